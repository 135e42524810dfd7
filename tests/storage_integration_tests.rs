//! Integration tests for the storage collaborators on real files
//!
//! These tests verify that:
//! - The SQLite store round-trips airports and favorites across reopen
//! - Favorite mutations are idempotent and publish to live observers
//! - The preferences slot round-trips the last query across reopen

use camino::Utf8PathBuf;
use flightsearch::models::{AirportRecord, FavoritePair};
use flightsearch::storage::{AirportDirectory, FavoriteStore, QueryPersistence};
use flightsearch::{SqliteFlightStore, YamlQueryPersistence};
use tempfile::TempDir;
use tokio::time::{Duration, timeout};

fn fixture_airports() -> Vec<AirportRecord> {
    vec![
        AirportRecord {
            id: 1,
            iata_code: "JFK".to_string(),
            name: "John F. Kennedy International Airport".to_string(),
            passenger_count: 62_500_000,
        },
        AirportRecord {
            id: 2,
            iata_code: "LAX".to_string(),
            name: "Los Angeles International Airport".to_string(),
            passenger_count: 75_000_000,
        },
        AirportRecord {
            id: 3,
            iata_code: "OPO".to_string(),
            name: "Francisco Sá Carneiro Airport".to_string(),
            passenger_count: 13_100_000,
        },
    ]
}

fn path_in(dir: &TempDir, name: &str) -> Utf8PathBuf {
    Utf8PathBuf::from(dir.path().to_str().unwrap()).join(name)
}

#[tokio::test]
async fn test_directory_round_trips_across_reopen() {
    let dir = TempDir::new().unwrap();
    let db_path = path_in(&dir, "flightsearch.db");

    {
        let store = SqliteFlightStore::open(&db_path).unwrap();
        store.seed_airports(&fixture_airports()).unwrap();
    }

    let reopened = SqliteFlightStore::open(&db_path).unwrap();
    let airports = reopened.load_all().await.unwrap();

    assert_eq!(airports.len(), 3);
    let codes: Vec<&str> = airports.iter().map(|a| a.iata_code.as_str()).collect();
    assert_eq!(codes, vec!["JFK", "LAX", "OPO"]);
}

#[tokio::test]
async fn test_directory_search_endpoint_matches_in_memory_semantics() {
    let store = SqliteFlightStore::open_in_memory().unwrap();
    store.seed_airports(&fixture_airports()).unwrap();

    let results = store.search("international").await.unwrap();
    let codes: Vec<&str> = results.iter().map(|a| a.iata_code.as_str()).collect();
    assert_eq!(codes, vec!["JFK", "LAX"]);
}

#[tokio::test]
async fn test_favorites_survive_reopen_and_replay_on_subscribe() {
    let dir = TempDir::new().unwrap();
    let db_path = path_in(&dir, "flightsearch.db");

    {
        let store = SqliteFlightStore::open(&db_path).unwrap();
        store.insert(&FavoritePair::new("JFK", "LAX")).await.unwrap();
        store.insert(&FavoritePair::new("OPO", "LIS")).await.unwrap();
    }

    let reopened = SqliteFlightStore::open(&db_path).unwrap();
    // A fresh subscriber sees the persisted set without waiting for a change
    let favorites = reopened.observe().borrow().clone();

    assert_eq!(favorites.len(), 2);
    assert!(favorites.contains(&FavoritePair::new("JFK", "LAX")));
    assert!(favorites.contains(&FavoritePair::new("OPO", "LIS")));
}

#[tokio::test]
async fn test_toggle_cycle_settles_to_one_observable_change() {
    let store = SqliteFlightStore::open_in_memory().unwrap();
    let pair = FavoritePair::new("JFK", "LAX");
    let mut rx = store.observe();
    assert!(rx.borrow_and_update().is_empty());

    // Two racing inserts of the same pair: idempotent at the store level
    store.insert(&pair).await.unwrap();
    store.insert(&pair).await.unwrap();

    timeout(Duration::from_millis(100), rx.changed())
        .await
        .expect("Timeout")
        .expect("Channel closed");
    assert_eq!(rx.borrow_and_update().len(), 1);

    // Delete settles back; deleting again is a no-op
    store.delete(&pair).await.unwrap();
    store.delete(&pair).await.unwrap();

    timeout(Duration::from_millis(100), rx.changed())
        .await
        .expect("Timeout")
        .expect("Channel closed");
    assert!(rx.borrow_and_update().is_empty());
}

#[tokio::test]
async fn test_preferences_round_trip_across_reopen() {
    let dir = TempDir::new().unwrap();
    let prefs_path = path_in(&dir, "preferences.yaml");

    {
        let persistence = YamlQueryPersistence::open(&prefs_path).unwrap();
        assert_eq!(*persistence.observe().borrow(), "");
        persistence.save("Kennedy").await.unwrap();
    }

    let reopened = YamlQueryPersistence::open(&prefs_path).unwrap();
    assert_eq!(*reopened.observe().borrow(), "Kennedy");

    reopened.clear().await.unwrap();
    let cleared = YamlQueryPersistence::open(&prefs_path).unwrap();
    assert_eq!(*cleared.observe().borrow(), "");
}

#[tokio::test]
async fn test_preferences_observation_sees_saves() {
    let dir = TempDir::new().unwrap();
    let persistence = YamlQueryPersistence::open(path_in(&dir, "preferences.yaml")).unwrap();
    let mut rx = persistence.observe();

    persistence.save("LAX").await.unwrap();

    timeout(Duration::from_millis(100), rx.changed())
        .await
        .expect("Timeout")
        .expect("Channel closed");
    assert_eq!(*rx.borrow_and_update(), "LAX");
}
