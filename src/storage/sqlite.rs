//! SQLite-backed airport directory and favorite store.
//!
//! One database holds both tables. Favorite mutations are idempotent at the
//! SQL level (`INSERT OR IGNORE` against a UNIQUE constraint, targeted
//! `DELETE`), and every mutation republishes the full current set over a
//! watch channel, which is what makes the store's live stream authoritative
//! for the UI.

use std::sync::Mutex;

use camino::Utf8Path;
use indexmap::IndexSet;
use rusqlite::{Connection, params};
use tokio::sync::watch;

use crate::models::{AirportRecord, FavoritePair};
use crate::storage::{AirportDirectory, FavoriteStore, StorageError};
use async_trait::async_trait;

/// SQLite implementation of [`AirportDirectory`] and [`FavoriteStore`].
///
/// Queries on a small local database are microsecond-scale, so methods take
/// the connection lock directly instead of hopping to a blocking thread.
pub struct SqliteFlightStore {
    conn: Mutex<Connection>,

    /// Latest full favorites set; mutations republish through here.
    favorites_tx: watch::Sender<IndexSet<FavoritePair>>,
}

impl SqliteFlightStore {
    /// Opens or creates the database at `path`.
    ///
    /// Applies the schema, enables WAL mode and seeds the watch channel
    /// with the persisted favorites.
    pub fn open(path: impl AsRef<Utf8Path>) -> Result<Self, StorageError> {
        let conn = Connection::open(path.as_ref()).map_err(StorageError::read)?;
        Self::init_connection(conn)
    }

    /// Opens an in-memory database (fixtures and tests).
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory().map_err(StorageError::read)?;
        Self::init_connection(conn)
    }

    fn init_connection(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch(include_str!("schema.sql"))
            .map_err(StorageError::write)?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(StorageError::write)?;
        conn.pragma_update(None, "synchronous", "NORMAL")
            .map_err(StorageError::write)?;

        let favorites = Self::read_favorites(&conn)?;
        let (favorites_tx, _) = watch::channel(favorites);

        Ok(Self {
            conn: Mutex::new(conn),
            favorites_tx,
        })
    }

    /// Number of airports in the directory.
    pub fn airport_count(&self) -> Result<usize, StorageError> {
        let conn = self.conn.lock().unwrap();
        conn.query_row("SELECT COUNT(*) FROM airport", [], |row| row.get::<_, i64>(0))
            .map(|n| n as usize)
            .map_err(StorageError::read)
    }

    /// Insert airport records, keeping their ids.
    ///
    /// Used to populate fixtures and first-run databases; the directory is
    /// otherwise read-only.
    pub fn seed_airports(&self, airports: &[AirportRecord]) -> Result<(), StorageError> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction().map_err(StorageError::write)?;
        for airport in airports {
            tx.execute(
                "INSERT INTO airport (id, iata_code, name, passengers) VALUES (?1, ?2, ?3, ?4)",
                params![
                    airport.id,
                    airport.iata_code,
                    airport.name,
                    airport.passenger_count
                ],
            )
            .map_err(StorageError::write)?;
        }
        tx.commit().map_err(StorageError::write)?;
        Ok(())
    }

    fn read_favorites(conn: &Connection) -> Result<IndexSet<FavoritePair>, StorageError> {
        let mut stmt = conn
            .prepare("SELECT departure_code, destination_code FROM favorite ORDER BY id ASC")
            .map_err(StorageError::read)?;

        let rows = stmt
            .query_map([], |row| {
                Ok(FavoritePair {
                    departure_code: row.get(0)?,
                    destination_code: row.get(1)?,
                })
            })
            .map_err(StorageError::read)?;

        let mut favorites = IndexSet::new();
        for row in rows {
            favorites.insert(row.map_err(StorageError::read)?);
        }
        Ok(favorites)
    }

    fn row_to_airport(row: &rusqlite::Row<'_>) -> rusqlite::Result<AirportRecord> {
        Ok(AirportRecord {
            id: row.get(0)?,
            iata_code: row.get(1)?,
            name: row.get(2)?,
            passenger_count: row.get(3)?,
        })
    }

    /// Re-read the favorites table and publish the result to observers.
    ///
    /// Called with the lock held after every mutation so deliveries cannot
    /// reorder against each other.
    fn republish_favorites(&self, conn: &Connection) -> Result<(), StorageError> {
        let favorites = Self::read_favorites(conn)?;
        self.favorites_tx.send_replace(favorites);
        Ok(())
    }
}

#[async_trait]
impl AirportDirectory for SqliteFlightStore {
    async fn load_all(&self) -> Result<Vec<AirportRecord>, StorageError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare("SELECT id, iata_code, name, passengers FROM airport ORDER BY id ASC")
            .map_err(StorageError::read)?;

        let rows = stmt
            .query_map([], |row| Self::row_to_airport(row))
            .map_err(StorageError::read)?;

        let mut airports = Vec::new();
        for row in rows {
            airports.push(row.map_err(StorageError::read)?);
        }
        tracing::debug!("loaded {} airports from directory", airports.len());
        Ok(airports)
    }

    async fn search(&self, query: &str) -> Result<Vec<AirportRecord>, StorageError> {
        let pattern = format!("%{query}%");
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(
                "SELECT id, iata_code, name, passengers FROM airport \
                 WHERE name LIKE ?1 OR iata_code LIKE ?1 ORDER BY id ASC",
            )
            .map_err(StorageError::read)?;

        let rows = stmt
            .query_map(params![pattern], |row| Self::row_to_airport(row))
            .map_err(StorageError::read)?;

        let mut airports = Vec::new();
        for row in rows {
            airports.push(row.map_err(StorageError::read)?);
        }
        Ok(airports)
    }
}

#[async_trait]
impl FavoriteStore for SqliteFlightStore {
    async fn insert(&self, pair: &FavoritePair) -> Result<(), StorageError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR IGNORE INTO favorite (departure_code, destination_code) VALUES (?1, ?2)",
            params![pair.departure_code, pair.destination_code],
        )
        .map_err(StorageError::write)?;
        self.republish_favorites(&conn)
    }

    async fn delete(&self, pair: &FavoritePair) -> Result<(), StorageError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM favorite WHERE departure_code = ?1 AND destination_code = ?2",
            params![pair.departure_code, pair.destination_code],
        )
        .map_err(StorageError::write)?;
        self.republish_favorites(&conn)
    }

    fn observe(&self) -> watch::Receiver<IndexSet<FavoritePair>> {
        self.favorites_tx.subscribe()
    }
}
