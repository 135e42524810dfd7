//! FlightSearch - Offline airport search with persistent favorite routes
//!
//! Main entry point for the console application.
//!
//! # Overview
//!
//! This binary wires the reactive core together. It initializes:
//! - Logging infrastructure (file rotation + optional console output)
//! - Tokio async runtime (the pipeline and observation tasks live on it)
//! - Settings loading ([`SettingsManager`])
//! - Storage ([`SqliteFlightStore`] for airports + favorites,
//!   [`YamlQueryPersistence`] for the last search query)
//! - The state aggregator and [`SearchController`]
//!
//! The frontend is a deliberately small line-oriented driver: it exists to
//! exercise the core's public surface, not to render anything. Each input
//! line is either free text (a search query) or a command:
//!
//! ```text
//! <text>        submit query text
//! /select N     accept the N-th search result as departure
//! /fav N        toggle the N-th result as a favorite destination
//! /favorites    list favorite routes
//! /quit         exit
//! ```
//!
//! # Data Files
//!
//! Expected in the `FlightSearch Data/` directory (all created on demand
//! except the airport directory, which must be populated out of band):
//! - `flightsearch.yaml`: settings (paths, debounce window, logging flags)
//! - `flightsearch.db`: SQLite database with `airport` and `favorite` tables
//! - `preferences.yaml`: last search query slot

use anyhow::Result;
use flightsearch::{
    APP_NAME, Metrics, SearchController, SettingsManager, SqliteFlightStore, StateAggregator,
    StateChange, VERSION, YamlQueryPersistence,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Main entry point for the FlightSearch console application
///
/// # Errors
///
/// This function can fail if:
/// - Logging initialization fails (disk space, permissions)
/// - Tokio runtime creation fails (system resources)
/// - The settings file is invalid YAML
/// - The database or preferences file cannot be opened
fn main() -> Result<()> {
    let settings_manager = SettingsManager::new("FlightSearch Data")?;
    let settings = settings_manager.load()?;

    // Setup logging with file output; console output is opt-in because the
    // console is the frontend here
    let _guard = flightsearch::logging::setup_logging(
        &settings.log_dir,
        APP_NAME,
        settings.debug_logging,
        settings.console_logging,
    )?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    // Create tokio runtime for the pipeline and observation tasks
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(4)
        .thread_name("flightsearch-worker")
        .build()?;

    let result = runtime.block_on(run(&settings_manager, settings));

    // Shutdown the tokio runtime gracefully
    runtime.shutdown_timeout(Duration::from_secs(5));
    tracing::info!("Application shutdown complete");

    result
}

async fn run(
    settings_manager: &SettingsManager,
    settings: flightsearch::Settings,
) -> Result<()> {
    // Open storage
    let store = Arc::new(SqliteFlightStore::open(
        settings_manager.database_path(&settings),
    )?);
    let persistence = Arc::new(YamlQueryPersistence::open(
        settings_manager.preferences_path(&settings),
    )?);

    match store.airport_count() {
        Ok(0) => tracing::warn!(
            "airport directory is empty - searches will return no results \
             until the database is populated"
        ),
        Ok(n) => tracing::info!("airport directory holds {} records", n),
        Err(err) => tracing::error!("could not inspect airport directory: {}", err),
    }

    let aggregator = Arc::new(StateAggregator::new());
    let metrics = Arc::new(Metrics::new());

    let debounce = Duration::from_millis(settings.debounce_ms);
    let controller = SearchController::new(
        Arc::clone(&aggregator),
        store.clone(),
        store,
        persistence,
        debounce,
        Arc::clone(&metrics),
    );

    // Print state changes as they are published; this is the subscribe side
    // of the surface that a real frontend would drive its rendering from
    let mut changes = controller.subscribe();
    let printer_aggregator = Arc::clone(&aggregator);
    let printer = tokio::spawn(async move {
        loop {
            match changes.recv().await {
                Ok(change) => print_change(&printer_aggregator, &change),
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("state subscription lagged - {} events skipped", skipped);
                }
            }
        }
    });

    println!(
        "{} v{} - type to search, /select N, /fav N, /favorites, /quit",
        APP_NAME, VERSION
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        match input {
            "/quit" => break,
            "/favorites" => {
                let snap = controller.snapshot();
                if snap.favorites.is_empty() {
                    println!("no favorite routes");
                }
                for (dep, dest) in snap.favorite_routes() {
                    println!("  {} -> {}", dep.label(), dest.label());
                }
            }
            _ if input.starts_with("/select ") => {
                if let Some(airport) = nth_result(&controller, &input["/select ".len()..]) {
                    controller.on_suggestion_selected(&airport).await;
                } else {
                    println!("no such result");
                }
            }
            _ if input.starts_with("/fav ") => {
                if let Some(destination) = nth_result(&controller, &input["/fav ".len()..]) {
                    let snap = controller.snapshot();
                    controller.toggle_favorite(snap.selected_departure.as_ref(), &destination);
                } else {
                    println!("no such result");
                }
            }
            _ => controller.on_query_changed(input),
        }
    }

    controller.shutdown();
    printer.abort();
    metrics.log_summary();
    Ok(())
}

/// Look up the 1-based N-th entry of the current result list.
fn nth_result(controller: &SearchController, index: &str) -> Option<flightsearch::AirportRecord> {
    let index: usize = index.trim().parse().ok()?;
    controller
        .snapshot()
        .search_results
        .get(index.checked_sub(1)?)
        .cloned()
}

fn print_change(aggregator: &StateAggregator, change: &StateChange) {
    match change {
        StateChange::ResultsUpdated { count } => {
            let snap = aggregator.snapshot();
            println!("{} result(s):", count);
            for (i, airport) in snap.search_results.iter().take(10).enumerate() {
                let marker = match &snap.selected_departure {
                    Some(dep) if snap.is_favorite(&dep.iata_code, &airport.iata_code) => "*",
                    _ => " ",
                };
                println!("  {:>2}.{} {}", i + 1, marker, airport.label());
            }
            if snap.search_results.len() > 10 {
                println!("  ... and {} more", snap.search_results.len() - 10);
            }
        }
        StateChange::SelectionChanged {
            iata_code: Some(code),
        } => {
            println!("departure selected: {code}");
        }
        StateChange::FavoritesChanged { count } => {
            println!("favorites updated ({count} route(s))");
        }
        StateChange::ErrorRaised { message } => {
            println!("error: {message}");
        }
        _ => {}
    }
}
