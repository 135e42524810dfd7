// FlightSearch - Offline airport search with persistent favorite routes
//
// This is the library crate containing the reactive core: the state
// aggregator, the query pipeline, the matching and favorite services and the
// storage collaborators. The binary crate (main.rs) wires them together
// behind a minimal console frontend.

pub mod config;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod state;
pub mod storage;
pub mod ui;

// Re-export commonly used types for convenience
pub use config::SettingsManager;
pub use metrics::Metrics;
pub use models::{AirportRecord, ErrorInfo, ErrorKind, FavoritePair, Settings, UiSnapshot};
pub use state::{StateAggregator, StateChange};
pub use storage::{SqliteFlightStore, StorageError, YamlQueryPersistence};
pub use ui::SearchController;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
