use crate::models::{AirportRecord, FavoritePair};
use indexmap::IndexSet;

/// Which update source surfaced an error.
///
/// The error slot is shared (last writer wins), but implicit clearing is
/// scoped: a source's next success clears only its own stale error, so e.g.
/// a later successful search never hides a favorite-write failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Query pipeline: evaluation or query-persistence failures
    Search,
    /// Favorite store writes
    Favorites,
    /// The one-time directory load
    Directory,
}

/// A surfaced failure: a human-readable message plus the source that
/// raised it.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Single source of truth for everything a frontend renders.
///
/// Exactly one logical snapshot exists per session. It is owned by
/// [`StateAggregator`](crate::state::StateAggregator), which keeps it behind
/// an `RwLock<Arc<UiSnapshot>>` and replaces the whole `Arc` on every
/// accepted update. Observers therefore always hold a complete, internally
/// consistent view; there is no in-place mutation.
///
/// Field ownership is scoped per update source:
/// - query pipeline: `query`, `search_results`, `is_searching`,
///   `selected_departure`
/// - favorite store live stream: `favorites`
/// - one-time directory load: `all_airports`
/// - `error` is the one shared slot: any source may raise it (last writer
///   wins) and implicit clearing is scoped by [`ErrorKind`]
///
/// # Related Types
///
/// - [`crate::state::StateAggregator`]: owns and publishes the snapshot
/// - [`crate::state::StateChange`]: events emitted when fields change
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UiSnapshot {
    /// Raw query text, updated on every keystroke (before debouncing).
    pub query: String,

    /// Latest accepted evaluation's matches, or the destination list after
    /// a departure has been selected.
    pub search_results: Vec<AirportRecord>,

    /// Full directory in load order. Populated once at startup; empty if
    /// the load failed.
    pub all_airports: Vec<AirportRecord>,

    /// Current favorite routes, insertion-ordered.
    pub favorites: IndexSet<FavoritePair>,

    /// The accepted departure suggestion, if any.
    pub selected_departure: Option<AirportRecord>,

    /// True only between a query being accepted for evaluation and its
    /// result (or error) being published.
    pub is_searching: bool,

    /// The latest surfaced failure. Last writer wins.
    pub error: Option<ErrorInfo>,
}

impl UiSnapshot {
    /// Whether the given route is currently a favorite.
    pub fn is_favorite(&self, departure_code: &str, destination_code: &str) -> bool {
        self.favorites.contains(&FavoritePair::new(departure_code, destination_code))
    }

    /// Favorites joined against the loaded directory, as (departure,
    /// destination) record pairs. Pairs whose codes are missing from the
    /// directory are skipped.
    pub fn favorite_routes(&self) -> Vec<(AirportRecord, AirportRecord)> {
        self.favorites
            .iter()
            .filter_map(|pair| {
                let dep = self.find_by_code(&pair.departure_code)?;
                let dest = self.find_by_code(&pair.destination_code)?;
                Some((dep.clone(), dest.clone()))
            })
            .collect()
    }

    fn find_by_code(&self, code: &str) -> Option<&AirportRecord> {
        self.all_airports.iter().find(|a| a.iata_code == code)
    }
}
