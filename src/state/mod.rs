// State management module
//
// This module provides the StateAggregator, the single owner of the UI
// snapshot. Updates arrive from three independent asynchronous sources and
// are applied as field-scoped merges; change events are emitted for
// frontends over a broadcast channel.

use crate::models::{AirportRecord, ErrorInfo, ErrorKind, FavoritePair, UiSnapshot};
use indexmap::IndexSet;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

/// Change events emitted when the snapshot is replaced
///
/// Emitted to notify interested parties (primarily the frontend) about
/// state changes without requiring them to poll the snapshot.
#[derive(Clone, Debug, PartialEq)]
pub enum StateChange {
    /// Raw query text changed (fires on every accepted keystroke)
    QueryChanged { query: String },

    /// A search evaluation was accepted or its outcome was published
    SearchingChanged { is_searching: bool },

    /// The match list (or destination list) was replaced
    ResultsUpdated { count: usize },

    /// The one-time directory load completed
    DirectoryLoaded { count: usize },

    /// The favorite store's live stream delivered a new set
    FavoritesChanged { count: usize },

    /// A departure suggestion was accepted or cleared
    SelectionChanged { iata_code: Option<String> },

    /// A failure was surfaced (latest wins)
    ErrorRaised { message: String },
}

/// Single owner of the [`UiSnapshot`] with event emission
///
/// This is the central state component that:
/// - Holds the snapshot as `RwLock<Arc<UiSnapshot>>`; every update builds a
///   new snapshot from the previous one and swaps the `Arc` (observers never
///   see a partially applied update)
/// - Applies each source's update to only the fields that source owns, so
///   e.g. a favorites delivery can never reset an in-progress search
/// - Detects what changed and emits [`StateChange`] events
///
/// # Usage
///
/// - [`snapshot()`](Self::snapshot) for a cheap consistent view
/// - [`read()`](Self::read) for reading individual fields without cloning
/// - [`subscribe()`](Self::subscribe) for listening to state changes
///
/// # Related Types
///
/// - [`crate::models::UiSnapshot`]: the published state
/// - [`StateChange`]: event types emitted on updates
/// - [`crate::ui::SearchController`]: drives the query-pipeline updates
pub struct StateAggregator {
    /// Current snapshot; the Arc is replaced wholesale on every update
    snapshot: RwLock<Arc<UiSnapshot>>,

    /// Broadcast channel for emitting state change events
    change_tx: broadcast::Sender<StateChange>,
}

impl StateAggregator {
    /// Create a new aggregator with a default (empty) snapshot
    ///
    /// The broadcast channel buffers 100 events; laggy subscribers skip
    /// ahead rather than blocking updates.
    pub fn new() -> Self {
        let (change_tx, _) = broadcast::channel(100);
        Self {
            snapshot: RwLock::new(Arc::new(UiSnapshot::default())),
            change_tx,
        }
    }

    /// Get the current snapshot
    ///
    /// Cheap: clones the `Arc`, not the data. The returned snapshot is a
    /// complete, consistent view frozen at the time of the call.
    pub fn snapshot(&self) -> Arc<UiSnapshot> {
        Arc::clone(&self.snapshot.read().unwrap())
    }

    /// Execute a function with read access to the current snapshot
    ///
    /// # Example
    /// ```ignore
    /// let searching = aggregator.read(|s| s.is_searching);
    /// ```
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&UiSnapshot) -> R,
    {
        let guard = self.snapshot.read().unwrap();
        f(&guard)
    }

    /// Subscribe to state change events
    ///
    /// Returns a receiver notified of all future changes. Multiple
    /// subscribers can listen simultaneously.
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.change_tx.subscribe()
    }

    /// Replace the snapshot and emit change events
    ///
    /// The sole write path: builds the next snapshot from the previous one,
    /// swaps the `Arc` under the write lock, then diffs old against new to
    /// decide which events to emit.
    fn update<F>(&self, update_fn: F) -> Vec<StateChange>
    where
        F: FnOnce(&mut UiSnapshot),
    {
        let mut guard = self.snapshot.write().unwrap();
        let old = Arc::clone(&guard);

        let mut next = (*old).clone();
        update_fn(&mut next);
        let next = Arc::new(next);
        *guard = Arc::clone(&next);
        drop(guard);

        let changes = self.detect_changes(&old, &next);
        for change in &changes {
            // Ignore send errors - it's OK if no one is listening
            let _ = self.change_tx.send(change.clone());
        }
        changes
    }

    /// Detect what changed between two snapshots and generate events
    fn detect_changes(&self, old: &UiSnapshot, new: &UiSnapshot) -> Vec<StateChange> {
        let mut changes = Vec::new();

        if old.query != new.query {
            changes.push(StateChange::QueryChanged {
                query: new.query.clone(),
            });
        }

        if old.is_searching != new.is_searching {
            changes.push(StateChange::SearchingChanged {
                is_searching: new.is_searching,
            });
        }

        if old.search_results != new.search_results {
            changes.push(StateChange::ResultsUpdated {
                count: new.search_results.len(),
            });
        }

        if old.all_airports != new.all_airports {
            changes.push(StateChange::DirectoryLoaded {
                count: new.all_airports.len(),
            });
        }

        if old.favorites != new.favorites {
            changes.push(StateChange::FavoritesChanged {
                count: new.favorites.len(),
            });
        }

        if old.selected_departure != new.selected_departure {
            changes.push(StateChange::SelectionChanged {
                iata_code: new
                    .selected_departure
                    .as_ref()
                    .map(|a| a.iata_code.clone()),
            });
        }

        if old.error != new.error {
            if let Some(ref error) = new.error {
                changes.push(StateChange::ErrorRaised {
                    message: error.message.clone(),
                });
            }
        }

        changes
    }

    // Field-scoped update methods. Each source of updates gets methods that
    // touch only the fields it owns.

    /// Record the raw query text (query pipeline source)
    ///
    /// Applied unconditionally and immediately on every submission, before
    /// any debouncing. A blank query also clears the selected departure:
    /// a selection cannot outlive its query text.
    pub fn set_query(&self, query: &str) -> Vec<StateChange> {
        self.update(|s| {
            s.query = query.to_string();
            if query.trim().is_empty() {
                s.selected_departure = None;
            }
        })
    }

    /// Mark a query as accepted for evaluation (query pipeline source)
    pub fn begin_search(&self) -> Vec<StateChange> {
        self.update(|s| {
            s.is_searching = true;
        })
    }

    /// Publish a completed evaluation (query pipeline source)
    ///
    /// A successful search clears a stale search error; errors raised by
    /// the other sources are left for their own next success to clear.
    pub fn finish_search(&self, results: Vec<AirportRecord>) -> Vec<StateChange> {
        self.update(|s| {
            s.search_results = results;
            s.is_searching = false;
            if s.error.as_ref().map(|e| e.kind) == Some(ErrorKind::Search) {
                s.error = None;
            }
        })
    }

    /// Clear all search-derived fields (query pipeline source)
    ///
    /// Used for blank queries: no evaluation ran, so the error slot is left
    /// alone.
    pub fn clear_search(&self) -> Vec<StateChange> {
        self.update(|s| {
            s.search_results = Vec::new();
            s.selected_departure = None;
            s.is_searching = false;
        })
    }

    /// Apply an accepted departure suggestion (query pipeline source)
    ///
    /// Sets the selection, mirrors the airport name into the query text and
    /// replaces the result list with the destination candidates.
    pub fn apply_selection(
        &self,
        departure: AirportRecord,
        destinations: Vec<AirportRecord>,
    ) -> Vec<StateChange> {
        self.update(|s| {
            s.query = departure.name.clone();
            s.selected_departure = Some(departure);
            s.search_results = destinations;
            s.is_searching = false;
        })
    }

    /// Apply the one-time directory load (directory source)
    ///
    /// Only touches `all_airports` (and a stale directory error); called
    /// once at startup.
    pub fn set_all_airports(&self, airports: Vec<AirportRecord>) -> Vec<StateChange> {
        self.update(|s| {
            s.all_airports = airports;
            if s.error.as_ref().map(|e| e.kind) == Some(ErrorKind::Directory) {
                s.error = None;
            }
        })
    }

    /// Apply a favorites delivery from the store's live stream (favorites
    /// source). Only touches `favorites`.
    pub fn set_favorites(&self, favorites: IndexSet<FavoritePair>) -> Vec<StateChange> {
        self.update(|s| {
            s.favorites = favorites;
        })
    }

    /// Surface a failure (any source)
    ///
    /// The error slot is shared: the last writer wins, whatever its kind.
    /// Recording an error always clears `is_searching` so a failed
    /// evaluation cannot leave the UI spinning.
    pub fn record_error(&self, kind: ErrorKind, message: impl Into<String>) -> Vec<StateChange> {
        let message = message.into();
        tracing::warn!("surfacing error to UI: {}", message);
        self.update(|s| {
            s.error = Some(ErrorInfo::new(kind, message));
            s.is_searching = false;
        })
    }

    /// Clear a stale error raised by `kind`'s source, after that source
    /// succeeded. Errors from other sources are untouched.
    pub fn clear_error(&self, kind: ErrorKind) -> Vec<StateChange> {
        self.update(|s| {
            if s.error.as_ref().map(|e| e.kind) == Some(kind) {
                s.error = None;
            }
        })
    }
}

impl Default for StateAggregator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn airport(id: i64, code: &str, name: &str) -> AirportRecord {
        AirportRecord {
            id,
            iata_code: code.to_string(),
            name: name.to_string(),
            passenger_count: 0,
        }
    }

    #[test]
    fn test_new_aggregator() {
        let aggregator = StateAggregator::new();
        let snap = aggregator.snapshot();

        assert!(snap.query.is_empty());
        assert!(!snap.is_searching);
        assert!(snap.error.is_none());
    }

    #[test]
    fn test_snapshot_is_replaced_not_mutated() {
        let aggregator = StateAggregator::new();
        let before = aggregator.snapshot();

        aggregator.set_query("JFK");

        let after = aggregator.snapshot();
        assert!(!Arc::ptr_eq(&before, &after));
        // The earlier snapshot is frozen.
        assert_eq!(before.query, "");
        assert_eq!(after.query, "JFK");
    }

    #[test]
    fn test_set_query_emits_change() {
        let aggregator = StateAggregator::new();
        let changes = aggregator.set_query("LAX");

        assert_eq!(
            changes,
            vec![StateChange::QueryChanged {
                query: "LAX".to_string()
            }]
        );
    }

    #[test]
    fn test_blank_query_clears_selection() {
        let aggregator = StateAggregator::new();
        aggregator.apply_selection(airport(1, "JFK", "Kennedy"), Vec::new());
        assert!(aggregator.read(|s| s.selected_departure.is_some()));

        let changes = aggregator.set_query("");

        assert!(aggregator.read(|s| s.selected_departure.is_none()));
        assert!(changes
            .iter()
            .any(|c| matches!(c, StateChange::SelectionChanged { iata_code: None })));
    }

    #[test]
    fn test_search_lifecycle() {
        let aggregator = StateAggregator::new();

        let changes = aggregator.begin_search();
        assert_eq!(
            changes,
            vec![StateChange::SearchingChanged { is_searching: true }]
        );
        assert!(aggregator.read(|s| s.is_searching));

        let results = vec![airport(1, "JFK", "Kennedy")];
        let changes = aggregator.finish_search(results);
        assert!(changes
            .iter()
            .any(|c| matches!(c, StateChange::SearchingChanged { is_searching: false })));
        assert!(changes
            .iter()
            .any(|c| matches!(c, StateChange::ResultsUpdated { count: 1 })));
        assert!(!aggregator.read(|s| s.is_searching));
    }

    #[test]
    fn test_finish_search_clears_search_error_only() {
        let aggregator = StateAggregator::new();
        aggregator.record_error(ErrorKind::Search, "query evaluation failed: disk I/O error");
        assert!(aggregator.read(|s| s.error.is_some()));

        aggregator.finish_search(Vec::new());
        assert!(aggregator.read(|s| s.error.is_none()));

        // A favorite-write error survives a later successful search.
        aggregator.record_error(ErrorKind::Favorites, "favorite update failed: disk full");
        aggregator.finish_search(Vec::new());
        assert!(aggregator.read(|s| s.error.is_some()));
    }

    #[test]
    fn test_clear_error_is_kind_scoped() {
        let aggregator = StateAggregator::new();
        aggregator.record_error(ErrorKind::Favorites, "favorite update failed");

        aggregator.clear_error(ErrorKind::Directory);
        assert!(aggregator.read(|s| s.error.is_some()));

        aggregator.clear_error(ErrorKind::Favorites);
        assert!(aggregator.read(|s| s.error.is_none()));
    }

    #[test]
    fn test_directory_load_clears_stale_directory_error() {
        let aggregator = StateAggregator::new();
        aggregator.record_error(ErrorKind::Directory, "could not load airport directory");

        aggregator.set_all_airports(vec![airport(1, "JFK", "Kennedy")]);

        assert!(aggregator.read(|s| s.error.is_none()));
    }

    #[test]
    fn test_clear_search_leaves_error_alone() {
        let aggregator = StateAggregator::new();
        aggregator.record_error(ErrorKind::Search, "directory read failed");

        aggregator.clear_search();

        // No evaluation ran, so the error slot is untouched.
        assert!(aggregator.read(|s| s.error.is_some()));
        assert!(aggregator.read(|s| s.search_results.is_empty()));
    }

    #[test]
    fn test_record_error_clears_searching() {
        let aggregator = StateAggregator::new();
        aggregator.begin_search();

        let changes = aggregator.record_error(ErrorKind::Search, "query evaluation failed");

        assert!(!aggregator.read(|s| s.is_searching));
        assert!(changes
            .iter()
            .any(|c| matches!(c, StateChange::ErrorRaised { .. })));
    }

    #[test]
    fn test_favorites_update_does_not_touch_search_fields() {
        let aggregator = StateAggregator::new();
        aggregator.set_query("JF");
        aggregator.begin_search();

        let mut favorites = IndexSet::new();
        favorites.insert(FavoritePair::new("JFK", "LAX"));
        let changes = aggregator.set_favorites(favorites);

        assert_eq!(changes, vec![StateChange::FavoritesChanged { count: 1 }]);
        // The in-progress search is untouched by the favorites source.
        assert!(aggregator.read(|s| s.is_searching));
        assert_eq!(aggregator.read(|s| s.query.clone()), "JF");
    }

    #[test]
    fn test_directory_load_touches_only_all_airports() {
        let aggregator = StateAggregator::new();
        aggregator.set_query("LAX");

        let changes = aggregator.set_all_airports(vec![airport(1, "JFK", "Kennedy")]);

        assert_eq!(changes, vec![StateChange::DirectoryLoaded { count: 1 }]);
        assert_eq!(aggregator.read(|s| s.query.clone()), "LAX");
        assert!(aggregator.read(|s| s.search_results.is_empty()));
    }

    #[test]
    fn test_apply_selection() {
        let aggregator = StateAggregator::new();
        let jfk = airport(1, "JFK", "John F. Kennedy International Airport");
        let lax = airport(2, "LAX", "Los Angeles International Airport");

        let changes = aggregator.apply_selection(jfk.clone(), vec![lax.clone()]);

        let snap = aggregator.snapshot();
        assert_eq!(snap.selected_departure, Some(jfk.clone()));
        assert_eq!(snap.query, jfk.name);
        assert_eq!(snap.search_results, vec![lax]);
        assert!(!snap.is_searching);
        assert!(changes.iter().any(|c| matches!(
            c,
            StateChange::SelectionChanged { iata_code: Some(code) } if code == "JFK"
        )));
    }

    #[test]
    fn test_subscribe_receives_changes() {
        let aggregator = StateAggregator::new();
        let mut rx = aggregator.subscribe();

        aggregator.set_query("OPO");

        let event = rx.try_recv().unwrap();
        assert!(matches!(event, StateChange::QueryChanged { .. }));
    }

    #[test]
    fn test_multiple_subscribers() {
        let aggregator = StateAggregator::new();
        let mut rx1 = aggregator.subscribe();
        let mut rx2 = aggregator.subscribe();

        aggregator.begin_search();

        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_ok());
    }

    #[test]
    fn test_no_event_when_nothing_changed() {
        let aggregator = StateAggregator::new();
        aggregator.set_query("JFK");

        let changes = aggregator.set_query("JFK");
        assert!(changes.is_empty());
    }

    #[test]
    fn test_error_last_writer_wins_across_kinds() {
        let aggregator = StateAggregator::new();
        aggregator.record_error(ErrorKind::Favorites, "first failure");
        aggregator.record_error(ErrorKind::Search, "second failure");

        let error = aggregator.read(|s| s.error.clone()).unwrap();
        assert_eq!(error.message, "second failure");
        assert_eq!(error.kind, ErrorKind::Search);
    }
}
