// Performance metrics module
//
// Lightweight counters for observing pipeline behavior without locks.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Global pipeline metrics
///
/// Uses atomic operations for thread-safe tracking. Counters accumulate for
/// the lifetime of the session and are logged on shutdown.
#[derive(Debug)]
pub struct Metrics {
    /// Queries submitted to the pipeline (pre-debounce)
    pub queries_submitted: AtomicU64,

    /// Evaluations accepted after debouncing and duplicate suppression
    pub searches_evaluated: AtomicU64,

    /// Evaluations whose results were dropped because a newer submission
    /// superseded them
    pub searches_superseded: AtomicU64,

    /// Debounce firings suppressed because the text matched the previous
    /// evaluation
    pub duplicates_suppressed: AtomicU64,

    /// Favorite toggles that reached the store
    pub favorites_toggled: AtomicU64,

    /// Departure suggestions accepted
    pub selections: AtomicU64,

    /// Session start time
    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            queries_submitted: AtomicU64::new(0),
            searches_evaluated: AtomicU64::new(0),
            searches_superseded: AtomicU64::new(0),
            duplicates_suppressed: AtomicU64::new(0),
            favorites_toggled: AtomicU64::new(0),
            selections: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_query_submitted(&self) {
        self.queries_submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_search_evaluated(&self) {
        self.searches_evaluated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_search_superseded(&self) {
        self.searches_superseded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_duplicate_suppressed(&self) {
        self.duplicates_suppressed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_favorite_toggled(&self) {
        self.favorites_toggled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_selection(&self) {
        self.selections.fetch_add(1, Ordering::Relaxed);
    }

    /// Get total uptime
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        tracing::info!("=== Session Metrics Summary ===");
        tracing::info!("Uptime: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Queries: {} submitted, {} evaluated, {} superseded, {} duplicates suppressed",
            self.queries_submitted.load(Ordering::Relaxed),
            self.searches_evaluated.load(Ordering::Relaxed),
            self.searches_superseded.load(Ordering::Relaxed),
            self.duplicates_suppressed.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Selections: {}, favorite toggles: {}",
            self.selections.load(Ordering::Relaxed),
            self.favorites_toggled.load(Ordering::Relaxed)
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
