// Search controller - the UI-facing surface of the core
//
// This module contains the SearchController which coordinates between:
// - the frontend (query text, suggestion selection, favorite toggles)
// - StateAggregator (the UI snapshot)
// - the storage collaborators (directory, favorite store, query persistence)
//
// It owns the query pipeline: debouncing, duplicate suppression, blank-query
// short-circuiting, last-submitted-wins cancellation, startup restoration,
// and the background observation tasks for favorites and the directory load.

use crate::metrics::Metrics;
use crate::models::{AirportRecord, ErrorKind, FavoritePair, UiSnapshot};
use crate::services::{self, FavoriteToggler};
use crate::state::{StateAggregator, StateChange};
use crate::storage::{AirportDirectory, FavoriteStore, QueryPersistence, StorageError};
use indexmap::IndexSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{Instant, sleep};

/// Default quiet window between the last keystroke and evaluation.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Submissions the pipeline queues ahead of the debounce timer. Keystrokes
/// collapse into one evaluation, so the channel only ever holds a burst.
const QUERY_CHANNEL_CAPACITY: usize = 64;

/// Failure during a search evaluation.
///
/// The matching itself is pure and cannot fail; the only failure source is
/// the directory read underlying it.
#[derive(Error, Debug)]
pub enum EvaluationError {
    #[error("query evaluation failed: {0}")]
    Directory(#[from] StorageError),
}

enum QueryCommand {
    /// Raw text submission; restarts the debounce window.
    Submit(String),
    /// Drop any not-yet-fired submission (used when a suggestion is
    /// accepted so the stale text never evaluates).
    CancelPending,
}

/// Shared context for the pipeline task and the evaluations it spawns.
struct PipelineShared {
    aggregator: Arc<StateAggregator>,
    directory: Arc<dyn AirportDirectory>,
    persistence: Arc<dyn QueryPersistence>,
    /// Generation of the most recently accepted submission. Evaluations
    /// publish only if their generation is still the latest.
    latest_generation: AtomicU64,
    metrics: Arc<Metrics>,
}

/// Controller that wires the frontend surface to state and storage
///
/// This is the main coordinator of the core. It:
/// - Accepts raw query text and runs it through debounce, duplicate
///   suppression and last-submitted-wins cancellation
/// - Subscribes to the favorite store's live stream and the query
///   persistence restore value
/// - Kicks off the one-time directory load
/// - Serializes favorite toggle decisions against the current snapshot
///
/// All mutation flows through [`StateAggregator`]'s field-scoped methods, so
/// none of the concurrent sources can clobber another's fields.
///
/// # Example
/// ```ignore
/// let aggregator = Arc::new(StateAggregator::new());
/// let store = Arc::new(SqliteFlightStore::open("flightsearch.db")?);
/// let prefs = Arc::new(YamlQueryPersistence::open("preferences.yaml")?);
///
/// let controller = SearchController::new(
///     aggregator,
///     store.clone(),
///     store,
///     prefs,
///     DEFAULT_DEBOUNCE,
///     Arc::new(Metrics::new()),
/// );
/// controller.on_query_changed("JFK");
/// ```
pub struct SearchController {
    aggregator: Arc<StateAggregator>,

    persistence: Arc<dyn QueryPersistence>,

    /// Executes favorite insert/delete decisions against the store
    toggler: Arc<FavoriteToggler>,

    directory: Arc<dyn AirportDirectory>,

    metrics: Arc<Metrics>,

    /// Intake into the debounce pipeline task
    query_tx: mpsc::Sender<QueryCommand>,

    shared: Arc<PipelineShared>,

    /// Cancellation sender for graceful shutdown of the background tasks
    shutdown_tx: watch::Sender<bool>,
}

impl SearchController {
    /// Create the controller and spawn its background tasks
    ///
    /// Must be called from within a tokio runtime. Spawns: the debounce
    /// pipeline, the favorites observation loop and the one-shot directory
    /// load; then performs startup restoration from the persistence stream.
    pub fn new(
        aggregator: Arc<StateAggregator>,
        directory: Arc<dyn AirportDirectory>,
        favorites: Arc<dyn FavoriteStore>,
        persistence: Arc<dyn QueryPersistence>,
        debounce: Duration,
        metrics: Arc<Metrics>,
    ) -> Self {
        let (query_tx, query_rx) = mpsc::channel(QUERY_CHANNEL_CAPACITY);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let shared = Arc::new(PipelineShared {
            aggregator: Arc::clone(&aggregator),
            directory: Arc::clone(&directory),
            persistence: Arc::clone(&persistence),
            latest_generation: AtomicU64::new(0),
            metrics: Arc::clone(&metrics),
        });

        tokio::spawn(Self::run_query_pipeline(
            query_rx,
            shutdown_rx.clone(),
            debounce,
            Arc::clone(&shared),
        ));

        tokio::spawn(Self::observe_favorites(
            favorites.observe(),
            shutdown_rx.clone(),
            Arc::clone(&aggregator),
        ));

        tokio::spawn(Self::load_directory(
            Arc::clone(&directory),
            Arc::clone(&aggregator),
            shutdown_rx,
        ));

        let controller = Self {
            aggregator,
            persistence: Arc::clone(&persistence),
            toggler: Arc::new(FavoriteToggler::new(favorites)),
            directory,
            metrics,
            query_tx,
            shared,
            shutdown_tx,
        };

        controller.restore_query();

        tracing::info!("search controller initialized");
        controller
    }

    /// Get the current UI snapshot
    pub fn snapshot(&self) -> Arc<UiSnapshot> {
        self.aggregator.snapshot()
    }

    /// Subscribe to state change events
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.aggregator.subscribe()
    }

    /// Request graceful shutdown of the background tasks
    pub fn shutdown(&self) {
        tracing::info!("shutdown requested via watch channel");
        let _ = self.shutdown_tx.send(true);
    }

    /// Accept raw query text from the frontend
    ///
    /// The snapshot's `query` field updates immediately for responsiveness;
    /// evaluation is scheduled behind the debounce window.
    pub fn on_query_changed(&self, text: &str) {
        self.metrics.record_query_submitted();
        self.aggregator.set_query(text);
        self.submit(text.to_string());
    }

    /// Accept a departure suggestion
    ///
    /// Persists the airport name as the last query, computes the
    /// destination candidates and applies the selection. Supersedes any
    /// in-flight evaluation and cancels a pending debounce so a stale match
    /// list can never overwrite the destination list.
    pub async fn on_suggestion_selected(&self, airport: &AirportRecord) {
        tracing::info!("suggestion accepted: {}", airport.iata_code);
        self.shared.latest_generation.fetch_add(1, Ordering::SeqCst);
        self.send_command(QueryCommand::CancelPending);

        if let Err(err) = self.persistence.save(&airport.name).await {
            self.aggregator
                .record_error(ErrorKind::Search, format!("could not save search query: {err}"));
            return;
        }

        match Self::loaded_airports(&self.aggregator, self.directory.as_ref()).await {
            Ok(airports) => {
                let destinations = services::destinations_for(airport, &airports);
                self.metrics.record_selection();
                self.aggregator.apply_selection(airport.clone(), destinations);
            }
            Err(err) => {
                self.aggregator
                    .record_error(ErrorKind::Search, EvaluationError::from(err).to_string());
            }
        }
    }

    /// Toggle a favorite route
    ///
    /// No-op when `departure` is absent. The decision is made against the
    /// current snapshot's favorites; the visible favorites only change once
    /// the store's live stream reflects the mutation.
    pub fn toggle_favorite(
        &self,
        departure: Option<&AirportRecord>,
        destination: &AirportRecord,
    ) {
        let favorites = self.aggregator.read(|s| s.favorites.clone());
        let toggler = Arc::clone(&self.toggler);
        let aggregator = Arc::clone(&self.aggregator);
        let metrics = Arc::clone(&self.metrics);
        let departure = departure.cloned();
        let destination = destination.clone();

        tokio::spawn(async move {
            match toggler
                .toggle(departure.as_ref(), &destination, &favorites)
                .await
            {
                Ok(Some(_)) => {
                    metrics.record_favorite_toggled();
                    aggregator.clear_error(ErrorKind::Favorites);
                }
                Ok(None) => {}
                Err(err) => {
                    aggregator
                        .record_error(ErrorKind::Favorites, format!("favorite update failed: {err}"));
                }
            }
        });
    }

    fn submit(&self, text: String) {
        self.send_command(QueryCommand::Submit(text));
    }

    fn send_command(&self, command: QueryCommand) {
        // try_send: a keystroke burst must never block the frontend. The
        // channel outlives any realistic burst; failure means the pipeline
        // task is gone.
        if self.query_tx.try_send(command).is_err() {
            tracing::warn!("query pipeline unavailable; submission dropped");
        }
    }

    /// Startup restoration from the persistence stream
    ///
    /// Takes the current value of the subscription once. A blank restored
    /// value clears the search fields directly without evaluating; anything
    /// else runs through the exact same submit path as typed input.
    fn restore_query(&self) {
        let restored = self.persistence.observe().borrow().clone();

        if restored.trim().is_empty() {
            self.aggregator.clear_search();
            return;
        }

        tracing::info!("restoring last search query");
        self.aggregator.set_query(&restored);
        self.submit(restored);
    }

    /// The debounce pipeline: single consumer of query submissions
    ///
    /// A pinned timer restarts on every submission; when it fires with no
    /// newer submission pending, the text is checked against the previous
    /// evaluation (duplicate suppression) and then accepted.
    async fn run_query_pipeline(
        mut query_rx: mpsc::Receiver<QueryCommand>,
        mut shutdown_rx: watch::Receiver<bool>,
        debounce: Duration,
        shared: Arc<PipelineShared>,
    ) {
        tracing::debug!("query pipeline task started");

        let mut pending: Option<String> = None;
        let mut last_evaluated: Option<String> = None;
        let timer = sleep(Duration::ZERO);
        tokio::pin!(timer);

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => break,

                command = query_rx.recv() => match command {
                    Some(QueryCommand::Submit(text)) => {
                        pending = Some(text);
                        timer.as_mut().reset(Instant::now() + debounce);
                    }
                    Some(QueryCommand::CancelPending) => {
                        pending = None;
                    }
                    None => break,
                },

                _ = timer.as_mut(), if pending.is_some() => {
                    let text = pending.take().unwrap();

                    if last_evaluated.as_deref() == Some(text.as_str()) {
                        shared.metrics.record_duplicate_suppressed();
                        tracing::trace!("duplicate query suppressed");
                        continue;
                    }

                    last_evaluated = Some(text.clone());
                    Self::accept_query(text, &shared);
                }
            }
        }

        tracing::debug!("query pipeline task terminated");
    }

    /// Accept a debounced query for evaluation
    ///
    /// Bumps the generation so any older in-flight evaluation becomes
    /// stale. Blank queries never reach the match engine: they clear the
    /// persisted slot and the search fields instead.
    fn accept_query(text: String, shared: &Arc<PipelineShared>) {
        let generation = shared.latest_generation.fetch_add(1, Ordering::SeqCst) + 1;

        if text.trim().is_empty() {
            let shared = Arc::clone(shared);
            tokio::spawn(async move {
                if let Err(err) = shared.persistence.clear().await {
                    shared
                        .aggregator
                        .record_error(ErrorKind::Search, format!("could not clear saved search: {err}"));
                }
                if shared.latest_generation.load(Ordering::SeqCst) == generation {
                    shared.aggregator.clear_search();
                }
            });
            return;
        }

        shared.metrics.record_search_evaluated();
        shared.aggregator.begin_search();
        tracing::debug!("evaluating query {:?} (generation {})", text, generation);

        let shared = Arc::clone(shared);
        tokio::spawn(async move {
            let outcome = Self::evaluate(&text, &shared).await;

            // Last-submitted-wins: results are applied in submission order,
            // never completion order.
            if shared.latest_generation.load(Ordering::SeqCst) != generation {
                shared.metrics.record_search_superseded();
                tracing::debug!("dropping superseded evaluation (generation {})", generation);
                return;
            }

            match outcome {
                Ok(results) => {
                    tracing::debug!("query matched {} airports", results.len());
                    shared.aggregator.finish_search(results);
                }
                Err(err) => {
                    shared.aggregator.record_error(ErrorKind::Search, err.to_string());
                }
            }
        });
    }

    async fn evaluate(
        text: &str,
        shared: &PipelineShared,
    ) -> Result<Vec<AirportRecord>, EvaluationError> {
        let airports =
            Self::loaded_airports(&shared.aggregator, shared.directory.as_ref()).await?;
        Ok(services::match_airports(text, &airports))
    }

    /// The loaded directory, falling back to a fresh read when the one-time
    /// load has not completed (startup race) or failed.
    async fn loaded_airports(
        aggregator: &StateAggregator,
        directory: &dyn AirportDirectory,
    ) -> Result<Vec<AirportRecord>, StorageError> {
        let airports = aggregator.read(|s| s.all_airports.clone());
        if airports.is_empty() {
            directory.load_all().await
        } else {
            Ok(airports)
        }
    }

    /// Observe the favorite store's live stream
    ///
    /// Applies the current set on subscribe (replay-latest), then applies
    /// every subsequent delivery in order. Only touches the favorites field.
    async fn observe_favorites(
        mut favorites_rx: watch::Receiver<IndexSet<FavoritePair>>,
        mut shutdown_rx: watch::Receiver<bool>,
        aggregator: Arc<StateAggregator>,
    ) {
        tracing::debug!("favorites observation task started");

        loop {
            let favorites = favorites_rx.borrow_and_update().clone();
            aggregator.set_favorites(favorites);

            tokio::select! {
                _ = shutdown_rx.changed() => break,
                changed = favorites_rx.changed() => {
                    if changed.is_err() {
                        tracing::debug!("favorite store stream closed");
                        break;
                    }
                }
            }
        }

        tracing::debug!("favorites observation task terminated");
    }

    /// One-shot full directory load
    ///
    /// Only touches `all_airports`; on failure the directory stays empty
    /// and the error is surfaced.
    async fn load_directory(
        directory: Arc<dyn AirportDirectory>,
        aggregator: Arc<StateAggregator>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        tokio::select! {
            _ = shutdown_rx.changed() => {}
            result = directory.load_all() => match result {
                Ok(airports) => {
                    tracing::info!("airport directory loaded: {} records", airports.len());
                    aggregator.set_all_airports(airports);
                }
                Err(err) => {
                    aggregator.record_error(
                        ErrorKind::Directory,
                        format!("could not load airport directory: {err}"),
                    );
                }
            }
        }
    }
}
