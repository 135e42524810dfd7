//! Storage module - the core's three external collaborators.
//!
//! The engine never talks to disk directly; it goes through the seams
//! defined here, injected at construction time:
//!
//! - [`AirportDirectory`]: read-only lookup of airport records
//! - [`FavoriteStore`]: mutable set of favorite route pairs, observable as a
//!   live stream of its current contents
//! - [`QueryPersistence`]: single string slot holding the last search query
//!
//! Live observation uses `tokio::sync::watch`: a new subscriber immediately
//! sees the latest full value, not history, which is exactly the
//! replayed-on-subscribe contract the aggregator relies on.
//!
//! Production implementations live in [`sqlite`] (directory + favorites in
//! one rusqlite database) and [`preferences`] (YAML slot file). Tests mock
//! the traits directly.

pub mod preferences;
pub mod sqlite;

use crate::models::{AirportRecord, FavoritePair};
use async_trait::async_trait;
use indexmap::IndexSet;
use thiserror::Error;
use tokio::sync::watch;

pub use preferences::YamlQueryPersistence;
pub use sqlite::SqliteFlightStore;

/// Errors surfaced by any storage collaborator.
///
/// There is no retry policy: local offline storage either completes or
/// fails, and failures are surfaced to the UI, never masked.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("storage read failed: {0}")]
    Read(String),

    #[error("storage write failed: {0}")]
    Write(String),
}

impl StorageError {
    pub fn read(err: impl std::fmt::Display) -> Self {
        Self::Read(err.to_string())
    }

    pub fn write(err: impl std::fmt::Display) -> Self {
        Self::Write(err.to_string())
    }
}

/// Read-only lookup of airport records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AirportDirectory: Send + Sync {
    /// Every airport in storage, in load order.
    async fn load_all(&self) -> Result<Vec<AirportRecord>, StorageError>;

    /// Airports whose name or code contains `query`.
    ///
    /// Optional endpoint: the engine filters [`load_all`](Self::load_all)'s
    /// result in memory, but implementations expose the same matching
    /// semantics for callers that prefer to push the filter down.
    async fn search(&self, query: &str) -> Result<Vec<AirportRecord>, StorageError>;
}

/// Mutable, observable set of favorite route pairs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FavoriteStore: Send + Sync {
    /// Insert a pair. Idempotent: inserting an existing pair is a no-op.
    async fn insert(&self, pair: &FavoritePair) -> Result<(), StorageError>;

    /// Delete a pair. Idempotent: deleting an absent pair is a no-op.
    async fn delete(&self, pair: &FavoritePair) -> Result<(), StorageError>;

    /// Live stream of the current full set. New subscribers see the latest
    /// set immediately.
    fn observe(&self) -> watch::Receiver<IndexSet<FavoritePair>>;
}

/// Single string slot holding the last search query.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QueryPersistence: Send + Sync {
    /// Live stream of the current value; `""` when unset.
    fn observe(&self) -> watch::Receiver<String>;

    async fn save(&self, query: &str) -> Result<(), StorageError>;

    async fn clear(&self) -> Result<(), StorageError>;
}
