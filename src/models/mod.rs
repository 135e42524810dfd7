//! Data models for the flight search application.
//!
//! This module contains the core data structures used throughout the crate:
//! - [`AirportRecord`]: one airport from the local directory (immutable once loaded)
//! - [`FavoritePair`]: a favorite departure/destination route, identified by its code pair
//! - [`UiSnapshot`]: the single consistent view published to frontends
//! - [`Settings`]: user-tunable configuration loaded from `flightsearch.yaml`
//!
//! # Architecture Note
//!
//! The models are designed to be:
//! - **Serializable**: directory and settings structs derive `Serialize`/`Deserialize`
//! - **Cloneable**: the snapshot is wrapped in `RwLock<Arc<>>` by
//!   [`StateAggregator`](crate::state::StateAggregator) and swapped atomically
//! - **Immutable from the outside**: all snapshot updates go through the
//!   aggregator's field-scoped methods to keep the update sources from racing
//!   each other

pub mod airport;
pub mod settings;
pub mod snapshot;

pub use airport::{AirportRecord, FavoritePair};
pub use settings::Settings;
pub use snapshot::{ErrorInfo, ErrorKind, UiSnapshot};
