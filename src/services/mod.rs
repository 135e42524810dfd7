//! Services module - Pure business logic for search and favorites.
//!
//! The services are **framework-agnostic** and have no dependencies on the
//! UI layer, making them testable and reusable.
//!
//! # Components
//!
//! - [`matching`]: the result engine. Case-insensitive containment matching
//!   over the loaded directory and destination-list derivation for a chosen
//!   departure. Pure functions: they cannot fail on well-formed input and
//!   preserve directory load order (there is no relevance ranking).
//!
//! - [`favorites`]: the toggle protocol. [`decide_toggle`] picks insert or
//!   delete against a snapshot of the favorites set; [`FavoriteToggler`]
//!   executes the decision against the store. The authoritative favorites
//!   state is only ever observed through the store's live stream, never
//!   from the toggle call itself.
//!
//! # Design Philosophy
//!
//! - **Pure decision logic**: everything that can be a pure function is one
//! - **Async edges only**: the sole `await` points are store mutations
//! - **Testable**: no hidden dependencies, all inputs are explicit parameters

pub mod favorites;
pub mod matching;

pub use favorites::{FavoriteToggler, ToggleAction, decide_toggle};
pub use matching::{destinations_for, match_airports};
