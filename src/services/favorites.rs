//! Favorite-route toggling.
//!
//! The toggle protocol is deliberately asymmetric: the insert/delete
//! decision is made against a snapshot of the favorites set, but the
//! authoritative state only ever comes back through the store's live
//! stream. The UI makes no optimistic change, so a rejected or failed write
//! simply never becomes visible.

use crate::models::{AirportRecord, FavoritePair};
use crate::storage::{FavoriteStore, StorageError};
use indexmap::IndexSet;
use std::sync::Arc;

/// Outcome decided for a toggle request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleAction {
    /// The pair was absent from the snapshot; issue an insert.
    Add(FavoritePair),
    /// The pair was present; issue a delete.
    Remove(FavoritePair),
}

/// Decide what a toggle request should do against the given favorites set.
///
/// Returns `None` when no departure is selected: a destination cannot be
/// favorited on its own.
pub fn decide_toggle(
    departure: Option<&AirportRecord>,
    destination: &AirportRecord,
    favorites: &IndexSet<FavoritePair>,
) -> Option<ToggleAction> {
    let departure = departure?;
    let pair = FavoritePair::new(&departure.iata_code, &destination.iata_code);
    if favorites.contains(&pair) {
        Some(ToggleAction::Remove(pair))
    } else {
        Some(ToggleAction::Add(pair))
    }
}

/// Executes toggle decisions against the favorite store.
///
/// The store's insert and delete are idempotent, so a repeated toggle that
/// races an in-flight mutation settles to at most one observable change per
/// pair per cycle.
pub struct FavoriteToggler {
    store: Arc<dyn FavoriteStore>,
}

impl FavoriteToggler {
    pub fn new(store: Arc<dyn FavoriteStore>) -> Self {
        Self { store }
    }

    /// Apply a toggle request decided against `favorites`.
    ///
    /// Returns the action that was issued, or `None` for the no-op case.
    /// The caller learns about the new favorites set from the store's live
    /// stream, never from this return value.
    pub async fn toggle(
        &self,
        departure: Option<&AirportRecord>,
        destination: &AirportRecord,
        favorites: &IndexSet<FavoritePair>,
    ) -> Result<Option<ToggleAction>, StorageError> {
        let Some(action) = decide_toggle(departure, destination, favorites) else {
            tracing::debug!("toggle ignored: no departure selected");
            return Ok(None);
        };

        match &action {
            ToggleAction::Add(pair) => {
                tracing::info!(
                    "favoriting route {} -> {}",
                    pair.departure_code,
                    pair.destination_code
                );
                self.store.insert(pair).await?;
            }
            ToggleAction::Remove(pair) => {
                tracing::info!(
                    "unfavoriting route {} -> {}",
                    pair.departure_code,
                    pair.destination_code
                );
                self.store.delete(pair).await?;
            }
        }

        Ok(Some(action))
    }
}
