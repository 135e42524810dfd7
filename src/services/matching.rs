//! Airport matching for live search suggestions.
//!
//! Matching is deliberately simple: case-insensitive substring containment
//! on the airport name or IATA code, preserving directory load order. There
//! is no tokenization, no fuzzy matching and no relevance ranking.
//!
//! Blank queries never reach these functions; the query pipeline clears the
//! result list directly instead of evaluating them.

use crate::models::AirportRecord;

/// Airports whose name or IATA code contains `query`, case-insensitively.
///
/// The result is a stable subsequence of `airports`: original load order is
/// preserved and nothing is re-ranked.
pub fn match_airports(query: &str, airports: &[AirportRecord]) -> Vec<AirportRecord> {
    let needle = query.to_lowercase();
    airports
        .iter()
        .filter(|a| {
            a.name.to_lowercase().contains(&needle)
                || a.iata_code.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect()
}

/// Destination candidates for a chosen departure: every airport except the
/// departure itself (matched by id), in original load order.
pub fn destinations_for(selected: &AirportRecord, airports: &[AirportRecord]) -> Vec<AirportRecord> {
    airports
        .iter()
        .filter(|a| a.id != selected.id)
        .cloned()
        .collect()
}
