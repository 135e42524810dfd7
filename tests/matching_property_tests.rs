//! Property-based tests for the match engine
//!
//! For every query and directory: the result is exactly the subsequence of
//! airports whose name or code contains the query case-insensitively, in
//! the directory's original order.

use flightsearch::models::AirportRecord;
use flightsearch::services::{destinations_for, match_airports};
use proptest::prelude::*;

fn arb_directory() -> impl Strategy<Value = Vec<AirportRecord>> {
    prop::collection::vec(("[A-Z]{3}", "[A-Za-z ]{0,24}", 0i64..100_000_000), 0..24).prop_map(
        |rows| {
            // Ids are positional: distinct and stable like a real directory
            rows.into_iter()
                .enumerate()
                .map(|(i, (iata_code, name, passenger_count))| AirportRecord {
                    id: i as i64,
                    iata_code,
                    name,
                    passenger_count,
                })
                .collect()
        },
    )
}

fn matches(airport: &AirportRecord, query: &str) -> bool {
    let needle = query.to_lowercase();
    airport.name.to_lowercase().contains(&needle)
        || airport.iata_code.to_lowercase().contains(&needle)
}

proptest! {
    #[test]
    fn results_are_exactly_the_matching_subsequence(
        airports in arb_directory(),
        query in "[A-Za-z]{1,6}",
    ) {
        let results = match_airports(&query, &airports);

        // Every result matches the predicate
        for airport in &results {
            prop_assert!(matches(airport, &query));
        }

        // Every match is in the results, and order is the input order
        let expected: Vec<i64> = airports
            .iter()
            .filter(|a| matches(a, &query))
            .map(|a| a.id)
            .collect();
        let actual: Vec<i64> = results.iter().map(|a| a.id).collect();
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn matching_is_case_insensitive(
        airports in arb_directory(),
        query in "[A-Za-z]{1,6}",
    ) {
        let lower = match_airports(&query.to_lowercase(), &airports);
        let upper = match_airports(&query.to_uppercase(), &airports);
        prop_assert_eq!(lower, upper);
    }

    #[test]
    fn destinations_are_everything_but_the_selection(
        airports in arb_directory().prop_filter("need at least one airport", |a| !a.is_empty()),
        index in any::<prop::sample::Index>(),
    ) {
        let selected = airports[index.index(airports.len())].clone();
        let destinations = destinations_for(&selected, &airports);

        prop_assert_eq!(destinations.len(), airports.len() - 1);
        prop_assert!(destinations.iter().all(|a| a.id != selected.id));

        // Original order is preserved
        let expected: Vec<i64> = airports
            .iter()
            .filter(|a| a.id != selected.id)
            .map(|a| a.id)
            .collect();
        let actual: Vec<i64> = destinations.iter().map(|a| a.id).collect();
        prop_assert_eq!(actual, expected);
    }
}
