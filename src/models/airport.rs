use serde::{Deserialize, Serialize};

/// A single airport from the local directory.
///
/// Records are loaded once from storage and never modified afterwards.
/// `iata_code` is the natural key used for matching and favorites; `id` is
/// the stable storage identity used to exclude the selected departure from
/// the destination list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirportRecord {
    pub id: i64,
    pub iata_code: String,
    pub name: String,
    pub passenger_count: i64,
}

impl AirportRecord {
    /// Display label used by frontends: "OPO - Francisco Sá Carneiro Airport".
    pub fn label(&self) -> String {
        format!("{} - {}", self.iata_code, self.name)
    }
}

/// A favorite departure/destination route.
///
/// The code pair is the identity; the stores never hold duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FavoritePair {
    pub departure_code: String,
    pub destination_code: String,
}

impl FavoritePair {
    pub fn new(departure_code: impl Into<String>, destination_code: impl Into<String>) -> Self {
        Self {
            departure_code: departure_code.into(),
            destination_code: destination_code.into(),
        }
    }
}
