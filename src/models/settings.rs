use serde::{Deserialize, Serialize};

fn default_database_file() -> String {
    "flightsearch.db".to_string()
}

fn default_preferences_file() -> String {
    "preferences.yaml".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_debounce_ms() -> u64 {
    300
}

/// User-tunable settings from `flightsearch.yaml`.
///
/// All fields have defaults so a missing or partial file still yields a
/// working configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// SQLite database holding the airport directory and favorites.
    #[serde(default = "default_database_file")]
    pub database_file: String,

    /// YAML slot file holding the last search query.
    #[serde(default = "default_preferences_file")]
    pub preferences_file: String,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    /// Quiet window between the last keystroke and search evaluation.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    #[serde(default)]
    pub debug_logging: bool,

    #[serde(default)]
    pub console_logging: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_file: default_database_file(),
            preferences_file: default_preferences_file(),
            log_dir: default_log_dir(),
            debounce_ms: default_debounce_ms(),
            debug_logging: false,
            console_logging: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.database_file, "flightsearch.db");
        assert_eq!(settings.debounce_ms, 300);
        assert!(!settings.debug_logging);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let settings: Settings = serde_yaml_ng::from_str("debounce_ms: 150\n").unwrap();
        assert_eq!(settings.debounce_ms, 150);
        assert_eq!(settings.preferences_file, "preferences.yaml");
        assert_eq!(settings.log_dir, "logs");
    }

    #[test]
    fn test_round_trip() {
        let settings = Settings {
            database_file: "custom.db".to_string(),
            ..Settings::default()
        };
        let yaml = serde_yaml_ng::to_string(&settings).unwrap();
        let parsed: Settings = serde_yaml_ng::from_str(&yaml).unwrap();
        assert_eq!(parsed.database_file, "custom.db");
    }
}
