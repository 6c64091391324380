use serde::{Deserialize, Serialize};

/// Persisted options, merged over defaults at startup.
///
/// Immutable per run except for the cache fields, which the resolver
/// writes back through the settings store after a successful remote
/// lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Identifier the target field is expected to carry (name, id, or
    /// test id attribute).
    pub field_id: String,
    /// Label text associated with the target field, matched as a
    /// case-insensitive substring.
    pub field_label: String,
    /// Manual override; always wins and is never cached.
    pub manual_username: String,
    pub debug: bool,
    /// Retry attempts after the initial pass of a cascade.
    pub tries: u32,
    pub interval_ms: u64,
    pub cached_username: String,
    /// Milliseconds since the epoch of the last successful remote lookup.
    /// Stored for diagnostics; no expiry check is applied.
    pub cached_at: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            field_id: "customfield_12345".to_string(),
            field_label: "AD Username".to_string(),
            manual_username: String::new(),
            debug: false,
            tries: 40,
            interval_ms: 700,
            cached_username: String::new(),
            cached_at: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_shipped_options() {
        let settings = Settings::default();
        assert_eq!(settings.field_id, "customfield_12345");
        assert_eq!(settings.field_label, "AD Username");
        assert_eq!(settings.tries, 40);
        assert_eq!(settings.interval_ms, 700);
        assert!(!settings.debug);
        assert!(settings.manual_username.is_empty());
        assert!(settings.cached_username.is_empty());
        assert_eq!(settings.cached_at, 0);
    }

    #[test]
    fn partial_file_merges_over_defaults() {
        let settings: Settings =
            serde_yaml::from_str("field_label: Employee ID\ntries: 3\n").unwrap();
        assert_eq!(settings.field_label, "Employee ID");
        assert_eq!(settings.tries, 3);
        assert_eq!(settings.field_id, "customfield_12345");
        assert_eq!(settings.interval_ms, 700);
    }
}
