use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::sync::Arc;

use super::error::StorageError;
use super::kv::KeyValueStore;
use crate::settings::Settings;

pub const SETTINGS_KEY: &str = "settings";

#[derive(Clone)]
pub struct SettingsStore {
    kv: Arc<dyn KeyValueStore>,
}

impl SettingsStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Never fails: a missing, unreadable or malformed blob yields defaults.
    pub fn load(&self) -> Settings {
        match self.kv.get(SETTINGS_KEY) {
            Ok(Some(blob)) => parse_settings(&blob),
            Ok(None) => Settings::default(),
            Err(e) => {
                log::warn!("Failed to read settings, using defaults: {}", e);
                Settings::default()
            }
        }
    }

    pub fn save(&self, settings: &Settings) -> Result<(), StorageError> {
        let blob = serde_json::to_string(settings)?;
        self.kv.set(SETTINGS_KEY, &blob)
    }
}

/// Field-by-field parse: one bad field does not discard the others.
pub fn parse_settings(blob: &str) -> Settings {
    let map = match serde_json::from_str::<Value>(blob) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            log::warn!("Stored settings are not an object, using defaults");
            return Settings::default();
        }
        Err(e) => {
            log::warn!("Stored settings are malformed, using defaults: {}", e);
            return Settings::default();
        }
    };

    let defaults = Settings::default();
    Settings {
        update_interval_ms: field(&map, "update_interval_ms")
            .unwrap_or(defaults.update_interval_ms),
        chart_duration_seconds: field(&map, "chart_duration_seconds")
            .unwrap_or(defaults.chart_duration_seconds),
        high_accuracy: field(&map, "high_accuracy").unwrap_or(defaults.high_accuracy),
        auto_save: field(&map, "auto_save").unwrap_or(defaults.auto_save),
        dark_mode: field(&map, "dark_mode").unwrap_or(defaults.dark_mode),
        unit: field(&map, "unit").unwrap_or(defaults.unit),
    }
    .validated()
}

fn field<T: DeserializeOwned>(map: &Map<String, Value>, key: &str) -> Option<T> {
    let value = map.get(key)?;
    match serde_json::from_value(value.clone()) {
        Ok(v) => Some(v),
        Err(_) => {
            log::warn!("Ignoring malformed setting {}: {}", key, value);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::units::UnitSystem;

    #[test]
    fn test_missing_settings_are_defaults() {
        let store = SettingsStore::new(Arc::new(MemoryStore::new()));
        assert_eq!(store.load(), Settings::default());
    }

    #[test]
    fn test_round_trip() {
        let store = SettingsStore::new(Arc::new(MemoryStore::new()));
        let settings = Settings {
            update_interval_ms: 500,
            unit: UnitSystem::Metric,
            dark_mode: true,
            ..Settings::default()
        };
        store.save(&settings).unwrap();
        assert_eq!(store.load(), settings);
    }

    #[test]
    fn test_garbage_falls_back_to_defaults() {
        assert_eq!(parse_settings("definitely not json"), Settings::default());
        assert_eq!(parse_settings("[1, 2, 3]"), Settings::default());
        assert_eq!(parse_settings("null"), Settings::default());
    }

    #[test]
    fn test_bad_fields_fall_back_individually() {
        let settings = parse_settings(
            r#"{"update_interval_ms":"fast","chart_duration_seconds":120,"auto_save":false,"unit":"furlongs","dark_mode":true}"#,
        );
        assert_eq!(settings.update_interval_ms, 1_000);
        assert_eq!(settings.chart_duration_seconds, 120);
        assert!(!settings.auto_save);
        assert!(settings.dark_mode);
        assert_eq!(settings.unit, UnitSystem::Imperial);
    }

    #[test]
    fn test_out_of_range_fields_fall_back() {
        let settings = parse_settings(r#"{"update_interval_ms":1,"chart_duration_seconds":-5}"#);
        assert_eq!(settings.update_interval_ms, 1_000);
        assert_eq!(settings.chart_duration_seconds, 60);
    }
}
