use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use utoipa::ToSchema;

use crate::source::WatchOptions;
use crate::units::UnitSystem;

pub const UPDATE_INTERVAL_RANGE_MS: RangeInclusive<u64> = 100..=10_000;
pub const CHART_DURATION_RANGE_S: RangeInclusive<u64> = 10..=3_600;

/// User preferences persisted in the key-value store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct Settings {
    pub update_interval_ms: u64,
    pub chart_duration_seconds: u64,
    pub high_accuracy: bool,
    pub auto_save: bool,
    pub dark_mode: bool,
    pub unit: UnitSystem,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            update_interval_ms: 1_000,
            chart_duration_seconds: 60,
            high_accuracy: true,
            auto_save: true,
            dark_mode: false,
            unit: UnitSystem::default(),
        }
    }
}

impl Settings {
    /// Out-of-range values are replaced with their defaults.
    pub fn validated(self) -> Self {
        let defaults = Settings::default();
        Self {
            update_interval_ms: if UPDATE_INTERVAL_RANGE_MS.contains(&self.update_interval_ms) {
                self.update_interval_ms
            } else {
                defaults.update_interval_ms
            },
            chart_duration_seconds: if CHART_DURATION_RANGE_S
                .contains(&self.chart_duration_seconds)
            {
                self.chart_duration_seconds
            } else {
                defaults.chart_duration_seconds
            },
            ..self
        }
    }

    pub fn watch_options(&self) -> WatchOptions {
        WatchOptions {
            high_accuracy: self.high_accuracy,
            interval_ms: self.update_interval_ms,
            ..WatchOptions::default()
        }
    }
}
