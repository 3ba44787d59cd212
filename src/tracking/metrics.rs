use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use utoipa::ToSchema;

use super::types::Coordinate;
use crate::units::UnitSystem;

pub const DEFAULT_MIN_MOVEMENT_M: f64 = 5.0;

/// Running aggregates in canonical units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct SessionMetrics {
    pub current_speed_mps: f64,
    pub max_speed_mps: f64,
    pub average_speed_mps: f64,
    pub total_distance_m: f64,
    pub elapsed_seconds: f64,
}

/// Metrics converted for display.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DisplayMetrics {
    pub unit: UnitSystem,
    pub speed_unit: String,
    pub distance_unit: String,
    pub current_speed: f64,
    pub max_speed: f64,
    pub average_speed: f64,
    pub total_distance: f64,
    pub elapsed_seconds: f64,
    pub elapsed: String,
}

impl SessionMetrics {
    pub fn to_display(&self, unit: UnitSystem) -> DisplayMetrics {
        let whole_seconds = Duration::from_secs(self.elapsed_seconds.max(0.0) as u64);
        DisplayMetrics {
            unit,
            speed_unit: unit.speed_label().to_string(),
            distance_unit: unit.distance_label().to_string(),
            current_speed: unit.to_display_speed(self.current_speed_mps),
            max_speed: unit.to_display_speed(self.max_speed_mps),
            average_speed: unit.to_display_speed(self.average_speed_mps),
            total_distance: unit.to_display_distance(self.total_distance_m),
            elapsed_seconds: self.elapsed_seconds,
            elapsed: humantime::format_duration(whole_seconds).to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MetricsAccumulator {
    min_movement_m: f64,
    current_speed: f64,
    max_speed: f64,
    total_distance: f64,
    speed_sum: f64,
    speed_count: u64,
    last_position: Option<Coordinate>,
    started_at: Option<DateTime<Utc>>,
}

impl Default for MetricsAccumulator {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_MOVEMENT_M)
    }
}

impl MetricsAccumulator {
    pub fn new(min_movement_m: f64) -> Self {
        Self {
            min_movement_m: min_movement_m.max(0.0),
            current_speed: 0.0,
            max_speed: 0.0,
            total_distance: 0.0,
            speed_sum: 0.0,
            speed_count: 0,
            last_position: None,
            started_at: None,
        }
    }

    /// Zeroes every aggregate and starts a new session clock.
    pub fn reset(&mut self, start: DateTime<Utc>) {
        *self = Self {
            started_at: Some(start),
            ..Self::new(self.min_movement_m)
        };
    }

    /// `speed` must already have been through the sample filter.
    pub fn on_sample(&mut self, speed: f64, position: Coordinate) {
        self.current_speed = speed;
        self.max_speed = self.max_speed.max(speed);
        self.speed_sum += speed;
        self.speed_count += 1;

        if let Some(previous) = self.last_position {
            let delta = previous.distance_to(&position);
            if delta > self.min_movement_m {
                self.total_distance += delta;
            }
        }
        // Always advance, so jitter is measured from the true prior fix.
        self.last_position = Some(position);
    }

    pub fn average(&self) -> f64 {
        if self.speed_count == 0 {
            0.0
        } else {
            self.speed_sum / self.speed_count as f64
        }
    }

    pub fn current_speed(&self) -> f64 {
        self.current_speed
    }

    pub fn max_speed(&self) -> f64 {
        self.max_speed
    }

    pub fn total_distance(&self) -> f64 {
        self.total_distance
    }

    pub fn sample_count(&self) -> u64 {
        self.speed_count
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        self.started_at
            .and_then(|start| (now - start).to_std().ok())
            .unwrap_or_default()
    }

    pub fn snapshot(&self, now: DateTime<Utc>) -> SessionMetrics {
        SessionMetrics {
            current_speed_mps: self.current_speed,
            max_speed_mps: self.max_speed,
            average_speed_mps: self.average(),
            total_distance_m: self.total_distance,
            elapsed_seconds: self.elapsed(now).as_secs_f64(),
        }
    }
}
