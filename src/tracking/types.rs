use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::filter::DEFAULT_NOISE_THRESHOLD_MPS;
use super::history::DEFAULT_HISTORY_CAPACITY;
use super::metrics::DEFAULT_MIN_MOVEMENT_M;
use crate::storage::DEFAULT_MAX_RECORDINGS;

/// A single fix from the position source. Speed and accuracy are optional
/// because not every receiver reports them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PositionSample {
    pub timestamp: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, alias = "speed")]
    pub speed_mps: Option<f64>,
    #[serde(default, alias = "accuracy")]
    pub accuracy_m: Option<f64>,
}

impl PositionSample {
    pub fn new(timestamp: DateTime<Utc>, latitude: f64, longitude: f64) -> Self {
        Self {
            timestamp,
            latitude,
            longitude,
            speed_mps: None,
            accuracy_m: None,
        }
    }

    pub fn with_speed(mut self, speed_mps: f64) -> Self {
        self.speed_mps = Some(speed_mps);
        self
    }

    pub fn with_accuracy(mut self, accuracy_m: f64) -> Self {
        self.accuracy_m = Some(accuracy_m);
        self
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn from_str_pair(coordinates: &str) -> Option<Self> {
        let parts: Vec<_> = coordinates.split(',').map(|s| s.trim()).collect();
        if parts.len() != 2 {
            return None;
        }
        let latitude = parts[0].parse().ok()?;
        let longitude = parts[1].parse().ok()?;
        Some(Self::new(latitude, longitude))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TrackingState {
    pub is_tracking: bool,
    pub is_recording: bool,
    pub last_position: Option<Coordinate>,
    pub start_time: Option<DateTime<Utc>>,
}

/// Engine thresholds, read from the `tracking` section of the service config.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TrackingConfig {
    #[serde(default = "default_noise_threshold")]
    pub noise_threshold_mps: f64,
    #[serde(default = "default_min_movement")]
    pub min_movement_m: f64,
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    #[serde(default = "default_max_recordings")]
    pub max_recordings: usize,
}

fn default_noise_threshold() -> f64 {
    DEFAULT_NOISE_THRESHOLD_MPS
}

fn default_min_movement() -> f64 {
    DEFAULT_MIN_MOVEMENT_M
}

fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}

fn default_max_recordings() -> usize {
    DEFAULT_MAX_RECORDINGS
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            noise_threshold_mps: default_noise_threshold(),
            min_movement_m: default_min_movement(),
            history_capacity: default_history_capacity(),
            max_recordings: default_max_recordings(),
        }
    }
}
