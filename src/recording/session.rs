use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::units::UnitSystem;

/// Snapshot of one sample taken while recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RecordedSample {
    pub timestamp: DateTime<Utc>,
    pub speed_mps: f64,
    pub speed_display: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_m: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RecordingSession {
    pub id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    /// Unit in effect when the session was sealed.
    pub unit: UnitSystem,
    pub samples: Vec<RecordedSample>,
    pub max_speed_mps: f64,
    pub average_speed_mps: f64,
}

/// Listing view of a session without its samples.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SessionSummary {
    pub id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub unit: UnitSystem,
    pub sample_count: usize,
    pub duration_seconds: f64,
    pub max_speed: f64,
    pub average_speed: f64,
    pub speed_unit: String,
}

impl RecordingSession {
    pub fn open(start_time: DateTime<Utc>, unit: UnitSystem) -> Self {
        Self {
            id: generate_id(start_time),
            start_time,
            end_time: None,
            unit,
            samples: Vec::new(),
            max_speed_mps: 0.0,
            average_speed_mps: 0.0,
        }
    }

    pub fn is_sealed(&self) -> bool {
        self.end_time.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub(super) fn push(&mut self, sample: RecordedSample) {
        self.samples.push(sample);
    }

    pub(super) fn seal(&mut self, end_time: DateTime<Utc>, unit: UnitSystem) {
        self.end_time = Some(end_time);
        self.unit = unit;
        for sample in &mut self.samples {
            sample.speed_display = unit.to_display_speed(sample.speed_mps);
        }
        self.max_speed_mps = self
            .samples
            .iter()
            .map(|s| s.speed_mps)
            .fold(0.0, f64::max);
        self.average_speed_mps = if self.samples.is_empty() {
            0.0
        } else {
            self.samples.iter().map(|s| s.speed_mps).sum::<f64>() / self.samples.len() as f64
        };
    }

    pub fn duration_seconds(&self) -> f64 {
        self.end_time
            .map(|end| (end - self.start_time).num_milliseconds().max(0) as f64 / 1000.0)
            .unwrap_or(0.0)
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id.clone(),
            start_time: self.start_time,
            end_time: self.end_time,
            unit: self.unit,
            sample_count: self.samples.len(),
            duration_seconds: self.duration_seconds(),
            max_speed: self.unit.to_display_speed(self.max_speed_mps),
            average_speed: self.unit.to_display_speed(self.average_speed_mps),
            speed_unit: self.unit.speed_label().to_string(),
        }
    }
}

fn generate_id(start: DateTime<Utc>) -> String {
    let uuid = uuid::Uuid::new_v4();
    let timestamp = start.format("%Y%m%dT%H%M%SZ");
    format!("{}_{}", timestamp, uuid)
}
