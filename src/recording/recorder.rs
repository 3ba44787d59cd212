use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::error::RecordingError;
use super::session::{RecordedSample, RecordingSession};
use crate::tracking::PositionSample;
use crate::units::UnitSystem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RecorderState {
    Idle,
    Recording,
}

/// Idle -> Recording -> Idle. Stopping seals the open session and hands it
/// back to the caller.
#[derive(Debug, Default)]
pub struct SessionRecorder {
    current: Option<RecordingSession>,
}

impl SessionRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RecorderState {
        match self.current {
            Some(_) => RecorderState::Recording,
            None => RecorderState::Idle,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.current.is_some()
    }

    pub fn current(&self) -> Option<&RecordingSession> {
        self.current.as_ref()
    }

    pub fn start(
        &mut self,
        tracking_active: bool,
        now: DateTime<Utc>,
        unit: UnitSystem,
    ) -> Result<(), RecordingError> {
        if !tracking_active {
            return Err(RecordingError::TrackingInactive);
        }
        if self.current.is_some() {
            return Err(RecordingError::AlreadyRecording);
        }

        let session = RecordingSession::open(now, unit);
        log::info!("Recording {} started", session.id);
        self.current = Some(session);
        Ok(())
    }

    pub fn on_sample(&mut self, sample: &PositionSample, speed_mps: f64, unit: UnitSystem) {
        let Some(session) = self.current.as_mut() else {
            return;
        };
        session.push(RecordedSample {
            timestamp: sample.timestamp,
            speed_mps,
            speed_display: unit.to_display_speed(speed_mps),
            latitude: sample.latitude,
            longitude: sample.longitude,
            accuracy_m: sample.accuracy_m,
        });
    }

    pub fn stop(&mut self, now: DateTime<Utc>, unit: UnitSystem) -> Option<RecordingSession> {
        let mut session = self.current.take()?;
        session.seal(now, unit);
        log::info!(
            "Recording {} sealed with {} samples",
            session.id,
            session.samples.len()
        );
        Some(session)
    }
}
