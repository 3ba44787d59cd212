use std::io::BufRead;
use std::sync::Arc;
use thiserror::Error;

use crate::clock::{Clock, ManualClock};
use crate::recording::RecordingSession;
use crate::settings::Settings;
use crate::source::{ManualSource, PositionEvent, SourceEvent};
use crate::storage::RecordingStore;
use crate::tracking::{
    DisplayMetrics, LogPresenter, PositionSample, TrackingConfig, TrackingController,
    TrackingError,
};
use crate::units::UnitSystem;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("tracking error: {0}")]
    Tracking(#[from] TrackingError),
}

#[derive(Debug, Clone)]
pub struct ReplayOptions {
    pub unit: UnitSystem,
    pub record: bool,
    /// Persist the recording to the store passed to `replay`.
    pub save: bool,
    pub tracking: TrackingConfig,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            unit: UnitSystem::default(),
            record: false,
            save: false,
            tracking: TrackingConfig::default(),
        }
    }
}

#[derive(Debug)]
pub struct ReplayReport {
    pub samples: usize,
    pub metrics: DisplayMetrics,
    pub recording: Option<RecordingSession>,
}

/// One JSON sample per line. Blank lines are ignored; malformed ones are
/// logged and skipped. Returns the samples and the number skipped.
pub fn read_samples<R: BufRead>(reader: R) -> Result<(Vec<PositionSample>, usize), ReplayError> {
    let mut samples = Vec::new();
    let mut skipped = 0;

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<PositionSample>(line) {
            Ok(sample) => samples.push(sample),
            Err(e) => {
                log::warn!("Skipping line {}: {}", index + 1, e);
                skipped += 1;
            }
        }
    }

    Ok((samples, skipped))
}

/// Runs the samples through a fresh controller on a clock driven by the
/// sample timestamps, then stops tracking.
pub fn replay(
    samples: &[PositionSample],
    options: &ReplayOptions,
    recordings: RecordingStore,
) -> Result<ReplayReport, ReplayError> {
    let start = samples
        .first()
        .map(|s| s.timestamp)
        .unwrap_or_else(chrono::Utc::now);
    let clock = ManualClock::new(start);
    let settings = Settings {
        unit: options.unit,
        auto_save: options.save,
        ..Settings::default()
    };

    let mut controller = TrackingController::new(&options.tracking, settings, recordings)
        .with_source(Box::new(ManualSource::new()))
        .with_clock(Arc::new(clock.clone()));
    controller.add_presenter(Box::new(LogPresenter));

    controller.start()?;
    if options.record {
        controller.start_recording()?;
    }

    let Some(subscription) = controller.subscription() else {
        return Err(TrackingError::UnsupportedCapability.into());
    };

    for sample in samples {
        if sample.timestamp > clock.now() {
            clock.set(sample.timestamp);
        }
        controller.dispatch(SourceEvent {
            subscription,
            event: PositionEvent::Sample(sample.clone()),
        });
    }

    let recording = controller.stop();
    Ok(ReplayReport {
        samples: samples.len(),
        metrics: controller.display_metrics(),
        recording,
    })
}
