use chrono::{DateTime, Utc};
use std::sync::Arc;

use super::error::TrackingError;
use super::filter::SampleFilter;
use super::history::{duration_capacity, HistoryBuffer};
use super::metrics::{DisplayMetrics, MetricsAccumulator, SessionMetrics};
use super::presenter::Presenter;
use super::types::{Coordinate, PositionSample, TrackingConfig, TrackingState};
use crate::clock::{Clock, SystemClock};
use crate::recording::{RecordingSession, SessionRecorder};
use crate::settings::Settings;
use crate::source::{
    PositionError, PositionErrorCode, PositionEvent, PositionSource, SourceEvent, SubscriptionId,
};
use crate::storage::RecordingStore;
use crate::units::UnitSystem;

/// Owns all tracking state and routes each sample through
/// filter -> accumulator -> history -> recorder, in that order.
///
/// Calls are expected one at a time; callers sharing a controller across
/// tasks wrap it in a mutex so each sample is processed to completion before
/// the next one starts.
pub struct TrackingController {
    settings: Settings,
    unit: UnitSystem,
    clock: Arc<dyn Clock>,
    source: Option<Box<dyn PositionSource>>,
    subscription: Option<SubscriptionId>,
    filter: SampleFilter,
    metrics: MetricsAccumulator,
    history: HistoryBuffer,
    timeline: HistoryBuffer,
    recorder: SessionRecorder,
    recordings: RecordingStore,
    presenters: Vec<Box<dyn Presenter>>,
    is_tracking: bool,
    last_position: Option<Coordinate>,
    start_time: Option<DateTime<Utc>>,
    stopped_at: Option<DateTime<Utc>>,
    last_error: Option<PositionError>,
}

impl TrackingController {
    pub fn new(config: &TrackingConfig, settings: Settings, recordings: RecordingStore) -> Self {
        let settings = settings.validated();
        let unit = settings.unit;
        Self {
            filter: SampleFilter::new(config.noise_threshold_mps),
            metrics: MetricsAccumulator::new(config.min_movement_m),
            history: HistoryBuffer::new(config.history_capacity, unit),
            timeline: HistoryBuffer::for_duration(
                settings.chart_duration_seconds,
                settings.update_interval_ms,
                unit,
            ),
            settings,
            unit,
            clock: Arc::new(SystemClock),
            source: None,
            subscription: None,
            recorder: SessionRecorder::new(),
            recordings,
            presenters: Vec::new(),
            is_tracking: false,
            last_position: None,
            start_time: None,
            stopped_at: None,
            last_error: None,
        }
    }

    pub fn with_source(mut self, source: Box<dyn PositionSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn add_presenter(&mut self, presenter: Box<dyn Presenter>) {
        self.presenters.push(presenter);
    }

    pub fn state(&self) -> TrackingState {
        TrackingState {
            is_tracking: self.is_tracking,
            is_recording: self.recorder.is_recording(),
            last_position: self.last_position,
            start_time: self.start_time,
        }
    }

    pub fn is_tracking(&self) -> bool {
        self.is_tracking
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_recording()
    }

    pub fn unit(&self) -> UnitSystem {
        self.unit
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn subscription(&self) -> Option<SubscriptionId> {
        self.subscription
    }

    pub fn last_error(&self) -> Option<&PositionError> {
        self.last_error.as_ref()
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    pub fn timeline(&self) -> &HistoryBuffer {
        &self.timeline
    }

    pub fn recording(&self) -> Option<&RecordingSession> {
        self.recorder.current()
    }

    pub fn recordings(&self) -> &RecordingStore {
        &self.recordings
    }

    pub fn metrics(&self) -> SessionMetrics {
        let now = self.stopped_at.unwrap_or_else(|| self.clock.now());
        self.metrics.snapshot(now)
    }

    pub fn display_metrics(&self) -> DisplayMetrics {
        self.metrics().to_display(self.unit)
    }

    /// Starts a fresh tracking session. Starting while already tracking
    /// cancels the current watch first.
    pub fn start(&mut self) -> Result<(), TrackingError> {
        if self.source.is_none() {
            return Err(TrackingError::UnsupportedCapability);
        }
        if self.is_tracking {
            log::info!("Tracking already active, restarting");
            self.stop();
        }

        let now = self.clock.now();
        let options = self.settings.watch_options();
        let subscription = match self.source.as_mut() {
            Some(source) => source.subscribe(&options),
            None => return Err(TrackingError::UnsupportedCapability),
        };

        self.metrics.reset(now);
        self.history.clear();
        self.timeline.clear();
        self.last_position = None;
        self.last_error = None;
        self.start_time = Some(now);
        self.stopped_at = None;
        self.subscription = Some(subscription);
        self.is_tracking = true;

        log::info!("Tracking started ({:?})", subscription);
        self.notify_state();
        self.notify_metrics();
        Ok(())
    }

    /// Cancels the watch and seals any open recording, which is returned.
    pub fn stop(&mut self) -> Option<RecordingSession> {
        if !self.is_tracking {
            return None;
        }

        if let (Some(source), Some(subscription)) = (self.source.as_mut(), self.subscription.take())
        {
            source.cancel(subscription);
        }
        self.is_tracking = false;
        let sealed = self.finish_recording();
        self.stopped_at = Some(self.clock.now());

        log::info!("Tracking stopped");
        self.notify_state();
        sealed
    }

    /// Entry point for events coming off a source channel.
    pub fn dispatch(&mut self, event: SourceEvent) {
        if self.subscription != Some(event.subscription) {
            log::debug!(
                "Dropping event from inactive subscription {:?}",
                event.subscription
            );
            return;
        }
        match event.event {
            PositionEvent::Sample(sample) => self.on_position_sample(sample),
            PositionEvent::Error(error) => self.on_position_error(error),
        }
    }

    pub fn on_position_sample(&mut self, sample: PositionSample) {
        if !self.is_tracking {
            log::debug!("Ignoring sample delivered after stop");
            return;
        }

        let speed = match self.filter.filter(&sample) {
            Ok(speed) => speed,
            Err(rejection) => {
                log::debug!("Rejected sample at {}: {}", sample.timestamp, rejection);
                return;
            }
        };

        let position = sample.coordinate();
        self.metrics.on_sample(speed, position);
        self.last_position = Some(position);

        let label = sample.timestamp.format("%H:%M:%S").to_string();
        self.history.push(speed, label.clone());
        self.timeline.push(speed, label);

        self.recorder.on_sample(&sample, speed, self.unit);

        self.notify_metrics();
        self.notify_chart();
    }

    /// A permission denial ends tracking. Every other error is kept as
    /// `last_error` and tracking continues.
    pub fn on_position_error(&mut self, error: PositionError) {
        if !self.is_tracking {
            return;
        }

        for presenter in &mut self.presenters {
            presenter.position_error(&error);
        }

        let code = error.code;
        self.last_error = Some(error);
        if code == PositionErrorCode::PermissionDenied {
            log::warn!("Position permission denied, stopping tracking");
            self.stop();
        }
    }

    /// Returns false when `unit` is already active; nothing is touched then.
    pub fn switch_unit(&mut self, unit: UnitSystem) -> bool {
        if unit == self.unit {
            return false;
        }

        let old = self.unit;
        self.unit = unit;
        self.settings.unit = unit;
        self.history.rebase(old, unit);
        self.timeline.rebase(old, unit);

        log::info!("Display unit switched from {} to {}", old, unit);
        self.notify_metrics();
        self.notify_chart();
        true
    }

    pub fn start_recording(&mut self) -> Result<(), TrackingError> {
        let now = self.clock.now();
        self.recorder.start(self.is_tracking, now, self.unit)?;
        self.notify_state();
        Ok(())
    }

    pub fn stop_recording(&mut self) -> Option<RecordingSession> {
        let sealed = self.finish_recording();
        if sealed.is_some() {
            self.notify_state();
        }
        sealed
    }

    /// New watch options apply from the next `start`.
    pub fn apply_settings(&mut self, settings: Settings) {
        let settings = settings.validated();
        self.timeline.set_capacity(duration_capacity(
            settings.chart_duration_seconds,
            settings.update_interval_ms,
        ));
        let unit = settings.unit;
        self.settings = Settings {
            unit: self.unit,
            ..settings
        };
        self.switch_unit(unit);
    }

    fn finish_recording(&mut self) -> Option<RecordingSession> {
        let session = self.recorder.stop(self.clock.now(), self.unit)?;

        if session.is_empty() {
            log::info!("Discarding empty recording {}", session.id);
        } else if self.settings.auto_save {
            if let Err(e) = self.recordings.save(&session) {
                log::error!("Failed to persist recording {}: {}", session.id, e);
            }
        }
        Some(session)
    }

    fn notify_state(&mut self) {
        let state = self.state();
        for presenter in &mut self.presenters {
            presenter.tracking_changed(&state);
        }
    }

    fn notify_metrics(&mut self) {
        let metrics = self.display_metrics();
        for presenter in &mut self.presenters {
            presenter.metrics_updated(&metrics);
        }
    }

    fn notify_chart(&mut self) {
        let series = self.history.series();
        for presenter in &mut self.presenters {
            presenter.chart_updated(&series);
        }
    }
}
