use super::history::ChartSeries;
use super::metrics::DisplayMetrics;
use super::types::TrackingState;
use crate::source::PositionError;

/// Receives updates from the controller. The controller writes to
/// presenters but never reads from them.
pub trait Presenter: Send {
    fn metrics_updated(&mut self, _metrics: &DisplayMetrics) {}
    /// Replace-all update of the live chart.
    fn chart_updated(&mut self, _series: &ChartSeries) {}
    fn position_error(&mut self, _error: &PositionError) {}
    fn tracking_changed(&mut self, _state: &TrackingState) {}
}

pub struct LogPresenter;

impl Presenter for LogPresenter {
    fn metrics_updated(&mut self, metrics: &DisplayMetrics) {
        log::debug!(
            "speed {:.2} {} (max {:.2}, avg {:.2}), distance {:.3} {}, elapsed {}",
            metrics.current_speed,
            metrics.speed_unit,
            metrics.max_speed,
            metrics.average_speed,
            metrics.total_distance,
            metrics.distance_unit,
            metrics.elapsed
        );
    }

    fn position_error(&mut self, error: &PositionError) {
        log::warn!("Position error: {}", error);
    }

    fn tracking_changed(&mut self, state: &TrackingState) {
        log::info!(
            "Tracking {}, recording {}",
            if state.is_tracking { "on" } else { "off" },
            if state.is_recording { "on" } else { "off" }
        );
    }
}
