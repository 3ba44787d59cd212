mod controller;
mod error;
pub mod filter;
pub mod geodesy;
pub mod history;
pub mod metrics;
mod presenter;
mod types;

pub use controller::TrackingController;
pub use error::TrackingError;
pub use filter::{Rejection, SampleFilter};
pub use history::{ChartSeries, HistoryBuffer, HistoryPoint};
pub use metrics::{DisplayMetrics, MetricsAccumulator, SessionMetrics};
pub use presenter::{LogPresenter, Presenter};
pub use types::{Coordinate, PositionSample, TrackingConfig, TrackingState};
