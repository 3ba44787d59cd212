use utoipa::OpenApi;

use super::api::error::ErrorResponse;
use super::api::tracking::{
    ActiveRecording, StatusResponse, StopResponse, UnitRequest, UnitResponse,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        super::api::tracking::start,
        super::api::tracking::stop,
        super::api::tracking::status,
        super::api::tracking::metrics,
        super::api::tracking::chart,
        super::api::tracking::set_unit,
        super::api::tracking::start_recording,
        super::api::tracking::stop_recording,
        super::api::recordings::list_recordings,
        super::api::recordings::get_recording,
        super::api::recordings::export_recording,
        super::api::recordings::delete_recording,
        super::api::settings::get_settings,
        super::api::settings::put_settings,
    ),
    components(
        schemas(
            StatusResponse,
            StopResponse,
            ActiveRecording,
            UnitRequest,
            UnitResponse,
            ErrorResponse,
            crate::tracking::TrackingState,
            crate::tracking::Coordinate,
            crate::tracking::DisplayMetrics,
            crate::tracking::ChartSeries,
            crate::units::UnitSystem,
            crate::source::PositionError,
            crate::source::PositionErrorCode,
            crate::recording::RecordingSession,
            crate::recording::RecordedSample,
            crate::recording::SessionSummary,
            crate::settings::Settings,
        )
    ),
    info(
        title = "Speed-O-Mat API",
        description = "GPS speed tracking, session metrics and recordings",
        version = "0.1.0"
    ),
    tags(
        (name = "tracking", description = "Tracking lifecycle and live metrics"),
        (name = "recording", description = "Recording control"),
        (name = "recordings", description = "Saved recordings"),
        (name = "settings", description = "User settings")
    )
)]
pub struct ApiDoc;
