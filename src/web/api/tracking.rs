use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::recording::SessionSummary;
use crate::source::PositionError;
use crate::tracking::{ChartSeries, DisplayMetrics, TrackingController, TrackingState};
use crate::units::UnitSystem;
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusResponse {
    pub state: TrackingState,
    pub unit: UnitSystem,
    /// Most recent position error of the current session, if any.
    pub last_error: Option<PositionError>,
    pub recording: Option<ActiveRecording>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ActiveRecording {
    pub id: String,
    pub start_time: DateTime<Utc>,
    pub sample_count: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StopResponse {
    pub status: StatusResponse,
    /// Recording sealed by this stop, if one was open.
    pub recording: Option<SessionSummary>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UnitRequest {
    pub unit: UnitSystem,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UnitResponse {
    pub unit: UnitSystem,
    pub changed: bool,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ChartQuery {
    /// Return the duration-based timeline instead of the live window.
    #[serde(default)]
    pub timeline: bool,
}

fn status_of(controller: &TrackingController) -> StatusResponse {
    StatusResponse {
        state: controller.state(),
        unit: controller.unit(),
        last_error: controller.last_error().cloned(),
        recording: controller.recording().map(|session| ActiveRecording {
            id: session.id.clone(),
            start_time: session.start_time,
            sample_count: session.samples.len(),
        }),
    }
}

#[utoipa::path(
    post,
    path = "/api/tracking/start",
    tag = "tracking",
    responses(
        (status = 200, description = "Tracking started", body = StatusResponse),
        (status = 503, description = "No position source available", body = ErrorResponse)
    )
)]
pub async fn start(State(state): State<AppState>) -> ApiResult<Json<StatusResponse>> {
    let mut controller = state.controller.lock().await;
    controller.start()?;
    Ok(Json(status_of(&controller)))
}

#[utoipa::path(
    post,
    path = "/api/tracking/stop",
    tag = "tracking",
    responses(
        (status = 200, description = "Tracking stopped", body = StopResponse)
    )
)]
pub async fn stop(State(state): State<AppState>) -> Json<StopResponse> {
    let mut controller = state.controller.lock().await;
    let sealed = controller.stop();
    Json(StopResponse {
        status: status_of(&controller),
        recording: sealed.map(|session| session.summary()),
    })
}

#[utoipa::path(
    get,
    path = "/api/tracking/status",
    tag = "tracking",
    responses(
        (status = 200, description = "Tracking status", body = StatusResponse)
    )
)]
pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let controller = state.controller.lock().await;
    Json(status_of(&controller))
}

#[utoipa::path(
    get,
    path = "/api/metrics",
    tag = "tracking",
    responses(
        (status = 200, description = "Session metrics in the active unit", body = DisplayMetrics)
    )
)]
pub async fn metrics(State(state): State<AppState>) -> Json<DisplayMetrics> {
    let controller = state.controller.lock().await;
    Json(controller.display_metrics())
}

#[utoipa::path(
    get,
    path = "/api/chart",
    tag = "tracking",
    params(ChartQuery),
    responses(
        (status = 200, description = "Speed history in the active unit", body = ChartSeries)
    )
)]
pub async fn chart(
    State(state): State<AppState>,
    Query(query): Query<ChartQuery>,
) -> Json<ChartSeries> {
    let controller = state.controller.lock().await;
    let series = if query.timeline {
        controller.timeline().series()
    } else {
        controller.history().series()
    };
    Json(series)
}

#[utoipa::path(
    put,
    path = "/api/unit",
    tag = "tracking",
    request_body = UnitRequest,
    responses(
        (status = 200, description = "Active display unit", body = UnitResponse)
    )
)]
pub async fn set_unit(
    State(state): State<AppState>,
    Json(request): Json<UnitRequest>,
) -> Json<UnitResponse> {
    let mut controller = state.controller.lock().await;
    let changed = controller.switch_unit(request.unit);
    if changed {
        if let Err(e) = state.settings.save(controller.settings()) {
            log::warn!("Failed to persist unit change: {}", e);
        }
    }
    Json(UnitResponse {
        unit: controller.unit(),
        changed,
    })
}

#[utoipa::path(
    post,
    path = "/api/recording/start",
    tag = "recording",
    responses(
        (status = 200, description = "Recording started", body = ActiveRecording),
        (status = 409, description = "Not tracking, or already recording", body = ErrorResponse)
    )
)]
pub async fn start_recording(State(state): State<AppState>) -> ApiResult<Json<ActiveRecording>> {
    let mut controller = state.controller.lock().await;
    controller.start_recording()?;
    match status_of(&controller).recording {
        Some(active) => Ok(Json(active)),
        None => Err(ApiError::Conflict("recording did not open".to_string())),
    }
}

#[utoipa::path(
    post,
    path = "/api/recording/stop",
    tag = "recording",
    responses(
        (status = 200, description = "Sealed recording, or null when none was open", body = Option<SessionSummary>)
    )
)]
pub async fn stop_recording(State(state): State<AppState>) -> Json<Option<SessionSummary>> {
    let mut controller = state.controller.lock().await;
    Json(controller.stop_recording().map(|session| session.summary()))
}
