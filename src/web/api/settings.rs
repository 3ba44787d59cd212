use axum::{extract::State, Json};

use crate::settings::{Settings, CHART_DURATION_RANGE_S, UPDATE_INTERVAL_RANGE_MS};
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::state::AppState;

#[utoipa::path(
    get,
    path = "/api/settings",
    tag = "settings",
    responses(
        (status = 200, description = "Current settings", body = Settings)
    )
)]
pub async fn get_settings(State(state): State<AppState>) -> Json<Settings> {
    let controller = state.controller.lock().await;
    Json(controller.settings().clone())
}

/// Absent fields take their defaults; out-of-range values are rejected.
#[utoipa::path(
    put,
    path = "/api/settings",
    tag = "settings",
    request_body = Settings,
    responses(
        (status = 200, description = "Settings applied", body = Settings),
        (status = 400, description = "Value out of range", body = ErrorResponse),
        (status = 500, description = "Storage error", body = ErrorResponse)
    )
)]
pub async fn put_settings(
    State(state): State<AppState>,
    Json(settings): Json<Settings>,
) -> ApiResult<Json<Settings>> {
    if !UPDATE_INTERVAL_RANGE_MS.contains(&settings.update_interval_ms) {
        return Err(ApiError::Validation(format!(
            "update_interval_ms must be within {}..={}",
            UPDATE_INTERVAL_RANGE_MS.start(),
            UPDATE_INTERVAL_RANGE_MS.end()
        )));
    }
    if !CHART_DURATION_RANGE_S.contains(&settings.chart_duration_seconds) {
        return Err(ApiError::Validation(format!(
            "chart_duration_seconds must be within {}..={}",
            CHART_DURATION_RANGE_S.start(),
            CHART_DURATION_RANGE_S.end()
        )));
    }

    let mut controller = state.controller.lock().await;
    controller.apply_settings(settings);
    state.settings.save(controller.settings())?;
    Ok(Json(controller.settings().clone()))
}
