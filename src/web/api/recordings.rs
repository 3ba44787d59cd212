use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};

use crate::recording::{export_filename, to_csv, RecordingSession, SessionSummary};
use crate::web::api::error::{ApiResult, ErrorResponse};
use crate::web::state::AppState;

#[utoipa::path(
    get,
    path = "/api/recordings",
    tag = "recordings",
    responses(
        (status = 200, description = "Saved recordings, newest first", body = Vec<SessionSummary>),
        (status = 500, description = "Storage error", body = ErrorResponse)
    )
)]
pub async fn list_recordings(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<SessionSummary>>> {
    Ok(Json(state.recordings.list()?))
}

#[utoipa::path(
    get,
    path = "/api/recordings/{id}",
    tag = "recordings",
    params(
        ("id" = String, Path, description = "Recording id")
    ),
    responses(
        (status = 200, description = "Recording with all samples", body = RecordingSession),
        (status = 404, description = "Recording not found", body = ErrorResponse)
    )
)]
pub async fn get_recording(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<RecordingSession>> {
    Ok(Json(state.recordings.get(&id)?))
}

#[utoipa::path(
    get,
    path = "/api/recordings/{id}/export",
    tag = "recordings",
    params(
        ("id" = String, Path, description = "Recording id")
    ),
    responses(
        (status = 200, description = "CSV export", content_type = "text/csv", body = String),
        (status = 404, description = "Recording not found", body = ErrorResponse)
    )
)]
pub async fn export_recording(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let session = state.recordings.get(&id)?;
    let disposition = format!("attachment; filename=\"{}\"", export_filename(&session));
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        to_csv(&session),
    ))
}

#[utoipa::path(
    delete,
    path = "/api/recordings/{id}",
    tag = "recordings",
    params(
        ("id" = String, Path, description = "Recording id")
    ),
    responses(
        (status = 204, description = "Recording deleted"),
        (status = 404, description = "Recording not found", body = ErrorResponse)
    )
)]
pub async fn delete_recording(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.recordings.delete(&id)?;
    log::info!("Recording {} deleted", id);
    Ok(StatusCode::NO_CONTENT)
}
