use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::source::{SimulatedSource, SourceEvent};
use crate::storage::{FileStore, KeyValueStore, RecordingStore, SettingsStore};
use crate::tracking::{LogPresenter, TrackingController};

use super::api::recordings as recording_handlers;
use super::api::settings as settings_handlers;
use super::api::tracking as tracking_handlers;
use super::api_doc::ApiDoc;
use super::config::Config;
use super::state::AppState;

pub async fn run_server(config: Config) -> std::io::Result<()> {
    let bind_addr = config.web.bind.clone();
    let kv: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(config.storage.base_folder.clone()));
    let settings = SettingsStore::new(kv.clone());
    let recordings = RecordingStore::new(kv, config.tracking.max_recordings);

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let mut controller =
        TrackingController::new(&config.tracking, settings.load(), recordings.clone());
    match config.simulation.clone() {
        Some(simulation) => {
            log::info!("Using simulated position source at {}", simulation.coordinates);
            controller =
                controller.with_source(Box::new(SimulatedSource::new(simulation, events_tx)));
        }
        None => log::warn!("No position source configured, tracking cannot be started"),
    }
    controller.add_presenter(Box::new(LogPresenter));

    let state = AppState::new(controller, recordings, settings);
    spawn_event_pump(state.controller.clone(), events_rx);

    let app = router(state);

    log::info!("Starting server on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Tracking
        .route("/api/tracking/start", post(tracking_handlers::start))
        .route("/api/tracking/stop", post(tracking_handlers::stop))
        .route("/api/tracking/status", get(tracking_handlers::status))
        .route("/api/metrics", get(tracking_handlers::metrics))
        .route("/api/chart", get(tracking_handlers::chart))
        .route("/api/unit", put(tracking_handlers::set_unit))
        // Recording
        .route("/api/recording/start", post(tracking_handlers::start_recording))
        .route("/api/recording/stop", post(tracking_handlers::stop_recording))
        .route("/api/recordings", get(recording_handlers::list_recordings))
        .route(
            "/api/recordings/{id}",
            get(recording_handlers::get_recording).delete(recording_handlers::delete_recording),
        )
        .route("/api/recordings/{id}/export", get(recording_handlers::export_recording))
        // Settings
        .route(
            "/api/settings",
            get(settings_handlers::get_settings).put(settings_handlers::put_settings),
        )
        // OpenAPI / Swagger
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Feeds source events to the controller one at a time, in arrival order.
/// Ends when every sender has been dropped.
pub fn spawn_event_pump(
    controller: Arc<Mutex<TrackingController>>,
    mut events: mpsc::UnboundedReceiver<SourceEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            controller.lock().await.dispatch(event);
        }
        log::debug!("Position event channel closed");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::source::{ManualSource, PositionEvent};
    use crate::storage::MemoryStore;
    use crate::tracking::{PositionSample, TrackingConfig};
    use crate::units::UnitSystem;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use chrono::Utc;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_state(with_source: bool) -> AppState {
        let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let settings = SettingsStore::new(kv.clone());
        let recordings = RecordingStore::new(kv, 50);
        let mut controller = TrackingController::new(
            &TrackingConfig::default(),
            Settings::default(),
            recordings.clone(),
        );
        if with_source {
            controller = controller.with_source(Box::new(ManualSource::new()));
        }
        AppState::new(controller, recordings, settings)
    }

    async fn call(
        state: &AppState,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let (status, bytes) = call_raw(state, method, uri, body).await;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn call_raw(
        state: &AppState,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Vec<u8>) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        let response = router(state.clone())
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    async fn feed(state: &AppState, speed: f64) {
        let sample = PositionSample::new(Utc::now(), 40.4168, -3.7038).with_speed(speed);
        state.controller.lock().await.on_position_sample(sample);
    }

    #[tokio::test]
    async fn test_start_without_source_is_unavailable() {
        let state = test_state(false);
        let (status, body) = call(&state, Method::POST, "/api/tracking/start", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "unsupported_capability");

        let (_, status_body) = call(&state, Method::GET, "/api/tracking/status", None).await;
        assert_eq!(status_body["state"]["is_tracking"], false);
    }

    #[tokio::test]
    async fn test_tracking_lifecycle() {
        let state = test_state(true);
        let (status, body) = call(&state, Method::POST, "/api/tracking/start", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"]["is_tracking"], true);

        feed(&state, 10.0).await;
        feed(&state, 0.2).await;

        let (_, metrics) = call(&state, Method::GET, "/api/metrics", None).await;
        assert_eq!(metrics["speed_unit"], "mph");
        assert_eq!(metrics["current_speed"], 0.0);
        let max = metrics["max_speed"].as_f64().unwrap();
        assert!((max - 22.3694).abs() < 1e-9);

        let (_, chart) = call(&state, Method::GET, "/api/chart", None).await;
        assert_eq!(chart["values"].as_array().unwrap().len(), 2);
        let (_, timeline) = call(&state, Method::GET, "/api/chart?timeline=true", None).await;
        assert_eq!(timeline["labels"].as_array().unwrap().len(), 2);

        let (status, body) = call(&state, Method::POST, "/api/tracking/stop", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"]["state"]["is_tracking"], false);
        assert!(body["recording"].is_null());
    }

    #[tokio::test]
    async fn test_recording_requires_tracking() {
        let state = test_state(true);
        let (status, body) = call(&state, Method::POST, "/api/recording/start", None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "invalid_state");

        let (status, body) = call(&state, Method::POST, "/api/recording/stop", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.is_null());
    }

    #[tokio::test]
    async fn test_recording_round_trip() {
        let state = test_state(true);
        call(&state, Method::POST, "/api/tracking/start", None).await;
        let (status, active) = call(&state, Method::POST, "/api/recording/start", None).await;
        assert_eq!(status, StatusCode::OK);
        let id = active["id"].as_str().unwrap().to_string();

        feed(&state, 4.0).await;
        feed(&state, 6.0).await;

        let (_, status_body) = call(&state, Method::GET, "/api/tracking/status", None).await;
        assert_eq!(status_body["recording"]["sample_count"], 2);

        let (_, summary) = call(&state, Method::POST, "/api/recording/stop", None).await;
        assert_eq!(summary["id"], id.as_str());
        assert_eq!(summary["sample_count"], 2);

        let (_, listed) = call(&state, Method::GET, "/api/recordings", None).await;
        assert_eq!(listed.as_array().unwrap().len(), 1);

        let (status, session) =
            call(&state, Method::GET, &format!("/api/recordings/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(session["samples"].as_array().unwrap().len(), 2);

        let response = router(state.clone())
            .oneshot(
                Request::builder()
                    .uri(format!("/api/recordings/{id}/export"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/csv"));
        let disposition = response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.contains("speed-session-"));
        assert!(disposition.ends_with(".csv\""));
        let csv = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let csv = String::from_utf8(csv.to_vec()).unwrap();
        assert_eq!(csv.lines().count(), 3);
        assert!(csv.starts_with("timestamp,elapsed_s,speed_mps,speed_mph"));

        let (status, _) =
            call_raw(&state, Method::DELETE, &format!("/api/recordings/{id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) =
            call(&state, Method::GET, &format!("/api/recordings/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "recording_not_found");
    }

    #[tokio::test]
    async fn test_unit_switch_is_persisted() {
        let state = test_state(true);
        call(&state, Method::POST, "/api/tracking/start", None).await;
        feed(&state, 10.0).await;

        let (status, body) =
            call(&state, Method::PUT, "/api/unit", Some(json!({"unit": "metric"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["changed"], true);

        let (_, body) =
            call(&state, Method::PUT, "/api/unit", Some(json!({"unit": "metric"}))).await;
        assert_eq!(body["changed"], false);

        let (_, chart) = call(&state, Method::GET, "/api/chart", None).await;
        assert_eq!(chart["speed_unit"], "km/h");
        let value = chart["values"][0].as_f64().unwrap();
        assert!((value - 36.0).abs() < 1e-9);

        assert_eq!(state.settings.load().unit, UnitSystem::Metric);
    }

    #[tokio::test]
    async fn test_settings_validation_and_persistence() {
        let state = test_state(true);
        let (status, body) = call(
            &state,
            Method::PUT,
            "/api/settings",
            Some(json!({"update_interval_ms": 50})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_failed");

        let (status, body) = call(
            &state,
            Method::PUT,
            "/api/settings",
            Some(json!({
                "update_interval_ms": 500,
                "chart_duration_seconds": 30,
                "auto_save": false
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["update_interval_ms"], 500);
        assert_eq!(body["high_accuracy"], true);

        let stored = state.settings.load();
        assert_eq!(stored.update_interval_ms, 500);
        assert!(!stored.auto_save);

        let (_, body) = call(&state, Method::GET, "/api/settings", None).await;
        assert_eq!(body["chart_duration_seconds"], 30);
        assert_eq!(state.controller.lock().await.timeline().capacity(), 60);
    }

    #[tokio::test]
    async fn test_event_pump_feeds_active_subscription() {
        let state = test_state(true);
        call(&state, Method::POST, "/api/tracking/start", None).await;
        let subscription = state.controller.lock().await.subscription().unwrap();

        let (tx, rx) = mpsc::unbounded_channel();
        let pump = spawn_event_pump(state.controller.clone(), rx);
        for speed in [3.0, 5.0] {
            let sample = PositionSample::new(Utc::now(), 1.0, 2.0).with_speed(speed);
            tx.send(SourceEvent {
                subscription,
                event: PositionEvent::Sample(sample),
            })
            .unwrap();
        }
        drop(tx);
        pump.await.unwrap();

        let controller = state.controller.lock().await;
        assert_eq!(controller.history().len(), 2);
        assert_eq!(controller.metrics().max_speed_mps, 5.0);
    }

    #[tokio::test]
    async fn test_openapi_is_served() {
        let state = test_state(false);
        let (status, body) = call(&state, Method::GET, "/api-doc/openapi.json", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["paths"]["/api/tracking/start"].is_object());
    }
}
