use std::sync::Arc;
use tokio::sync::Mutex;

use crate::storage::{RecordingStore, SettingsStore};
use crate::tracking::TrackingController;

#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<Mutex<TrackingController>>,
    pub recordings: RecordingStore,
    pub settings: SettingsStore,
}

impl AppState {
    pub fn new(
        controller: TrackingController,
        recordings: RecordingStore,
        settings: SettingsStore,
    ) -> Self {
        Self {
            controller: Arc::new(Mutex::new(controller)),
            recordings,
            settings,
        }
    }
}
