use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordingError {
    #[error("recording requires an active tracking session")]
    TrackingInactive,
    #[error("recording already running")]
    AlreadyRecording,
}
