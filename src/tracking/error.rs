use thiserror::Error;

use crate::recording::RecordingError;

#[derive(Debug, Error)]
pub enum TrackingError {
    #[error("position sampling is not available on this host")]
    UnsupportedCapability,
    #[error("invalid state: {0}")]
    InvalidState(#[from] RecordingError),
}
