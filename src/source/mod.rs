mod manual;
mod simulated;

pub use manual::ManualSource;
pub use simulated::{SimulatedSource, SimulationConfig};

use serde::{Deserialize, Serialize};
use strum_macros::Display;
use thiserror::Error;
use utoipa::ToSchema;

use crate::tracking::PositionSample;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
pub struct SubscriptionId(pub u64);

/// Options handed to the source on subscribe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WatchOptions {
    pub high_accuracy: bool,
    /// Oldest cached fix the source may return; 0 forces a fresh one.
    pub maximum_age_ms: u64,
    pub timeout_ms: u64,
    /// Preferred delivery cadence. Sources are free to ignore it.
    pub interval_ms: u64,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            maximum_age_ms: 0,
            timeout_ms: 10_000,
            interval_ms: 1_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PositionErrorCode {
    PermissionDenied,
    Unavailable,
    Timeout,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize, ToSchema)]
#[error("{code}: {message}")]
pub struct PositionError {
    pub code: PositionErrorCode,
    pub message: String,
}

impl PositionError {
    pub fn new(code: PositionErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PositionEvent {
    Sample(PositionSample),
    Error(PositionError),
}

/// An event tagged with the subscription that produced it, so the
/// controller can drop deliveries from a cancelled watch.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceEvent {
    pub subscription: SubscriptionId,
    pub event: PositionEvent,
}

/// A position-sampling capability. Events are delivered out of band
/// (channel, replay loop, test harness) and fed to the controller.
pub trait PositionSource: Send {
    fn subscribe(&mut self, options: &WatchOptions) -> SubscriptionId;
    fn cancel(&mut self, subscription: SubscriptionId);
}
