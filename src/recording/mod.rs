mod error;
pub mod export;
mod recorder;
mod session;

pub use error::RecordingError;
pub use export::{export_filename, to_csv};
pub use recorder::{RecorderState, SessionRecorder};
pub use session::{RecordedSample, RecordingSession, SessionSummary};
