mod error;
mod kv;
mod recordings;
mod settings;

pub use error::StorageError;
pub use kv::{FileStore, KeyValueStore, MemoryStore};
pub use recordings::{RecordingStore, DEFAULT_MAX_RECORDINGS};
pub use settings::SettingsStore;
