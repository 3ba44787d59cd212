pub mod error;
pub mod recordings;
pub mod settings;
pub mod tracking;
