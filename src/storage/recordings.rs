use std::sync::Arc;

use super::error::StorageError;
use super::kv::KeyValueStore;
use crate::recording::{RecordingSession, SessionSummary};

pub const RECORDINGS_KEY: &str = "recordings";
pub const DEFAULT_MAX_RECORDINGS: usize = 50;

/// Sealed sessions kept in insertion order under a single key. Once the cap
/// is reached the oldest insert is evicted first.
#[derive(Clone)]
pub struct RecordingStore {
    kv: Arc<dyn KeyValueStore>,
    capacity: usize,
}

impl RecordingStore {
    pub fn new(kv: Arc<dyn KeyValueStore>, capacity: usize) -> Self {
        Self {
            kv,
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn load(&self) -> Result<Vec<RecordingSession>, StorageError> {
        let Some(blob) = self.kv.get(RECORDINGS_KEY)? else {
            return Ok(Vec::new());
        };

        let entries: Vec<serde_json::Value> = match serde_json::from_str(&blob) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("Stored recordings are malformed, starting empty: {}", e);
                return Ok(Vec::new());
            }
        };

        let sessions = entries
            .into_iter()
            .enumerate()
            .filter_map(|(i, value)| match serde_json::from_value(value) {
                Ok(session) => Some(session),
                Err(e) => {
                    log::warn!("Skipping malformed recording #{}: {}", i, e);
                    None
                }
            })
            .collect();
        Ok(sessions)
    }

    fn write(&self, sessions: &[RecordingSession]) -> Result<(), StorageError> {
        let blob = serde_json::to_string(sessions)?;
        self.kv.set(RECORDINGS_KEY, &blob)
    }

    /// Returns the ids evicted to make room.
    pub fn save(&self, session: &RecordingSession) -> Result<Vec<String>, StorageError> {
        let mut sessions = self.load()?;
        sessions.push(session.clone());

        let overflow = sessions.len().saturating_sub(self.capacity);
        let evicted: Vec<String> = sessions.drain(..overflow).map(|s| s.id).collect();
        for id in &evicted {
            log::info!("Evicted oldest recording {}", id);
        }

        self.write(&sessions)?;
        Ok(evicted)
    }

    /// Newest first.
    pub fn list(&self) -> Result<Vec<SessionSummary>, StorageError> {
        Ok(self.load()?.iter().rev().map(|s| s.summary()).collect())
    }

    pub fn get(&self, id: &str) -> Result<RecordingSession, StorageError> {
        self.load()?
            .into_iter()
            .find(|s| s.id == id)
            .ok_or_else(|| StorageError::NotFound(id.to_string()))
    }

    pub fn delete(&self, id: &str) -> Result<(), StorageError> {
        let mut sessions = self.load()?;
        let before = sessions.len();
        sessions.retain(|s| s.id != id);
        if sessions.len() == before {
            return Err(StorageError::NotFound(id.to_string()));
        }
        self.write(&sessions)
    }
}
