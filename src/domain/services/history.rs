#[cfg(test)]
#[path = "history_test.rs"]
mod tests;

use anyhow::Result;

use super::LocalStorage;
use super::StorageKey;
use crate::domain::models::GenerationResult;

pub const HISTORY_LIMIT: usize = 50;

/// Newest-first log of past generations. The whole list is written back on
/// every mutation.
#[derive(Clone, Debug)]
pub struct HistoryStore {
    storage: LocalStorage,
    entries: Vec<GenerationResult>,
}

impl HistoryStore {
    pub fn new(storage: LocalStorage) -> HistoryStore {
        return HistoryStore {
            storage,
            entries: vec![],
        };
    }

    /// Replaces the in-memory list with the persisted one. Anything that
    /// cannot be parsed is treated as an empty history.
    pub fn load(&mut self) {
        self.entries = vec![];

        let payload = match self.storage.get(StorageKey::History) {
            Some(payload) => payload,
            None => return,
        };

        match serde_json::from_str::<Vec<GenerationResult>>(&payload) {
            Ok(mut entries) => {
                entries.truncate(HISTORY_LIMIT);
                self.entries = entries;
            }
            Err(err) => {
                tracing::warn!(error = ?err, "discarding unreadable history");
            }
        }
    }

    pub fn entries(&self) -> &[GenerationResult] {
        return &self.entries;
    }

    pub fn len(&self) -> usize {
        return self.entries.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.entries.is_empty();
    }

    pub fn get(&self, id: &str) -> Option<&GenerationResult> {
        return self.entries.iter().find(|entry| return entry.id == id);
    }

    pub fn add(&mut self, result: GenerationResult) -> Result<()> {
        self.entries.insert(0, result);
        self.entries.truncate(HISTORY_LIMIT);

        let payload = serde_json::to_string(&self.entries)?;
        self.storage.set(StorageKey::History, &payload)?;

        return Ok(());
    }

    pub fn clear(&mut self) -> Result<()> {
        self.entries = vec![];
        self.storage.remove(StorageKey::History)?;

        return Ok(());
    }
}
