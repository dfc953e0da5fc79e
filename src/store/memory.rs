// In-memory draft store for tests and ephemeral setups.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::draft::state::Draft;

use super::{DraftStore, StoreError};

/// Process-local snapshot store keeping the same compare-and-swap contract
/// as the SQLite backend.
#[derive(Default)]
pub struct MemoryDraftStore {
    drafts: Mutex<HashMap<String, Draft>>,
}

impl MemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Draft>> {
        self.drafts.lock().expect("draft store mutex poisoned")
    }
}

impl DraftStore for MemoryDraftStore {
    fn load(&self, league_id: &str) -> Result<Option<Draft>, StoreError> {
        Ok(self.lock().get(league_id).cloned())
    }

    fn insert_new(&self, draft: &Draft) -> Result<(), StoreError> {
        let mut drafts = self.lock();
        if drafts.contains_key(&draft.league_id) {
            return Err(StoreError::AlreadyExists(draft.league_id.clone()));
        }
        drafts.insert(draft.league_id.clone(), draft.clone());
        Ok(())
    }

    fn compare_and_swap(&self, expected_version: u64, draft: &Draft) -> Result<(), StoreError> {
        let mut drafts = self.lock();
        match drafts.get(&draft.league_id) {
            None => Err(StoreError::NotFound(draft.league_id.clone())),
            Some(stored) if stored.version != expected_version => {
                Err(StoreError::Conflict(draft.league_id.clone()))
            }
            Some(_) => {
                drafts.insert(draft.league_id.clone(), draft.clone());
                Ok(())
            }
        }
    }

    fn delete(&self, league_id: &str) -> Result<(), StoreError> {
        self.lock().remove(league_id);
        Ok(())
    }
}
