use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::{RosterStore, StoreResult};
use crate::model::Roster;

/// In-process roster store. Clones share the same underlying map.
#[derive(Clone, Default)]
pub struct MemoryRosterStore {
    map: Arc<RwLock<HashMap<String, Roster>>>,
}

impl MemoryRosterStore {
    pub fn new() -> Self { Self::default() }

    /// Seed a roster without going through `save`.
    pub fn with_roster(self, course_id: &str, roster: Roster) -> Self {
        self.map.write().insert(course_id.to_string(), roster);
        self
    }

    pub fn course_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.map.read().keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl RosterStore for MemoryRosterStore {
    fn load(&self, course_id: &str) -> StoreResult<Roster> {
        Ok(self.map.read().get(course_id).cloned().unwrap_or_default())
    }

    fn save(&self, course_id: &str, roster: &Roster) -> StoreResult<()> {
        self.map.write().insert(course_id.to_string(), roster.clone());
        Ok(())
    }
}
