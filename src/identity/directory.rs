use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::model::Course;
use crate::storage::{RosterStore, StoreResult};

/// Read-only course lookup used by the resolver.
pub trait CourseDirectory: Send + Sync {
    fn course(&self, course_id: &str) -> Option<Arc<Course>>;
}

/// Courses held in memory. Lookups hand out `Arc` snapshots, so a roster refresh never
/// disturbs a resolve already in flight.
#[derive(Default)]
pub struct MemoryCourseDirectory {
    courses: RwLock<HashMap<String, Arc<Course>>>,
}

impl MemoryCourseDirectory {
    pub fn new() -> Self { Self::default() }

    pub fn insert(&self, course: Course) {
        self.courses.write().insert(course.id.clone(), Arc::new(course));
    }

    pub fn remove(&self, course_id: &str) -> Option<Arc<Course>> { self.courses.write().remove(course_id) }

    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.courses.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Reload the roster of a known course from `store`. Returns false for unknown courses,
    /// including one removed while the store was being read.
    pub fn refresh_roster(&self, course_id: &str, store: &dyn RosterStore) -> StoreResult<bool> {
        if !self.courses.read().contains_key(course_id) {
            return Ok(false);
        }
        // Store I/O runs unlocked; the check and the swap share one write guard.
        let roster = store.load(course_id)?;
        let mut courses = self.courses.write();
        let Some(slot) = courses.get_mut(course_id) else { return Ok(false); };
        debug!(target: "coursegate::store", "refresh_roster: course='{}' users={}", course_id, roster.len());
        *slot = Arc::new(Course { roster, ..(**slot).clone() });
        Ok(true)
    }
}

impl CourseDirectory for MemoryCourseDirectory {
    fn course(&self, course_id: &str) -> Option<Arc<Course>> { self.courses.read().get(course_id).cloned() }
}
