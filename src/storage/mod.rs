//!
//! coursegate roster storage
//! -------------------------
//! The sync engine and the course directory read and write rosters through the
//! `RosterStore` trait. Both calls are atomic with respect to a single invocation:
//! `save` either replaces the whole roster for a course or leaves it untouched.
//!
//! Two implementations ship with the crate:
//! - `MemoryRosterStore`: a locked in-process map, used by tests and embedders.
//! - `JsonRosterStore`: one `users.json` per course directory under a root folder.

use std::path::PathBuf;

use crate::model::Roster;

mod json;
mod memory;

pub use json::{JsonRosterStore, USERS_FILENAME};
pub use memory::MemoryRosterStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("invalid course id {0:?}")]
    InvalidCourseId(String),
    #[error("roster io failed for '{path}': {source}")]
    Io { path: PathBuf, #[source] source: std::io::Error },
    #[error("roster file '{path}' is not valid: {source}")]
    Format { path: PathBuf, #[source] source: serde_json::Error },
    #[error("roster backend unavailable: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

pub trait RosterStore: Send + Sync {
    /// Current roster for `course_id`. A course with no stored roster loads as empty.
    fn load(&self, course_id: &str) -> StoreResult<Roster>;

    /// Replace the stored roster for `course_id`.
    fn save(&self, course_id: &str, roster: &Roster) -> StoreResult<()>;
}

/// Course ids become directory names, so only a conservative character set is accepted.
pub fn validate_course_id(course_id: &str) -> StoreResult<()> {
    let ok = !course_id.is_empty()
        && !course_id.starts_with('.')
        && course_id.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if ok { Ok(()) } else { Err(StoreError::InvalidCourseId(course_id.to_string())) }
}
