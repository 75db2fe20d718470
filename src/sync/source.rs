//! Pulling users from an external system of record (typically the LMS).
//!
//! Source users never carry passwords. Existing users keep their stored hash, so a
//! source sync only rotates credentials for accounts it creates.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{SyncError, SyncOptions, SyncResult, UserSync};
use crate::model::User;
use crate::role::Role;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SourceUser {
    pub email: String,
    #[serde(default)]
    pub name: String,
    /// `Unknown` leaves an existing user's role alone.
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub lms_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("user source failed: {0}")]
pub struct SourceError(pub String);

pub trait UserSource: Send + Sync {
    fn fetch_users(&self) -> Result<Vec<SourceUser>, SourceError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SourcePolicy {
    /// Update name, role and external id of users already on the roster.
    pub sync_attributes: bool,
    /// Create roster entries for source users not yet on the roster.
    pub add_users: bool,
}

impl Default for SourcePolicy {
    fn default() -> Self { Self { sync_attributes: true, add_users: true } }
}

impl UserSync {
    /// Fetch users from `source` and sync them into `course_id` under `policy`.
    ///
    /// `policy.sync_attributes` replaces `options.allow_merge`; `dry_run` and `notify`
    /// apply as usual.
    pub fn sync_from_source(
        &self,
        course_id: &str,
        source: &dyn UserSource,
        policy: SourcePolicy,
        options: SyncOptions,
    ) -> Result<SyncResult, SyncError> {
        let fetched = source.fetch_users()?;
        let roster = self.load(course_id)?;
        let fetched_count = fetched.len();

        let candidates: Vec<User> = fetched
            .into_iter()
            .filter(|su| !su.email.is_empty())
            .filter_map(|su| {
                let existing = roster.get(&su.email);
                if existing.is_none() && !policy.add_users {
                    return None;
                }
                let mut u = User::new(su.email, su.name, su.role);
                if !su.lms_id.is_empty() {
                    u.lms_id = Some(su.lms_id);
                }
                // Confirm the current credential rather than rotating it.
                if let Some(e) = existing {
                    u.pass = e.pass.clone();
                }
                Some(u)
            })
            .collect();

        debug!(
            target: "coursegate::sync",
            "sync_from_source: course='{}' fetched={} candidates={} policy={:?}",
            course_id, fetched_count, candidates.len(), policy
        );
        let options = options.allow_merge(policy.sync_attributes);
        self.sync_roster(course_id, roster, candidates, options)
    }
}
