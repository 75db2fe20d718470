//!
//! coursegate roster synchronization
//! ---------------------------------
//! Reconciles a batch of incoming users against a course roster. Each candidate is
//! classified as skipped, added or modified; candidates without a password get a
//! generated one whose plaintext is handed back in the `SyncResult`.
//!
//! The call is all-or-nothing with respect to the stored roster: a password or hashing
//! failure aborts before anything is saved, and a failed save discards the
//! classification. Notifications happen only after a successful save.
//!
//! The engine holds no locks of its own. Callers must serialize syncs against the same
//! course.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::model::{Roster, User};
use crate::role::Role;
use crate::security::{CredentialError, CredentialProvider};
use crate::storage::{RosterStore, StoreError};

mod notify;
mod result;
mod source;

pub use notify::{LogNotifier, NotifyError, NotifyHints, Notifier};
pub use result::{Outcome, SyncOptions, SyncResult};
pub use source::{SourceError, SourcePolicy, SourceUser, UserSource};

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("failed to load roster for course '{course_id}': {source}")]
    Load { course_id: String, #[source] source: StoreError },
    #[error("failed to set password for '{email}': {source}")]
    Password { email: String, #[source] source: CredentialError },
    #[error("failed to save roster for course '{course_id}': {source}")]
    Save { course_id: String, #[source] source: StoreError },
    #[error(transparent)]
    Source(#[from] SourceError),
}

#[derive(Clone)]
pub struct UserSync {
    store: Arc<dyn RosterStore>,
    credentials: Arc<dyn CredentialProvider>,
    notifier: Arc<dyn Notifier>,
}

impl UserSync {
    pub fn new(store: Arc<dyn RosterStore>, credentials: Arc<dyn CredentialProvider>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, credentials, notifier }
    }

    pub fn store(&self) -> &Arc<dyn RosterStore> { &self.store }

    /// Sync a single user. See `sync`.
    pub fn add_user(&self, course_id: &str, user: User, options: SyncOptions) -> Result<SyncResult, SyncError> {
        self.sync(course_id, vec![user], options)
    }

    /// Reconcile `incoming` against the stored roster of `course_id`.
    ///
    /// Candidate passwords are either empty (one is generated) or already hashed (stored
    /// verbatim). Raw passwords must be hashed by the caller first.
    pub fn sync(&self, course_id: &str, incoming: Vec<User>, options: SyncOptions) -> Result<SyncResult, SyncError> {
        let roster = self.load(course_id)?;
        self.sync_roster(course_id, roster, incoming, options)
    }

    fn load(&self, course_id: &str) -> Result<Roster, SyncError> {
        self.store.load(course_id).map_err(|source| SyncError::Load { course_id: course_id.to_string(), source })
    }

    fn sync_roster(
        &self,
        course_id: &str,
        mut roster: Roster,
        incoming: Vec<User>,
        options: SyncOptions,
    ) -> Result<SyncResult, SyncError> {
        // Keyed by email; a repeated email keeps its last occurrence.
        let mut batch: BTreeMap<String, User> = BTreeMap::new();
        for user in incoming {
            if user.email.is_empty() {
                warn!(target: "coursegate::sync", "sync: course='{}' dropping candidate with empty email (name='{}')", course_id, user.name);
                continue;
            }
            batch.insert(user.email.clone(), user);
        }
        let batch_size = batch.len();
        debug!(target: "coursegate::sync", "sync: course='{}' candidates={} roster={} options={:?}", course_id, batch_size, roster.len(), options);

        let mut result = SyncResult::new();
        for (email, mut candidate) in batch {
            if let Some(existing) = roster.get(&email).filter(|_| !options.allow_merge) {
                result.record(Outcome::Skipped, existing.clone());
                continue;
            }

            if candidate.pass.is_empty() {
                let plaintext = self.credentials.generate().map_err(|source| SyncError::Password { email: email.clone(), source })?;
                candidate.pass = self.credentials.hash(&plaintext).map_err(|source| SyncError::Password { email: email.clone(), source })?;
                result.clear_text_passwords.insert(email.clone(), plaintext);
            }

            match roster.get_mut(&email) {
                None => {
                    if candidate.role == Role::Unknown {
                        candidate.role = Role::Other;
                    }
                    roster.insert(email, candidate.clone());
                    result.record(Outcome::Added, candidate);
                }
                Some(local) => {
                    if local.merge(&candidate) {
                        result.record(Outcome::Modified, local.clone());
                    }
                }
            }
        }

        if options.dry_run {
            info!(target: "coursegate::sync", "sync (dry run): course='{}' {}", course_id, result.summary());
            return Ok(result);
        }

        if result.added.is_empty() && result.modified.is_empty() {
            debug!(target: "coursegate::sync", "sync: course='{}' roster unchanged, not saving", course_id);
            return Ok(result);
        }

        self.store
            .save(course_id, &roster)
            .map_err(|source| SyncError::Save { course_id: course_id.to_string(), source })?;
        info!(target: "coursegate::sync", "sync: course='{}' {}", course_id, result.summary());

        if options.notify {
            let hints = NotifyHints { dry_run: options.dry_run, space_out: batch_size > 1 };
            self.send_notifications(&result, hints);
        }

        Ok(result)
    }

    fn send_notifications(&self, result: &SyncResult, hints: NotifyHints) {
        for user in &result.added {
            let plaintext = result.generated_password(&user.email);
            if let Err(e) = self.notifier.account_created(user, plaintext, hints) {
                warn!(target: "coursegate::sync", "notify: account-created for '{}' failed: {}", user.email, e);
            }
        }

        // Only generated passwords trigger a message; metadata edits and caller-supplied
        // hashes stay silent.
        for user in &result.modified {
            let Some(plaintext) = result.generated_password(&user.email) else { continue; };
            if let Err(e) = self.notifier.password_reset(user, plaintext, hints) {
                warn!(target: "coursegate::sync", "notify: password-reset for '{}' failed: {}", user.email, e);
            }
        }
    }
}
