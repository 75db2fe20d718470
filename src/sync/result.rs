use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::User;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SyncOptions {
    /// Merge incoming fields into existing users instead of skipping them.
    #[serde(default)]
    pub allow_merge: bool,
    /// Classify only: nothing is persisted and nobody is notified.
    #[serde(default)]
    pub dry_run: bool,
    /// Send account-created / password-reset messages after persisting.
    #[serde(default)]
    pub notify: bool,
}

impl SyncOptions {
    pub fn new() -> Self { Self::default() }
    pub fn allow_merge(mut self, v: bool) -> Self { self.allow_merge = v; self }
    pub fn dry_run(mut self, v: bool) -> Self { self.dry_run = v; self }
    pub fn notify(mut self, v: bool) -> Self { self.notify = v; self }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Skipped,
    Added,
    Modified,
}

/// What one sync call did. The three lists are disjoint.
///
/// `clear_text_passwords` holds plaintext only for passwords generated during this call.
/// It is never persisted and exists to feed notifications.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SyncResult {
    pub skipped: Vec<User>,
    pub added: Vec<User>,
    pub modified: Vec<User>,
    pub clear_text_passwords: BTreeMap<String, String>,
}

impl SyncResult {
    pub fn new() -> Self { Self::default() }

    pub(crate) fn record(&mut self, outcome: Outcome, user: User) {
        match outcome {
            Outcome::Skipped => self.skipped.push(user),
            Outcome::Added => self.added.push(user),
            Outcome::Modified => self.modified.push(user),
        }
    }

    pub fn outcome_of(&self, email: &str) -> Option<Outcome> {
        let has = |v: &[User]| v.iter().any(|u| u.email == email);
        if has(&self.skipped) { Some(Outcome::Skipped) }
        else if has(&self.added) { Some(Outcome::Added) }
        else if has(&self.modified) { Some(Outcome::Modified) }
        else { None }
    }

    pub fn generated_password(&self, email: &str) -> Option<&str> {
        self.clear_text_passwords.get(email).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool { self.skipped.is_empty() && self.added.is_empty() && self.modified.is_empty() }

    /// One-line summary for logs: counts and emails, never passwords.
    pub fn summary(&self) -> String {
        let emails = |v: &[User]| v.iter().map(|u| u.email.as_str()).collect::<Vec<_>>().join(",");
        format!(
            "skipped={} [{}] added={} [{}] modified={} [{}] generated={}",
            self.skipped.len(), emails(&self.skipped),
            self.added.len(), emails(&self.added),
            self.modified.len(), emails(&self.modified),
            self.clear_text_passwords.len()
        )
    }
}

impl std::fmt::Debug for SyncResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncResult")
            .field("skipped", &self.skipped)
            .field("added", &self.added)
            .field("modified", &self.modified)
            .field("clear_text_passwords", &self.clear_text_passwords.keys().collect::<Vec<_>>())
            .finish()
    }
}
