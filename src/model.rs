//! Course, assignment and user records.
//!
//! A `Course` owns its roster (email -> `User`) and its assignments. Users are keyed
//! by email, compared case-sensitively. Passwords are only ever held as PHC hash
//! strings on a `User`; plaintext lives in `SyncResult` for the duration of one sync.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::role::Role;

/// Email -> user, ordered so persisted rosters are stable across writes.
pub type Roster = BTreeMap<String, User>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct User {
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: Role,
    /// Password hash. Empty on an incoming candidate means "generate one".
    #[serde(default)]
    pub pass: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lms_id: Option<String>,
}

impl User {
    pub fn new<S: Into<String>>(email: S, name: S, role: Role) -> Self {
        Self { email: email.into(), name: name.into(), role, pass: String::new(), lms_id: None }
    }

    pub fn with_pass<S: Into<String>>(mut self, pass_hash: S) -> Self { self.pass = pass_hash.into(); self }

    pub fn with_lms_id<S: Into<String>>(mut self, lms_id: S) -> Self { self.lms_id = Some(lms_id.into()); self }

    /// Overwrite fields of `self` with the non-empty fields of `other`.
    ///
    /// A role of `Unknown` counts as empty. The email is the key and is never touched.
    /// Returns true when at least one stored value actually changed.
    pub fn merge(&mut self, other: &User) -> bool {
        let mut changed = false;
        if !other.name.is_empty() && other.name != self.name {
            self.name = other.name.clone();
            changed = true;
        }
        if other.role != Role::Unknown && other.role != self.role {
            self.role = other.role;
            changed = true;
        }
        if !other.pass.is_empty() && other.pass != self.pass {
            self.pass = other.pass.clone();
            changed = true;
        }
        if let Some(id) = other.lms_id.as_deref().filter(|s| !s.is_empty()) {
            if self.lms_id.as_deref() != Some(id) {
                self.lms_id = Some(id.to_string());
                changed = true;
            }
        }
        changed
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Assignment {
    pub id: String,
    pub course_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Course {
    pub id: String,
    pub name: String,
    pub roster: Roster,
    pub assignments: BTreeMap<String, Assignment>,
}

impl Course {
    pub fn new<S: Into<String>>(id: S, name: S) -> Self {
        Self { id: id.into(), name: name.into(), roster: Roster::new(), assignments: BTreeMap::new() }
    }

    pub fn with_roster(mut self, roster: Roster) -> Self { self.roster = roster; self }

    /// Add an assignment scoped to this course.
    pub fn add_assignment<S: Into<String>>(&mut self, id: S, name: Option<&str>) {
        let id = id.into();
        let a = Assignment { id: id.clone(), course_id: self.id.clone(), name: name.map(|s| s.to_string()) };
        self.assignments.insert(id, a);
    }

    pub fn user(&self, email: &str) -> Option<&User> { self.roster.get(email) }

    pub fn assignment(&self, id: &str) -> Option<&Assignment> { self.assignments.get(id) }
}
