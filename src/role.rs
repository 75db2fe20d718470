//! Ordered user roles.
//!
//! Roles form a total order by ordinal. Every permission check in the crate is a
//! "minimum role" comparison: a user may act when `user.role >= required`.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Role {
    #[default]
    Unknown = 0,
    Other = 1,
    Student = 2,
    Grader = 3,
    Admin = 4,
    Owner = 5,
}

impl Role {
    pub const ALL: [Role; 6] = [Role::Unknown, Role::Other, Role::Student, Role::Grader, Role::Admin, Role::Owner];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Unknown => "unknown",
            Role::Other => "other",
            Role::Student => "student",
            Role::Grader => "grader",
            Role::Admin => "admin",
            Role::Owner => "owner",
        }
    }

    /// True when this role meets or exceeds `required`.
    pub fn satisfies(self, required: Role) -> bool { self >= required }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0:?} is not a valid role")]
pub struct ParseRoleError(pub String);

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unknown" => Ok(Role::Unknown),
            "other" => Ok(Role::Other),
            "student" => Ok(Role::Student),
            "grader" => Ok(Role::Grader),
            "admin" => Ok(Role::Admin),
            "owner" => Ok(Role::Owner),
            _ => Err(ParseRoleError(s.to_string())),
        }
    }
}

// Stored and wire forms accept only the exact names, so a load/save round trip is lossless.
impl TryFrom<String> for Role {
    type Error = ParseRoleError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Role::ALL.into_iter().find(|r| r.as_str() == s).ok_or(ParseRoleError(s))
    }
}

impl From<Role> for String {
    fn from(r: Role) -> Self { r.as_str().to_string() }
}
