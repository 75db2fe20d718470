//! Request context resolution, role-based authorization and roster synchronization
//! for a course-management backend.
//!
//! - `identity`: resolves a typed request into base -> course/user -> assignment context.
//! - `sync`: reconciles incoming users against a course roster.
//! - `storage`, `security`: roster persistence and credential collaborators.

pub mod config;
pub mod error;
pub mod identity;
pub mod model;
pub mod role;
pub mod security;
pub mod storage;
pub mod sync;

pub use error::{ApiError, ApiResult, ErrorKind};
pub use model::{Assignment, Course, Roster, User};
pub use role::Role;
