use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::request::Layers;
use crate::model::{Assignment, Course, User};

/// Metadata stamped on every request during resolution. Never supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BaseContext {
    pub request_id: String,
    pub endpoint: String,
    pub timestamp: DateTime<Utc>,
}

impl BaseContext {
    pub fn stamp(endpoint: &str) -> Self {
        Self { request_id: uuid::Uuid::new_v4().to_string(), endpoint: endpoint.to_string(), timestamp: Utc::now() }
    }
}

/// An authenticated and authorized user within a located course.
#[derive(Clone)]
pub struct CourseUserContext {
    pub base: BaseContext,
    pub course_id: String,
    pub user_email: String,
    /// The credential exactly as supplied on the request.
    pub user_pass: String,
    pub course: Arc<Course>,
    pub user: User,
}

impl std::fmt::Debug for CourseUserContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CourseUserContext")
            .field("base", &self.base)
            .field("course_id", &self.course_id)
            .field("user_email", &self.user_email)
            .field("user_pass", &"<redacted>")
            .field("role", &self.user.role)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AssignmentContext {
    pub course_user: CourseUserContext,
    pub assignment_id: String,
    pub assignment: Assignment,
}

/// A fully resolved context. The variant is the innermost layer the request type declared.
#[derive(Debug, Clone)]
pub enum RequestContext {
    Base(BaseContext),
    CourseUser(CourseUserContext),
    Assignment(AssignmentContext),
}

impl RequestContext {
    pub fn layers(&self) -> Layers {
        match self {
            RequestContext::Base(_) => Layers::Base,
            RequestContext::CourseUser(_) => Layers::CourseUser,
            RequestContext::Assignment(_) => Layers::Assignment,
        }
    }

    pub fn base(&self) -> &BaseContext {
        match self {
            RequestContext::Base(b) => b,
            RequestContext::CourseUser(cu) => &cu.base,
            RequestContext::Assignment(a) => &a.course_user.base,
        }
    }

    pub fn course_user(&self) -> Option<&CourseUserContext> {
        match self {
            RequestContext::Base(_) => None,
            RequestContext::CourseUser(cu) => Some(cu),
            RequestContext::Assignment(a) => Some(&a.course_user),
        }
    }

    pub fn assignment(&self) -> Option<&AssignmentContext> {
        match self {
            RequestContext::Assignment(a) => Some(a),
            _ => None,
        }
    }

    pub fn request_id(&self) -> &str { &self.base().request_id }
}

/// The request value together with the context resolved for it.
#[derive(Debug, Clone)]
pub struct Resolved<R> {
    pub request: R,
    pub context: RequestContext,
}
