use serde::{Deserialize, Serialize};

use crate::role::Role;

/// Context layers a request type needs, innermost last. Each layer implies the ones before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layers {
    Base,
    CourseUser,
    Assignment,
}

impl Layers {
    pub fn needs_course_user(self) -> bool { self >= Layers::CourseUser }
    pub fn needs_assignment(self) -> bool { self >= Layers::Assignment }
}

/// Identity fields every course-scoped request carries on the wire.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CourseUserFields {
    #[serde(default)]
    pub course_id: String,
    #[serde(default)]
    pub user_email: String,
    #[serde(default)]
    pub user_pass: String,
}

impl CourseUserFields {
    pub fn new<S: Into<String>>(course_id: S, user_email: S, user_pass: S) -> Self {
        Self { course_id: course_id.into(), user_email: user_email.into(), user_pass: user_pass.into() }
    }
}

impl std::fmt::Debug for CourseUserFields {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CourseUserFields")
            .field("course_id", &self.course_id)
            .field("user_email", &self.user_email)
            .field("user_pass", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AssignmentFields {
    #[serde(default)]
    pub assignment_id: String,
}

impl AssignmentFields {
    pub fn new<S: Into<String>>(assignment_id: S) -> Self { Self { assignment_id: assignment_id.into() } }
}

/// A deserialized API request type.
///
/// Layers and minimum role are declared per type, not discovered per value. A type
/// whose `LAYERS` include `CourseUser` must set `MIN_ROLE`; the resolver reports an
/// internal error otherwise.
///
/// ```
/// use coursegate::identity::{ApiRequest, CourseUserFields, Layers};
/// use coursegate::Role;
///
/// struct ListUsers { ctx: CourseUserFields }
///
/// impl ApiRequest for ListUsers {
///     const KIND: &'static str = "course/users/list";
///     const LAYERS: Layers = Layers::CourseUser;
///     const MIN_ROLE: Option<Role> = Some(Role::Grader);
///     fn course_user(&self) -> Option<&CourseUserFields> { Some(&self.ctx) }
/// }
/// ```
pub trait ApiRequest {
    const KIND: &'static str;
    const LAYERS: Layers;
    const MIN_ROLE: Option<Role>;

    fn course_user(&self) -> Option<&CourseUserFields> { None }
    fn assignment(&self) -> Option<&AssignmentFields> { None }
}
