//! Staged request resolution: base -> course/user -> assignment.
//!
//! Each stage takes the already-resolved outer layer and either extends it or fails.
//! The first failure is returned as-is, stamped with the request id and endpoint, and
//! no context is ever returned alongside an error.
//!
//! The role check runs before any assignment lookup, so an under-privileged caller
//! cannot learn whether an assignment exists.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::directory::CourseDirectory;
use super::registry::{RequestRegistry, RequestSpec};
use super::request::{ApiRequest, AssignmentFields, CourseUserFields};
use super::request_context::{AssignmentContext, BaseContext, CourseUserContext, RequestContext, Resolved};
use crate::error::{ApiError, ApiResult};
use crate::security::CredentialProvider;

#[derive(Clone)]
pub struct ContextResolver {
    registry: Arc<RequestRegistry>,
    courses: Arc<dyn CourseDirectory>,
    credentials: Arc<dyn CredentialProvider>,
}

impl ContextResolver {
    pub fn new(
        registry: Arc<RequestRegistry>,
        courses: Arc<dyn CourseDirectory>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        let missing = registry.undeclared_roles();
        if !missing.is_empty() {
            warn!(target: "coursegate::resolve", "request kinds without a declared role will always fail: {:?}", missing);
        }
        // Build the decoy now rather than on the first unknown-user request.
        let _ = credentials.decoy_hash();
        Self { registry, courses, credentials }
    }

    pub fn registry(&self) -> &RequestRegistry { &self.registry }

    /// Validate, authenticate and authorize `request`, returning it with its populated context.
    pub fn resolve<R: ApiRequest>(&self, request: R, endpoint: &str) -> ApiResult<Resolved<R>> {
        let base = BaseContext::stamp(endpoint);
        debug!(target: "coursegate::resolve", "resolve: rid={} endpoint='{}' kind='{}'", base.request_id, endpoint, R::KIND);

        let Some(spec) = self.registry.get(R::KIND).copied() else {
            warn!(target: "coursegate::resolve", "resolve: rid={} kind '{}' is not registered", base.request_id, R::KIND);
            return Err(stamp(
                ApiError::internal("unknown_request_kind", "Request is not any kind of known API request."),
                &base,
            ));
        };

        if !spec.layers.needs_course_user() {
            return Ok(Resolved { request, context: RequestContext::Base(base) });
        }

        let empty = CourseUserFields::default();
        let fields = request.course_user().unwrap_or(&empty);
        let course_user = self.resolve_course_user(base, fields, &spec)?;

        if !spec.layers.needs_assignment() {
            return Ok(Resolved { request, context: RequestContext::CourseUser(course_user) });
        }

        let empty = AssignmentFields::default();
        let fields = request.assignment().unwrap_or(&empty);
        let assignment = resolve_assignment(course_user, fields)?;
        Ok(Resolved { request, context: RequestContext::Assignment(assignment) })
    }

    fn resolve_course_user(
        &self,
        base: BaseContext,
        fields: &CourseUserFields,
        spec: &RequestSpec,
    ) -> ApiResult<CourseUserContext> {
        if fields.course_id.is_empty() {
            return Err(stamp(ApiError::bad_request("missing_course_id", "No course ID specified."), &base));
        }
        if fields.user_email.is_empty() {
            return Err(stamp(ApiError::bad_request("missing_user_email", "No user email specified."), &base));
        }
        if fields.user_pass.is_empty() {
            return Err(stamp(ApiError::bad_request("missing_user_pass", "No user password specified."), &base));
        }

        let Some(course) = self.courses.course(&fields.course_id) else {
            debug!(target: "coursegate::resolve", "resolve: rid={} course '{}' not found", base.request_id, fields.course_id);
            return Err(stamp(
                ApiError::bad_request("course_not_found", "Could not find course.").with_detail("course-id", fields.course_id.as_str()),
                &base,
            ));
        };

        // Unknown email and wrong password produce the same error; only the log tells them apart.
        let user = match course.user(&fields.user_email) {
            Some(u) if self.credentials.verify(&u.pass, &fields.user_pass) => u.clone(),
            Some(_) => {
                debug!(target: "coursegate::resolve", "resolve: rid={} bad password for '{}' in '{}'", base.request_id, fields.user_email, fields.course_id);
                return Err(stamp(ApiError::unauthenticated(), &base));
            }
            None => {
                // Pay the same hashing cost as a wrong password so timing does not reveal the account.
                let _ = self.credentials.verify(self.credentials.decoy_hash(), &fields.user_pass);
                debug!(target: "coursegate::resolve", "resolve: rid={} unknown user '{}' in '{}'", base.request_id, fields.user_email, fields.course_id);
                return Err(stamp(ApiError::unauthenticated(), &base));
            }
        };

        let Some(min_role) = spec.min_role else {
            warn!(target: "coursegate::resolve", "resolve: rid={} kind '{}' declares no minimum role", base.request_id, spec.kind);
            return Err(stamp(
                ApiError::internal("undeclared_role", "No role found for request. All request types require a minimum role."),
                &base,
            ));
        };

        if !user.role.satisfies(min_role) {
            info!(
                target: "coursegate::resolve",
                "resolve: rid={} denied '{}' (role {}) for '{}': requires {}",
                base.request_id, user.email, user.role, spec.kind, min_role
            );
            return Err(stamp(ApiError::permission_denied(min_role), &base));
        }

        Ok(CourseUserContext {
            course_id: fields.course_id.clone(),
            user_email: fields.user_email.clone(),
            user_pass: fields.user_pass.clone(),
            course,
            user,
            base,
        })
    }
}

fn resolve_assignment(course_user: CourseUserContext, fields: &AssignmentFields) -> ApiResult<AssignmentContext> {
    if fields.assignment_id.is_empty() {
        return Err(stamp(ApiError::bad_request("missing_assignment_id", "No assignment ID specified."), &course_user.base));
    }

    let Some(assignment) = course_user.course.assignment(&fields.assignment_id).cloned() else {
        return Err(stamp(
            ApiError::bad_request("assignment_not_found", "Could not find assignment.")
                .with_detail("course-id", course_user.course_id.as_str())
                .with_detail("assignment-id", fields.assignment_id.as_str()),
            &course_user.base,
        ));
    };

    Ok(AssignmentContext { assignment_id: fields.assignment_id.clone(), assignment, course_user })
}

fn stamp(err: ApiError, base: &BaseContext) -> ApiError {
    err.for_request(Some(base.request_id.as_str()), base.endpoint.as_str())
}
