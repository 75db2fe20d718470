//! Structured errors returned by request context resolution.
//!
//! Every `ApiError` carries the request id (once one has been assigned), the endpoint,
//! a kind, a machine-readable code and a human-readable message. The required role of a
//! denied request is kept for server-side diagnostics and is never part of the public body.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use crate::role::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed or missing input, or a lookup that failed in a way safe to report.
    BadRequest,
    /// Identity could not be verified. Unknown user and wrong password look the same.
    Unauthenticated,
    /// Identity verified, role insufficient.
    PermissionDenied,
    /// Programming or configuration error.
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "bad_request",
            ErrorKind::Unauthenticated => "unauthenticated",
            ErrorKind::PermissionDenied => "permission_denied",
            ErrorKind::Internal => "internal",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiError {
    pub kind: ErrorKind,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub endpoint: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, String>,
    #[serde(skip)]
    required_role: Option<Role>,
}

impl ApiError {
    pub fn new<S: Into<String>>(kind: ErrorKind, code: S, msg: S) -> Self {
        ApiError {
            kind,
            code: code.into(),
            message: msg.into(),
            request_id: None,
            endpoint: String::new(),
            details: BTreeMap::new(),
            required_role: None,
        }
    }

    pub fn bad_request<S: Into<String>>(code: S, msg: S) -> Self { Self::new(ErrorKind::BadRequest, code, msg) }
    pub fn internal<S: Into<String>>(code: S, msg: S) -> Self { Self::new(ErrorKind::Internal, code, msg) }

    /// Authentication failure. The message is fixed so callers cannot tell an unknown
    /// email from a wrong password.
    pub fn unauthenticated() -> Self {
        Self::new(ErrorKind::Unauthenticated, "auth_failed", "Failed to authenticate.")
    }

    pub fn permission_denied(required: Role) -> Self {
        let mut e = Self::new(ErrorKind::PermissionDenied, "insufficient_role", "User does not have sufficient permissions.");
        e.required_role = Some(required);
        e
    }

    /// Stamp the request metadata. Called by the resolver on every error it returns.
    pub fn for_request<R: Into<String>, E: Into<String>>(mut self, request_id: Option<R>, endpoint: E) -> Self {
        self.request_id = request_id.map(Into::into);
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_detail<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    pub fn required_role(&self) -> Option<Role> { self.required_role }

    pub fn http_status(&self) -> u16 {
        match self.kind {
            ErrorKind::BadRequest => 400,
            ErrorKind::Unauthenticated => 401,
            ErrorKind::PermissionDenied => 403,
            ErrorKind::Internal => 500,
        }
    }

    /// JSON body safe to hand back to the caller.
    pub fn public_body(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|_| serde_json::json!({ "kind": self.kind, "code": self.code }))
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let rid = self.request_id.as_deref().unwrap_or("-");
        write!(f, "[{}] {} {}: {}: {}", rid, self.endpoint, self.kind.as_str(), self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
