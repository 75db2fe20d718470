use std::collections::HashMap;

use tracing::warn;

use super::request::{ApiRequest, Layers};
use crate::role::Role;

/// Static declaration of one request type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestSpec {
    pub kind: &'static str,
    pub layers: Layers,
    pub min_role: Option<Role>,
}

impl RequestSpec {
    pub fn of<R: ApiRequest>() -> Self {
        Self { kind: R::KIND, layers: R::LAYERS, min_role: R::MIN_ROLE }
    }

    /// Course-scoped but no minimum role.
    pub fn is_missing_role(&self) -> bool { self.layers.needs_course_user() && self.min_role.is_none() }
}

/// Request kind -> declaration. Built once at startup, read by every resolve.
#[derive(Debug, Clone, Default)]
pub struct RequestRegistry {
    specs: HashMap<&'static str, RequestSpec>,
}

impl RequestRegistry {
    pub fn new() -> Self { Self::default() }

    pub fn register<R: ApiRequest>(mut self) -> Self {
        self.insert(RequestSpec::of::<R>());
        self
    }

    pub fn insert(&mut self, spec: RequestSpec) {
        if let Some(prev) = self.specs.insert(spec.kind, spec) {
            if prev != spec {
                warn!(target: "coursegate::resolve", "request kind '{}' re-registered: {:?} -> {:?}", spec.kind, prev, spec);
            }
        }
    }

    pub fn get(&self, kind: &str) -> Option<&RequestSpec> { self.specs.get(kind) }

    pub fn len(&self) -> usize { self.specs.len() }

    pub fn is_empty(&self) -> bool { self.specs.is_empty() }

    /// Kinds that would fail every resolve with "no role declared". Sorted.
    pub fn undeclared_roles(&self) -> Vec<&'static str> {
        let mut out: Vec<&'static str> = self.specs.values().filter(|s| s.is_missing_role()).map(|s| s.kind).collect();
        out.sort_unstable();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Ping;
    impl ApiRequest for Ping {
        const KIND: &'static str = "ping";
        const LAYERS: Layers = Layers::Base;
        const MIN_ROLE: Option<Role> = None;
    }

    struct Broken;
    impl ApiRequest for Broken {
        const KIND: &'static str = "broken";
        const LAYERS: Layers = Layers::Assignment;
        const MIN_ROLE: Option<Role> = None;
    }

    struct Reload;
    impl ApiRequest for Reload {
        const KIND: &'static str = "admin/course/reload";
        const LAYERS: Layers = Layers::CourseUser;
        const MIN_ROLE: Option<Role> = Some(Role::Admin);
    }

    #[test]
    fn register_and_lookup() {
        let reg = RequestRegistry::new().register::<Ping>().register::<Reload>();
        assert_eq!(reg.len(), 2);
        let spec = reg.get("admin/course/reload").unwrap();
        assert_eq!(spec.layers, Layers::CourseUser);
        assert_eq!(spec.min_role, Some(Role::Admin));
        assert!(reg.get("nope").is_none());
    }

    #[test]
    fn audit_finds_missing_roles() {
        let reg = RequestRegistry::new().register::<Ping>().register::<Broken>().register::<Reload>();
        // Base-only requests need no role.
        assert_eq!(reg.undeclared_roles(), vec!["broken"]);
    }
}
