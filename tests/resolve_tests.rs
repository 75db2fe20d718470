//! Context resolution integration tests: field validation, authentication, role checks
//! and assignment lookups through the public resolver API.

use std::sync::Arc;

use anyhow::Result;

use coursegate::identity::{
    ApiRequest, AssignmentFields, ContextResolver, CourseDirectory, CourseUserFields, Layers, MemoryCourseDirectory,
    RequestContext, RequestRegistry,
};
use coursegate::security::{Argon2Credentials, CredentialProvider};
use coursegate::{Course, ErrorKind, Role, User};

#[derive(Debug, Clone)]
struct Ping;

impl ApiRequest for Ping {
    const KIND: &'static str = "ping";
    const LAYERS: Layers = Layers::Base;
    const MIN_ROLE: Option<Role> = None;
}

#[derive(Debug, Clone)]
struct ListUsers {
    ctx: CourseUserFields,
}

impl ApiRequest for ListUsers {
    const KIND: &'static str = "course/users/list";
    const LAYERS: Layers = Layers::CourseUser;
    const MIN_ROLE: Option<Role> = Some(Role::Grader);
    fn course_user(&self) -> Option<&CourseUserFields> { Some(&self.ctx) }
}

#[derive(Debug, Clone)]
struct Submit {
    ctx: CourseUserFields,
    asg: AssignmentFields,
}

impl ApiRequest for Submit {
    const KIND: &'static str = "submit";
    const LAYERS: Layers = Layers::Assignment;
    const MIN_ROLE: Option<Role> = Some(Role::Student);
    fn course_user(&self) -> Option<&CourseUserFields> { Some(&self.ctx) }
    fn assignment(&self) -> Option<&AssignmentFields> { Some(&self.asg) }
}

#[derive(Debug, Clone)]
struct NoRole {
    ctx: CourseUserFields,
}

impl ApiRequest for NoRole {
    const KIND: &'static str = "misconfigured";
    const LAYERS: Layers = Layers::CourseUser;
    const MIN_ROLE: Option<Role> = None;
    fn course_user(&self) -> Option<&CourseUserFields> { Some(&self.ctx) }
}

#[derive(Debug, Clone)]
struct Unregistered;

impl ApiRequest for Unregistered {
    const KIND: &'static str = "unregistered";
    const LAYERS: Layers = Layers::Base;
    const MIN_ROLE: Option<Role> = None;
}

const PASS: &str = "correct horse";

struct Fixture {
    resolver: ContextResolver,
    lookups: Arc<CountingDirectory>,
}

/// Wraps the directory so tests can tell whether a lookup happened.
struct CountingDirectory {
    inner: MemoryCourseDirectory,
    hits: std::sync::atomic::AtomicUsize,
}

impl CourseDirectory for CountingDirectory {
    fn course(&self, course_id: &str) -> Option<Arc<Course>> {
        self.hits.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.inner.course(course_id)
    }
}

impl CountingDirectory {
    fn hits(&self) -> usize { self.hits.load(std::sync::atomic::Ordering::SeqCst) }
}

fn fixture() -> Result<Fixture> {
    let creds = Arc::new(Argon2Credentials::with_params(8, 1, 1)?);
    let mut course = Course::new("cse101", "Intro");
    for (email, role) in [
        ("other@x.com", Role::Other),
        ("student@x.com", Role::Student),
        ("grader@x.com", Role::Grader),
        ("admin@x.com", Role::Admin),
        ("owner@x.com", Role::Owner),
    ] {
        let u = User::new(email, email, role).with_pass(creds.hash(PASS)?);
        course.roster.insert(email.to_string(), u);
    }
    course.add_assignment("hw0", Some("Warmup"));

    let directory = MemoryCourseDirectory::new();
    directory.insert(course);
    let lookups = Arc::new(CountingDirectory { inner: directory, hits: Default::default() });

    let registry = RequestRegistry::new()
        .register::<Ping>()
        .register::<ListUsers>()
        .register::<Submit>()
        .register::<NoRole>();
    let resolver = ContextResolver::new(Arc::new(registry), lookups.clone(), creds);
    Ok(Fixture { resolver, lookups })
}

fn list_users(course: &str, email: &str, pass: &str) -> ListUsers {
    ListUsers { ctx: CourseUserFields::new(course, email, pass) }
}

fn submit(email: &str, assignment: &str) -> Submit {
    Submit { ctx: CourseUserFields::new("cse101", email, PASS), asg: AssignmentFields::new(assignment) }
}

#[test]
fn base_only_request_is_stamped() -> Result<()> {
    let f = fixture()?;
    let r = f.resolver.resolve(Ping, "ping")?;
    assert_eq!(r.context.layers(), Layers::Base);
    assert_eq!(r.context.base().endpoint, "ping");
    assert!(!r.context.request_id().is_empty());
    assert!(r.context.course_user().is_none());
    assert_eq!(f.lookups.hits(), 0);
    Ok(())
}

#[test]
fn missing_fields_fail_before_lookup() -> Result<()> {
    let f = fixture()?;
    let cases = [
        (list_users("", "grader@x.com", PASS), "missing_course_id"),
        (list_users("cse101", "", PASS), "missing_user_email"),
        (list_users("cse101", "grader@x.com", ""), "missing_user_pass"),
        (list_users("", "", ""), "missing_course_id"),
    ];
    for (req, code) in cases {
        let err = f.resolver.resolve(req, "course/users/list").unwrap_err();
        assert_eq!(err.kind, ErrorKind::BadRequest);
        assert_eq!(err.code, code);
        assert_eq!(err.endpoint, "course/users/list");
        assert!(err.request_id.is_some());
    }
    assert_eq!(f.lookups.hits(), 0, "no store lookup should happen for malformed requests");
    Ok(())
}

#[test]
fn unknown_course_is_bad_request() -> Result<()> {
    let f = fixture()?;
    let err = f.resolver.resolve(list_users("cse999", "grader@x.com", PASS), "ep").unwrap_err();
    assert_eq!(err.kind, ErrorKind::BadRequest);
    assert_eq!(err.code, "course_not_found");
    assert_eq!(err.details.get("course-id").map(String::as_str), Some("cse999"));
    Ok(())
}

#[test]
fn unknown_user_and_bad_password_look_identical() -> Result<()> {
    let f = fixture()?;
    let unknown = f.resolver.resolve(list_users("cse101", "nobody@x.com", PASS), "ep").unwrap_err();
    let wrong = f.resolver.resolve(list_users("cse101", "grader@x.com", "nope"), "ep").unwrap_err();
    for e in [&unknown, &wrong] {
        assert_eq!(e.kind, ErrorKind::Unauthenticated);
        assert_eq!(e.http_status(), 401);
    }
    assert_eq!(unknown.code, wrong.code);
    assert_eq!(unknown.message, wrong.message);
    assert_eq!(unknown.details, wrong.details);
    Ok(())
}

#[test]
fn role_threshold_for_every_role() -> Result<()> {
    let f = fixture()?;
    for (email, role) in [
        ("other@x.com", Role::Other),
        ("student@x.com", Role::Student),
        ("grader@x.com", Role::Grader),
        ("admin@x.com", Role::Admin),
        ("owner@x.com", Role::Owner),
    ] {
        let res = f.resolver.resolve(list_users("cse101", email, PASS), "course/users/list");
        if role >= Role::Grader {
            let r = res?;
            let cu = r.context.course_user().expect("course/user layer");
            assert_eq!(cu.user.email, email);
            assert_eq!(cu.user.role, role);
            assert_eq!(cu.course.id, "cse101");
            assert_eq!(cu.user_pass, PASS);
        } else {
            let err = res.unwrap_err();
            assert_eq!(err.kind, ErrorKind::PermissionDenied, "{}", email);
            assert_eq!(err.required_role(), Some(Role::Grader));
            assert!(!err.public_body().to_string().contains("grader\""));
        }
    }
    Ok(())
}

#[test]
fn undeclared_role_is_internal() -> Result<()> {
    let f = fixture()?;
    assert_eq!(f.resolver.registry().undeclared_roles(), vec!["misconfigured"]);
    let err = f.resolver
        .resolve(NoRole { ctx: CourseUserFields::new("cse101", "owner@x.com", PASS) }, "ep")
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Internal);
    assert_eq!(err.code, "undeclared_role");
    Ok(())
}

#[test]
fn unregistered_kind_is_internal() -> Result<()> {
    let f = fixture()?;
    let err = f.resolver.resolve(Unregistered, "ep").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Internal);
    assert_eq!(err.code, "unknown_request_kind");
    Ok(())
}

#[test]
fn assignment_layer_resolves() -> Result<()> {
    let f = fixture()?;
    let r = f.resolver.resolve(submit("student@x.com", "hw0"), "submit")?;
    assert_eq!(r.context.layers(), Layers::Assignment);
    let a = r.context.assignment().expect("assignment layer");
    assert_eq!(a.assignment.id, "hw0");
    assert_eq!(a.assignment.course_id, "cse101");
    assert_eq!(a.course_user.user.email, "student@x.com");
    assert_eq!(r.request.asg.assignment_id, "hw0");
    Ok(())
}

#[test]
fn assignment_errors() -> Result<()> {
    let f = fixture()?;
    let err = f.resolver.resolve(submit("student@x.com", ""), "submit").unwrap_err();
    assert_eq!((err.kind, err.code.as_str()), (ErrorKind::BadRequest, "missing_assignment_id"));

    let err = f.resolver.resolve(submit("student@x.com", "hw9"), "submit").unwrap_err();
    assert_eq!((err.kind, err.code.as_str()), (ErrorKind::BadRequest, "assignment_not_found"));
    assert_eq!(err.details.get("assignment-id").map(String::as_str), Some("hw9"));
    Ok(())
}

#[test]
fn role_check_precedes_assignment_lookup() -> Result<()> {
    let f = fixture()?;
    // An under-privileged caller learns nothing about the assignment, real or not.
    for asg in ["hw0", "hw9", ""] {
        let err = f.resolver.resolve(submit("other@x.com", asg), "submit").unwrap_err();
        assert_eq!(err.kind, ErrorKind::PermissionDenied, "assignment {:?}", asg);
    }
    Ok(())
}

#[test]
fn repeated_resolution_differs_only_in_stamp() -> Result<()> {
    let f = fixture()?;
    let a = f.resolver.resolve(submit("grader@x.com", "hw0"), "submit")?;
    let b = f.resolver.resolve(submit("grader@x.com", "hw0"), "submit")?;
    assert_ne!(a.context.request_id(), b.context.request_id());
    assert!(b.context.base().timestamp >= a.context.base().timestamp);

    let (ca, cb) = (a.context.assignment().unwrap(), b.context.assignment().unwrap());
    assert_eq!(ca.assignment, cb.assignment);
    assert_eq!(ca.course_user.user, cb.course_user.user);
    assert_eq!(ca.course_user.course, cb.course_user.course);
    assert_eq!(ca.course_user.base.endpoint, cb.course_user.base.endpoint);
    Ok(())
}

#[test]
fn context_debug_redacts_credential() -> Result<()> {
    let f = fixture()?;
    let r = f.resolver.resolve(list_users("cse101", "admin@x.com", PASS), "ep")?;
    let RequestContext::CourseUser(cu) = &r.context else { panic!("expected course/user context") };
    assert!(!format!("{:?}", cu).contains(PASS));
    assert!(!format!("{:?}", r.request).contains(PASS));
    Ok(())
}

/// Delegates to Argon2 and counts verifications.
struct CountingCredentials {
    inner: Argon2Credentials,
    verifies: std::sync::atomic::AtomicUsize,
}

impl CredentialProvider for CountingCredentials {
    fn generate(&self) -> Result<String, coursegate::security::CredentialError> { self.inner.generate() }
    fn hash(&self, plaintext: &str) -> Result<String, coursegate::security::CredentialError> { self.inner.hash(plaintext) }
    fn verify(&self, stored_hash: &str, supplied: &str) -> bool {
        self.verifies.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.inner.verify(stored_hash, supplied)
    }
    fn decoy_hash(&self) -> &str { self.inner.decoy_hash() }
}

#[test]
fn unknown_user_costs_one_verification() -> Result<()> {
    let inner = Argon2Credentials::with_params(8, 1, 1)?;
    let mut course = Course::new("cse101", "Intro");
    course.roster.insert("a@x.com".into(), User::new("a@x.com", "A", Role::Admin).with_pass(inner.hash(PASS)?));
    let directory = MemoryCourseDirectory::new();
    directory.insert(course);

    let creds = Arc::new(CountingCredentials { inner, verifies: Default::default() });
    let resolver = ContextResolver::new(
        Arc::new(RequestRegistry::new().register::<ListUsers>()),
        Arc::new(directory),
        creds.clone(),
    );
    let count = || creds.verifies.load(std::sync::atomic::Ordering::SeqCst);

    let before = count();
    let err = resolver.resolve(list_users("cse101", "nobody@x.com", PASS), "ep").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Unauthenticated);
    assert_eq!(count() - before, 1, "unknown email must still run one verification");

    let before = count();
    let err = resolver.resolve(list_users("cse101", "a@x.com", "wrong"), "ep").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Unauthenticated);
    assert_eq!(count() - before, 1);

    // The decoy is a real Argon2 hash, so the unknown-user path does real work.
    assert!(creds.decoy_hash().starts_with("$argon2id$"));
    Ok(())
}
