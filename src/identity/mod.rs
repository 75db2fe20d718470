//! Request identity: per-type declarations, the request registry, and the staged
//! resolver that turns a deserialized request into an authenticated, authorized context.
//! Keep the public surface thin and split implementation across sub-modules.

mod directory;
mod registry;
mod request;
mod request_context;
mod resolver;

pub use directory::{CourseDirectory, MemoryCourseDirectory};
pub use registry::{RequestRegistry, RequestSpec};
pub use request::{ApiRequest, AssignmentFields, CourseUserFields, Layers};
pub use request_context::{AssignmentContext, BaseContext, CourseUserContext, RequestContext, Resolved};
pub use resolver::ContextResolver;
