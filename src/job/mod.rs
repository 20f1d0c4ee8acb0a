//! Job abstraction and route registration.
//!
//! # Data Flow
//! ```text
//! JobEntrypoint (entrypoint.rs)
//!     → perform + auxiliary EndpointConfigs (endpoint.rs)
//!     → static files and directories (statics.rs)
//!     → EndpointRegistry (registry.rs): validate, build Router, catalog
//! ```
//!
//! # Design Decisions
//! - Parameters are declared with builders, never inferred
//! - Registration errors are fatal at startup, not at request time
//! - Job code runs on the blocking pool; it may be CPU-bound

pub mod endpoint;
pub mod entrypoint;
pub mod registry;
pub mod statics;

pub use endpoint::{EndpointConfig, Handler, JobError, ParamSource, ParamSpec, Params};
pub use entrypoint::JobEntrypoint;
pub use registry::{EndpointRegistry, EndpointSummary, RegistryError, API_PREFIX};
pub use statics::StaticEndpoint;
