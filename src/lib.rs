//! Job wrapper library: serve a user job as an HTTP API.

pub mod config;
pub mod datamodel;
pub mod health;
pub mod http;
pub mod job;
pub mod lifecycle;
pub mod manifest;
pub mod observability;
pub mod profiler;

pub use config::schema::WrapperConfig;
pub use http::JobServer;
pub use job::{EndpointConfig, JobEntrypoint, JobError, ParamSpec, Params, StaticEndpoint};
pub use lifecycle::{serve_job_class, serve_job_instance, Shutdown};
