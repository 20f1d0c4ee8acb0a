//! HTTP serving subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → request.rs (request ID set and echoed)
//!     → TraceLayer, body limit, access log
//!     → reloader.rs (forward to the mounted app)
//!     → placeholder app (probes only) | job app (server.rs)
//! ```

pub mod reloader;
pub mod request;
pub mod server;

pub use reloader::AppReloader;
pub use request::X_REQUEST_ID;
pub use server::JobServer;
