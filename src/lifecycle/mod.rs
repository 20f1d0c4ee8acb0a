//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load manifest → Bind → Probes up → Build job in background → Mount
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain connections → Stop profiler
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - The listener binds before the job exists, so probes answer early
//! - A job that fails to build leaves the process serving, never ready

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{late_init, serve_job_class, serve_job_instance, spawn_late_init, BoxError, ServeError};
