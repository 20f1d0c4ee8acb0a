//! Health and lifecycle subsystem.
//!
//! # Data Flow
//! ```text
//! Initialization thread (lifecycle::startup):
//!     construct job → mount routes → state.rs: LiveReady
//!     construction fails            → state.rs: LiveError(message)
//!
//! Orchestrator probes (handlers.rs):
//!     GET /live   → 200 once serving, whatever the job outcome
//!     GET /ready  → 200 only when LiveReady
//!     GET /health → job identity + status summary
//! ```
//!
//! # Design Decisions
//! - One writer, many readers: status is swapped atomically, never locked
//! - A failed job stays live but never ready, so the orchestrator restarts it
//! - Error text is surfaced verbatim to probes

pub mod handlers;
pub mod state;

pub use handlers::{health_router, HealthContext};
pub use state::{HealthState, HealthStatus};
