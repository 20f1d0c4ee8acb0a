//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Request path:
//!     → access_log.rs (one line per non-probe request)
//!
//! Consumers:
//!     → stdout (plain or JSON)
//!     → GET /metrics (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through logs via the `x-request-id` header
//! - Metrics are cheap (atomic increments)
//! - Access log is opt-in

pub mod access_log;
pub mod logging;
pub mod metrics;

pub use logging::init_logging;
