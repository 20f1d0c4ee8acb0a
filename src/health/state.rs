//! Job health state machine.
//!
//! # States
//! - NotLive: process starting, listener not serving yet
//! - LiveNotReady: serving probes, job still initializing
//! - LiveReady: job constructed, all routes mounted
//! - LiveError: job construction failed, carries the error text
//!
//! # State Transitions
//! ```text
//! NotLive → LiveNotReady → LiveReady
//!    │            └──────→ LiveError
//!    └──→ LiveReady | LiveError
//! ```
//!
//! LiveReady and LiveError are terminal. Any other transition is refused and
//! logged; the state stays as it was.

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};

use crate::observability::metrics;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    NotLive,
    LiveNotReady,
    LiveReady,
    LiveError(String),
}

impl HealthStatus {
    pub fn is_live(&self) -> bool {
        !matches!(self, HealthStatus::NotLive)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, HealthStatus::LiveReady)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            HealthStatus::LiveError(message) => Some(message),
            _ => None,
        }
    }

    /// Short machine-readable name used in probe responses.
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::NotLive => "not_live",
            HealthStatus::LiveNotReady => "live",
            HealthStatus::LiveReady => "ready",
            HealthStatus::LiveError(_) => "error",
        }
    }

    /// Numeric form for the health gauge.
    pub fn as_gauge(&self) -> f64 {
        match self {
            HealthStatus::NotLive => 0.0,
            HealthStatus::LiveNotReady => 1.0,
            HealthStatus::LiveReady => 2.0,
            HealthStatus::LiveError(_) => -1.0,
        }
    }

    fn can_become(&self, next: &HealthStatus) -> bool {
        use HealthStatus::*;
        matches!(
            (self, next),
            (NotLive, LiveNotReady)
                | (NotLive, LiveReady)
                | (NotLive, LiveError(_))
                | (LiveNotReady, LiveReady)
                | (LiveNotReady, LiveError(_))
        )
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthStatus::LiveError(message) => write!(f, "error: {}", message),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Shared health state.
///
/// Written by the initialization thread, read by every probe. The status
/// lives behind an atomic pointer, so readers never block.
#[derive(Debug)]
pub struct HealthState {
    status: ArcSwap<HealthStatus>,
    started_at: DateTime<Utc>,
}

impl HealthState {
    /// Fresh state, not live yet.
    pub fn new() -> Self {
        Self::with_status(HealthStatus::NotLive)
    }

    /// State for a job that is ready from the start.
    pub fn ready() -> Self {
        Self::with_status(HealthStatus::LiveReady)
    }

    fn with_status(status: HealthStatus) -> Self {
        metrics::record_health_state(status.as_gauge());
        Self {
            status: ArcSwap::from_pointee(status),
            started_at: Utc::now(),
        }
    }

    pub fn status(&self) -> Arc<HealthStatus> {
        self.status.load_full()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn set_live(&self) -> bool {
        self.transition(HealthStatus::LiveNotReady)
    }

    pub fn set_ready(&self) -> bool {
        self.transition(HealthStatus::LiveReady)
    }

    pub fn set_error(&self, message: impl Into<String>) -> bool {
        self.transition(HealthStatus::LiveError(message.into()))
    }

    fn transition(&self, next: HealthStatus) -> bool {
        let current = self.status.load();
        let from: &HealthStatus = &current;
        if !from.can_become(&next) {
            tracing::warn!(from = %from, to = %next, "Refusing health state transition");
            return false;
        }

        let gauge = next.as_gauge();
        let next = Arc::new(next);
        let previous = self.status.compare_and_swap(&current, Arc::clone(&next));
        if !Arc::ptr_eq(&previous, &current) {
            tracing::warn!(to = %next, "Health state changed concurrently, transition dropped");
            return false;
        }

        tracing::info!(from = %from, to = %next, "Health state changed");
        metrics::record_health_state(gauge);
        true
    }
}

impl Default for HealthState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path() {
        let state = HealthState::new();
        assert!(!state.status().is_live());

        assert!(state.set_live());
        assert!(state.status().is_live());
        assert!(!state.status().is_ready());

        assert!(state.set_ready());
        assert!(state.status().is_ready());
    }

    #[test]
    fn error_is_terminal() {
        let state = HealthState::new();
        state.set_live();
        assert!(state.set_error("boom"));

        let status = state.status();
        assert!(status.is_live());
        assert!(!status.is_ready());
        assert_eq!(status.error(), Some("boom"));

        assert!(!state.set_ready());
        assert!(!state.set_live());
        assert_eq!(state.status().error(), Some("boom"));
    }

    #[test]
    fn ready_is_terminal() {
        let state = HealthState::ready();
        assert!(!state.set_live());
        assert!(!state.set_error("late"));
        assert!(state.status().is_ready());
    }
}
