//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the wrapper.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the job wrapper.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct WrapperConfig {
    /// Listener configuration (bind address, body limits).
    pub listener: ListenerConfig,

    /// Where the job manifest lives.
    pub manifest: ManifestConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Memory profiler settings.
    pub profiler: ProfilerConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:7000").
    pub bind_address: String,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:7000".to_string(),
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Manifest location.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ManifestConfig {
    /// Path to the manifest, relative to the working directory.
    pub path: String,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            path: crate::manifest::MANIFEST_FILENAME.to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of human-readable ones.
    pub structured_logs: bool,

    /// Log one line per served request.
    pub access_log: bool,

    /// Expose Prometheus metrics at /metrics.
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "debug".to_string(),
            structured_logs: false,
            access_log: false,
            metrics_enabled: true,
        }
    }
}

/// Memory profiler configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProfilerConfig {
    /// Enable the memory profiler.
    pub enabled: bool,

    /// Leak-detection mode: report memory retained since the profiler started.
    pub leaks: bool,

    /// Binary trace output.
    pub report_path: String,

    /// Rendered HTML output.
    pub timeline_path: String,

    /// Interval between samples in milliseconds.
    pub sample_interval_ms: u64,
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            leaks: false,
            report_path: "memory-report.bin".to_string(),
            timeline_path: "memory-timeline.html".to_string(),
            sample_interval_ms: 100,
        }
    }
}
