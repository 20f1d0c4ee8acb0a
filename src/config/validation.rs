//! Configuration validation.
//!
//! Serde handles syntax; this module checks values. All errors are
//! collected, not just the first one.

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::WrapperConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// A single semantic configuration problem.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid bind address \"{0}\"")]
    InvalidBindAddress(String),

    #[error("unknown log level \"{0}\"")]
    InvalidLogLevel(String),

    #[error("max_body_bytes must be greater than zero")]
    ZeroBodyLimit,

    #[error("manifest path must not be empty")]
    EmptyManifestPath,

    #[error("profiler sample_interval_ms must be greater than zero")]
    ZeroSampleInterval,

    #[error("profiler report and timeline paths must differ")]
    ProfilerPathClash,
}

/// Check a configuration, returning every problem found.
pub fn validate_config(config: &WrapperConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }
    if config.listener.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }
    if config.manifest.path.trim().is_empty() {
        errors.push(ValidationError::EmptyManifestPath);
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::InvalidLogLevel(
            config.observability.log_level.clone(),
        ));
    }

    if config.profiler.sample_interval_ms == 0 {
        errors.push(ValidationError::ZeroSampleInterval);
    }
    if config.profiler.report_path == config.profiler.timeline_path {
        errors.push(ValidationError::ProfilerPathClash);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(validate_config(&WrapperConfig::default()), Ok(()));
    }

    #[test]
    fn collects_all_errors() {
        let mut config = WrapperConfig::default();
        config.listener.bind_address = "nowhere".to_string();
        config.observability.log_level = "loud".to_string();
        config.profiler.sample_interval_ms = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::InvalidBindAddress("nowhere".to_string()),
                ValidationError::InvalidLogLevel("loud".to_string()),
                ValidationError::ZeroSampleInterval,
            ]
        );
    }
}
