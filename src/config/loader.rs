//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::WrapperConfig;
use crate::config::validation::{validate_config, ValidationError};

pub const ENV_HTTP_ADDR: &str = "JOB_HTTP_ADDR";
pub const ENV_HTTP_PORT: &str = "JOB_HTTP_PORT";
pub const ENV_MANIFEST_PATH: &str = "JOB_MANIFEST_PATH";
pub const ENV_ACCESS_LOG: &str = "JOB_ACCESS_LOG";
pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";
pub const ENV_LOG_STRUCTURED: &str = "LOG_STRUCTURED";
pub const ENV_MEMORY_PROFILER: &str = "MEMORY_PROFILER";
pub const ENV_MEMORY_PROFILER_LEAKS: &str = "MEMORY_PROFILER_LEAKS";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value \"{value}\" for {var}: {reason}")]
    Env {
        var: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration: defaults, then the optional TOML file, then the
/// process environment. The result is validated.
pub fn load_config(path: Option<&Path>) -> Result<WrapperConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => WrapperConfig::default(),
    };

    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply environment overrides using `lookup` to read variables.
pub fn apply_env_overrides<F>(config: &mut WrapperConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let addr = lookup(ENV_HTTP_ADDR);
    let port = lookup(ENV_HTTP_PORT);
    if addr.is_some() || port.is_some() {
        let (current_host, current_port) = split_host_port(&config.listener.bind_address);
        let host = addr.unwrap_or(current_host);
        let port = match port {
            Some(port) => port
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::Env {
                    var: ENV_HTTP_PORT,
                    value: port.clone(),
                    reason: "expected a port number",
                })?
                .to_string(),
            None => current_port,
        };
        config.listener.bind_address = format!("{}:{}", host, port);
    }

    if let Some(path) = lookup(ENV_MANIFEST_PATH) {
        config.manifest.path = path;
    }
    if let Some(level) = lookup(ENV_LOG_LEVEL) {
        config.observability.log_level = level.to_ascii_lowercase();
    }

    override_flag(&lookup, ENV_ACCESS_LOG, &mut config.observability.access_log)?;
    override_flag(&lookup, ENV_LOG_STRUCTURED, &mut config.observability.structured_logs)?;
    override_flag(&lookup, ENV_MEMORY_PROFILER, &mut config.profiler.enabled)?;
    override_flag(&lookup, ENV_MEMORY_PROFILER_LEAKS, &mut config.profiler.leaks)?;

    Ok(())
}

fn override_flag<F>(lookup: &F, var: &'static str, target: &mut bool) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup(var) {
        *target = parse_flag(&value).ok_or(ConfigError::Env {
            var,
            value,
            reason: "expected a boolean flag",
        })?;
    }
    Ok(())
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" | "" => Some(false),
        _ => None,
    }
}

fn split_host_port(bind_address: &str) -> (String, String) {
    match bind_address.rsplit_once(':') {
        Some((host, port)) => (host.to_string(), port.to_string()),
        None => (bind_address.to_string(), "7000".to_string()),
    }
}
