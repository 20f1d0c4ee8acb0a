//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults (schema.rs)
//!     → optional TOML file (loader.rs)
//!     → environment overrides (loader.rs)
//!     → validation.rs (semantic checks)
//!     → WrapperConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Environment is read once, at startup
//! - All fields have defaults so an empty config is valid
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{ListenerConfig, ManifestConfig, ObservabilityConfig, ProfilerConfig, WrapperConfig};
