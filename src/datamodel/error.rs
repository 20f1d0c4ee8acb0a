//! Marshalling errors.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while converting between raw values and typed records.
///
/// Paths are rendered JSONPath-style, `$` being the root value
/// (e.g. `$.git.remote`, `$.labels[2]`).
#[derive(Debug, Error)]
pub enum DataModelError {
    /// A mapping carried a key the record does not declare.
    #[error("unexpected field \"{field}\" provided to type {record} at {path}")]
    UnknownField {
        path: String,
        record: &'static str,
        field: String,
    },

    /// A required record field was absent.
    #[error("missing required field \"{field}\" of type {record} at {path}")]
    MissingField {
        path: String,
        record: &'static str,
        field: &'static str,
    },

    /// The value has the wrong shape for its slot.
    #[error("expected {expected} at {path}, got {found}")]
    TypeMismatch {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A null value landed in a non-optional slot.
    #[error("null value is not allowed at {path}")]
    UnexpectedNull { path: String },

    /// No alternative of a union accepted the value.
    #[error("none of the union types {union} match the value at {path}")]
    NoUnionMatch { path: String, union: String },

    /// A scalar could not be converted to the declared type.
    #[error("cannot convert {value} at {path} into {expected}")]
    Coercion {
        path: String,
        value: String,
        expected: &'static str,
    },

    /// The normalized tree was rejected by the type's own deserializer.
    #[error("failed to construct {type_name}: {source}")]
    Construction {
        type_name: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// Serialization produced something other than a mapping.
    #[error("expected a mapping after serialization, got {found}")]
    NotAMapping { found: &'static str },

    #[error("file doesn't exist: {0}")]
    FileNotFound(PathBuf),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DataModelError>;
