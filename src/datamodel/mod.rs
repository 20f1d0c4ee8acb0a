//! Object ⇄ record marshalling engine.
//!
//! # Data Flow
//! ```text
//! Parsing (raw → typed):
//!     YAML/JSON text
//!     → serde_json::Value tree
//!     → parse.rs (walk Value against T::schema(): strict keys, coercion, unions)
//!     → serde deserialization into T
//!
//! Serialization (typed → raw):
//!     T: Serialize (records, paths, dates, JsonHook types)
//!     → serialize.rs (to_serializable)
//!     → remove_none (strip nulls)
//!     → JSON/YAML text
//! ```
//!
//! # Design Decisions
//! - Records cannot be introspected at runtime, so every model carries an
//!   explicit `Schema` next to its serde derives
//! - Unknown keys are errors, never silently dropped
//! - Union alternatives are resolved in the order they are listed
//! - Custom serialization hooks win over structural conversion

pub mod error;
pub mod parse;
pub mod schema;
pub mod serialize;

pub use error::DataModelError;
pub use parse::{
    normalize, parse_dict_datamodel, parse_dict_datamodels, parse_object, parse_yaml_datamodel,
    parse_yaml_file_datamodel,
};
pub use schema::{DataModel, FieldSchema, Presence, RecordSchema, Schema, UnionSchema};
pub use serialize::{
    convert_to_json, convert_to_yaml, datamodel_to_dict, remove_none, serialize_with_hook,
    to_serializable, JsonHook,
};
