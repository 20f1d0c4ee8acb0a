//! Runtime type descriptors for marshalled models.
//!
//! A `Schema` describes the shape a raw value must have to be turned into a
//! typed model. Records list their fields with a presence rule; unions list
//! their alternatives in tie-break order.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;

/// A type that can be parsed from, and serialized back into, a raw value tree.
pub trait DataModel: Serialize + DeserializeOwned {
    /// Describe the shape of this type.
    fn schema() -> Schema;
}

/// Shape of a value slot.
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    /// Mapping with a fixed set of named fields.
    Record(RecordSchema),
    /// Either null or the inner shape.
    Optional(Box<Schema>),
    /// One of several shapes, resolved in listed order.
    Union(UnionSchema),
    /// Sequence of values sharing one shape.
    List(Box<Schema>),
    /// String-keyed mapping of values sharing one shape.
    Map(Box<Schema>),
    Str,
    Int,
    Float,
    Bool,
    /// Any value, passed through untouched (null included).
    Any,
    /// Opaque value constructed by the named type's own deserializer.
    Custom(&'static str),
}

impl Schema {
    /// Schema of a model type.
    pub fn of<T: DataModel>() -> Self {
        T::schema()
    }

    pub fn optional(inner: Schema) -> Self {
        Schema::Optional(Box::new(inner))
    }

    pub fn list(inner: Schema) -> Self {
        Schema::List(Box::new(inner))
    }

    pub fn map(inner: Schema) -> Self {
        Schema::Map(Box::new(inner))
    }

    pub fn union(alternatives: Vec<Schema>) -> Self {
        Schema::Union(UnionSchema::new(alternatives))
    }

    /// True for record shapes, the ones a union tries first.
    pub fn is_record(&self) -> bool {
        matches!(self, Schema::Record(_))
    }

    /// True when null is an acceptable value.
    pub fn accepts_null(&self) -> bool {
        matches!(self, Schema::Optional(_) | Schema::Union(_) | Schema::Any)
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Schema::Record(record) => write!(f, "{}", record.name()),
            Schema::Optional(inner) => write!(f, "Optional[{}]", inner),
            Schema::Union(union) => write!(f, "{}", union),
            Schema::List(inner) => write!(f, "List[{}]", inner),
            Schema::Map(inner) => write!(f, "Dict[str, {}]", inner),
            Schema::Str => write!(f, "str"),
            Schema::Int => write!(f, "int"),
            Schema::Float => write!(f, "float"),
            Schema::Bool => write!(f, "bool"),
            Schema::Any => write!(f, "Any"),
            Schema::Custom(name) => write!(f, "{}", name),
        }
    }
}

/// How a record field behaves when absent or null.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Must be present and non-null.
    Required,
    /// May be absent; null means absent, so the type's default applies.
    Defaulted,
    /// May be absent or null.
    Optional,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSchema {
    name: &'static str,
    schema: Schema,
    presence: Presence,
}

impl FieldSchema {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn presence(&self) -> Presence {
        self.presence
    }
}

/// Field list of a record, built up front in declaration order.
///
/// ```
/// use job_wrapper::datamodel::{RecordSchema, Schema};
///
/// let git = RecordSchema::new("GitManifest")
///     .required("remote", Schema::Str)
///     .optional("branch", Schema::Str)
///     .defaulted("directory", Schema::Str);
/// assert_eq!(git.fields().len(), 3);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSchema {
    name: &'static str,
    fields: Vec<FieldSchema>,
}

impl RecordSchema {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            fields: Vec::new(),
        }
    }

    pub fn required(self, name: &'static str, schema: Schema) -> Self {
        self.field(name, schema, Presence::Required)
    }

    pub fn defaulted(self, name: &'static str, schema: Schema) -> Self {
        self.field(name, schema, Presence::Defaulted)
    }

    /// Declare an optional field. The schema is wrapped in `Schema::Optional`.
    pub fn optional(self, name: &'static str, schema: Schema) -> Self {
        let schema = match schema {
            Schema::Optional(_) => schema,
            other => Schema::optional(other),
        };
        self.field(name, schema, Presence::Optional)
    }

    fn field(mut self, name: &'static str, schema: Schema, presence: Presence) -> Self {
        self.fields.push(FieldSchema {
            name,
            schema,
            presence,
        });
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|field| field.name == name)
    }
}

impl From<RecordSchema> for Schema {
    fn from(record: RecordSchema) -> Self {
        Schema::Record(record)
    }
}

/// Alternatives of a union, in the order they are tried.
///
/// Resolution policy for a non-null value:
/// 1. the first record alternative parses the value; its error is reported
/// 2. without record alternatives, the first non-record alternative does
/// 3. an empty union matches nothing
#[derive(Debug, Clone, PartialEq)]
pub struct UnionSchema {
    alternatives: Vec<Schema>,
}

impl UnionSchema {
    pub fn new(alternatives: Vec<Schema>) -> Self {
        Self { alternatives }
    }

    pub fn alternatives(&self) -> &[Schema] {
        &self.alternatives
    }
}

impl fmt::Display for UnionSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Union[")?;
        for (i, alternative) in self.alternatives.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", alternative)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_fields_are_wrapped_once() {
        let record = RecordSchema::new("R")
            .optional("a", Schema::Str)
            .optional("b", Schema::optional(Schema::Int));
        assert_eq!(record.get("a").unwrap().schema(), &Schema::optional(Schema::Str));
        assert_eq!(record.get("b").unwrap().schema(), &Schema::optional(Schema::Int));
        assert_eq!(record.get("a").unwrap().presence(), Presence::Optional);
        assert!(record.get("c").is_none());
    }

    #[test]
    fn display_names() {
        let schema = Schema::union(vec![
            RecordSchema::new("Git").into(),
            Schema::list(Schema::Str),
            Schema::map(Schema::Float),
        ]);
        assert_eq!(schema.to_string(), "Union[Git, List[str], Dict[str, float]]");
    }
}
