//! Raw value → typed model conversion.

use std::path::Path;

use serde_json::{Map, Number, Value};

use crate::datamodel::error::{DataModelError, Result};
use crate::datamodel::schema::{DataModel, Presence, RecordSchema, Schema, UnionSchema};

const ROOT: &str = "$";

/// Parse a raw value into `T`, checking it against `T::schema()` first.
pub fn parse_object<T: DataModel>(value: Value) -> Result<T> {
    let normalized = normalize(value, &T::schema())?;
    serde_json::from_value(normalized).map_err(|source| DataModelError::Construction {
        type_name: std::any::type_name::<T>(),
        source,
    })
}

/// Parse a mapping into a record type.
pub fn parse_dict_datamodel<T: DataModel>(value: Map<String, Value>) -> Result<T> {
    parse_object(Value::Object(value))
}

/// Parse a list of mappings into record types.
pub fn parse_dict_datamodels<T: DataModel>(values: Vec<Map<String, Value>>) -> Result<Vec<T>> {
    values.into_iter().map(parse_dict_datamodel).collect()
}

/// Parse YAML text into `T`. An empty document counts as an empty mapping.
pub fn parse_yaml_datamodel<T: DataModel>(yaml: &str) -> Result<T> {
    if yaml.trim().is_empty() {
        return parse_object(Value::Object(Map::new()));
    }
    let data: Value = serde_yaml::from_str(yaml)?;
    let data = match data {
        Value::Null => Value::Object(Map::new()),
        other => other,
    };
    parse_object(data)
}

/// Parse a YAML file into `T`. The file must exist.
pub fn parse_yaml_file_datamodel<T: DataModel>(path: &Path) -> Result<T> {
    if !path.is_file() {
        return Err(DataModelError::FileNotFound(path.to_path_buf()));
    }
    let text = std::fs::read_to_string(path)?;
    parse_yaml_datamodel(&text)
}

/// Check `value` against `schema` and return it in canonical form.
///
/// Record keys are validated, scalars are coerced to their declared type,
/// unions are resolved to a single alternative. The result is ready for
/// plain serde deserialization.
pub fn normalize(value: Value, schema: &Schema) -> Result<Value> {
    normalize_at(value, schema, ROOT)
}

fn normalize_at(value: Value, schema: &Schema, path: &str) -> Result<Value> {
    match schema {
        Schema::Any => Ok(value),
        Schema::Optional(inner) => {
            if value.is_null() {
                Ok(Value::Null)
            } else {
                normalize_at(value, inner, path)
            }
        }
        Schema::Union(union) => parse_union(value, union, path),
        _ if value.is_null() => Err(DataModelError::UnexpectedNull {
            path: path.to_string(),
        }),
        Schema::Record(record) => parse_record(value, record, path),
        Schema::List(inner) => match value {
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| normalize_at(item, inner, &format!("{}[{}]", path, i)))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            other => Err(mismatch(path, "list", &other)),
        },
        Schema::Map(inner) => match value {
            Value::Object(entries) => entries
                .into_iter()
                .map(|(key, item)| {
                    let item_path = child_path(path, &key);
                    normalize_at(item, inner, &item_path).map(|item| (key, item))
                })
                .collect::<Result<Map<_, _>>>()
                .map(Value::Object),
            other => Err(mismatch(path, "mapping", &other)),
        },
        Schema::Str => coerce_str(value, path),
        Schema::Int => coerce_int(value, path),
        Schema::Float => coerce_float(value, path),
        Schema::Bool => coerce_bool(value, path),
        Schema::Custom(_) => Ok(value),
    }
}

fn parse_record(value: Value, record: &RecordSchema, path: &str) -> Result<Value> {
    let entries = match value {
        Value::Object(entries) => entries,
        other => return Err(mismatch(path, "mapping", &other)),
    };

    let mut parsed = Map::with_capacity(entries.len());
    for (key, raw) in entries {
        let field = record
            .get(&key)
            .ok_or_else(|| DataModelError::UnknownField {
                path: path.to_string(),
                record: record.name(),
                field: key.clone(),
            })?;
        let field_path = child_path(path, &key);

        if raw.is_null() && !field.schema().accepts_null() {
            match field.presence() {
                Presence::Defaulted => continue,
                Presence::Required | Presence::Optional => {
                    return Err(DataModelError::UnexpectedNull { path: field_path });
                }
            }
        }

        let value = normalize_at(raw, field.schema(), &field_path)?;
        parsed.insert(key, value);
    }

    if let Some(missing) = record
        .fields()
        .iter()
        .find(|field| field.presence() == Presence::Required && !parsed.contains_key(field.name()))
    {
        return Err(DataModelError::MissingField {
            path: path.to_string(),
            record: record.name(),
            field: missing.name(),
        });
    }

    Ok(Value::Object(parsed))
}

fn parse_union(value: Value, union: &UnionSchema, path: &str) -> Result<Value> {
    if value.is_null() {
        return Ok(Value::Null);
    }

    let alternatives = union.alternatives();
    let chosen = alternatives
        .iter()
        .find(|alt| alt.is_record())
        .or_else(|| alternatives.first());

    match chosen {
        Some(schema) => normalize_at(value, schema, path),
        None => Err(DataModelError::NoUnionMatch {
            path: path.to_string(),
            union: union.to_string(),
        }),
    }
}

fn coerce_str(value: Value, path: &str) -> Result<Value> {
    match value {
        Value::String(_) => Ok(value),
        Value::Number(n) => Ok(Value::String(n.to_string())),
        Value::Bool(b) => Ok(Value::String(b.to_string())),
        other => Err(mismatch(path, "string", &other)),
    }
}

fn coerce_int(value: Value, path: &str) -> Result<Value> {
    match value {
        Value::Number(ref n) if n.is_i64() || n.is_u64() => Ok(value),
        Value::Number(n) => {
            // Floats truncate toward zero.
            let truncated = n.as_f64().filter(|f| f.is_finite()).map(f64::trunc);
            match truncated {
                Some(f) if f >= i64::MIN as f64 && f <= i64::MAX as f64 => Ok(Value::from(f as i64)),
                _ => Err(coercion(path, &n.to_string(), "int")),
            }
        }
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| coercion(path, &s, "int")),
        Value::Bool(b) => Ok(Value::from(b as i64)),
        other => Err(mismatch(path, "int", &other)),
    }
}

fn coerce_float(value: Value, path: &str) -> Result<Value> {
    match value {
        Value::Number(_) => Ok(value),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| coercion(path, &s, "float")),
        Value::Bool(b) => Ok(Value::from(if b { 1.0 } else { 0.0 })),
        other => Err(mismatch(path, "float", &other)),
    }
}

fn coerce_bool(value: Value, path: &str) -> Result<Value> {
    match value {
        Value::Bool(_) => Ok(value),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(coercion(path, &s, "bool")),
        },
        Value::Number(n) => Ok(Value::Bool(n.as_f64().is_some_and(|f| f != 0.0))),
        other => Err(mismatch(path, "bool", &other)),
    }
}

fn child_path(path: &str, key: &str) -> String {
    format!("{}.{}", path, key)
}

fn mismatch(path: &str, expected: &'static str, found: &Value) -> DataModelError {
    DataModelError::TypeMismatch {
        path: path.to_string(),
        expected,
        found: kind_of(found),
    }
}

fn coercion(path: &str, value: &str, expected: &'static str) -> DataModelError {
    DataModelError::Coercion {
        path: path.to_string(),
        value: format!("{:?}", value),
        expected,
    }
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "mapping",
    }
}
