//! Typed model → raw value conversion.
//!
//! Structural conversion is serde's: records become mappings, `PathBuf`
//! becomes a string, chrono dates become ISO-8601 strings, sequences and
//! mappings recurse. Types implementing `JsonHook` route their `Serialize`
//! impl through the hook, so the hook's output is emitted verbatim.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::datamodel::error::{DataModelError, Result};
use crate::datamodel::parse::kind_of;

/// Custom serialization hook.
///
/// Implement this and forward `Serialize` to [`serialize_with_hook`]:
///
/// ```
/// use job_wrapper::datamodel::{serialize_with_hook, to_serializable, JsonHook};
/// use serde::{Serialize, Serializer};
/// use serde_json::{json, Value};
///
/// struct Celsius(f64);
///
/// impl JsonHook for Celsius {
///     fn to_json(&self) -> Value {
///         json!(format!("{}°C", self.0))
///     }
/// }
///
/// impl Serialize for Celsius {
///     fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
///         serialize_with_hook(self, serializer)
///     }
/// }
///
/// assert_eq!(to_serializable(&Celsius(21.5)).unwrap(), json!("21.5°C"));
/// ```
pub trait JsonHook {
    fn to_json(&self) -> Value;
}

/// `Serialize` body for types exposing a `JsonHook`.
pub fn serialize_with_hook<T, S>(value: &T, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    T: JsonHook + ?Sized,
    S: Serializer,
{
    value.to_json().serialize(serializer)
}

/// Convert any serializable value into a raw value tree.
pub fn to_serializable<T: Serialize + ?Sized>(value: &T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}

/// Drop null mapping entries and null sequence elements, recursively.
pub fn remove_none(value: Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .filter(|item| !item.is_null())
                .map(remove_none)
                .collect(),
        ),
        Value::Object(entries) => Value::Object(
            entries
                .into_iter()
                .filter(|(_, item)| !item.is_null())
                .map(|(key, item)| (key, remove_none(item)))
                .collect(),
        ),
        other => other,
    }
}

/// Serialize a record to a null-free mapping.
pub fn datamodel_to_dict<T: Serialize + ?Sized>(value: &T) -> Result<Map<String, Value>> {
    match remove_none(to_serializable(value)?) {
        Value::Object(entries) => Ok(entries),
        other => Err(DataModelError::NotAMapping {
            found: kind_of(&other),
        }),
    }
}

/// Serialize to compact JSON without null fields.
pub fn convert_to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let tree = remove_none(to_serializable(value)?);
    Ok(serde_json::to_string(&tree)?)
}

/// Serialize to YAML without null fields, keeping field declaration order.
pub fn convert_to_yaml<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let tree = remove_none(to_serializable(value)?);
    Ok(serde_yaml::to_string(&tree)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use serde_json::json;
    use std::path::PathBuf;

    struct Memory(&'static str);

    impl JsonHook for Memory {
        fn to_json(&self) -> Value {
            Value::String(self.0.to_string())
        }
    }

    impl Serialize for Memory {
        fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
            serialize_with_hook(self, serializer)
        }
    }

    #[derive(Serialize)]
    struct Resources {
        memory: Option<Memory>,
        workdir: PathBuf,
        created: NaiveDate,
    }

    /// A record whose hook replaces its structural form entirely.
    struct Redacted {
        #[allow(dead_code)]
        secret: String,
    }

    impl JsonHook for Redacted {
        fn to_json(&self) -> Value {
            json!({"redacted": true})
        }
    }

    impl Serialize for Redacted {
        fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
            serialize_with_hook(self, serializer)
        }
    }

    #[test]
    fn structural_conversion() {
        let resources = Resources {
            memory: Some(Memory("1Gi")),
            workdir: PathBuf::from("/srv/job"),
            created: NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
        };
        assert_eq!(
            to_serializable(&resources).unwrap(),
            json!({"memory": "1Gi", "workdir": "/srv/job", "created": "2024-02-29"})
        );
    }

    #[test]
    fn datetimes_are_iso8601() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        assert_eq!(to_serializable(&at).unwrap(), json!("2024-05-01T12:30:00Z"));
    }

    #[test]
    fn hook_takes_precedence_over_structure() {
        let value = Redacted {
            secret: "hunter2".to_string(),
        };
        assert_eq!(to_serializable(&value).unwrap(), json!({"redacted": true}));
        assert_eq!(
            to_serializable(&vec![Memory("1"), Memory("2")]).unwrap(),
            json!(["1", "2"])
        );
    }

    #[test]
    fn remove_none_is_recursive() {
        let raw = json!({
            "a": null,
            "b": [1, null, {"c": null, "d": 2}],
            "e": {"f": null},
        });
        assert_eq!(remove_none(raw), json!({"b": [1, {"d": 2}], "e": {}}));
    }

    #[test]
    fn yaml_keeps_declaration_order_and_drops_nulls() {
        #[derive(Serialize)]
        struct Ordered {
            zeta: u32,
            alpha: Option<u32>,
            mid: &'static str,
        }
        let yaml = convert_to_yaml(&Ordered {
            zeta: 1,
            alpha: None,
            mid: "x",
        })
        .unwrap();
        assert_eq!(yaml, "zeta: 1\nmid: x\n");
        assert_eq!(
            convert_to_json(&Ordered {
                zeta: 1,
                alpha: Some(2),
                mid: "x"
            })
            .unwrap(),
            r#"{"zeta":1,"alpha":2,"mid":"x"}"#
        );
    }

    #[test]
    fn dict_requires_mapping() {
        assert!(matches!(
            datamodel_to_dict(&vec![1, 2]),
            Err(DataModelError::NotAMapping { found: "list" })
        ));
    }
}
