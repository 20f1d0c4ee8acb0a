//! Resource quantities such as `256Mi`, `10m` or `2`.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

use crate::datamodel::{serialize_with_hook, JsonHook};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid quantity \"{0}\"")]
pub struct InvalidQuantity(pub String);

/// A Kubernetes-style resource quantity.
///
/// Keeps the text it was parsed from so it serializes back unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct Quantity {
    text: String,
    value: f64,
}

/// Suffix → multiplier, longest suffixes first.
const SUFFIXES: &[(&str, f64)] = &[
    ("Ki", 1024.0),
    ("Mi", 1024.0 * 1024.0),
    ("Gi", 1024.0 * 1024.0 * 1024.0),
    ("Ti", 1024.0 * 1024.0 * 1024.0 * 1024.0),
    ("Pi", 1024.0 * 1024.0 * 1024.0 * 1024.0 * 1024.0),
    ("Ei", 1024.0 * 1024.0 * 1024.0 * 1024.0 * 1024.0 * 1024.0),
    ("m", 1e-3),
    ("k", 1e3),
    ("M", 1e6),
    ("G", 1e9),
    ("T", 1e12),
    ("P", 1e15),
    ("E", 1e18),
];

impl Quantity {
    /// Original textual form.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Numeric value in base units (bytes, cores).
    pub fn value(&self) -> f64 {
        self.value
    }
}

impl FromStr for Quantity {
    type Err = InvalidQuantity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let (number, multiplier) = SUFFIXES
            .iter()
            .find_map(|(suffix, multiplier)| {
                text.strip_suffix(suffix).map(|number| (number, *multiplier))
            })
            .unwrap_or((text, 1.0));

        let number: f64 = number
            .parse()
            .map_err(|_| InvalidQuantity(s.to_string()))?;
        if !number.is_finite() || number < 0.0 {
            return Err(InvalidQuantity(s.to_string()));
        }

        Ok(Self {
            text: text.to_string(),
            value: number * multiplier,
        })
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl JsonHook for Quantity {
    fn to_json(&self) -> Value {
        Value::String(self.text.clone())
    }
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_with_hook(self, serializer)
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct QuantityVisitor;

        impl Visitor<'_> for QuantityVisitor {
            type Value = Quantity;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a quantity string or number")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Quantity, E> {
                v.parse().map_err(E::custom)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Quantity, E> {
                self.visit_str(&v.to_string())
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Quantity, E> {
                self.visit_str(&v.to_string())
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Quantity, E> {
                self.visit_str(&v.to_string())
            }
        }

        deserializer.deserialize_any(QuantityVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_suffixes() {
        assert_eq!("256Mi".parse::<Quantity>().unwrap().value(), 256.0 * 1024.0 * 1024.0);
        assert_eq!("10m".parse::<Quantity>().unwrap().value(), 0.01);
        assert_eq!("2".parse::<Quantity>().unwrap().value(), 2.0);
        assert_eq!("1.5G".parse::<Quantity>().unwrap().value(), 1.5e9);
        assert!("lots".parse::<Quantity>().is_err());
        assert!("-1Gi".parse::<Quantity>().is_err());
    }

    #[test]
    fn serializes_original_text() {
        let q: Quantity = serde_json::from_value(json!("1Gi")).unwrap();
        assert_eq!(serde_json::to_value(&q).unwrap(), json!("1Gi"));

        let n: Quantity = serde_json::from_value(json!(3)).unwrap();
        assert_eq!(n.as_str(), "3");
    }
}
