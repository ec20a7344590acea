use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A typed key-value map used for credentials, authorization, and free-form
/// metadata on agent cards and task contexts.
pub type Metadata = BTreeMap<String, MetaValue>;

/// A single metadata value: string, number, boolean, or a nested map.
///
/// Deserialization is untagged, so plain JSON/TOML scalars and objects map
/// directly onto the variants. Arrays and `null` are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    /// A boolean flag.
    Bool(bool),
    /// Any numeric value, stored as `f64`.
    Number(f64),
    /// A UTF-8 string.
    String(String),
    /// A nested map of further values.
    Map(Metadata),
}

impl MetaValue {
    /// Returns the string slice if this value is a [`MetaValue::String`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetaValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the number if this value is a [`MetaValue::Number`].
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetaValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the boolean if this value is a [`MetaValue::Bool`].
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            MetaValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the nested map if this value is a [`MetaValue::Map`].
    pub fn as_map(&self) -> Option<&Metadata> {
        match self {
            MetaValue::Map(m) => Some(m),
            _ => None,
        }
    }
}

impl From<&str> for MetaValue {
    fn from(value: &str) -> Self {
        MetaValue::String(value.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(value: String) -> Self {
        MetaValue::String(value)
    }
}

impl From<f64> for MetaValue {
    fn from(value: f64) -> Self {
        MetaValue::Number(value)
    }
}

impl From<i64> for MetaValue {
    fn from(value: i64) -> Self {
        MetaValue::Number(value as f64)
    }
}

impl From<bool> for MetaValue {
    fn from(value: bool) -> Self {
        MetaValue::Bool(value)
    }
}

impl From<Metadata> for MetaValue {
    fn from(value: Metadata) -> Self {
        MetaValue::Map(value)
    }
}
