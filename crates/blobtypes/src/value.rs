// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Value trees exchanged with blob views.

use crate::error::{BlobError, Result};
use crate::naming::{camel_case_to_underscore, join};
use std::collections::BTreeMap;
use std::fmt;

/// Flat field-name to value mapping.
pub type FlatValues = BTreeMap<String, Value>;

/// A nested value: scalars, enum labels, lists and maps.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Enum label.
    Label(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Empty map, to be filled with [`with`](Self::with).
    pub fn map() -> Self {
        Self::Map(BTreeMap::new())
    }

    /// Insert `key` into a map value, builder style. No-op on non-maps.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        if let Self::Map(entries) = &mut self {
            entries.insert(key.into(), value.into());
        }
        self
    }

    /// Short name of the variant, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Label(_) => "label",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Int(v) => Some(*v > 0),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Label(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Self::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Flatten nested maps and lists into `_` joined field names.
    ///
    /// Map keys are converted from camelCase; list items get their
    /// position as suffix, so `{"pos": {"x": 1}, "rgb": [1, 2]}` becomes
    /// `pos_x`, `rgb_0` and `rgb_1`. A non-container root flattens to the
    /// single entry `value`.
    pub fn flatten(&self) -> FlatValues {
        let mut out = FlatValues::new();
        match self {
            Self::Map(_) | Self::List(_) => flatten_into("", self, &mut out),
            leaf => {
                out.insert(crate::layout::VALUE_FIELD.to_string(), leaf.clone());
            }
        }
        out
    }
}

fn flatten_into(prefix: &str, value: &Value, out: &mut FlatValues) {
    match value {
        Value::Map(entries) => {
            for (key, item) in entries {
                flatten_into(&join(prefix, &camel_case_to_underscore(key)), item, out);
            }
        }
        Value::List(items) => {
            for (index, item) in items.iter().enumerate() {
                flatten_into(&join(prefix, &index.to_string()), item, out);
            }
        }
        leaf => {
            out.insert(prefix.to_string(), leaf.clone());
        }
    }
}

/// String form used for structural equality: NaN prints as `NaN` and so
/// compares equal to itself.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v:?}"),
            Self::Label(s) => f.write_str(s),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Map(entries) => {
                f.write_str("{")?;
                for (i, (key, item)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {item}")?;
                }
                f.write_str("}")
            }
        }
    }
}

macro_rules! impl_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Self::Int(i64::from(v))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Label(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Label(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::List(v)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(v: BTreeMap<String, Value>) -> Self {
        Self::Map(v)
    }
}

impl TryFrom<serde_json::Value> for Value {
    type Error = BlobError;

    fn try_from(json: serde_json::Value) -> Result<Self> {
        use serde_json::Value as Json;
        Ok(match json {
            Json::Null => {
                return Err(BlobError::InvalidSchema(
                    "null is not a valid field value".into(),
                ))
            }
            Json::Bool(b) => Self::Bool(b),
            Json::Number(n) => match n.as_i64() {
                Some(v) => Self::Int(v),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Json::String(s) => Self::Label(s),
            Json::Array(items) => Self::List(
                items
                    .into_iter()
                    .map(Value::try_from)
                    .collect::<Result<_>>()?,
            ),
            Json::Object(entries) => Self::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| Ok((k, Value::try_from(v)?)))
                    .collect::<Result<_>>()?,
            ),
        })
    }
}

/// Non-finite floats have no JSON form and are emitted as strings.
impl From<&Value> for serde_json::Value {
    fn from(value: &Value) -> Self {
        use serde_json::Value as Json;
        match value {
            Value::Bool(b) => Json::Bool(*b),
            Value::Int(v) => Json::from(*v),
            Value::Float(v) => serde_json::Number::from_f64(*v)
                .map_or_else(|| Json::String(format!("{v}")), Json::Number),
            Value::Label(s) => Json::String(s.clone()),
            Value::List(items) => Json::Array(items.iter().map(Json::from).collect()),
            Value::Map(entries) => Json::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), Json::from(v)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_nested_maps_and_lists() {
        let tree = Value::map()
            .with("foo", 1)
            .with("pos", Value::map().with("x", 4).with("y", 2))
            .with("lorem", vec![Value::from(1), Value::from(2)])
            .with("maxSpeed", 3.5);

        let flat = tree.flatten();
        assert_eq!(flat.get("foo"), Some(&Value::Int(1)));
        assert_eq!(flat.get("pos_x"), Some(&Value::Int(4)));
        assert_eq!(flat.get("pos_y"), Some(&Value::Int(2)));
        assert_eq!(flat.get("lorem_0"), Some(&Value::Int(1)));
        assert_eq!(flat.get("lorem_1"), Some(&Value::Int(2)));
        assert_eq!(flat.get("max_speed"), Some(&Value::Float(3.5)));
        assert_eq!(flat.len(), 6);
    }

    #[test]
    fn test_flatten_list_of_maps() {
        let tree = Value::map().with(
            "items",
            vec![Value::map().with("mass", 1.0), Value::map().with("mass", 2.0)],
        );
        let flat = tree.flatten();
        assert_eq!(flat.get("items_0_mass"), Some(&Value::Float(1.0)));
        assert_eq!(flat.get("items_1_mass"), Some(&Value::Float(2.0)));
    }

    #[test]
    fn test_flatten_leaf_root() {
        let flat = Value::Int(7).flatten();
        assert_eq!(flat.get("value"), Some(&Value::Int(7)));
    }

    #[test]
    fn test_display_nan_is_stable() {
        let nan = Value::Float(f64::NAN);
        assert_ne!(nan, nan.clone());
        assert_eq!(nan.to_string(), nan.clone().to_string());
        assert_eq!(Value::Float(2.0).to_string(), "2.0");
        assert_eq!(Value::Bool(true).to_string(), "true");
    }

    #[test]
    fn test_json_conversion() {
        let json = serde_json::json!({
            "position": {"x": 1.0, "y": 2},
            "state": "idle",
            "alive": true,
            "tags": [1, 2]
        });
        let value = Value::try_from(json.clone()).unwrap();
        assert_eq!(
            value.as_map().unwrap().get("state"),
            Some(&Value::Label("idle".into()))
        );
        assert_eq!(serde_json::Value::from(&value), json);
        assert!(Value::try_from(serde_json::json!({"a": null})).is_err());
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Value::Int(3).as_f64(), Some(3.0));
        assert_eq!(Value::Int(0).as_bool(), Some(false));
        assert_eq!(Value::Bool(true).as_i64(), Some(1));
        assert_eq!(Value::Float(1.5).as_i64(), None);
        assert_eq!(Value::from("a").as_str(), Some("a"));
    }
}
