//! Document value model
//!
//! Parsed configuration documents are represented as a tagged tree so that
//! every consumer matches exhaustively on the node kind. Integers and floats
//! are kept apart because `number` and `float` rules depend on the native kind.
//!
//! Copyright (c) 2025 Confgate Team
//! Licensed under the Apache-2.0 license

use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Mapping node of a document. Key order carries no meaning.
pub type Mapping = BTreeMap<String, Value>;

/// A node of a parsed configuration document
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Sequence(Vec<Value>),
    Mapping(Mapping),
}

/// Errors raised while converting parser output into a [`Value`]
#[derive(Debug, Error)]
pub enum ValueError {
    /// Mapping key that cannot be represented as a string
    #[error("unsupported mapping key of kind {kind}")]
    UnsupportedKey { kind: &'static str },

    /// Integer outside the i64 range, or a number with no numeric reading
    #[error("unsupported number: {0}")]
    UnsupportedNumber(String),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Value {
    /// Parse a YAML document into a value tree
    pub fn from_yaml_str(input: &str) -> Result<Self, ValueError> {
        let raw: serde_yaml::Value = serde_yaml::from_str(input)?;
        Self::try_from(raw)
    }

    /// Parse a JSON document into a value tree
    pub fn from_json_str(input: &str) -> Result<Self, ValueError> {
        let raw: serde_json::Value = serde_json::from_str(input)?;
        Self::try_from(raw)
    }

    /// Human-readable name of the node kind, used in mismatch messages
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Sequence(_) => "array",
            Value::Mapping(_) => "object",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Value::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Look up a key when this node is a mapping
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_mapping().and_then(|m| m.get(key))
    }
}

impl TryFrom<serde_json::Value> for Value {
    type Error = ValueError;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        Ok(match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => number(n.as_i64(), n.as_u64(), n.as_f64(), || n.to_string())?,
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => Value::Sequence(
                items
                    .into_iter()
                    .map(Value::try_from)
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            serde_json::Value::Object(map) => {
                let mut out = Mapping::new();
                for (key, val) in map {
                    out.insert(key, Value::try_from(val)?);
                }
                Value::Mapping(out)
            }
        })
    }
}

/// Integers stay integers; integers beyond `i64` are rejected rather than
/// silently widened to floats
fn number(
    signed: Option<i64>,
    unsigned: Option<u64>,
    float: Option<f64>,
    render: impl FnOnce() -> String,
) -> Result<Value, ValueError> {
    match (signed, unsigned, float) {
        (Some(i), _, _) => Ok(Value::Integer(i)),
        (None, Some(_), _) => Err(ValueError::UnsupportedNumber(render())),
        (None, None, Some(f)) => Ok(Value::Float(f)),
        (None, None, None) => Err(ValueError::UnsupportedNumber(render())),
    }
}

impl TryFrom<serde_yaml::Value> for Value {
    type Error = ValueError;

    fn try_from(value: serde_yaml::Value) -> Result<Self, Self::Error> {
        Ok(match value {
            serde_yaml::Value::Null => Value::Null,
            serde_yaml::Value::Bool(b) => Value::Bool(b),
            serde_yaml::Value::Number(n) => number(n.as_i64(), n.as_u64(), n.as_f64(), || n.to_string())?,
            serde_yaml::Value::String(s) => Value::String(s),
            serde_yaml::Value::Sequence(items) => Value::Sequence(
                items
                    .into_iter()
                    .map(Value::try_from)
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            serde_yaml::Value::Mapping(map) => {
                let mut out = Mapping::new();
                for (key, val) in map {
                    out.insert(yaml_key(key)?, Value::try_from(val)?);
                }
                Value::Mapping(out)
            }
            serde_yaml::Value::Tagged(tagged) => Value::try_from(tagged.value)?,
        })
    }
}

/// Scalar YAML keys are stringified; YAML allows `8080: x` or `true: y`.
fn yaml_key(key: serde_yaml::Value) -> Result<String, ValueError> {
    match key {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        serde_yaml::Value::Null => Ok("null".to_string()),
        serde_yaml::Value::Tagged(tagged) => yaml_key(tagged.value),
        serde_yaml::Value::Sequence(_) => Err(ValueError::UnsupportedKey { kind: "array" }),
        serde_yaml::Value::Mapping(_) => Err(ValueError::UnsupportedKey { kind: "object" }),
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}
