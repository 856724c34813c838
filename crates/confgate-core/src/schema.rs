//! Declarative schema model
//!
//! A [`Schema`] maps top-level field names to [`SchemaRule`]s. Rules can be
//! built in code with the builder methods or deserialized from YAML/JSON
//! definitions. Shape invariants are checked once, in [`Schema::new`], so a
//! malformed schema never reaches document validation.
//!
//! Copyright (c) 2025 Confgate Team
//! Licensed under the Apache-2.0 license

use crate::error::SchemaError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Logical type of a field
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    String,
    /// Integer; numeric strings such as `"8080"` are accepted
    Number,
    /// Fractional number; native integers are rejected
    Float,
    Boolean,
    /// Native boolean or one of yes/no/true/false/on/off/1/0 (any case)
    AnsibleBool,
    Object,
    Array,
    /// Name of a registered custom validator
    Custom(String),
}

impl FieldType {
    pub fn name(&self) -> &str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Float => "float",
            FieldType::Boolean => "boolean",
            FieldType::AnsibleBool => "ansible_bool",
            FieldType::Object => "object",
            FieldType::Array => "array",
            FieldType::Custom(name) => name,
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, FieldType::Custom(_))
    }
}

impl From<String> for FieldType {
    fn from(name: String) -> Self {
        match name.as_str() {
            "string" => FieldType::String,
            "number" => FieldType::Number,
            "float" => FieldType::Float,
            "boolean" => FieldType::Boolean,
            "ansible_bool" => FieldType::AnsibleBool,
            "object" => FieldType::Object,
            "array" => FieldType::Array,
            _ => FieldType::Custom(name),
        }
    }
}

impl From<&str> for FieldType {
    fn from(name: &str) -> Self {
        FieldType::from(name.to_string())
    }
}

impl From<FieldType> for String {
    fn from(field_type: FieldType) -> Self {
        field_type.name().to_string()
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Contract for one field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaRule {
    #[serde(rename = "type")]
    pub field_type: FieldType,

    #[serde(default)]
    pub required: bool,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, SchemaRule>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaRule>>,

    /// Sibling names; when all are truthy the field becomes required
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_when_true: Vec<String>,

    /// Sibling names; unless all are truthy the field is not walked
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validate_when_true: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SchemaRule {
    pub fn new<T: Into<FieldType>>(field_type: T) -> Self {
        Self {
            field_type: field_type.into(),
            required: false,
            properties: BTreeMap::new(),
            items: None,
            required_when_true: Vec::new(),
            validate_when_true: Vec::new(),
            description: None,
        }
    }

    pub fn string() -> Self {
        Self::new(FieldType::String)
    }

    pub fn number() -> Self {
        Self::new(FieldType::Number)
    }

    pub fn float() -> Self {
        Self::new(FieldType::Float)
    }

    pub fn boolean() -> Self {
        Self::new(FieldType::Boolean)
    }

    pub fn ansible_bool() -> Self {
        Self::new(FieldType::AnsibleBool)
    }

    /// Rule checked by the named custom validator
    pub fn custom<N: Into<String>>(name: N) -> Self {
        Self::new(FieldType::Custom(name.into()))
    }

    /// Object rule with the given properties
    pub fn object<I, K>(properties: I) -> Self
    where
        I: IntoIterator<Item = (K, SchemaRule)>,
        K: Into<String>,
    {
        let mut rule = Self::new(FieldType::Object);
        rule.properties = properties.into_iter().map(|(k, v)| (k.into(), v)).collect();
        rule
    }

    /// Array rule applying `items` to every element
    pub fn array(items: SchemaRule) -> Self {
        let mut rule = Self::new(FieldType::Array);
        rule.items = Some(Box::new(items));
        rule
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn required_when_true<I, S>(mut self, siblings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_when_true = siblings.into_iter().map(Into::into).collect();
        self
    }

    pub fn validate_when_true<I, S>(mut self, siblings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.validate_when_true = siblings.into_iter().map(Into::into).collect();
        self
    }

    pub fn description<D: Into<String>>(mut self, description: D) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Check the shape invariant of this rule and its children
    fn check_shape(&self, path: &str) -> Result<(), SchemaError> {
        match self.field_type {
            FieldType::Object => {
                if self.properties.is_empty() {
                    return Err(SchemaError::MissingProperties { path: path.to_string() });
                }
                if self.items.is_some() {
                    return Err(SchemaError::UnexpectedItems {
                        path: path.to_string(),
                        field_type: self.field_type.to_string(),
                    });
                }
                check_fields(&self.properties, path)
            }
            FieldType::Array => {
                if !self.properties.is_empty() {
                    return Err(SchemaError::UnexpectedProperties {
                        path: path.to_string(),
                        field_type: self.field_type.to_string(),
                    });
                }
                let Some(items) = &self.items else {
                    return Err(SchemaError::MissingItems { path: path.to_string() });
                };
                let items_path = format!("{}[]", path);
                // Elements have no siblings and are never absent
                if items.required || !items.required_when_true.is_empty() || !items.validate_when_true.is_empty() {
                    return Err(SchemaError::PresenceRuleOnItems { path: items_path });
                }
                items.check_shape(&items_path)
            }
            _ => {
                if !self.properties.is_empty() {
                    return Err(SchemaError::UnexpectedProperties {
                        path: path.to_string(),
                        field_type: self.field_type.to_string(),
                    });
                }
                if self.items.is_some() {
                    return Err(SchemaError::UnexpectedItems {
                        path: path.to_string(),
                        field_type: self.field_type.to_string(),
                    });
                }
                Ok(())
            }
        }
    }

    /// Visit this rule and every nested rule with its schema path
    pub(crate) fn walk<'a>(&'a self, path: String, visit: &mut dyn FnMut(&str, &'a SchemaRule)) {
        visit(&path, self);
        for (name, child) in &self.properties {
            child.walk(format!("{}.{}", path, name), visit);
        }
        if let Some(items) = &self.items {
            items.walk(format!("{}[]", path), visit);
        }
    }
}

/// Check a set of sibling rules: each rule's shape and its gate references
fn check_fields(fields: &BTreeMap<String, SchemaRule>, parent: &str) -> Result<(), SchemaError> {
    for (name, rule) in fields {
        let path = if parent.is_empty() {
            name.clone()
        } else {
            format!("{}.{}", parent, name)
        };
        for sibling in rule.required_when_true.iter().chain(&rule.validate_when_true) {
            if !fields.contains_key(sibling) {
                return Err(SchemaError::UnknownSibling {
                    path,
                    sibling: sibling.clone(),
                });
            }
        }
        rule.check_shape(&path)?;
    }
    Ok(())
}

/// Immutable, reusable mapping from top-level field name to rule
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Schema {
    fields: BTreeMap<String, SchemaRule>,
}

impl Schema {
    /// Build a schema, rejecting rules that break the shape invariants
    pub fn new<I, K>(fields: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = (K, SchemaRule)>,
        K: Into<String>,
    {
        let fields: BTreeMap<String, SchemaRule> =
            fields.into_iter().map(|(k, v)| (k.into(), v)).collect();
        check_fields(&fields, "")?;
        Ok(Self { fields })
    }

    /// Parse a schema definition written in YAML
    pub fn from_yaml_str(input: &str) -> Result<Self, SchemaError> {
        let fields: BTreeMap<String, SchemaRule> =
            serde_yaml::from_str(input).map_err(|e| SchemaError::Parse(e.to_string()))?;
        Self::new(fields)
    }

    /// Parse a schema definition written in JSON
    pub fn from_json_str(input: &str) -> Result<Self, SchemaError> {
        let fields: BTreeMap<String, SchemaRule> =
            serde_json::from_str(input).map_err(|e| SchemaError::Parse(e.to_string()))?;
        Self::new(fields)
    }

    pub fn fields(&self) -> &BTreeMap<String, SchemaRule> {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&SchemaRule> {
        self.fields.get(name)
    }

    /// Every custom type name used anywhere in the schema, with its schema path
    pub fn custom_types(&self) -> Vec<(String, String)> {
        let mut found = Vec::new();
        for (name, rule) in &self.fields {
            rule.walk(name.clone(), &mut |path, rule| {
                if let FieldType::Custom(custom) = &rule.field_type {
                    found.push((path.to_string(), custom.clone()));
                }
            });
        }
        found
    }
}
