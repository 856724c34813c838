//! Error types for the Confgate validation engine
//!
//! Two families live here. [`ValidationError`] and [`ValidationErrors`] are
//! findings about a document and are returned to the caller as data.
//! [`Error`] and [`SchemaError`] are failures of the library itself, such as
//! a malformed schema detected at construction time.
//!
//! Copyright (c) 2025 Confgate Team
//! Licensed under the Apache-2.0 license

use crate::path::FieldPath;
use crate::value::ValueError;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Category of a validation finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Document is not even a well-formed tree of the expected coarse shape
    Fatal,
    /// Key not declared in the schema
    UnknownField,
    /// Required field absent after conditional resolution
    MissingField,
    /// Value does not match the declared type
    TypeMismatch,
    /// Synchronous custom validator rejected the value
    Custom,
    /// Asynchronous (network-backed) validator rejected the value
    Remote,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Fatal => "fatal",
            ErrorKind::UnknownField => "unknown field",
            ErrorKind::MissingField => "missing field",
            ErrorKind::TypeMismatch => "type mismatch",
            ErrorKind::Custom => "custom",
            ErrorKind::Remote => "remote",
        };
        write!(f, "{}", name)
    }
}

/// A single validation finding with the path of the offending node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationError {
    /// Path of the node the finding refers to
    pub path: FieldPath,
    /// Human-readable reason
    pub message: String,
    /// Category of the finding
    pub kind: ErrorKind,
    /// Name of the custom validator that produced the finding
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validator: Option<String>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

impl std::error::Error for ValidationError {}

impl ValidationError {
    /// Create a new validation error
    pub fn new<M: Into<String>>(path: FieldPath, kind: ErrorKind, message: M) -> Self {
        Self {
            path,
            message: message.into(),
            kind,
            validator: None,
        }
    }

    pub fn fatal<M: Into<String>>(message: M) -> Self {
        Self::new(FieldPath::root(), ErrorKind::Fatal, message)
    }

    pub fn unknown_field(path: FieldPath) -> Self {
        let message = match path.field_name() {
            Some(name) => format!("unknown field '{}'", name),
            None => "unknown field".to_string(),
        };
        Self::new(path, ErrorKind::UnknownField, message)
    }

    pub fn missing_field(path: FieldPath) -> Self {
        let message = match path.field_name() {
            Some(name) => format!("required field '{}' is missing", name),
            None => "required field is missing".to_string(),
        };
        Self::new(path, ErrorKind::MissingField, message)
    }

    pub fn type_mismatch<M: Into<String>>(path: FieldPath, message: M) -> Self {
        Self::new(path, ErrorKind::TypeMismatch, message)
    }

    /// Finding from a synchronous custom validator
    pub fn custom<V: Into<String>, M: Into<String>>(path: FieldPath, validator: V, message: M) -> Self {
        Self {
            path,
            message: message.into(),
            kind: ErrorKind::Custom,
            validator: Some(validator.into()),
        }
    }

    /// Finding from an asynchronous validator, prefixed with its name
    pub fn remote<V: Into<String>, M: AsRef<str>>(path: FieldPath, validator: V, message: M) -> Self {
        let validator = validator.into();
        Self {
            path,
            message: format!("{}: {}", validator, message.as_ref()),
            kind: ErrorKind::Remote,
            validator: Some(validator),
        }
    }
}

/// Findings collected over one validation run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    pub errors: Vec<ValidationError>,
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} validation error(s):", self.errors.len())?;
        for (i, error) in self.errors.iter().enumerate() {
            write!(f, "\n{}. {}", i + 1, error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl ValidationErrors {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    pub fn add(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn extend<I: IntoIterator<Item = ValidationError>>(&mut self, errors: I) {
        self.errors.extend(errors);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.errors.iter()
    }

    /// Errors of one category
    pub fn by_kind(&self, kind: ErrorKind) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter().filter(move |e| e.kind == kind)
    }

    /// Stable sort by path; errors on the same node keep discovery order
    pub fn sort_by_path(&mut self) {
        self.errors.sort_by(|a, b| a.path.cmp(&b.path));
    }

    /// Ok if no errors, Err otherwise
    pub fn into_result(self) -> std::result::Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(error: ValidationError) -> Self {
        Self { errors: vec![error] }
    }
}

impl From<Vec<ValidationError>> for ValidationErrors {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self { errors }
    }
}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

/// Programming-contract violations in a schema, detected when it is built
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("schema rule '{path}' has type object but declares no properties")]
    MissingProperties { path: String },

    #[error("schema rule '{path}' has type array but declares no items")]
    MissingItems { path: String },

    #[error("schema rule '{path}' of type {field_type} cannot declare properties")]
    UnexpectedProperties { path: String, field_type: String },

    #[error("schema rule '{path}' of type {field_type} cannot declare items")]
    UnexpectedItems { path: String, field_type: String },

    #[error("schema rule '{path}' describes array elements and cannot declare required or conditional gates")]
    PresenceRuleOnItems { path: String },

    #[error("schema rule '{path}' references unknown sibling '{sibling}' in a conditional gate")]
    UnknownSibling { path: String, sibling: String },

    #[error("schema rule '{path}' uses type '{name}' but no validator with that name is registered")]
    UnknownValidator { path: String, name: String },

    #[error("schema definition could not be parsed: {0}")]
    Parse(String),
}

/// Main error type for Confgate library operations
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid schema: {0}")]
    Schema(#[from] SchemaError),

    #[error("invalid document: {0}")]
    Document(#[from] ValueError),

    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience type alias for Results using the library error type
pub type Result<T> = std::result::Result<T, Error>;
