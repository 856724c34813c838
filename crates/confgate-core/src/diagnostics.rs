//! Per-call diagnostics sink handed to validators
//!
//! Validators report non-fatal findings here instead of reading any
//! process-wide verbosity setting. Warnings end up in the validation report
//! and are also emitted through `tracing`.

use crate::path::FieldPath;
use serde::Serialize;
use std::cell::RefCell;
use std::fmt;

/// Non-fatal finding, e.g. a weak but acceptable password
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub path: FieldPath,
    pub message: String,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Collects warnings raised during one structural pass
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: RefCell<Vec<Warning>>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning for `path`
    pub fn warn<M: Into<String>>(&self, path: &FieldPath, message: M) {
        let warning = Warning {
            path: path.clone(),
            message: message.into(),
        };
        tracing::warn!(path = %warning.path, "{}", warning.message);
        self.warnings.borrow_mut().push(warning);
    }

    /// Emit a debug-level note that is not kept in the report
    pub fn note<M: AsRef<str>>(&self, path: &FieldPath, message: M) {
        tracing::debug!(path = %path, "{}", message.as_ref());
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.borrow().len()
    }

    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings.into_inner()
    }
}
