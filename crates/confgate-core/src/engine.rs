//! Single-document validation
//!
//! [`SchemaValidator`] pairs an immutable [`Schema`] with a
//! [`ValidatorRegistry`]. A run first walks the document and schema together
//! on the calling thread, collecting structural errors, running synchronous
//! validators inline and queueing asynchronous ones. The queued checks are
//! then handed to the [`AsyncCoordinator`].
//!
//! Copyright (c) 2025 Confgate Team
//! Licensed under the Apache-2.0 license

use crate::conditional::Gates;
use crate::coordinator::{AsyncCoordinator, CancelSignal, PendingCheck, DEFAULT_CALL_TIMEOUT};
use crate::diagnostics::{Diagnostics, Warning};
use crate::error::{SchemaError, ValidationError, ValidationErrors};
use crate::matcher::{check_scalar, mismatch};
use crate::path::FieldPath;
use crate::registry::{AsyncContext, CustomValidator, ValidatorContext, ValidatorRegistry};
use crate::schema::{FieldType, Schema, SchemaRule};
use crate::value::{Mapping, Value};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

/// Knobs for a validation run
#[derive(Debug, Clone)]
pub struct ValidationOptions {
    /// Deadline for each asynchronous check
    pub call_timeout: Duration,
    /// Run queued asynchronous checks after the structural pass
    pub run_async_checks: bool,
    /// Stop at the first error
    pub fail_fast: bool,
    /// Maximum number of errors to report (0 = unlimited)
    pub max_errors: usize,
    /// Sort the final error list by path
    pub sort_errors: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            call_timeout: DEFAULT_CALL_TIMEOUT,
            run_async_checks: true,
            fail_fast: false,
            max_errors: 0,
            sort_errors: true,
        }
    }
}

impl ValidationOptions {
    /// Structural checks and synchronous validators only
    pub fn offline() -> Self {
        Self {
            run_async_checks: false,
            ..Self::default()
        }
    }

    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub fn with_max_errors(mut self, max_errors: usize) -> Self {
        self.max_errors = max_errors;
        self
    }
}

/// Result of the synchronous structural pass
#[derive(Debug, Default)]
pub struct StructuralOutcome {
    pub errors: ValidationErrors,
    pub warnings: Vec<Warning>,
    /// Asynchronous checks whose fields passed structural validation
    pub pending: Vec<PendingCheck>,
    /// The document did not have the coarse shape required to walk it
    pub fatal: bool,
}

/// Final result of validating one document
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub errors: ValidationErrors,
    pub warnings: Vec<Warning>,
    /// Number of asynchronous checks dispatched
    pub async_checks_run: usize,
    /// The asynchronous phase was cut short by cancellation
    pub cancelled: bool,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Convert to `Err` when any error was found
    pub fn into_result(self) -> Result<Vec<Warning>, ValidationErrors> {
        self.errors.into_result().map(|_| self.warnings)
    }
}

/// Validates documents against one schema
#[derive(Debug, Clone)]
pub struct SchemaValidator {
    schema: Arc<Schema>,
    registry: Arc<ValidatorRegistry>,
    options: ValidationOptions,
}

impl SchemaValidator {
    /// Pair a schema with a registry, checking every custom type resolves
    pub fn new(schema: Schema, registry: Arc<ValidatorRegistry>) -> Result<Self, SchemaError> {
        for (path, name) in schema.custom_types() {
            if !registry.contains(&name) {
                return Err(SchemaError::UnknownValidator { path, name });
            }
        }
        Ok(Self {
            schema: Arc::new(schema),
            registry,
            options: ValidationOptions::default(),
        })
    }

    pub fn with_options(mut self, options: ValidationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn registry(&self) -> &ValidatorRegistry {
        &self.registry
    }

    pub fn options(&self) -> &ValidationOptions {
        &self.options
    }

    /// Run the structural pass only
    ///
    /// Never suspends and never performs I/O beyond what synchronous
    /// validators do (file existence checks).
    pub fn validate_structure(&self, document: &Value) -> StructuralOutcome {
        let Some(mapping) = document.as_mapping() else {
            return StructuralOutcome {
                errors: ValidationError::fatal(format!(
                    "document root must be a mapping, found {}",
                    document.kind()
                ))
                .into(),
                fatal: true,
                ..StructuralOutcome::default()
            };
        };

        let mut walker = Walker::new(&self.registry, &self.options, document);
        walker.walk_fields(self.schema.fields(), mapping, &FieldPath::root());
        walker.finish()
    }

    /// Validate a document: structural pass, then asynchronous checks
    #[instrument(skip_all, fields(fields = self.schema.fields().len()))]
    pub async fn validate(&self, document: &Value, cancel: &CancelSignal) -> ValidationReport {
        let StructuralOutcome {
            mut errors,
            warnings,
            pending,
            fatal,
        } = self.validate_structure(document);
        let mut report = ValidationReport::default();

        let halted = self.options.fail_fast && !errors.is_empty();
        if fatal || halted || !self.options.run_async_checks {
            if !pending.is_empty() {
                debug!(skipped = pending.len(), fatal, halted, "asynchronous checks not run");
            }
        } else if !pending.is_empty() {
            let mut coordinator = AsyncCoordinator::new(self.options.call_timeout);
            let outcome = coordinator.run(pending, cancel).await;
            report.async_checks_run = outcome.dispatched;
            report.cancelled = outcome.cancelled;
            errors.extend(outcome.errors);
        }

        if self.options.sort_errors {
            errors.sort_by_path();
        }
        if self.options.max_errors > 0 {
            errors.errors.truncate(self.options.max_errors);
        }
        debug!(errors = errors.len(), warnings = warnings.len(), "document validated");
        report.errors = errors;
        report.warnings = warnings;
        report
    }
}

/// State of one structural pass
struct Walker<'a> {
    registry: &'a ValidatorRegistry,
    options: &'a ValidationOptions,
    root: &'a Value,
    shared_root: Option<Arc<Value>>,
    diagnostics: Diagnostics,
    errors: ValidationErrors,
    pending: Vec<PendingCheck>,
    halted: bool,
}

impl<'a> Walker<'a> {
    fn new(registry: &'a ValidatorRegistry, options: &'a ValidationOptions, root: &'a Value) -> Self {
        Self {
            registry,
            options,
            root,
            shared_root: None,
            diagnostics: Diagnostics::new(),
            errors: ValidationErrors::new(),
            pending: Vec::new(),
            halted: false,
        }
    }

    fn finish(self) -> StructuralOutcome {
        StructuralOutcome {
            errors: self.errors,
            warnings: self.diagnostics.into_warnings(),
            pending: self.pending,
            fatal: false,
        }
    }

    fn push(&mut self, error: ValidationError) {
        if self.halted {
            return;
        }
        self.errors.add(error);
        let limit_reached = self.options.max_errors > 0 && self.errors.len() >= self.options.max_errors;
        if self.options.fail_fast || limit_reached {
            self.halted = true;
        }
    }

    fn walk_fields(&mut self, rules: &'a BTreeMap<String, SchemaRule>, mapping: &'a Mapping, path: &FieldPath) {
        for key in mapping.keys() {
            if !rules.contains_key(key) {
                self.push(ValidationError::unknown_field(path.child(key)));
            }
        }

        for (name, rule) in rules {
            if self.halted {
                return;
            }
            let gates = Gates::resolve(rule, mapping);
            let child = path.child(name);
            match mapping.get(name) {
                None => {
                    if gates.required && gates.validate {
                        self.push(ValidationError::missing_field(child));
                    }
                }
                Some(_) if !gates.validate => {
                    self.diagnostics.note(&child, "validation gate closed, contents not checked");
                }
                Some(value) => self.match_value(rule, value, mapping, &child),
            }
        }
    }

    fn match_value(&mut self, rule: &'a SchemaRule, value: &'a Value, parent: &'a Mapping, path: &FieldPath) {
        if value.is_null() {
            self.push(ValidationError::type_mismatch(path.clone(), mismatch(value, &rule.field_type)));
            return;
        }

        match &rule.field_type {
            FieldType::Object => match value.as_mapping() {
                Some(mapping) => self.walk_fields(&rule.properties, mapping, path),
                None => self.push(ValidationError::type_mismatch(path.clone(), mismatch(value, &rule.field_type))),
            },
            FieldType::Array => match (value.as_sequence(), rule.items.as_deref()) {
                (Some(elements), Some(items)) => {
                    for (i, element) in elements.iter().enumerate() {
                        if self.halted {
                            return;
                        }
                        self.match_value(items, element, parent, &path.index(i));
                    }
                }
                // Rules without items are rejected when the schema is built
                (Some(_), None) => {}
                (None, _) => self.push(ValidationError::type_mismatch(path.clone(), mismatch(value, &rule.field_type))),
            },
            FieldType::Custom(name) => self.run_custom(name, value, parent, path),
            scalar => {
                if let Err(message) = check_scalar(value, scalar) {
                    self.push(ValidationError::type_mismatch(path.clone(), message));
                }
            }
        }
    }

    fn run_custom(&mut self, name: &str, value: &'a Value, parent: &'a Mapping, path: &FieldPath) {
        let registry = self.registry;
        let Some(validator) = registry.get(name) else {
            self.push(ValidationError::custom(
                path.clone(),
                name,
                format!("no validator registered for type '{}'", name),
            ));
            return;
        };

        match validator {
            CustomValidator::Sync(check) => {
                let result = check.validate(value, &ValidatorContext::new(self.root, parent, path, &self.diagnostics));
                if let Err(message) = result {
                    self.push(ValidationError::custom(path.clone(), name, message));
                }
            }
            CustomValidator::Async { precheck, check } => {
                if let Some(precheck) = precheck {
                    let result =
                        precheck.validate(value, &ValidatorContext::new(self.root, parent, path, &self.diagnostics));
                    if let Err(message) = result {
                        self.push(ValidationError::custom(path.clone(), name, message));
                        return;
                    }
                }
                let root = self
                    .shared_root
                    .get_or_insert_with(|| Arc::new(self.root.clone()))
                    .clone();
                self.pending.push(PendingCheck {
                    validator: name.to_string(),
                    path: path.clone(),
                    value: value.clone(),
                    context: AsyncContext::new(root, Arc::new(parent.clone()), path.clone()),
                    check: Arc::clone(check),
                });
                debug!(validator = name, path = %path, "queued asynchronous check");
            }
        }
    }
}
