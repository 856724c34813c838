//! Named custom validators
//!
//! Two families share one namespace. Synchronous validators run inline
//! during the structural walk. Asynchronous validators may reach external
//! services; the engine queues them and the coordinator runs them after the
//! structural pass.
//!
//! Copyright (c) 2025 Confgate Team
//! Licensed under the Apache-2.0 license

use crate::diagnostics::Diagnostics;
use crate::path::FieldPath;
use crate::value::{Mapping, Value};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Outcome of a custom check; the error carries a human-readable reason
pub type CheckResult = Result<(), String>;

/// Read-only view handed to synchronous validators
#[derive(Clone, Copy)]
pub struct ValidatorContext<'a> {
    root: &'a Value,
    parent: &'a Mapping,
    path: &'a FieldPath,
    diagnostics: &'a Diagnostics,
}

impl<'a> ValidatorContext<'a> {
    pub fn new(
        root: &'a Value,
        parent: &'a Mapping,
        path: &'a FieldPath,
        diagnostics: &'a Diagnostics,
    ) -> Self {
        Self {
            root,
            parent,
            path,
            diagnostics,
        }
    }

    /// Whole document being validated
    pub fn root(&self) -> &'a Value {
        self.root
    }

    /// Mapping that encloses the field (for array elements, the mapping holding the array)
    pub fn parent(&self) -> &'a Mapping {
        self.parent
    }

    pub fn sibling(&self, name: &str) -> Option<&'a Value> {
        self.parent.get(name)
    }

    /// Top-level document field, for cross-field checks
    pub fn top_level(&self, name: &str) -> Option<&'a Value> {
        self.root.get(name)
    }

    pub fn path(&self) -> &'a FieldPath {
        self.path
    }

    /// Record a non-fatal warning for the current field
    pub fn warn<M: Into<String>>(&self, message: M) {
        self.diagnostics.warn(self.path, message);
    }

    pub fn note<M: AsRef<str>>(&self, message: M) {
        self.diagnostics.note(self.path, message);
    }
}

/// Owned snapshot handed to asynchronous validators
#[derive(Debug, Clone)]
pub struct AsyncContext {
    root: Arc<Value>,
    parent: Arc<Mapping>,
    path: FieldPath,
}

impl AsyncContext {
    pub fn new(root: Arc<Value>, parent: Arc<Mapping>, path: FieldPath) -> Self {
        Self { root, parent, path }
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    pub fn parent(&self) -> &Mapping {
        &self.parent
    }

    pub fn sibling(&self, name: &str) -> Option<&Value> {
        self.parent.get(name)
    }

    pub fn top_level(&self, name: &str) -> Option<&Value> {
        self.root.get(name)
    }

    pub fn path(&self) -> &FieldPath {
        &self.path
    }
}

/// Fast check that needs no I/O
pub trait SyncValidator: Send + Sync {
    fn validate(&self, value: &Value, context: &ValidatorContext<'_>) -> CheckResult;
}

impl<F> SyncValidator for F
where
    F: Fn(&Value, &ValidatorContext<'_>) -> CheckResult + Send + Sync,
{
    fn validate(&self, value: &Value, context: &ValidatorContext<'_>) -> CheckResult {
        self(value, context)
    }
}

/// Check that may perform network calls
///
/// Implementations are run concurrently and may be aborted mid-flight when
/// the run is cancelled or the per-call deadline passes, so they must not
/// rely on running to completion.
#[async_trait]
pub trait AsyncValidator: Send + Sync {
    async fn validate(&self, value: Value, context: AsyncContext) -> CheckResult;
}

/// Adapter turning an async closure into an [`AsyncValidator`]
pub struct AsyncFnValidator<F>(F);

/// Wrap an async closure as a validator
pub fn async_fn<F, Fut>(f: F) -> AsyncFnValidator<F>
where
    F: Fn(Value, AsyncContext) -> Fut + Send + Sync,
    Fut: Future<Output = CheckResult> + Send,
{
    AsyncFnValidator(f)
}

#[async_trait]
impl<F, Fut> AsyncValidator for AsyncFnValidator<F>
where
    F: Fn(Value, AsyncContext) -> Fut + Send + Sync,
    Fut: Future<Output = CheckResult> + Send,
{
    async fn validate(&self, value: Value, context: AsyncContext) -> CheckResult {
        (self.0)(value, context).await
    }
}

/// A registered custom validator
#[derive(Clone)]
pub enum CustomValidator {
    Sync(Arc<dyn SyncValidator>),
    Async {
        /// Cheap shape check run during the structural walk
        precheck: Option<Arc<dyn SyncValidator>>,
        check: Arc<dyn AsyncValidator>,
    },
}

impl CustomValidator {
    pub fn is_async(&self) -> bool {
        matches!(self, CustomValidator::Async { .. })
    }
}

/// Name to validator mapping, shared read-only across validation runs
#[derive(Clone, Default)]
pub struct ValidatorRegistry {
    validators: BTreeMap<String, CustomValidator>,
}

impl fmt::Debug for ValidatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorRegistry")
            .field("sync", &self.sync_names())
            .field("async", &self.async_names())
            .finish()
    }
}

impl ValidatorRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the built-in synchronous validators
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::validators::register_builtins(&mut registry);
        registry
    }

    /// Register a synchronous validator from a function or closure
    pub fn register_sync<N, F>(&mut self, name: N, validator: F) -> &mut Self
    where
        N: Into<String>,
        F: Fn(&Value, &ValidatorContext<'_>) -> CheckResult + Send + Sync + 'static,
    {
        self.insert(name.into(), CustomValidator::Sync(Arc::new(validator)))
    }

    /// Register a synchronous validator implemented as a type
    pub fn register_sync_validator<N, V>(&mut self, name: N, validator: V) -> &mut Self
    where
        N: Into<String>,
        V: SyncValidator + 'static,
    {
        self.insert(name.into(), CustomValidator::Sync(Arc::new(validator)))
    }

    /// Register an asynchronous validator without a structural precheck
    pub fn register_async<N, V>(&mut self, name: N, validator: V) -> &mut Self
    where
        N: Into<String>,
        V: AsyncValidator + 'static,
    {
        self.insert(
            name.into(),
            CustomValidator::Async {
                precheck: None,
                check: Arc::new(validator),
            },
        )
    }

    /// Register an asynchronous validator gated by a synchronous precheck
    pub fn register_async_with_precheck<N, P, V>(&mut self, name: N, precheck: P, validator: V) -> &mut Self
    where
        N: Into<String>,
        P: Fn(&Value, &ValidatorContext<'_>) -> CheckResult + Send + Sync + 'static,
        V: AsyncValidator + 'static,
    {
        self.insert(
            name.into(),
            CustomValidator::Async {
                precheck: Some(Arc::new(precheck)),
                check: Arc::new(validator),
            },
        )
    }

    fn insert(&mut self, name: String, validator: CustomValidator) -> &mut Self {
        if self.validators.insert(name.clone(), validator).is_some() {
            tracing::debug!(validator = %name, "replaced previously registered validator");
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&CustomValidator> {
        self.validators.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.validators.contains_key(name)
    }

    pub fn sync_names(&self) -> Vec<&str> {
        self.validators
            .iter()
            .filter(|(_, v)| !v.is_async())
            .map(|(k, _)| k.as_str())
            .collect()
    }

    pub fn async_names(&self) -> Vec<&str> {
        self.validators
            .iter()
            .filter(|(_, v)| v.is_async())
            .map(|(k, _)| k.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_lookup() {
        let mut registry = ValidatorRegistry::new();
        registry
            .register_sync("non_empty", |value: &Value, _ctx: &ValidatorContext<'_>| {
                match value.as_str() {
                    Some(s) if !s.is_empty() => Ok(()),
                    _ => Err("must be a non-empty string".to_string()),
                }
            })
            .register_async("remote", async_fn(|_value, _ctx| async { Ok(()) }));

        assert!(registry.contains("non_empty"));
        assert!(!registry.get("non_empty").unwrap().is_async());
        assert!(registry.get("remote").unwrap().is_async());
        assert_eq!(registry.sync_names(), vec!["non_empty"]);
        assert_eq!(registry.async_names(), vec!["remote"]);
    }

    #[test]
    fn test_context_lookups() {
        let root = Value::from_yaml_str("domain: example.com\nmatrix:\n  enabled: true\n").unwrap();
        let parent = root.get("matrix").and_then(Value::as_mapping).unwrap();
        let path = FieldPath::root().child("matrix").child("enabled");
        let diagnostics = Diagnostics::new();
        let ctx = ValidatorContext::new(&root, parent, &path, &diagnostics);

        assert_eq!(ctx.top_level("domain").and_then(Value::as_str), Some("example.com"));
        assert_eq!(ctx.sibling("enabled"), Some(&Value::Bool(true)));
        ctx.warn("heads up");
        assert_eq!(diagnostics.warning_count(), 1);
    }

    #[tokio::test]
    async fn test_async_fn_adapter() {
        let validator = async_fn(|value: Value, _ctx: AsyncContext| async move {
            if value.as_str() == Some("ok") {
                Ok(())
            } else {
                Err("not ok".to_string())
            }
        });
        let ctx = AsyncContext::new(
            Arc::new(Value::Null),
            Arc::new(Mapping::new()),
            FieldPath::root().child("x"),
        );
        assert!(validator.validate(Value::from("ok"), ctx.clone()).await.is_ok());
        assert_eq!(validator.validate(Value::from("no"), ctx).await, Err("not ok".to_string()));
    }
}
