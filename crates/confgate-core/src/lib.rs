//! Confgate Core - schema validation engine for configuration documents
//!
//! Confgate checks parsed YAML/JSON configuration documents against a
//! declarative [`Schema`]. Validation happens in two phases:
//!
//! - a synchronous structural pass that matches types, resolves conditional
//!   gates between sibling fields and runs cheap custom validators inline;
//! - an asynchronous phase in which network-backed validators run
//!   concurrently, each with its own deadline, under a run-wide
//!   cancellation signal.
//!
//! Every finding is a [`ValidationError`] carrying the exact path of the
//! offending node (`rclone.remotes[0].settings.template`), so callers can
//! report all problems in one pass.
//!
//! ```no_run
//! use confgate_core::{CancelSignal, Schema, SchemaRule, SchemaValidator, ValidatorRegistry, Value};
//! use std::sync::Arc;
//!
//! # async fn demo() -> confgate_core::Result<()> {
//! let schema = Schema::new([
//!     ("domain", SchemaRule::custom("domain").required()),
//!     ("port", SchemaRule::number()),
//! ])?;
//! let validator = SchemaValidator::new(schema, Arc::new(ValidatorRegistry::with_builtins()))?;
//! let document = Value::from_yaml_str("domain: example.com\nport: \"8080\"\n")?;
//! let report = validator.validate(&document, &CancelSignal::never()).await;
//! assert!(report.is_valid());
//! # Ok(())
//! # }
//! ```
//!
//! Copyright (c) 2025 Confgate Team
//! Licensed under the Apache-2.0 license

pub mod batch;
pub mod conditional;
pub mod coordinator;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod path;
pub mod registry;
pub mod schema;
pub mod validators;
pub mod value;

pub use batch::{validate_documents, BatchReport, DocumentJob, DocumentReport};
pub use coordinator::{
    cancellation, AsyncCoordinator, CancelHandle, CancelSignal, CoordinatorOutcome, CoordinatorState, PendingCheck,
};
pub use diagnostics::{Diagnostics, Warning};
pub use engine::{SchemaValidator, StructuralOutcome, ValidationOptions, ValidationReport};
pub use error::{Error, ErrorKind, Result, SchemaError, ValidationError, ValidationErrors};
pub use path::{FieldPath, PathSegment};
pub use registry::{
    async_fn, AsyncContext, AsyncValidator, CheckResult, CustomValidator, SyncValidator, ValidatorContext,
    ValidatorRegistry,
};
pub use schema::{FieldType, Schema, SchemaRule};
pub use value::{Mapping, Value, ValueError};

/// Version of the confgate-core crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
