//! Validate command handler

use crate::cli::{OutputFormat, ValidateArgs};
use crate::config::{ChecksConfig, Config};
use crate::error::{Error, Result};
use crate::handlers::schema::load_schema;
use crate::logging::{redaction, timing::Timer};
use crate::output::OutputWriter;
use confgate_core::{validate_documents, CancelSignal, DocumentJob, SchemaValidator, ValidatorRegistry, Value};
use confgate_providers::register_provider_checks;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn, Instrument};

/// Built-in validators plus the remote provider checks
///
/// Remote checks are registered even for offline runs so schemas naming
/// them still load.
pub fn build_registry(config: &Config) -> Result<ValidatorRegistry> {
    let mut registry = ValidatorRegistry::with_builtins();
    register_provider_checks(&mut registry, &config.checks.providers)?;
    Ok(registry)
}

/// A document to check and the schema it must satisfy
#[derive(Debug, Clone, PartialEq)]
struct Target {
    name: String,
    path: PathBuf,
    schema: PathBuf,
}

fn resolve_targets(args: &ValidateArgs, config: &Config) -> Result<Vec<Target>> {
    if !args.documents.is_empty() {
        let schema = args.schema.clone().ok_or_else(|| {
            Error::invalid_args("--schema is required when documents are named on the command line")
        })?;
        return Ok(args
            .documents
            .iter()
            .map(|path| Target {
                name: path.display().to_string(),
                path: path.clone(),
                schema: schema.clone(),
            })
            .collect());
    }
    if args.schema.is_some() {
        return Err(Error::invalid_args("--schema needs at least one DOCUMENT"));
    }
    if config.documents.is_empty() {
        return Err(Error::invalid_args(
            "nothing to validate: pass DOCUMENT paths with --schema or declare documents in .confgate.yaml",
        ));
    }
    Ok(config
        .documents
        .iter()
        .map(|document| Target {
            name: document.display_name(),
            path: document.path.clone(),
            schema: document.schema.clone(),
        })
        .collect())
}

/// Command-line flags layered over the configuration file
fn effective_checks(args: &ValidateArgs, config: &Config) -> Result<ChecksConfig> {
    let mut checks = config.checks.clone();
    if args.offline {
        checks.offline = true;
    }
    if let Some(timeout) = args.timeout {
        if timeout == 0 {
            return Err(Error::invalid_args("--timeout must be greater than zero"));
        }
        checks.timeout_secs = timeout;
    }
    if args.fail_fast {
        checks.fail_fast = true;
    }
    if let Some(max_errors) = args.max_errors {
        checks.max_errors = max_errors;
    }
    Ok(checks)
}

/// Read and parse a document; failures are reported against that document
fn load_document(path: &Path) -> std::result::Result<Value, String> {
    let content =
        fs::read_to_string(path).map_err(|e| format!("could not read {}: {}", path.display(), e))?;
    let parsed = match path.extension().and_then(|s| s.to_str()) {
        Some("json") => Value::from_json_str(&content),
        _ => Value::from_yaml_str(&content),
    };
    parsed.map_err(|e| format!("could not parse {}: {}", path.display(), e))
}

/// Handle the validate command
#[instrument(skip_all, fields(documents = args.documents.len(), offline = args.offline))]
pub async fn handle_validate(
    args: ValidateArgs,
    config: &Config,
    output: &mut OutputWriter,
    cancel: CancelSignal,
) -> Result<()> {
    let targets = resolve_targets(&args, config)?;
    let checks = effective_checks(&args, config)?;
    let options = checks.validation_options();
    let registry = Arc::new(build_registry(config)?);
    debug!(options = ?options, "validation options");

    let mut schemas: BTreeMap<PathBuf, Arc<SchemaValidator>> = BTreeMap::new();
    let mut jobs = Vec::with_capacity(targets.len());
    let mut loaded = Vec::new();
    for target in targets {
        let validator = match schemas.get(&target.schema) {
            Some(validator) => validator.clone(),
            None => {
                let validator = Arc::new(load_schema(&target.schema, registry.clone())?.with_options(options.clone()));
                schemas.insert(target.schema.clone(), validator.clone());
                validator
            }
        };

        output.info(&format!("Validating {}", target.path.display()))?;
        match load_document(&target.path) {
            Ok(document) => {
                loaded.push((target.name.clone(), document.clone()));
                jobs.push(DocumentJob::new(target.name, document, validator));
            }
            Err(reason) => {
                warn!(document = %target.name, "{}", reason);
                jobs.push(DocumentJob::failed(target.name, reason, validator));
            }
        }
    }

    let report = {
        let timer = Timer::with_details("validate_documents", &format!("{} document(s)", jobs.len()));
        validate_documents(jobs, &cancel).instrument(timer.span().clone()).await
    };
    info!(
        documents = report.documents.len(),
        errors = report.total_errors(),
        warnings = report.total_warnings(),
        "validation finished"
    );

    output.batch_report(&report)?;

    if args.show_documents {
        if output.format() == OutputFormat::Human {
            for (name, document) in &loaded {
                output.section(&format!("Document: {}", name))?;
                let mut shown = serde_json::to_value(document)?;
                redaction::redact_json_value(&mut shown);
                output.data(&shown)?;
            }
        } else {
            debug!("--show-documents only applies to human output");
        }
    }

    if report.cancelled() {
        output.warning("Remote checks were cancelled; results are incomplete")?;
        return Err(Error::Cancelled);
    }
    if !report.is_valid() {
        return Err(Error::ValidationFailed {
            errors: report.total_errors(),
            documents: report.invalid_documents().count(),
        });
    }
    Ok(())
}
