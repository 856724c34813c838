//! Validation of several documents in one run
//!
//! Each document carries its own validator and is checked independently; a
//! document that failed to load or failed validation never prevents the
//! others from being checked.

use crate::coordinator::CancelSignal;
use crate::engine::{SchemaValidator, ValidationReport};
use crate::error::ValidationError;
use crate::value::Value;
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{error, info, Instrument};

/// One document to validate
#[derive(Debug, Clone)]
pub struct DocumentJob {
    pub name: String,
    /// Parsed document, or the reason it could not be loaded
    pub document: Result<Value, String>,
    pub validator: Arc<SchemaValidator>,
}

impl DocumentJob {
    pub fn new<N: Into<String>>(name: N, document: Value, validator: Arc<SchemaValidator>) -> Self {
        Self {
            name: name.into(),
            document: Ok(document),
            validator,
        }
    }

    /// Job for a document that could not be read or parsed
    pub fn failed<N: Into<String>, E: Into<String>>(name: N, reason: E, validator: Arc<SchemaValidator>) -> Self {
        Self {
            name: name.into(),
            document: Err(reason.into()),
            validator,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentReport {
    pub name: String,
    #[serde(flatten)]
    pub report: ValidationReport,
}

/// Per-document reports in job order
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub documents: Vec<DocumentReport>,
}

impl BatchReport {
    pub fn is_valid(&self) -> bool {
        self.documents.iter().all(|d| d.report.is_valid())
    }

    pub fn total_errors(&self) -> usize {
        self.documents.iter().map(|d| d.report.errors.len()).sum()
    }

    pub fn total_warnings(&self) -> usize {
        self.documents.iter().map(|d| d.report.warnings.len()).sum()
    }

    pub fn invalid_documents(&self) -> impl Iterator<Item = &DocumentReport> {
        self.documents.iter().filter(|d| !d.report.is_valid())
    }

    pub fn cancelled(&self) -> bool {
        self.documents.iter().any(|d| d.report.cancelled)
    }
}

fn fatal_report(message: String) -> ValidationReport {
    ValidationReport {
        errors: ValidationError::fatal(message).into(),
        ..ValidationReport::default()
    }
}

/// Validate every job concurrently and collect the reports in job order
pub async fn validate_documents(jobs: Vec<DocumentJob>, cancel: &CancelSignal) -> BatchReport {
    let names: Vec<String> = jobs.iter().map(|job| job.name.clone()).collect();
    let mut reports: Vec<Option<ValidationReport>> = vec![None; jobs.len()];
    let mut tasks = JoinSet::new();

    for (index, job) in jobs.into_iter().enumerate() {
        let DocumentJob {
            name,
            document,
            validator,
        } = job;
        let document = match document {
            Ok(document) => document,
            Err(reason) => {
                error!(document = %name, "document could not be loaded: {}", reason);
                reports[index] = Some(fatal_report(reason));
                continue;
            }
        };
        let cancel = cancel.clone();
        let span = tracing::info_span!("document", name = %name);
        tasks.spawn(
            async move {
                let report = validator.validate(&document, &cancel).await;
                (index, report)
            }
            .instrument(span),
        );
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, report)) => reports[index] = Some(report),
            Err(e) => error!("document validation task failed: {}", e),
        }
    }

    let documents: Vec<DocumentReport> = names
        .into_iter()
        .zip(reports)
        .map(|(name, report)| DocumentReport {
            report: report.unwrap_or_else(|| fatal_report("validation did not complete".to_string())),
            name,
        })
        .collect();

    let batch = BatchReport { documents };
    info!(
        documents = batch.documents.len(),
        errors = batch.total_errors(),
        warnings = batch.total_warnings(),
        "batch validated"
    );
    batch
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ValidatorRegistry;
    use crate::schema::{Schema, SchemaRule};

    fn validator() -> Arc<SchemaValidator> {
        let schema = Schema::new([("name", SchemaRule::custom("subdomain").required())]).unwrap();
        Arc::new(SchemaValidator::new(schema, Arc::new(ValidatorRegistry::with_builtins())).unwrap())
    }

    #[tokio::test]
    async fn test_each_document_is_independent() {
        let v = validator();
        let jobs = vec![
            DocumentJob::new("good.yml", Value::from_yaml_str("name: app\n").unwrap(), v.clone()),
            DocumentJob::failed("broken.yml", "did not find expected key at line 2", v.clone()),
            DocumentJob::new("bad.yml", Value::from_yaml_str("name: -app\nother: 1\n").unwrap(), v),
        ];
        let batch = validate_documents(jobs, &CancelSignal::never()).await;

        let names: Vec<&str> = batch.documents.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["good.yml", "broken.yml", "bad.yml"]);
        assert!(batch.documents[0].report.is_valid());
        assert_eq!(batch.documents[1].report.errors.len(), 1);
        assert_eq!(batch.documents[2].report.errors.len(), 2);
        assert_eq!(batch.total_errors(), 3);
        assert_eq!(batch.invalid_documents().count(), 2);
        assert!(!batch.is_valid());
    }

    #[tokio::test]
    async fn test_empty_batch_is_valid() {
        let batch = validate_documents(Vec::new(), &CancelSignal::never()).await;
        assert!(batch.is_valid());
        assert_eq!(batch.total_errors(), 0);
    }
}
