//! Schema command handler and schema loading shared with `validate`

use crate::cli::{OutputFormat, SchemaArgs};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::handlers::validate::build_registry;
use crate::output::OutputWriter;
use confgate_core::{Schema, SchemaValidator, ValidatorRegistry};
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Read and check a schema definition without binding it to validators
fn read_schema(path: &Path) -> Result<Schema> {
    if !path.exists() {
        return Err(Error::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let content = fs::read_to_string(path)?;
    let parsed = match path.extension().and_then(|s| s.to_str()) {
        Some("json") => Schema::from_json_str(&content),
        _ => Schema::from_yaml_str(&content),
    };
    parsed.map_err(|source| Error::Schema {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a schema and bind its custom types to `registry`
pub fn load_schema(path: &Path, registry: Arc<ValidatorRegistry>) -> Result<SchemaValidator> {
    let schema = read_schema(path)?;
    let validator = SchemaValidator::new(schema, registry).map_err(|source| Error::Schema {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), fields = validator.schema().fields().len(), "loaded schema");
    Ok(validator)
}

/// Custom type referenced by a schema
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomTypeUse {
    pub path: String,
    pub validator: String,
    /// Backed by a remote check
    pub remote: bool,
}

/// What the schema command reports
#[derive(Debug, Serialize)]
pub struct SchemaSummary<'a> {
    pub file: String,
    pub fields: Vec<&'a str>,
    pub custom_types: Vec<CustomTypeUse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<&'a Schema>,
}

impl<'a> SchemaSummary<'a> {
    pub fn new(file: &Path, validator: &'a SchemaValidator) -> Self {
        let registry = validator.registry();
        let custom_types = validator
            .schema()
            .custom_types()
            .into_iter()
            .map(|(path, name)| CustomTypeUse {
                remote: registry.get(&name).map(|v| v.is_async()).unwrap_or(false),
                path,
                validator: name,
            })
            .collect();
        Self {
            file: file.display().to_string(),
            fields: validator.schema().fields().keys().map(String::as_str).collect(),
            custom_types,
            schema: None,
        }
    }
}

/// Handle the schema command
#[instrument(skip(config, output), fields(file = %args.file.display()))]
pub fn handle_schema(args: SchemaArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let registry = Arc::new(build_registry(config)?);
    let validator = load_schema(&args.file, registry)?;
    let mut summary = SchemaSummary::new(&args.file, &validator);

    if output.format() != OutputFormat::Human {
        if args.show {
            summary.schema = Some(validator.schema());
        }
        return output.data(&summary);
    }

    output.success(&format!(
        "✓ {} is a valid schema with {} top-level field(s)",
        summary.file,
        summary.fields.len()
    ))?;
    for custom in &summary.custom_types {
        let kind = if custom.remote { "remote check" } else { "check" };
        output.info(&format!("{} uses {} '{}'", custom.path, kind, custom.validator))?;
    }
    if args.show {
        output.section("Schema")?;
        output.data(validator.schema())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const SCHEMA: &str = r#"
domain:
  type: domain
  required: true
cloudflare_token:
  type: cloudflare_api_token
  required_when_true: [use_cloudflare]
  validate_when_true: [use_cloudflare]
use_cloudflare:
  type: ansible_bool
"#;

    fn registry() -> Arc<ValidatorRegistry> {
        Arc::new(build_registry(&Config::default()).unwrap())
    }

    #[test]
    fn test_summary_marks_remote_checks() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("schema.yaml");
        fs::write(&path, SCHEMA).unwrap();

        let validator = load_schema(&path, registry()).unwrap();
        let summary = SchemaSummary::new(&path, &validator);
        assert_eq!(summary.fields, vec!["cloudflare_token", "domain", "use_cloudflare"]);
        assert_eq!(
            summary.custom_types,
            vec![
                CustomTypeUse {
                    path: "cloudflare_token".to_string(),
                    validator: "cloudflare_api_token".to_string(),
                    remote: true,
                },
                CustomTypeUse {
                    path: "domain".to_string(),
                    validator: "domain".to_string(),
                    remote: false,
                },
            ]
        );
    }

    #[test]
    fn test_unknown_custom_type_is_a_schema_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("schema.json");
        fs::write(&path, r#"{"mode": {"type": "tls_mode"}}"#).unwrap();

        let err = load_schema(&path, registry()).unwrap_err();
        assert!(matches!(err, Error::Schema { .. }));
        assert!(err.to_string().contains("tls_mode"));
        assert_eq!(err.exit_code(), 7);
    }

    #[test]
    fn test_missing_schema_file() {
        let err = load_schema(Path::new("/nonexistent/schema.yaml"), registry()).unwrap_err();
        assert!(matches!(err, Error::FileNotFound { .. }));
    }
}
