//! Configuration management for the CLI
//!
//! This module handles loading configuration from:
//! - an explicit `--config` path or `CONFGATE_CONFIG`
//! - `.confgate.yaml` (or `.json`) in the working directory
//! - `confgate/config.yaml` in the user configuration directory
//!
//! Document and schema paths in a configuration file are resolved relative
//! to the directory containing that file.

use crate::cli::OutputFormat;
use crate::error::{Error, Result};
use confgate_core::ValidationOptions;
use confgate_providers::ProvidersConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Documents validated when none are named on the command line
    pub documents: Vec<DocumentConfig>,

    /// Validation and remote check settings
    pub checks: ChecksConfig,

    /// Output settings
    pub output: OutputConfig,

    /// Logging settings
    pub logging: LoggingSettings,
}

/// A document and the schema it must satisfy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentConfig {
    /// Name used in reports; defaults to the file name
    #[serde(default)]
    pub name: Option<String>,
    pub path: PathBuf,
    pub schema: PathBuf,
}

impl DocumentConfig {
    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| {
            self.path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.path.display().to_string())
        })
    }
}

/// Validation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChecksConfig {
    /// Skip checks that contact remote services
    pub offline: bool,

    /// Deadline in seconds for each remote check
    pub timeout_secs: u64,

    /// Skip remote checks once structural errors are found
    pub fail_fast: bool,

    /// Errors reported per document, 0 for all
    pub max_errors: usize,

    #[serde(flatten)]
    pub providers: ProvidersConfig,
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format (human, json, json-pretty, yaml)
    pub format: String,

    /// Use colored output by default
    pub color: bool,
}

/// Logging configuration read from the configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level filter used when no `-v` flag or `RUST_LOG` is given
    pub level: Option<String>,

    /// Log format (compact, full, json)
    pub format: Option<String>,
}

impl Default for ChecksConfig {
    fn default() -> Self {
        Self {
            offline: false,
            timeout_secs: 10,
            fail_fast: false,
            max_errors: 0,
            providers: ProvidersConfig::default(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "human".to_string(),
            color: true,
        }
    }
}

impl ChecksConfig {
    /// Engine options derived from these settings
    pub fn validation_options(&self) -> ValidationOptions {
        let mut options = ValidationOptions::default()
            .with_call_timeout(Duration::from_secs(self.timeout_secs))
            .with_fail_fast(self.fail_fast)
            .with_max_errors(self.max_errors);
        options.run_async_checks = !self.offline;
        options
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("yaml") | Some("yml")
    )
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;

        let invalid = |expected: &str, reason: String| Error::InvalidFormat {
            path: path.to_path_buf(),
            expected: expected.to_string(),
            reason,
        };
        let mut config: Config = if is_yaml(path) {
            serde_yaml::from_str(&content).map_err(|e| invalid("YAML", e.to_string()))?
        } else {
            serde_json::from_str(&content).map_err(|e| invalid("JSON", e.to_string()))?
        };

        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        config.validate()?;
        tracing::debug!(path = %path.display(), documents = config.documents.len(), "loaded configuration");
        Ok(config)
    }

    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        match Self::default_config_paths().into_iter().find(|p| p.exists()) {
            Some(path) => Self::from_file(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific file or default locations
    pub fn load_with_file(file: Option<&Path>) -> Result<Self> {
        if let Some(path) = file {
            Self::from_file(path)
        } else {
            Self::load()
        }
    }

    /// Get default configuration file paths to check
    fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from(".confgate.yaml"),
            PathBuf::from(".confgate.yml"),
            PathBuf::from(".confgate.json"),
        ];

        if let Some(config_dir) = dirs::config_dir() {
            let confgate_dir = config_dir.join("confgate");
            paths.push(confgate_dir.join("config.yaml"));
            paths.push(confgate_dir.join("config.json"));
        }

        paths
    }

    fn resolve_paths(&mut self, base: &Path) {
        for document in &mut self.documents {
            if document.path.is_relative() {
                document.path = base.join(&document.path);
            }
            if document.schema.is_relative() {
                document.schema = base.join(&document.schema);
            }
        }
    }

    /// Reject settings that cannot produce a meaningful run
    pub fn validate(&self) -> Result<()> {
        if self.checks.timeout_secs == 0 {
            return Err(Error::config("checks.timeout_secs must be greater than zero"));
        }
        if OutputFormat::from_name(&self.output.format).is_none() {
            return Err(Error::config(format!(
                "unknown output format '{}'",
                self.output.format
            )));
        }
        let mut names = BTreeSet::new();
        for document in &self.documents {
            let name = document.display_name();
            if !names.insert(name.clone()) {
                return Err(Error::config(format!("document name '{}' is used twice", name)));
            }
        }
        self.checks
            .providers
            .client
            .validate()
            .map_err(|e| Error::config(e.to_string()))
    }

    /// Output format from the configuration file
    pub fn output_format(&self) -> OutputFormat {
        OutputFormat::from_name(&self.output.format).unwrap_or(OutputFormat::Human)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.documents.is_empty());
        assert_eq!(config.checks.timeout_secs, 10);
        assert_eq!(config.checks.providers.domain_field, "domain");
        assert_eq!(config.output_format(), OutputFormat::Human);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_yaml_resolves_relative_paths() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("confgate.yaml");
        std::fs::write(
            &path,
            r#"
documents:
  - name: settings
    path: group_vars/all/settings.yml
    schema: schemas/settings.yaml
  - path: /etc/app/vars.yml
    schema: schemas/vars.yaml
checks:
  timeout_secs: 3
  offline: true
  domain_field: base_domain
output:
  format: json
"#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.documents[0].path, dir.path().join("group_vars/all/settings.yml"));
        assert_eq!(config.documents[0].schema, dir.path().join("schemas/settings.yaml"));
        assert_eq!(config.documents[1].path, PathBuf::from("/etc/app/vars.yml"));
        assert_eq!(config.documents[1].display_name(), "vars.yml");
        assert_eq!(config.checks.timeout_secs, 3);
        assert_eq!(config.checks.providers.domain_field, "base_domain");
        assert_eq!(config.output_format(), OutputFormat::Json);

        let options = config.checks.validation_options();
        assert!(!options.run_async_checks);
        assert_eq!(options.call_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_load_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("confgate.json");
        std::fs::write(&path, r#"{"checks": {"fail_fast": true, "max_errors": 5}}"#).unwrap();

        let config = Config::from_file(&path).unwrap();
        assert!(config.checks.fail_fast);
        assert_eq!(config.checks.max_errors, 5);
        assert_eq!(config.checks.timeout_secs, 10);
    }

    #[test]
    fn test_rejects_duplicate_document_names() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("confgate.yaml");
        std::fs::write(
            &path,
            "documents:\n  - {path: a/settings.yml, schema: s.yaml}\n  - {path: b/settings.yml, schema: s.yaml}\n",
        )
        .unwrap();

        let err = Config::from_file(&path).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("'settings.yml' is used twice"));
    }

    #[test]
    fn test_rejects_zero_timeout_and_unknown_format() {
        let mut config = Config::default();
        config.checks.timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.output.format = "table".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_file_is_invalid_format() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("confgate.json");
        std::fs::write(&path, "{\"checks\": ").unwrap();

        let err = Config::from_file(&path).unwrap_err();
        assert!(matches!(err, Error::InvalidFormat { ref expected, .. } if expected == "JSON"));
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = Config::load_with_file(Some(Path::new("/nonexistent/confgate.yaml"))).unwrap_err();
        assert!(matches!(err, Error::FileNotFound { .. }));
        assert_eq!(err.exit_code(), 3);
    }
}
