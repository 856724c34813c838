//! Error types for provider setup
//!
//! Failures of a check itself are reported as validation errors through the
//! core's `CheckResult`; this type only covers building the checks.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("invalid provider configuration: {0}")]
    Config(String),

    #[error("failed to create HTTP client: {0}")]
    Client(String),

    #[error("invalid URL '{url}': {source}")]
    Url {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

pub type Result<T> = std::result::Result<T, ProviderError>;
