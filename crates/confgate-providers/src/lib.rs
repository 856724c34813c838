//! Confgate Providers - network-backed validators
//!
//! Implementations of the core's [`AsyncValidator`] contract that talk to
//! third-party services:
//!
//! - `cloudflare_api_token`: token is active, owns the zone of the
//!   document's domain, and the zone's SSL mode is `full` or `strict`
//! - `container_registry`: registry accepts the configured login
//!
//! Every check shares one HTTP client with bounded timeouts and retries
//! for transient failures.
//!
//! Copyright (c) 2025 Confgate Team
//! Licensed under the Apache-2.0 license

pub mod cloudflare;
pub mod error;
pub mod http;
pub mod registry_auth;

pub use cloudflare::{CloudflareCheck, CLOUDFLARE_API_URL};
pub use confgate_core::AsyncValidator;
pub use error::{ProviderError, Result};
pub use http::{CheckClient, CheckClientConfig, HttpError, RetryPolicy};
pub use registry_auth::{Challenge, ContainerRegistryCheck, RegistryCredentials};

use confgate_core::ValidatorRegistry;
use serde::{Deserialize, Serialize};

pub const CLOUDFLARE_VALIDATOR: &str = "cloudflare_api_token";
pub const REGISTRY_VALIDATOR: &str = "container_registry";

/// Settings for the provider checks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub cloudflare_api_url: String,
    /// Top-level document field holding the domain to verify
    pub domain_field: String,
    pub client: CheckClientConfig,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            cloudflare_api_url: CLOUDFLARE_API_URL.to_string(),
            domain_field: "domain".to_string(),
            client: CheckClientConfig::default(),
        }
    }
}

/// Register every provider check in `registry`
pub fn register_provider_checks(registry: &mut ValidatorRegistry, config: &ProvidersConfig) -> Result<()> {
    let client = CheckClient::new(&config.client)?;

    let cloudflare = CloudflareCheck::new(client.clone(), &config.cloudflare_api_url, config.domain_field.clone())?;
    let precheck = cloudflare.precheck();
    registry.register_async_with_precheck(CLOUDFLARE_VALIDATOR, precheck, cloudflare);

    registry.register_async_with_precheck(
        REGISTRY_VALIDATOR,
        ContainerRegistryCheck::precheck,
        ContainerRegistryCheck::new(client),
    );

    tracing::debug!(
        validators = ?registry.async_names(),
        "registered provider checks"
    );
    Ok(())
}
