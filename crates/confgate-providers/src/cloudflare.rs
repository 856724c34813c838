//! Cloudflare API token check
//!
//! Verifies that a configured API token is active, that the zone for the
//! document's domain belongs to the token's account, and that the zone's
//! SSL mode terminates TLS at the origin (`full` or `strict`).
//!
//! Copyright (c) 2025 Confgate Team
//! Licensed under the Apache-2.0 license

use crate::error::ProviderError;
use crate::http::{CheckClient, ErrorClassification, HttpError};
use async_trait::async_trait;
use confgate_core::{AsyncContext, AsyncValidator, CheckResult, ValidatorContext, Value};
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

pub const CLOUDFLARE_API_URL: &str = "https://api.cloudflare.com/client/v4/";

/// SSL modes that encrypt the connection to the origin
const ACCEPTED_SSL_MODES: [&str; 2] = ["full", "strict"];

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    message: String,
}

#[derive(Debug, Deserialize)]
struct TokenStatus {
    status: String,
}

#[derive(Debug, Deserialize)]
struct Zone {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct Setting {
    value: String,
}

impl<T> Envelope<T> {
    fn into_result(self, what: &str) -> Result<T, String> {
        if !self.success {
            let reason = self
                .errors
                .first()
                .map(|e| e.message.as_str())
                .unwrap_or("request was not successful");
            return Err(format!("{}: {}", what, reason));
        }
        self.result
            .ok_or_else(|| format!("{}: response did not include a result", what))
    }
}

/// Candidate zone names for a domain, most specific first
///
/// `matrix.example.co.uk` yields `matrix.example.co.uk`, `example.co.uk`
/// and `co.uk`.
pub fn zone_candidates(domain: &str) -> Vec<String> {
    let domain = domain.trim_end_matches('.');
    let labels: Vec<&str> = domain.split('.').filter(|l| !l.is_empty()).collect();
    (0..labels.len().saturating_sub(1))
        .map(|start| labels[start..].join("."))
        .collect()
}

fn describe(error: HttpError, what: &str) -> String {
    match error.classification {
        ErrorClassification::AuthenticationError => {
            format!("{}: API token was rejected ({})", what, error)
        }
        ErrorClassification::NetworkError => format!("could not reach the Cloudflare API: {}", error),
        _ => format!("{}: {}", what, error),
    }
}

/// Async validator for Cloudflare API tokens
#[derive(Debug, Clone)]
pub struct CloudflareCheck {
    client: CheckClient,
    api_url: Url,
    domain_field: String,
}

impl CloudflareCheck {
    pub fn new(client: CheckClient, api_url: &str, domain_field: impl Into<String>) -> Result<Self, ProviderError> {
        // Keep a trailing slash so relative joins stay under the API prefix
        let normalized = format!("{}/", api_url.trim_end_matches('/'));
        let api_url = Url::parse(&normalized).map_err(|source| ProviderError::Url {
            url: api_url.to_string(),
            source,
        })?;
        Ok(Self {
            client,
            api_url,
            domain_field: domain_field.into(),
        })
    }

    pub fn domain_field(&self) -> &str {
        &self.domain_field
    }

    fn endpoint(&self, path: &str) -> Result<Url, String> {
        self.api_url
            .join(path)
            .map_err(|e| format!("invalid Cloudflare API path '{}': {}", path, e))
    }

    async fn verify_token(&self, token: &str) -> CheckResult {
        let url = self.endpoint("user/tokens/verify")?;
        let envelope: Envelope<TokenStatus> = self
            .client
            .get_json(|client| client.get(url.clone()).bearer_auth(token))
            .await
            .map_err(|e| describe(e, "token verification failed"))?;
        let status = envelope.into_result("token verification failed")?;
        if status.status == "active" {
            Ok(())
        } else {
            Err(format!("API token is not active (status: {})", status.status))
        }
    }

    async fn find_zone(&self, token: &str, domain: &str) -> Result<Zone, String> {
        for candidate in zone_candidates(domain) {
            let mut url = self.endpoint("zones")?;
            url.query_pairs_mut().append_pair("name", &candidate);
            let envelope: Envelope<Vec<Zone>> = self
                .client
                .get_json(|client| client.get(url.clone()).bearer_auth(token))
                .await
                .map_err(|e| describe(e, "zone lookup failed"))?;
            let zones = envelope.into_result("zone lookup failed")?;
            if let Some(zone) = zones.into_iter().find(|z| z.name == candidate) {
                debug!(zone = %zone.name, "found zone for domain");
                return Ok(zone);
            }
        }
        Err(format!(
            "no zone for domain '{}' is accessible with this API token",
            domain
        ))
    }

    async fn check_ssl_mode(&self, token: &str, zone: &Zone) -> CheckResult {
        let url = self.endpoint(&format!("zones/{}/settings/ssl", zone.id))?;
        let envelope: Envelope<Setting> = self
            .client
            .get_json(|client| client.get(url.clone()).bearer_auth(token))
            .await
            .map_err(|e| describe(e, "reading SSL settings failed"))?;
        let setting = envelope.into_result("reading SSL settings failed")?;
        if ACCEPTED_SSL_MODES.contains(&setting.value.as_str()) {
            Ok(())
        } else {
            Err(format!(
                "zone '{}' uses SSL mode '{}'; expected one of {}",
                zone.name,
                setting.value,
                ACCEPTED_SSL_MODES.join(", ")
            ))
        }
    }

    /// Shape check run during the structural pass
    pub fn precheck(&self) -> impl Fn(&Value, &ValidatorContext<'_>) -> CheckResult + Send + Sync + 'static {
        let domain_field = self.domain_field.clone();
        move |value: &Value, ctx: &ValidatorContext<'_>| -> CheckResult {
            match value.as_str() {
                Some(token) if !token.trim().is_empty() => {}
                _ => return Err("API token must be a non-empty string".to_string()),
            }
            match ctx.top_level(&domain_field).and_then(Value::as_str) {
                Some(domain) if !domain.is_empty() => Ok(()),
                _ => Err(format!(
                    "top-level field '{}' is required to verify the API token",
                    domain_field
                )),
            }
        }
    }
}

#[async_trait]
impl AsyncValidator for CloudflareCheck {
    #[instrument(skip_all, fields(path = %context.path()))]
    async fn validate(&self, value: Value, context: AsyncContext) -> CheckResult {
        let token = value
            .as_str()
            .ok_or_else(|| "API token must be a string".to_string())?;
        let domain = context
            .top_level(&self.domain_field)
            .and_then(Value::as_str)
            .ok_or_else(|| format!("top-level field '{}' is missing", self.domain_field))?;

        self.verify_token(token).await?;
        let zone = self.find_zone(token, domain).await?;
        self.check_ssl_mode(token, &zone).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::CheckClientConfig;
    use confgate_core::{Diagnostics, FieldPath, Mapping};

    #[test]
    fn test_zone_candidates() {
        assert_eq!(
            zone_candidates("matrix.example.co.uk"),
            vec!["matrix.example.co.uk", "example.co.uk", "co.uk"]
        );
        assert_eq!(zone_candidates("example.com."), vec!["example.com"]);
        assert!(zone_candidates("localhost").is_empty());
    }

    #[test]
    fn test_envelope_errors() {
        let failed: Envelope<TokenStatus> =
            serde_json::from_str(r#"{"success":false,"errors":[{"code":1000,"message":"Invalid API Token"}],"result":null}"#)
                .unwrap();
        assert_eq!(
            failed.into_result("token verification failed").unwrap_err(),
            "token verification failed: Invalid API Token"
        );
    }

    #[test]
    fn test_precheck_requires_domain_field() {
        let client = CheckClient::new(&CheckClientConfig::default()).unwrap();
        let check = CloudflareCheck::new(client, CLOUDFLARE_API_URL, "domain").unwrap();
        let precheck = check.precheck();

        let root = Value::from_yaml_str("cloudflare_token: abc\n").unwrap();
        let parent = Mapping::new();
        let path = FieldPath::root().child("cloudflare_token");
        let diagnostics = Diagnostics::new();
        let ctx = ValidatorContext::new(&root, &parent, &path, &diagnostics);

        assert!(precheck(&Value::from("abc"), &ctx).unwrap_err().contains("'domain'"));
        assert!(precheck(&Value::from(""), &ctx).unwrap_err().contains("non-empty"));
    }

    #[test]
    fn test_api_url_normalized() {
        let client = CheckClient::new(&CheckClientConfig::default()).unwrap();
        let check = CloudflareCheck::new(client, "http://127.0.0.1:9/client/v4", "domain").unwrap();
        assert_eq!(
            check.endpoint("zones").unwrap().as_str(),
            "http://127.0.0.1:9/client/v4/zones"
        );
    }
}
