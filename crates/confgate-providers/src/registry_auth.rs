//! Container registry credential check
//!
//! Probes the registry's `/v2/` endpoint and answers its authentication
//! challenge with the configured credentials. Both challenge schemes of
//! the distribution API are supported: `Basic` (credentials sent straight
//! to `/v2/`) and `Bearer` (credentials exchanged for a token at `realm`).

use crate::http::{CheckClient, ErrorClassification, HttpError};
use async_trait::async_trait;
use confgate_core::{AsyncContext, AsyncValidator, CheckResult, Mapping, ValidatorContext, Value};
use reqwest::header::WWW_AUTHENTICATE;
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{debug, instrument};
use url::Url;

const CREDENTIAL_KEYS: [&str; 3] = ["registry", "username", "password"];

/// Registry address and login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryCredentials {
    pub registry: String,
    pub username: String,
    pub password: String,
}

impl RegistryCredentials {
    pub fn from_mapping(mapping: &Mapping) -> Result<Self, String> {
        let field = |key: &str| -> Result<String, String> {
            match mapping.get(key).and_then(Value::as_str) {
                Some(s) if !s.is_empty() => Ok(s.to_string()),
                _ => Err(format!("registry credentials need a non-empty '{}'", key)),
            }
        };
        Ok(Self {
            registry: field("registry")?,
            username: field("username")?,
            password: field("password")?,
        })
    }

    pub fn from_value(value: &Value) -> Result<Self, String> {
        let mapping = value
            .as_mapping()
            .ok_or_else(|| format!("expected an object with {}", CREDENTIAL_KEYS.join(", ")))?;
        Self::from_mapping(mapping)
    }

    /// `https://<registry>/v2/` unless the registry names its own scheme
    pub fn probe_url(&self) -> Result<Url, String> {
        let base = if self.registry.contains("://") {
            self.registry.clone()
        } else {
            format!("https://{}", self.registry)
        };
        let base = Url::parse(&format!("{}/", base.trim_end_matches('/')))
            .map_err(|e| format!("invalid registry address '{}': {}", self.registry, e))?;
        base.join("v2/")
            .map_err(|e| format!("invalid registry address '{}': {}", self.registry, e))
    }
}

/// Parsed `WWW-Authenticate` challenge
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Challenge {
    Basic,
    Bearer { realm: String, params: BTreeMap<String, String> },
}

impl Challenge {
    pub fn parse(header: &str) -> Option<Self> {
        let header = header.trim();
        let (scheme, rest) = header.split_once(char::is_whitespace).unwrap_or((header, ""));
        match scheme.to_ascii_lowercase().as_str() {
            "basic" => Some(Challenge::Basic),
            "bearer" => {
                let mut params = parse_params(rest);
                let realm = params.remove("realm")?;
                Some(Challenge::Bearer { realm, params })
            }
            _ => None,
        }
    }
}

/// Split `key="value",key2=value2` pairs; quoted values may contain commas
fn parse_params(input: &str) -> BTreeMap<String, String> {
    let mut params = BTreeMap::new();
    let mut chars = input.chars().peekable();
    loop {
        while matches!(chars.peek(), Some(c) if c.is_whitespace() || *c == ',') {
            chars.next();
        }
        let key: String = chars.by_ref().take_while(|c| *c != '=').collect::<String>().trim().to_string();
        if key.is_empty() {
            break;
        }
        let mut value = String::new();
        if chars.peek() == Some(&'"') {
            chars.next();
            for c in chars.by_ref() {
                if c == '"' {
                    break;
                }
                value.push(c);
            }
        } else {
            while let Some(c) = chars.peek() {
                if *c == ',' {
                    break;
                }
                value.push(*c);
                chars.next();
            }
            value = value.trim().to_string();
        }
        params.insert(key.to_ascii_lowercase(), value);
    }
    params
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: Option<String>,
    access_token: Option<String>,
}

fn describe(error: HttpError) -> String {
    match error.classification {
        ErrorClassification::NetworkError => format!("could not reach registry: {}", error),
        _ => format!("registry request failed: {}", error),
    }
}

/// Async validator for container registry logins
#[derive(Debug, Clone)]
pub struct ContainerRegistryCheck {
    client: CheckClient,
}

impl ContainerRegistryCheck {
    pub fn new(client: CheckClient) -> Self {
        Self { client }
    }

    /// Shape check run during the structural pass
    pub fn precheck(value: &Value, _ctx: &ValidatorContext<'_>) -> CheckResult {
        RegistryCredentials::from_value(value).map(|_| ())
    }

    async fn answer_basic(&self, probe: &Url, creds: &RegistryCredentials) -> CheckResult {
        let response = self
            .client
            .send(|client| client.get(probe.clone()).basic_auth(&creds.username, Some(&creds.password)))
            .await
            .map_err(describe)?;
        expect_accepted(response, creds).await
    }

    async fn answer_bearer(
        &self,
        realm: &str,
        params: &BTreeMap<String, String>,
        creds: &RegistryCredentials,
    ) -> CheckResult {
        let mut url = Url::parse(realm).map_err(|e| format!("registry sent an invalid token realm '{}': {}", realm, e))?;
        {
            let mut query = url.query_pairs_mut();
            for key in ["service", "scope"] {
                if let Some(value) = params.get(key) {
                    query.append_pair(key, value);
                }
            }
            query.append_pair("account", &creds.username);
        }

        let response = self
            .client
            .send(|client| client.get(url.clone()).basic_auth(&creds.username, Some(&creds.password)))
            .await
            .map_err(describe)?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(rejected(creds));
        }
        if !status.is_success() {
            return Err(describe(HttpError::from_response(response).await));
        }
        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| format!("registry token endpoint returned an unexpected body: {}", e))?;
        match body.token.or(body.access_token) {
            Some(token) if !token.is_empty() => Ok(()),
            _ => Err("registry token endpoint did not issue a token".to_string()),
        }
    }
}

fn rejected(creds: &RegistryCredentials) -> String {
    format!(
        "registry '{}' rejected the credentials for user '{}'",
        creds.registry, creds.username
    )
}

async fn expect_accepted(response: Response, creds: &RegistryCredentials) -> CheckResult {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        Err(rejected(creds))
    } else {
        Err(describe(HttpError::from_response(response).await))
    }
}

#[async_trait]
impl AsyncValidator for ContainerRegistryCheck {
    #[instrument(skip_all)]
    async fn validate(&self, value: Value, _context: AsyncContext) -> CheckResult {
        let creds = RegistryCredentials::from_value(&value)?;
        let probe = creds.probe_url()?;

        let response = self.client.send(|client| client.get(probe.clone())).await.map_err(describe)?;
        let status = response.status();
        if status.is_success() {
            debug!(registry = %creds.registry, "registry allows anonymous access");
            return Ok(());
        }
        if status != StatusCode::UNAUTHORIZED {
            return Err(describe(HttpError::from_response(response).await));
        }

        let challenge = response
            .headers()
            .get(WWW_AUTHENTICATE)
            .and_then(|v| v.to_str().ok())
            .and_then(Challenge::parse);
        match challenge {
            Some(Challenge::Basic) => self.answer_basic(&probe, &creds).await,
            Some(Challenge::Bearer { realm, params }) => self.answer_bearer(&realm, &params, &creds).await,
            None => Err("registry returned 401 without a supported authentication challenge".to_string()),
        }
    }
}
