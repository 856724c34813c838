//! Shared HTTP client for network-backed checks

use super::error::HttpError;
use super::retry::{execute_with_retry, RetryPolicy};
use crate::error::ProviderError;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the client used by every provider check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckClientConfig {
    /// Total time allowed for one request
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub retry: RetryPolicy,
    pub user_agent: String,
}

impl Default for CheckClientConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 8,
            connect_timeout_secs: 4,
            retry: RetryPolicy::default(),
            user_agent: format!("confgate/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl CheckClientConfig {
    pub fn validate(&self) -> Result<(), ProviderError> {
        if self.request_timeout_secs == 0 || self.connect_timeout_secs == 0 {
            return Err(ProviderError::Config("timeouts cannot be zero".to_string()));
        }
        if self.request_timeout_secs < self.connect_timeout_secs {
            return Err(ProviderError::Config(
                "request timeout should be >= connect timeout".to_string(),
            ));
        }
        Ok(())
    }
}

/// `reqwest` client plus retry policy
#[derive(Debug, Clone)]
pub struct CheckClient {
    client: Client,
    retry: RetryPolicy,
}

impl CheckClient {
    pub fn new(config: &CheckClientConfig) -> Result<Self, ProviderError> {
        config.validate()?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ProviderError::Client(e.to_string()))?;
        Ok(Self {
            client,
            retry: config.retry.clone(),
        })
    }

    /// Send a request, retrying transient failures
    ///
    /// Network errors, 429 and 5xx are retried. Any other response,
    /// including 401, is returned for the caller to interpret.
    pub async fn send<B>(&self, build: B) -> Result<Response, HttpError>
    where
        B: Fn(&Client) -> RequestBuilder,
    {
        let client = &self.client;
        let build = &build;
        execute_with_retry(
            || async move {
                let response = build(client).send().await.map_err(HttpError::from_request_error)?;
                let status = response.status();
                if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
                    return Err(HttpError::from_response(response).await);
                }
                Ok(response)
            },
            self.retry.clone(),
        )
        .await
    }

    /// Send a request and decode a successful JSON body
    pub async fn get_json<T, B>(&self, build: B) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
        B: Fn(&Client) -> RequestBuilder,
    {
        let response = self.send(build).await?;
        if !response.status().is_success() {
            return Err(HttpError::from_response(response).await);
        }
        response
            .json::<T>()
            .await
            .map_err(|e| HttpError::invalid_response(format!("unexpected response body: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(CheckClientConfig::default().validate().is_ok());
        assert!(CheckClient::new(&CheckClientConfig::default()).is_ok());
    }

    #[test]
    fn test_invalid_timeouts() {
        let config = CheckClientConfig {
            request_timeout_secs: 1,
            connect_timeout_secs: 5,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ProviderError::Config(_))));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: CheckClientConfig = serde_json::from_str(r#"{"request_timeout_secs": 20}"#).unwrap();
        assert_eq!(config.request_timeout_secs, 20);
        assert_eq!(config.connect_timeout_secs, 4);
        assert_eq!(config.retry, RetryPolicy::default());
    }
}
