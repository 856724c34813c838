//! Tests for CloudflareCheck against a mocked Cloudflare API.

use confgate_core::{AsyncContext, AsyncValidator, FieldPath, Mapping, Value};
use confgate_providers::{CheckClient, CheckClientConfig, CloudflareCheck, RetryPolicy};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{bearer_token, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "cf-test-token";

fn client() -> CheckClient {
    let config = CheckClientConfig {
        request_timeout_secs: 5,
        connect_timeout_secs: 2,
        retry: RetryPolicy::new(2)
            .with_base_delay(Duration::from_millis(5))
            .with_max_delay(Duration::from_millis(20)),
        ..Default::default()
    };
    CheckClient::new(&config).unwrap()
}

fn check(server: &MockServer) -> CloudflareCheck {
    CloudflareCheck::new(client(), &format!("{}/client/v4", server.uri()), "domain").unwrap()
}

fn context(domain: &str) -> AsyncContext {
    let root = Value::from_yaml_str(&format!("domain: {}\ncloudflare_token: {}\n", domain, TOKEN)).unwrap();
    let parent = root.as_mapping().cloned().unwrap_or_else(Mapping::new);
    AsyncContext::new(Arc::new(root), Arc::new(parent), FieldPath::root().child("cloudflare_token"))
}

async fn mount_token_status(server: &MockServer, status: &str) {
    Mock::given(method("GET"))
        .and(path("/client/v4/user/tokens/verify"))
        .and(bearer_token(TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "errors": [],
            "result": {"id": "abc", "status": status}
        })))
        .mount(server)
        .await;
}

async fn mount_zone(server: &MockServer, name: &str) {
    Mock::given(method("GET"))
        .and(path("/client/v4/zones"))
        .and(query_param("name", name))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "errors": [],
            "result": [{"id": "zone-1", "name": name}]
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/client/v4/zones"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "errors": [],
            "result": []
        })))
        .with_priority(10)
        .mount(server)
        .await;
}

async fn mount_ssl_mode(server: &MockServer, mode: &str) {
    Mock::given(method("GET"))
        .and(path("/client/v4/zones/zone-1/settings/ssl"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "errors": [],
            "result": {"id": "ssl", "value": mode}
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn accepts_active_token_with_strict_zone() {
    let server = MockServer::start().await;
    mount_token_status(&server, "active").await;
    mount_zone(&server, "example.com").await;
    mount_ssl_mode(&server, "strict").await;

    let result = check(&server)
        .validate(Value::from(TOKEN), context("matrix.example.com"))
        .await;
    assert_eq!(result, Ok(()));
}

#[tokio::test]
async fn rejects_inactive_token() {
    let server = MockServer::start().await;
    mount_token_status(&server, "disabled").await;

    let result = check(&server).validate(Value::from(TOKEN), context("example.com")).await;
    assert_eq!(result, Err("API token is not active (status: disabled)".to_string()));
}

#[tokio::test]
async fn reports_invalid_token_from_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/client/v4/user/tokens/verify"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "success": false,
            "errors": [{"code": 1000, "message": "Invalid API Token"}],
            "result": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = check(&server)
        .validate(Value::from(TOKEN), context("example.com"))
        .await
        .unwrap_err();
    assert!(err.contains("API token was rejected"), "{}", err);
    assert!(err.contains("Invalid API Token"), "{}", err);
}

#[tokio::test]
async fn rejects_zone_outside_account() {
    let server = MockServer::start().await;
    mount_token_status(&server, "active").await;
    mount_zone(&server, "other.org").await;

    let err = check(&server)
        .validate(Value::from(TOKEN), context("example.com"))
        .await
        .unwrap_err();
    assert_eq!(err, "no zone for domain 'example.com' is accessible with this API token");
}

#[tokio::test]
async fn rejects_flexible_ssl_mode() {
    let server = MockServer::start().await;
    mount_token_status(&server, "active").await;
    mount_zone(&server, "example.com").await;
    mount_ssl_mode(&server, "flexible").await;

    let err = check(&server)
        .validate(Value::from(TOKEN), context("example.com"))
        .await
        .unwrap_err();
    assert_eq!(err, "zone 'example.com' uses SSL mode 'flexible'; expected one of full, strict");
}

#[tokio::test]
async fn retries_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/client/v4/user/tokens/verify"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    mount_token_status(&server, "active").await;
    mount_zone(&server, "example.com").await;
    mount_ssl_mode(&server, "full").await;

    let result = check(&server).validate(Value::from(TOKEN), context("example.com")).await;
    assert_eq!(result, Ok(()));
}

#[tokio::test]
async fn unreachable_api_is_a_failure_not_a_skip() {
    let check = CloudflareCheck::new(client(), "http://127.0.0.1:1/client/v4", "domain").unwrap();
    let err = check
        .validate(Value::from(TOKEN), context("example.com"))
        .await
        .unwrap_err();
    assert!(err.starts_with("could not reach the Cloudflare API"), "{}", err);
}
