use super::expect_str;
use crate::registry::{CheckResult, ValidatorContext};
use crate::value::Value;
use url::Url;

/// Absolute `http` or `https` URL with a host
pub fn url(value: &Value, _ctx: &ValidatorContext<'_>) -> CheckResult {
    let raw = expect_str(value)?;
    if raw.is_empty() {
        return Err("URL cannot be empty".to_string());
    }
    if let Some(bad) = raw.chars().find(|c| c.is_whitespace() || c.is_control()) {
        return Err(format!("URL contains invalid character {:?}", bad));
    }
    let parsed = Url::parse(raw).map_err(|e| format!("'{}' is not a valid URL: {}", raw, e))?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(format!(
                "URL scheme must be http or https, got '{}'",
                other
            ))
        }
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(format!("URL '{}' has no host", raw));
    }
    Ok(())
}
