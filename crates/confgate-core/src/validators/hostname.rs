//! RFC-1123 host labels and domain names

use super::expect_str;
use crate::registry::{CheckResult, ValidatorContext};
use crate::value::Value;

const MAX_LABEL_LEN: usize = 63;
const MAX_DOMAIN_LEN: usize = 253;

fn check_label(label: &str) -> CheckResult {
    if label.is_empty() {
        return Err("subdomain cannot be empty".to_string());
    }
    if label.len() > MAX_LABEL_LEN {
        return Err(format!(
            "subdomain '{}' is longer than {} characters",
            label, MAX_LABEL_LEN
        ));
    }
    if let Some(bad) = label.chars().find(|c| !(c.is_ascii_alphanumeric() || *c == '-')) {
        return Err(format!(
            "subdomain '{}' contains invalid character '{}'; only letters, digits and hyphens are allowed",
            label, bad
        ));
    }
    if label.starts_with('-') {
        return Err(format!("subdomain '{}' cannot start with a hyphen", label));
    }
    if label.ends_with('-') {
        return Err(format!("subdomain '{}' cannot end with a hyphen", label));
    }
    if label.contains("--") {
        return Err(format!("subdomain '{}' cannot contain consecutive hyphens", label));
    }
    Ok(())
}

/// Single host label such as `matrix` or `files-01`
pub fn subdomain(value: &Value, _ctx: &ValidatorContext<'_>) -> CheckResult {
    check_label(expect_str(value)?)
}

/// Fully qualified domain name such as `example.com`
pub fn domain(value: &Value, _ctx: &ValidatorContext<'_>) -> CheckResult {
    let name = expect_str(value)?;
    if name.is_empty() {
        return Err("domain cannot be empty".to_string());
    }
    if name.len() > MAX_DOMAIN_LEN {
        return Err(format!("domain is longer than {} characters", MAX_DOMAIN_LEN));
    }
    let labels: Vec<&str> = name.split('.').collect();
    if labels.len() < 2 {
        return Err(format!("domain '{}' must contain at least one dot", name));
    }
    for label in &labels {
        check_label(label).map_err(|e| format!("domain '{}': {}", name, e.replacen("subdomain", "label", 1)))?;
    }
    let tld = labels[labels.len() - 1];
    if !tld.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(format!("domain '{}' has a non-alphabetic top-level label '{}'", name, tld));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::test_support::check;

    #[test]
    fn test_valid_subdomains() {
        for ok in ["matrix", "files-01", "A1", "x"] {
            assert!(check(subdomain, ok).is_ok(), "{} should pass", ok);
        }
    }

    #[test]
    fn test_each_subdomain_failure_is_distinct() {
        let long = "a".repeat(64);
        let cases = [
            ("", "cannot be empty"),
            (long.as_str(), "longer than 63"),
            ("-abc", "start with a hyphen"),
            ("abc-", "end with a hyphen"),
            ("a--b", "consecutive hyphens"),
            ("my_host", "invalid character '_'"),
        ];
        for (input, expected) in cases {
            let err = check(subdomain, input).unwrap_err();
            assert!(err.contains(expected), "{:?}: got {}", input, err);
        }
    }

    #[test]
    fn test_subdomain_rejects_non_strings() {
        assert!(crate::validators::test_support::run(subdomain, Value::Integer(5)).0.is_err());
    }

    #[test]
    fn test_domains() {
        assert!(check(domain, "example.com").is_ok());
        assert!(check(domain, "matrix.example.co.uk").is_ok());
        assert!(check(domain, "localhost").unwrap_err().contains("at least one dot"));
        assert!(check(domain, "example.123").unwrap_err().contains("non-alphabetic"));
        assert!(check(domain, "bad_label.example.com").unwrap_err().contains("invalid character"));
        assert!(check(domain, "example..com").unwrap_err().contains("label cannot be empty"));
    }
}
