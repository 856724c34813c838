//! Built-in synchronous validators
//!
//! Each validator is a plain function of `(value, context)` registered under
//! the type name schemas use to refer to it.

mod hostname;
mod numeric;
mod password;
mod rclone;
mod schedule;
mod ssh;
mod web;

pub use hostname::{domain, subdomain};
pub use numeric::{positive_number, whole_number};
pub use password::password;
pub use rclone::{rclone_template, RCLONE_TEMPLATES};
pub use schedule::{cron_special_time, timezone, CRON_SPECIAL_TIMES};
pub use ssh::{ssh_public_key, SSH_KEY_TYPES};
pub use web::url;

use crate::matcher::mismatch;
use crate::registry::ValidatorRegistry;
use crate::schema::FieldType;
use crate::value::Value;

/// Register every built-in validator under its schema type name
pub fn register_builtins(registry: &mut ValidatorRegistry) {
    registry
        .register_sync("subdomain", subdomain)
        .register_sync("domain", domain)
        .register_sync("whole_number", whole_number)
        .register_sync("positive_number", positive_number)
        .register_sync("url", url)
        .register_sync("ssh_public_key", ssh_public_key)
        .register_sync("cron_special_time", cron_special_time)
        .register_sync("timezone", timezone)
        .register_sync("rclone_template", rclone_template)
        .register_sync("password", password);
}

/// Borrow the value as a string or describe what was found instead
pub(crate) fn expect_str(value: &Value) -> Result<&str, String> {
    value.as_str().ok_or_else(|| mismatch(value, &FieldType::String))
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::diagnostics::{Diagnostics, Warning};
    use crate::path::FieldPath;
    use crate::registry::{CheckResult, ValidatorContext};
    use crate::value::{Mapping, Value};

    /// Run a validator against a standalone value, returning its warnings too
    pub fn run(
        validator: fn(&Value, &ValidatorContext<'_>) -> CheckResult,
        value: Value,
    ) -> (CheckResult, Vec<Warning>) {
        let root = Value::Mapping(Mapping::new());
        let parent = Mapping::new();
        let path = FieldPath::root().child("field");
        let diagnostics = Diagnostics::new();
        let result = {
            let ctx = ValidatorContext::new(&root, &parent, &path, &diagnostics);
            validator(&value, &ctx)
        };
        (result, diagnostics.into_warnings())
    }

    pub fn check(validator: fn(&Value, &ValidatorContext<'_>) -> CheckResult, value: &str) -> CheckResult {
        run(validator, Value::from(value)).0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_are_registered() {
        let registry = ValidatorRegistry::with_builtins();
        for name in [
            "subdomain",
            "domain",
            "whole_number",
            "positive_number",
            "url",
            "ssh_public_key",
            "cron_special_time",
            "timezone",
            "rclone_template",
            "password",
        ] {
            assert!(registry.contains(name), "missing built-in {}", name);
        }
        assert!(registry.async_names().is_empty());
    }

    #[test]
    fn test_expect_str() {
        assert_eq!(expect_str(&Value::from("x")), Ok("x"));
        assert_eq!(
            expect_str(&Value::Integer(3)),
            Err("expected a string, found integer 3".to_string())
        );
    }
}
