//! Password strength
//!
//! Short passwords and passwords with surrounding whitespace are rejected.
//! Passwords that pass but are still weak only produce a warning.

use super::expect_str;
use crate::registry::{CheckResult, ValidatorContext};
use crate::value::Value;

const MIN_LENGTH: usize = 8;
const RECOMMENDED_LENGTH: usize = 12;
const RECOMMENDED_CLASSES: usize = 3;

fn character_classes(password: &str) -> usize {
    [
        password.chars().any(|c| c.is_lowercase()),
        password.chars().any(|c| c.is_uppercase()),
        password.chars().any(|c| c.is_ascii_digit()),
        password.chars().any(|c| !c.is_alphanumeric()),
    ]
    .into_iter()
    .filter(|present| *present)
    .count()
}

pub fn password(value: &Value, ctx: &ValidatorContext<'_>) -> CheckResult {
    let password = expect_str(value)?;
    let length = password.chars().count();
    if length < MIN_LENGTH {
        return Err(format!("password must be at least {} characters long", MIN_LENGTH));
    }
    if password.trim() != password {
        return Err("password must not start or end with whitespace".to_string());
    }

    let classes = character_classes(password);
    if length < RECOMMENDED_LENGTH {
        ctx.warn(format!(
            "password is shorter than the recommended {} characters",
            RECOMMENDED_LENGTH
        ));
    }
    if classes < RECOMMENDED_CLASSES {
        ctx.warn(format!(
            "password uses {} of 4 character classes; mixing lower case, upper case, digits and symbols is recommended",
            classes
        ));
    }
    Ok(())
}
