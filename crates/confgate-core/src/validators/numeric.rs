use crate::matcher::{coerce_integer, mismatch};
use crate::registry::{CheckResult, ValidatorContext};
use crate::schema::FieldType;
use crate::value::Value;

fn integer(value: &Value) -> Result<i64, String> {
    coerce_integer(value).ok_or_else(|| mismatch(value, &FieldType::Number))
}

/// Integer that is zero or greater
pub fn whole_number(value: &Value, _ctx: &ValidatorContext<'_>) -> CheckResult {
    let n = integer(value)?;
    if n < 0 {
        return Err(format!("must be a whole number (0 or greater), got {}", n));
    }
    Ok(())
}

/// Integer strictly greater than zero
pub fn positive_number(value: &Value, _ctx: &ValidatorContext<'_>) -> CheckResult {
    let n = integer(value)?;
    if n <= 0 {
        return Err(format!("must be a positive number (greater than 0), got {}", n));
    }
    Ok(())
}
