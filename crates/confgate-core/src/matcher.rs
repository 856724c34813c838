//! Type-flexible matching of scalar values
//!
//! Coercions here are read-only: they decide whether a value would be
//! accepted as the declared type and never rewrite the document.

use crate::schema::FieldType;
use crate::value::Value;

const ANSIBLE_TRUE: [&str; 4] = ["yes", "true", "on", "1"];
const ANSIBLE_FALSE: [&str; 4] = ["no", "false", "off", "0"];

/// Interpret a value as an Ansible-style boolean
///
/// Native booleans and the strings yes/no/true/false/on/off/1/0 (any case)
/// are accepted. Native numbers are not.
pub fn coerce_ansible_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => {
            let lowered = s.to_ascii_lowercase();
            if ANSIBLE_TRUE.contains(&lowered.as_str()) {
                Some(true)
            } else if ANSIBLE_FALSE.contains(&lowered.as_str()) {
                Some(false)
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Interpret a value as an integer: native integers or integer strings
pub fn coerce_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Integer(i) => Some(*i),
        Value::String(s) => s.parse::<i64>().ok(),
        _ => None,
    }
}

/// Interpret a value as a fractional number
///
/// Native floats are accepted, native integers are not. Strings must parse
/// as a finite float and must not also parse as an integer, so `"2"` is
/// rejected while `"2.0"` and `"1e3"` are accepted.
pub fn coerce_float(value: &Value) -> Option<f64> {
    match value {
        Value::Float(f) if f.is_finite() => Some(*f),
        Value::String(s) if s.parse::<i64>().is_err() => {
            s.parse::<f64>().ok().filter(|f| f.is_finite())
        }
        _ => None,
    }
}

/// Check a value against a scalar type
///
/// Returns a mismatch description on failure. Structural and custom types
/// are handled by the engine and always pass here.
pub fn check_scalar(value: &Value, field_type: &FieldType) -> Result<(), String> {
    let accepted = match field_type {
        FieldType::String => matches!(value, Value::String(_)),
        FieldType::Boolean => matches!(value, Value::Bool(_)),
        FieldType::Number => coerce_integer(value).is_some(),
        FieldType::Float => coerce_float(value).is_some(),
        FieldType::AnsibleBool => coerce_ansible_bool(value).is_some(),
        FieldType::Object | FieldType::Array | FieldType::Custom(_) => true,
    };
    if accepted {
        Ok(())
    } else {
        Err(mismatch(value, field_type))
    }
}

/// Describe a type mismatch, quoting short scalar values
pub fn mismatch(value: &Value, field_type: &FieldType) -> String {
    let expected = match field_type {
        FieldType::String => "a string",
        FieldType::Number => "an integer or integer string",
        FieldType::Float => "a fractional number or float string",
        FieldType::Boolean => "a boolean",
        FieldType::AnsibleBool => "a boolean or one of yes/no/true/false/on/off/1/0",
        FieldType::Object => "an object",
        FieldType::Array => "an array",
        FieldType::Custom(name) => name.as_str(),
    };
    match value {
        Value::String(s) if s.len() <= 40 => {
            format!("expected {}, found string \"{}\"", expected, s)
        }
        Value::Integer(i) => format!("expected {}, found integer {}", expected, i),
        Value::Float(f) => format!("expected {}, found float {}", expected, f),
        Value::Bool(b) => format!("expected {}, found boolean {}", expected, b),
        other => format!("expected {}, found {}", expected, other.kind()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> Value {
        Value::String(v.to_string())
    }

    #[test]
    fn test_number_accepts_integers_and_integer_strings() {
        assert!(check_scalar(&Value::Integer(8080), &FieldType::Number).is_ok());
        assert!(check_scalar(&s("8080"), &FieldType::Number).is_ok());
        assert!(check_scalar(&s("abc"), &FieldType::Number).is_err());
        assert!(check_scalar(&Value::Float(1.5), &FieldType::Number).is_err());
    }

    #[test]
    fn test_float_rejects_native_integers() {
        assert!(check_scalar(&Value::Float(1.25), &FieldType::Float).is_ok());
        assert!(check_scalar(&s("1.25"), &FieldType::Float).is_ok());
        assert!(check_scalar(&Value::Float(2.0), &FieldType::Float).is_ok());
        assert!(check_scalar(&Value::Integer(5), &FieldType::Float).is_err());
        assert!(check_scalar(&s("abc"), &FieldType::Float).is_err());
    }

    #[test]
    fn test_float_string_forms() {
        assert_eq!(coerce_float(&s("1e3")), Some(1000.0));
        assert_eq!(coerce_float(&s("2")), None);
        assert_eq!(coerce_float(&s("inf")), None);
        assert_eq!(coerce_float(&s("NaN")), None);
    }

    #[test]
    fn test_ansible_bool_forms() {
        for accepted in [Value::Bool(true), s("yes"), s("ON"), s("1"), Value::Bool(false), s("no"), s("off"), s("0")] {
            assert!(
                check_scalar(&accepted, &FieldType::AnsibleBool).is_ok(),
                "{:?} should be accepted",
                accepted
            );
        }
        for rejected in [s("maybe"), Value::Integer(123), Value::Null, Value::Integer(1)] {
            assert!(
                check_scalar(&rejected, &FieldType::AnsibleBool).is_err(),
                "{:?} should be rejected",
                rejected
            );
        }
        assert_eq!(coerce_ansible_bool(&s("True")), Some(true));
        assert_eq!(coerce_ansible_bool(&s("OFF")), Some(false));
    }

    #[test]
    fn test_strict_string_and_boolean() {
        assert!(check_scalar(&Value::Integer(1), &FieldType::String).is_err());
        assert!(check_scalar(&s("true"), &FieldType::Boolean).is_err());
        assert!(check_scalar(&Value::Null, &FieldType::String).is_err());
    }

    #[test]
    fn test_mismatch_messages() {
        assert_eq!(
            mismatch(&Value::Null, &FieldType::String),
            "expected a string, found null"
        );
        assert_eq!(
            mismatch(&s("abc"), &FieldType::Number),
            "expected an integer or integer string, found string \"abc\""
        );
    }
}
