//! Conditional gates between sibling fields
//!
//! `required_when_true` and `validate_when_true` name siblings in the same
//! enclosing mapping. A gate is open only when every named sibling coerces
//! to a truthy `ansible_bool`; missing or non-boolean siblings close it
//! without producing an error of their own.

use crate::matcher::coerce_ansible_bool;
use crate::schema::SchemaRule;
use crate::value::Mapping;

/// AND over the named siblings; an empty list is open
pub fn gate_open(siblings: &[String], parent: &Mapping) -> bool {
    siblings.iter().all(|name| {
        parent
            .get(name)
            .and_then(coerce_ansible_bool)
            .unwrap_or(false)
    })
}

/// Resolved gates for one field in one enclosing mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gates {
    /// Field must be present
    pub required: bool,
    /// Field, when present, is walked and validated
    pub validate: bool,
}

impl Gates {
    pub fn resolve(rule: &SchemaRule, parent: &Mapping) -> Self {
        let conditionally_required =
            !rule.required_when_true.is_empty() && gate_open(&rule.required_when_true, parent);
        Self {
            required: rule.required || conditionally_required,
            validate: gate_open(&rule.validate_when_true, parent),
        }
    }
}
