//! Property-based tests for the structural pass
//!
//! Arbitrary documents must never panic the engine, and validating the same
//! document twice must give the same answer without mutating anything.

use confgate_core::{Mapping, Schema, SchemaRule, SchemaValidator, ValidatorRegistry, Value};
use proptest::prelude::*;
use std::sync::Arc;

/// Strategy for random document trees biased towards the schema's key names
fn value_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Integer),
        (-1.0e6f64..1.0e6).prop_map(Value::Float),
        prop_oneof![
            Just("yes".to_string()),
            Just("off".to_string()),
            Just("8080".to_string()),
            Just("example.com".to_string()),
            "[a-zA-Z0-9_.-]{0,20}",
        ]
        .prop_map(Value::String),
    ];

    leaf.prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..5).prop_map(Value::Sequence),
            proptest::collection::btree_map(key_strategy(), inner, 0..6).prop_map(Value::Mapping),
        ]
    })
}

fn key_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("enabled".to_string()),
        Just("remotes".to_string()),
        Just("name".to_string()),
        Just("settings".to_string()),
        Just("template".to_string()),
        Just("port".to_string()),
        "[a-z_]{1,10}",
    ]
}

fn document_strategy() -> impl Strategy<Value = Value> {
    proptest::collection::btree_map(key_strategy(), value_strategy(), 0..8)
        .prop_map(|m: Mapping| Value::Mapping(m))
}

fn validator() -> SchemaValidator {
    let schema = Schema::new([
        ("enabled", SchemaRule::ansible_bool()),
        ("port", SchemaRule::custom("positive_number")),
        ("name", SchemaRule::custom("subdomain")),
        (
            "remotes",
            SchemaRule::array(SchemaRule::object([
                ("name", SchemaRule::string().required()),
                (
                    "settings",
                    SchemaRule::object([("template", SchemaRule::custom("rclone_template").required())]),
                ),
            ]))
            .required_when_true(["enabled"])
            .validate_when_true(["enabled"]),
        ),
    ])
    .unwrap();
    SchemaValidator::new(schema, Arc::new(ValidatorRegistry::with_builtins())).unwrap()
}

fn rendered(validator: &SchemaValidator, document: &Value) -> Vec<String> {
    validator
        .validate_structure(document)
        .errors
        .iter()
        .map(ToString::to_string)
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_never_panics_on_any_tree(document in value_strategy()) {
        let outcome = validator().validate_structure(&document);
        if document.as_mapping().is_none() {
            prop_assert!(outcome.fatal);
            prop_assert_eq!(outcome.errors.len(), 1);
        }
    }

    #[test]
    fn prop_validation_is_idempotent(document in document_strategy()) {
        let validator = validator();
        let snapshot = document.clone();
        let first = rendered(&validator, &document);
        let second = rendered(&validator, &document);
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(&document, &snapshot);
    }

    #[test]
    fn prop_every_unknown_key_is_reported(extra in "[A-Z]{3,8}") {
        let validator = validator();
        let mut mapping = Mapping::new();
        mapping.insert(extra.clone(), Value::Null);
        let errors = rendered(&validator, &Value::Mapping(mapping));
        prop_assert_eq!(errors, vec![format!("{}: unknown field '{}'", extra, extra)]);
    }
}
