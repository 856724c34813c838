//! End-to-end tests of the asynchronous phase
//!
//! Checks are driven through `SchemaValidator::validate` with randomized
//! artificial delays so completion order differs between runs.

use confgate_core::{
    async_fn, cancellation, AsyncContext, CancelSignal, CheckResult, ErrorKind, Schema, SchemaRule,
    SchemaValidator, ValidationOptions, ValidatorRegistry, Value,
};
use rand::Rng;
use std::sync::Arc;
use std::time::{Duration, Instant};

async fn jittered(fail: bool) -> CheckResult {
    let delay = rand::thread_rng().gen_range(1..40);
    tokio::time::sleep(Duration::from_millis(delay)).await;
    if fail {
        Err("remote rejected value".to_string())
    } else {
        Ok(())
    }
}

fn registry() -> Arc<ValidatorRegistry> {
    let mut registry = ValidatorRegistry::with_builtins();
    registry
        .register_async("remote_ok", async_fn(|_value: Value, _ctx: AsyncContext| jittered(false)))
        .register_async("remote_fail", async_fn(|_value: Value, _ctx: AsyncContext| jittered(true)))
        .register_async(
            "remote_hang",
            async_fn(|_value: Value, _ctx: AsyncContext| async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            }),
        );
    Arc::new(registry)
}

/// Schema with `total` async fields of which the first `failing` fail
fn fan_out(total: usize, failing: usize) -> (SchemaValidator, Value) {
    let mut fields = Vec::new();
    let mut document = confgate_core::Mapping::new();
    for i in 0..total {
        let name = format!("field_{:02}", i);
        let kind = if i < failing { "remote_fail" } else { "remote_ok" };
        fields.push((name.clone(), SchemaRule::custom(kind)));
        document.insert(name, Value::from("value"));
    }
    let validator = SchemaValidator::new(Schema::new(fields).unwrap(), registry()).unwrap();
    (validator, Value::Mapping(document))
}

#[tokio::test]
async fn test_failure_count_is_order_independent() {
    for _ in 0..5 {
        let (validator, document) = fan_out(12, 5);
        let report = validator.validate(&document, &CancelSignal::never()).await;

        assert_eq!(report.async_checks_run, 12);
        assert_eq!(report.errors.by_kind(ErrorKind::Remote).count(), 5);
        let paths: Vec<String> = report.errors.iter().map(|e| e.path.to_string()).collect();
        assert_eq!(paths, vec!["field_00", "field_01", "field_02", "field_03", "field_04"]);
        assert!(report
            .errors
            .iter()
            .all(|e| e.message == "remote_fail: remote rejected value"));
    }
}

#[tokio::test]
async fn test_structural_errors_precede_async_results() {
    let (validator, document) = fan_out(3, 1);
    let mut mapping = document.as_mapping().cloned().unwrap();
    mapping.insert("unexpected".to_string(), Value::Bool(true));

    let report = validator.validate(&Value::Mapping(mapping), &CancelSignal::never()).await;
    assert_eq!(report.errors.len(), 2);
    assert_eq!(report.errors.by_kind(ErrorKind::UnknownField).count(), 1);
    assert_eq!(report.errors.by_kind(ErrorKind::Remote).count(), 1);
}

#[tokio::test]
async fn test_slow_check_times_out_without_blocking_others() {
    let schema = Schema::new([
        ("slow", SchemaRule::custom("remote_hang")),
        ("quick", SchemaRule::custom("remote_fail")),
    ])
    .unwrap();
    let validator = SchemaValidator::new(schema, registry())
        .unwrap()
        .with_options(ValidationOptions::default().with_call_timeout(Duration::from_millis(200)));
    let document = Value::from_yaml_str("slow: a\nquick: b\n").unwrap();

    let started = Instant::now();
    let report = validator.validate(&document, &CancelSignal::never()).await;
    assert!(started.elapsed() < Duration::from_secs(5));
    let messages: Vec<&str> = report.errors.iter().map(|e| e.message.as_str()).collect();
    assert_eq!(
        messages,
        vec!["remote_fail: remote rejected value", "remote_hang: timed out after 200ms"]
    );
}

#[tokio::test]
async fn test_cancellation_returns_promptly() {
    let schema = Schema::new([
        ("a", SchemaRule::custom("remote_hang")),
        ("b", SchemaRule::custom("remote_hang")),
        ("c", SchemaRule::custom("remote_hang")),
    ])
    .unwrap();
    let call_timeout = Duration::from_secs(2);
    let validator = SchemaValidator::new(schema, registry())
        .unwrap()
        .with_options(ValidationOptions::default().with_call_timeout(call_timeout));
    let document = Value::from_yaml_str("a: 1\nb: 2\nc: 3\n").unwrap();

    let (handle, signal) = cancellation();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.cancel();
    });

    let started = Instant::now();
    let report = validator.validate(&document, &signal).await;
    assert!(started.elapsed() < call_timeout);
    assert!(report.cancelled);
    assert_eq!(report.errors.len(), 3);
    assert!(report
        .errors
        .iter()
        .all(|e| e.message == "remote_hang: cancelled before completion"));
}
