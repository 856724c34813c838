//! Concurrent execution of queued asynchronous validators
//!
//! The coordinator moves through `Idle -> Dispatching -> Collecting -> Done`.
//! Every queued check becomes its own task with its own deadline, so a slow
//! or failing service never blocks or aborts the others. Results are
//! reported over a channel and merged into path-qualified errors.
//!
//! Copyright (c) 2025 Confgate Team
//! Licensed under the Apache-2.0 license

use crate::error::ValidationError;
use crate::path::FieldPath;
use crate::registry::{AsyncContext, AsyncValidator, CheckResult};
use crate::value::Value;
use futures::FutureExt;
use std::collections::HashMap;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tracing::{debug, info, warn, Instrument};

/// Default deadline for a single asynchronous check
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// Lifecycle of a coordinator run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    Idle,
    Dispatching,
    Collecting,
    Done,
}

impl fmt::Display for CoordinatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordinatorState::Idle => write!(f, "idle"),
            CoordinatorState::Dispatching => write!(f, "dispatching"),
            CoordinatorState::Collecting => write!(f, "collecting"),
            CoordinatorState::Done => write!(f, "done"),
        }
    }
}

/// Sending half of a run-wide cancellation signal
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Raise the signal; every clone of the paired [`CancelSignal`] observes it
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Receiving half of a run-wide cancellation signal
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    /// Signal that is never raised
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once the signal is raised; pends forever if it never can be
    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                // Sender dropped without cancelling
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Create a linked cancellation handle and signal
pub fn cancellation() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelSignal { rx })
}

/// An asynchronous check queued by the structural pass
#[derive(Clone)]
pub struct PendingCheck {
    pub validator: String,
    pub path: FieldPath,
    pub value: Value,
    pub context: AsyncContext,
    pub check: Arc<dyn AsyncValidator>,
}

impl fmt::Debug for PendingCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingCheck")
            .field("validator", &self.validator)
            .field("path", &self.path.to_string())
            .finish()
    }
}

/// Result of one coordinator run
#[derive(Debug, Clone, Default)]
pub struct CoordinatorOutcome {
    /// Failures, one per failed check, sorted by path
    pub errors: Vec<ValidationError>,
    /// Checks that reported a definite result
    pub completed: usize,
    /// Checks that were dispatched
    pub dispatched: usize,
    /// Whether the run was cut short by cancellation
    pub cancelled: bool,
}

struct UnitReport {
    id: usize,
    result: CheckResult,
}

/// Runs queued asynchronous checks concurrently and joins them
#[derive(Debug)]
pub struct AsyncCoordinator {
    call_timeout: Duration,
    state: CoordinatorState,
}

impl Default for AsyncCoordinator {
    fn default() -> Self {
        Self::new(DEFAULT_CALL_TIMEOUT)
    }
}

impl AsyncCoordinator {
    pub fn new(call_timeout: Duration) -> Self {
        Self {
            call_timeout,
            state: CoordinatorState::Idle,
        }
    }

    pub fn state(&self) -> CoordinatorState {
        self.state
    }

    pub fn call_timeout(&self) -> Duration {
        self.call_timeout
    }

    fn transition(&mut self, next: CoordinatorState) {
        debug!(from = %self.state, to = %next, "coordinator state change");
        self.state = next;
    }

    /// Run every check to a definite result, or until `cancel` is raised
    pub async fn run(&mut self, checks: Vec<PendingCheck>, cancel: &CancelSignal) -> CoordinatorOutcome {
        let mut outcome = CoordinatorOutcome::default();

        if checks.is_empty() {
            self.transition(CoordinatorState::Done);
            return outcome;
        }
        if cancel.is_cancelled() {
            info!(queued = checks.len(), "cancelled before dispatch, no checks run");
            outcome.cancelled = true;
            self.transition(CoordinatorState::Done);
            return outcome;
        }

        self.transition(CoordinatorState::Dispatching);
        let (tx, mut rx) = mpsc::unbounded_channel::<UnitReport>();
        let mut tasks = JoinSet::new();
        let mut in_flight: HashMap<usize, (String, FieldPath)> = HashMap::new();

        for (id, check) in checks.into_iter().enumerate() {
            let PendingCheck {
                validator,
                path,
                value,
                context,
                check,
            } = check;
            in_flight.insert(id, (validator.clone(), path.clone()));

            let tx = tx.clone();
            let deadline = self.call_timeout;
            let span = tracing::info_span!("async_check", validator = %validator, path = %path);
            tasks.spawn(
                async move {
                    let call = AssertUnwindSafe(check.validate(value, context)).catch_unwind();
                    let result = match tokio::time::timeout(deadline, call).await {
                        Ok(Ok(result)) => result,
                        Ok(Err(_)) => Err("validator panicked".to_string()),
                        Err(_) => Err(format!("timed out after {}", format_duration(deadline))),
                    };
                    debug!(ok = result.is_ok(), "check finished");
                    // Receiver gone means the run was cancelled
                    let _ = tx.send(UnitReport { id, result });
                }
                .instrument(span),
            );
        }
        drop(tx);
        outcome.dispatched = in_flight.len();
        info!(dispatched = outcome.dispatched, "async checks dispatched");

        self.transition(CoordinatorState::Collecting);
        let mut cancel = cancel.clone();
        loop {
            tokio::select! {
                report = rx.recv() => match report {
                    Some(report) => record(&mut outcome, &mut in_flight, report),
                    None => break,
                },
                _ = cancel.cancelled() => {
                    warn!(in_flight = in_flight.len(), "cancellation requested, aborting in-flight checks");
                    outcome.cancelled = true;
                    tasks.abort_all();
                    // Keep results that were sent before the abort
                    while let Ok(report) = rx.try_recv() {
                        record(&mut outcome, &mut in_flight, report);
                    }
                    for (_, (validator, path)) in in_flight.drain() {
                        outcome
                            .errors
                            .push(ValidationError::remote(path, validator, "cancelled before completion"));
                    }
                    break;
                }
            }
        }

        // Reap finished or aborted tasks
        while tasks.join_next().await.is_some() {}

        outcome.errors.sort_by(|a, b| a.path.cmp(&b.path).then_with(|| a.message.cmp(&b.message)));
        self.transition(CoordinatorState::Done);
        info!(
            completed = outcome.completed,
            failed = outcome.errors.len(),
            cancelled = outcome.cancelled,
            "async checks finished"
        );
        outcome
    }
}

fn record(
    outcome: &mut CoordinatorOutcome,
    in_flight: &mut HashMap<usize, (String, FieldPath)>,
    report: UnitReport,
) {
    let Some((validator, path)) = in_flight.remove(&report.id) else {
        return;
    };
    outcome.completed += 1;
    if let Err(message) = report.result {
        outcome.errors.push(ValidationError::remote(path, validator, message));
    }
}

fn format_duration(duration: Duration) -> String {
    if duration.subsec_millis() == 0 {
        format!("{}s", duration.as_secs())
    } else {
        format!("{}ms", duration.as_millis())
    }
}
