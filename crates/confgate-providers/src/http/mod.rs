//! HTTP plumbing shared by the provider checks
//!
//! - Client construction with request and connect timeouts
//! - Error classification from status codes
//! - Retry with exponential backoff for transient failures

pub mod client;
pub mod error;
pub mod retry;

pub use client::{CheckClient, CheckClientConfig};
pub use error::{ErrorClassification, HttpError};
pub use retry::{execute_with_retry, RetryDecision, RetryHandler, RetryPolicy};
