//! # Retry
//!
//! A reusable retry policy with exponential backoff and jitter.
//!
//! The policy knows nothing about the operations it wraps: callers decide
//! which failures are worth another attempt, either by implementing
//! [`Retryable`] on their error type or by passing a predicate to
//! [`RetryPolicy::run_with`]. Deterministic failures should never be marked
//! retryable, since repeating them cannot change the outcome.

pub mod error;
pub mod policy;

pub use error::{PolicyError, Result};
pub use policy::{RetryPolicy, Retryable};
