//! Retry policies.
//!
//! This module groups the knobs that control **whether** a failed attempt may
//! be retried and **how long** to wait before the next one.
//!
//! ## Contents
//! - [`RetryPolicy`] / [`RetryPolicyBuilder`] — the immutable configuration bundle
//! - [`BackoffPolicy`] / [`ExponentialOptions`] — nominal delay curve
//! - [`JitterPolicy`] — randomization of nominal delays
//! - [`ErrorFilter`] / [`Classify`] / [`ErrorKind`] — failure classification
//!
//! ## Quick wiring
//! ```text
//! RetryPolicy { max_attempts, backoff, jitter, filter, reraise, cancel }
//!      └─► engine::Retrier uses:
//!           - filter.can_retry(&err) to decide continue/stop
//!           - nominal_delay(retry_index) + jitter to schedule the next attempt
//! ```
//!
//! ## Defaults
//! - `BackoffPolicy::Fixed` with base delay 0 (retry immediately).
//! - Exponential, when selected, defaults to base 1000ms, ×2, capped at 2s.
//! - Jitter disabled; enabling it without a type picks `Full`.

mod backoff;
mod filter;
mod jitter;
mod retry;

pub use backoff::{BackoffPolicy, ExponentialOptions};
pub use filter::{Classify, ErrorFilter, ErrorKind};
pub use jitter::JitterPolicy;
pub use retry::{RetryPolicy, RetryPolicyBuilder};
