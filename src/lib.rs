//! # insist
//!
//! **insist** is a policy-driven retry engine for async Rust.
//!
//! It repeatedly invokes a caller-supplied operation according to a
//! declarative [`RetryPolicy`] until the operation succeeds, the attempt
//! budget runs out, the failure is classified non-retryable, or an external
//! cancellation token fires.
//!
//! ## Architecture
//! ```text
//!     ┌─────────────────┐      ┌──────────────────┐
//!     │    Operation    │      │   RetryPolicy    │
//!     │ (trait/closure) │      │ (immutable knobs)│
//!     └────────┬────────┘      └────────┬─────────┘
//!              ▼                        ▼
//! ┌──────────────────────────────────────────────────────┐
//! │  Retrier::run — attempt loop                         │
//! │                                                      │
//! │  invoke ──► Ok ──────────────────────────► value     │
//! │    │                                                 │
//! │    └─► Err(e)                                        │
//! │         ├─ budget exhausted ─► Exhausted / Original  │
//! │         ├─ filter says stop ─► Original(e)           │
//! │         └─ retryable:                                │
//! │              backoff(i) ─► jitter ─► cancellable     │
//! │              sleep ─► next attempt                   │
//! │                                                      │
//! │  cancellation token ─► Aborted (before an attempt    │
//! │                        or during a backoff wait)     │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! ## Features
//! | Area               | Description                                           | Key types                                  |
//! |--------------------|-------------------------------------------------------|--------------------------------------------|
//! | **Policy**         | Attempt budget, backoff, jitter, reraise, cancellation| [`RetryPolicy`], [`RetryPolicyBuilder`]    |
//! | **Backoff**        | Fixed or capped-exponential nominal delays            | [`BackoffPolicy`], [`ExponentialOptions`]  |
//! | **Jitter**         | Full, equal, or decorrelated randomization            | [`JitterPolicy`]                           |
//! | **Classification** | Retryable-kind sets and predicates, identity-tagged   | [`Classify`], [`ErrorKind`], [`ErrorFilter`] |
//! | **Operations**     | Trait for method semantics, adapter for closures      | [`Operation`], [`OperationFn`]             |
//! | **Errors**         | Exhausted / original / aborted, nothing swallowed     | [`RetryError`]                             |
//!
//! ## Example
//! ```rust
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use std::time::Duration;
//! use insist::{BackoffPolicy, JitterPolicy, Retrier, RetryPolicy};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let policy = RetryPolicy::builder(3)
//!         .backoff(BackoffPolicy::Exponential)
//!         .base_delay(Duration::from_millis(10))
//!         .use_jitter(true)
//!         .jitter_type(JitterPolicy::Equal)
//!         .build();
//!     let retrier = Retrier::new(policy);
//!
//!     let calls = AtomicU32::new(0);
//!     let greeting = retrier
//!         .run_fn(|| {
//!             let attempt = calls.fetch_add(1, Ordering::SeqCst);
//!             async move {
//!                 if attempt < 2 {
//!                     Err(format!("flaky #{attempt}"))
//!                 } else {
//!                     Ok("hello")
//!                 }
//!             }
//!         })
//!         .await?;
//!
//!     assert_eq!(greeting, "hello");
//!     Ok(())
//! }
//! ```
//!
//! ## Guarantees
//! - At most `max_attempts + 1` invocations per [`Retrier::run`] call.
//! - Success is terminal immediately; remaining budget is ignored.
//! - Exhaustion precedes classification on the final attempt.
//! - Cancellation is observed without polling and never waits out a backoff.
//! - Policies are immutable; concurrent executions share them read-only.

mod engine;
mod error;
mod ops;
mod policies;

// ---- Public re-exports ----

pub use engine::Retrier;
pub use error::RetryError;
pub use ops::{Operation, OperationFn};
pub use policies::{
    BackoffPolicy, Classify, ErrorFilter, ErrorKind, ExponentialOptions, JitterPolicy,
    RetryPolicy, RetryPolicyBuilder,
};
