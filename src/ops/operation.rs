//! # Operation abstraction.
//!
//! [`Operation`] is the unit the engine retries: an async, fallible call.
//! Implementing it on your own type preserves method semantics — the
//! implementing value *is* the receiver, and call arguments live in its
//! fields. Plain closures go through
//! [`OperationFn`](crate::OperationFn) instead; both surfaces feed the same
//! attempt loop.
//!
//! The engine invokes [`call`](Operation::call) once per attempt and never
//! interrupts an in-flight call; cancellation takes effect between attempts
//! and during backoff waits.

use async_trait::async_trait;

/// An async, fallible unit of work the engine may invoke repeatedly.
///
/// `call` takes `&mut self` so an operation can keep per-execution state
/// (counters, rotating credentials, a prepared request) across attempts.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use insist::Operation;
///
/// struct FetchUser {
///     user_id: u64,
///     attempts_seen: u32,
/// }
///
/// #[async_trait]
/// impl Operation for FetchUser {
///     type Output = String;
///     type Error = String;
///
///     async fn call(&mut self) -> Result<String, String> {
///         self.attempts_seen += 1;
///         if self.attempts_seen < 2 {
///             Err("cold cache".into())
///         } else {
///             Ok(format!("user-{}", self.user_id))
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait Operation: Send {
    /// Value produced on success.
    type Output: Send;
    /// Error produced on failure.
    type Error: Send;

    /// Executes one attempt.
    async fn call(&mut self) -> Result<Self::Output, Self::Error>;
}
