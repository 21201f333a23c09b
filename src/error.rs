//! Error types produced by the retry engine.
//!
//! Every terminal failure of [`Retrier::run`](crate::Retrier::run) is exactly one
//! of the three [`RetryError`] variants:
//!
//! - [`RetryError::Exhausted`] — the attempt budget ran out; wraps the final
//!   operation error together with the retry count.
//! - [`RetryError::Original`] — the operation error propagated unchanged, either
//!   because it was classified non-retryable mid-budget or because the policy
//!   asked to reraise at exhaustion.
//! - [`RetryError::Aborted`] — the cancellation token fired before an attempt or
//!   during a backoff wait.
//!
//! The helper methods (`as_label`, `original`, `retries`) exist for logging and
//! for callers that need the operation error back without matching variants.

use thiserror::Error;

/// Terminal failure of one retry execution.
///
/// `E` is the operation's own error type; it is never boxed or stringified.
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// The attempt budget was exhausted without a retryable path to success.
    ///
    /// `retries` equals the zero-based index of the final attempt, which is the
    /// policy's configured number of retries.
    #[error("attempt budget exhausted after {retries} retries: {error}")]
    Exhausted {
        /// Error returned by the final attempt.
        error: E,
        /// Number of retries performed after the initial attempt.
        retries: u32,
    },

    /// The operation error, propagated unchanged.
    ///
    /// Produced when classification forbids another attempt while budget
    /// remains, or at exhaustion when the policy has `reraise` set.
    #[error("{0}")]
    Original(E),

    /// Cancellation was observed before an attempt or during a backoff wait.
    #[error("retry aborted by cancellation signal")]
    Aborted,
}

impl<E> RetryError<E> {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use insist::RetryError;
    ///
    /// let err: RetryError<String> = RetryError::Exhausted {
    ///     error: "boom".into(),
    ///     retries: 2,
    /// };
    /// assert_eq!(err.as_label(), "retry_exhausted");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RetryError::Exhausted { .. } => "retry_exhausted",
            RetryError::Original(_) => "original_error",
            RetryError::Aborted => "retry_aborted",
        }
    }

    /// Returns the operation error carried by this failure, if any.
    pub fn original(&self) -> Option<&E> {
        match self {
            RetryError::Exhausted { error, .. } => Some(error),
            RetryError::Original(error) => Some(error),
            RetryError::Aborted => None,
        }
    }

    /// Consumes the failure and returns the operation error, if any.
    pub fn into_original(self) -> Option<E> {
        match self {
            RetryError::Exhausted { error, .. } => Some(error),
            RetryError::Original(error) => Some(error),
            RetryError::Aborted => None,
        }
    }

    /// Returns the retry count for exhaustion failures.
    pub fn retries(&self) -> Option<u32> {
        match self {
            RetryError::Exhausted { retries, .. } => Some(*retries),
            _ => None,
        }
    }

    /// Indicates whether this failure was caused by cancellation.
    pub fn is_aborted(&self) -> bool {
        matches!(self, RetryError::Aborted)
    }
}
