//! # Retry policy: validated, immutable execution configuration.
//!
//! [`RetryPolicy`] bundles everything one call site needs: attempt budget,
//! backoff shape, jitter strategy, error filter, reraise behavior, and an
//! optional cancellation token. It is built once through
//! [`RetryPolicyBuilder`], normalized at [`build`](RetryPolicyBuilder::build),
//! and never mutated afterwards — concurrent executions share it read-only.
//!
//! ## Normalization rules
//! - Exponential backoff with no explicit base delay gets 1000ms; fixed gets 0.
//! - Exponential options merge field-wise over `{max_interval: 2s, multiplier: 2}`.
//! - Jitter enabled with no explicit type resolves to `Full`; jitter disabled
//!   resolves to `None` whatever the type says.
//!
//! Construction is infallible: the attempt budget is unsigned, so there is no
//! invalid configuration to reject. `max_attempts == 0` is legal and means
//! exactly one attempt, no retries.

use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::policies::backoff::{Backoff, BackoffPolicy, ExponentialOptions};
use crate::policies::filter::{ErrorFilter, ErrorKind, RetryPredicate};
use crate::policies::jitter::JitterPolicy;

/// Immutable retry configuration for one call site.
///
/// `E` is the error type of the operations this policy will govern.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use insist::{BackoffPolicy, RetryPolicy};
///
/// let policy = RetryPolicy::<String>::builder(3)
///     .backoff(BackoffPolicy::Exponential)
///     .build();
///
/// // Exponential with no explicit base delay defaults to 1000ms,
/// // growing ×2 per retry up to the 2s default cap.
/// assert_eq!(policy.base_delay(), Duration::from_millis(1000));
/// assert_eq!(policy.nominal_delay(0), Duration::from_millis(1000));
/// assert_eq!(policy.nominal_delay(1), Duration::from_millis(2000));
/// assert_eq!(policy.nominal_delay(5), Duration::from_millis(2000));
/// assert_eq!(policy.max_invocations(), 4);
/// ```
pub struct RetryPolicy<E> {
    max_attempts: u32,
    backoff: Backoff,
    jitter: JitterPolicy,
    filter: ErrorFilter<E>,
    reraise: bool,
    cancel: Option<CancellationToken>,
}

impl<E> RetryPolicy<E> {
    /// Starts building a policy with the given retry budget.
    ///
    /// `max_attempts` is the number of *retries* after the initial attempt;
    /// total possible invocations are `max_attempts + 1`.
    pub fn builder(max_attempts: u32) -> RetryPolicyBuilder<E> {
        RetryPolicyBuilder::new(max_attempts)
    }

    /// Number of retries permitted after the initial attempt.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Upper bound on operation invocations per execution (`max_attempts + 1`).
    pub fn max_invocations(&self) -> u64 {
        u64::from(self.max_attempts) + 1
    }

    /// Shape of the nominal delay curve.
    pub fn backoff_policy(&self) -> BackoffPolicy {
        self.backoff.kind
    }

    /// Normalized base delay.
    pub fn base_delay(&self) -> Duration {
        self.backoff.base
    }

    /// Exponential growth parameters (also the decorrelated jitter bound).
    pub fn exponential(&self) -> &ExponentialOptions {
        &self.backoff.exponential
    }

    /// Effective jitter strategy after normalization.
    pub fn jitter(&self) -> JitterPolicy {
        self.jitter
    }

    /// Whether exhaustion propagates the final error unchanged instead of
    /// wrapping it.
    pub fn reraise(&self) -> bool {
        self.reraise
    }

    /// The cancellation token observed by executions of this policy, if any.
    pub fn cancel_token(&self) -> Option<&CancellationToken> {
        self.cancel.as_ref()
    }

    /// The failure classifier consulted on non-final attempts.
    pub fn filter(&self) -> &ErrorFilter<E> {
        &self.filter
    }

    /// Nominal (pre-jitter) delay before retry `retry_index` (0-based).
    pub fn nominal_delay(&self, retry_index: u32) -> Duration {
        self.backoff.nominal(retry_index)
    }
}

impl<E> Clone for RetryPolicy<E> {
    fn clone(&self) -> Self {
        Self {
            max_attempts: self.max_attempts,
            backoff: self.backoff,
            jitter: self.jitter,
            filter: self.filter.clone(),
            reraise: self.reraise,
            cancel: self.cancel.clone(),
        }
    }
}

impl<E> fmt::Debug for RetryPolicy<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("backoff", &self.backoff)
            .field("jitter", &self.jitter)
            .field("filter", &self.filter)
            .field("reraise", &self.reraise)
            .field("cancel", &self.cancel.is_some())
            .finish()
    }
}

/// Fluent builder for [`RetryPolicy`].
pub struct RetryPolicyBuilder<E> {
    max_attempts: u32,
    backoff: BackoffPolicy,
    base_delay: Option<Duration>,
    exponential: ExponentialOptions,
    use_jitter: bool,
    jitter_type: Option<JitterPolicy>,
    retry_on: Option<HashSet<ErrorKind>>,
    predicate: Option<RetryPredicate<E>>,
    reraise: bool,
    cancel: Option<CancellationToken>,
}

impl<E> RetryPolicyBuilder<E> {
    fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff: BackoffPolicy::default(),
            base_delay: None,
            exponential: ExponentialOptions::default(),
            use_jitter: false,
            jitter_type: None,
            retry_on: None,
            predicate: None,
            reraise: false,
            cancel: None,
        }
    }

    /// Selects the backoff curve (default: [`BackoffPolicy::Fixed`]).
    pub fn backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Sets the base delay explicitly.
    ///
    /// Unset, it normalizes to 0 under fixed backoff and 1000ms under
    /// exponential.
    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = Some(delay);
        self
    }

    /// Replaces the exponential options wholesale.
    pub fn exponential(mut self, options: ExponentialOptions) -> Self {
        self.exponential = options;
        self
    }

    /// Overrides only the exponential delay cap.
    pub fn max_interval(mut self, max_interval: Duration) -> Self {
        self.exponential.max_interval = max_interval;
        self
    }

    /// Overrides only the exponential growth factor.
    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.exponential.multiplier = multiplier;
        self
    }

    /// Restricts retrying to errors whose kind is in the given set.
    ///
    /// An empty set leaves every kind retryable.
    pub fn retry_on(mut self, kinds: impl IntoIterator<Item = ErrorKind>) -> Self {
        self.retry_on = Some(kinds.into_iter().collect());
        self
    }

    /// Installs a retry predicate; returning `false` forbids another attempt
    /// regardless of the kind set.
    pub fn retry_if<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.predicate = Some(std::sync::Arc::new(predicate));
        self
    }

    /// On exhaustion, propagate the final error unchanged instead of wrapping
    /// it (default: wrap).
    pub fn reraise(mut self, reraise: bool) -> Self {
        self.reraise = reraise;
        self
    }

    /// Attaches an external cancellation token.
    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Enables or disables jitter (default: disabled).
    ///
    /// Enabled with no explicit type, the strategy resolves to
    /// [`JitterPolicy::Full`].
    pub fn use_jitter(mut self, enabled: bool) -> Self {
        self.use_jitter = enabled;
        self
    }

    /// Selects the jitter strategy used when jitter is enabled.
    ///
    /// Without [`use_jitter(true)`](Self::use_jitter) this has no effect; the
    /// disabled strategy is always [`JitterPolicy::None`].
    pub fn jitter_type(mut self, jitter: JitterPolicy) -> Self {
        self.jitter_type = Some(jitter);
        self
    }

    /// Normalizes and freezes the configuration.
    pub fn build(self) -> RetryPolicy<E> {
        let base = self.base_delay.unwrap_or(match self.backoff {
            BackoffPolicy::Fixed => Duration::ZERO,
            BackoffPolicy::Exponential => Duration::from_millis(1000),
        });
        let jitter = if self.use_jitter {
            self.jitter_type.unwrap_or(JitterPolicy::Full)
        } else {
            JitterPolicy::None
        };

        RetryPolicy {
            max_attempts: self.max_attempts,
            backoff: Backoff {
                kind: self.backoff,
                base,
                exponential: self.exponential,
            },
            jitter,
            filter: ErrorFilter {
                retry_on: self.retry_on,
                predicate: self.predicate,
            },
            reraise: self.reraise,
            cancel: self.cancel,
        }
    }
}
