//! # Backoff scheduling for retry delays.
//!
//! [`BackoffPolicy`] selects how the nominal delay before a retry is derived
//! from the retry index:
//! - [`BackoffPolicy::Fixed`] — the same base delay before every retry;
//! - [`BackoffPolicy::Exponential`] — `base × multiplier^index`, clamped to
//!   [`ExponentialOptions::max_interval`].
//!
//! The nominal delay is what the jitter strategy receives; the scheduler itself
//! is deterministic. Because the delay is derived purely from the retry index,
//! jitter output never feeds back into subsequent calculations.

use std::time::Duration;

/// Shape of the nominal delay curve.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BackoffPolicy {
    /// Constant delay: every retry waits the base delay.
    #[default]
    Fixed,
    /// Growing delay: `base × multiplier^index`, capped at the max interval.
    Exponential,
}

/// Growth parameters for [`BackoffPolicy::Exponential`].
///
/// Caller-supplied values merge over the defaults `{max_interval: 2s,
/// multiplier: 2.0}`. `max_interval` also bounds decorrelated jitter,
/// regardless of the backoff policy in effect.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExponentialOptions {
    /// Maximum delay cap for retries.
    pub max_interval: Duration,
    /// Multiplicative growth factor per retry.
    pub multiplier: f64,
}

impl Default for ExponentialOptions {
    fn default() -> Self {
        Self {
            max_interval: Duration::from_millis(2000),
            multiplier: 2.0,
        }
    }
}

/// Resolved backoff schedule: policy plus normalized base delay.
///
/// Built once by the policy builder; holds no per-call state.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Backoff {
    pub(crate) kind: BackoffPolicy,
    pub(crate) base: Duration,
    pub(crate) exponential: ExponentialOptions,
}

impl Backoff {
    /// Computes the nominal delay before retry `retry_index` (0-based: 0 is
    /// the delay before the first retry).
    ///
    /// Non-finite or negative intermediate values clamp to the max interval.
    pub(crate) fn nominal(&self, retry_index: u32) -> Duration {
        match self.kind {
            BackoffPolicy::Fixed => self.base,
            BackoffPolicy::Exponential => {
                let max_secs = self.exponential.max_interval.as_secs_f64();
                let exp = retry_index.min(i32::MAX as u32) as i32;
                let raw = self.base.as_secs_f64() * self.exponential.multiplier.powi(exp);

                if !raw.is_finite() || raw < 0.0 || raw > max_secs {
                    self.exponential.max_interval
                } else {
                    Duration::from_secs_f64(raw)
                }
            }
        }
    }
}
