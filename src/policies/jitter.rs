//! # Jitter strategies for retry delays.
//!
//! [`JitterPolicy`] turns a nominal backoff delay into the actual wait,
//! spreading out retries that would otherwise synchronize:
//!
//! - [`JitterPolicy::None`] — the nominal delay, unchanged
//! - [`JitterPolicy::Full`] — uniform random in `[0, nominal)`
//! - [`JitterPolicy::Equal`] — `nominal/2 +` uniform random in `[0, nominal/2)`
//! - [`JitterPolicy::Decorrelated`] — stateful: uniform random in
//!   `[base, previous × 3)`, capped at the max interval; independent of the
//!   scheduler's nominal value once seeded
//!
//! The decorrelated state (the previous actual delay) is owned by the caller
//! and passed through [`JitterPolicy::apply_decorrelated`]; one retry
//! execution never shares it with another.

use rand::Rng;
use std::time::Duration;

/// Randomization applied to backoff delays.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JitterPolicy {
    /// No randomization: the nominal delay is used verbatim.
    #[default]
    None,
    /// Uniform random in `[0, nominal)`. Most aggressive spreading.
    Full,
    /// `nominal/2` plus uniform random in `[0, nominal/2)`. Preserves at
    /// least half of the nominal delay.
    Equal,
    /// Uniform random in `[base, previous × 3)`, capped at the max interval.
    /// Needs the previous actual delay; use
    /// [`apply_decorrelated`](Self::apply_decorrelated).
    Decorrelated,
}

impl JitterPolicy {
    /// Applies stateless jitter to the given nominal delay.
    ///
    /// For `Decorrelated` this returns the input unchanged; that strategy
    /// needs the previous actual delay and goes through
    /// [`apply_decorrelated`](Self::apply_decorrelated) instead.
    pub fn apply(&self, nominal: Duration) -> Duration {
        match self {
            JitterPolicy::None | JitterPolicy::Decorrelated => nominal,
            JitterPolicy::Full => full_jitter(nominal),
            JitterPolicy::Equal => equal_jitter(nominal),
        }
    }

    /// Applies decorrelated jitter given the seed delay, the previous actual
    /// delay, and the cap.
    ///
    /// The caller stores the returned value as `prev` for the next call. On a
    /// non-`Decorrelated` policy this falls back to `apply(prev)`.
    pub fn apply_decorrelated(&self, base: Duration, prev: Duration, max: Duration) -> Duration {
        if !matches!(self, JitterPolicy::Decorrelated) {
            return self.apply(prev);
        }

        let base_ms = base.as_millis() as u64;
        let max_ms = max.as_millis() as u64;
        let upper = (prev.as_millis() as u64).saturating_mul(3).min(max_ms);

        if upper <= base_ms {
            return base;
        }
        Duration::from_millis(rand::rng().random_range(base_ms..upper))
    }
}

/// Full jitter: uniform in `[0, nominal)`.
fn full_jitter(nominal: Duration) -> Duration {
    let ms = nominal.as_millis() as u64;
    if ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::rng().random_range(0..ms))
}

/// Equal jitter: `nominal/2 +` uniform in `[0, nominal/2)`.
fn equal_jitter(nominal: Duration) -> Duration {
    let ms = nominal.as_millis() as u64;
    let half = ms / 2;
    let span = ms - half;
    if span == 0 {
        return Duration::from_millis(half);
    }
    Duration::from_millis(half + rand::rng().random_range(0..span))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_returns_nominal_exactly() {
        let nominal = Duration::from_millis(700);
        assert_eq!(JitterPolicy::None.apply(nominal), nominal);
    }

    #[test]
    fn full_stays_below_nominal() {
        let nominal = Duration::from_millis(1000);
        for _ in 0..200 {
            let jittered = JitterPolicy::Full.apply(nominal);
            assert!(jittered < nominal, "{jittered:?} not below {nominal:?}");
        }
    }

    #[test]
    fn equal_stays_within_half_and_nominal() {
        let nominal = Duration::from_millis(1000);
        for _ in 0..200 {
            let jittered = JitterPolicy::Equal.apply(nominal);
            assert!(jittered >= Duration::from_millis(500), "{jittered:?} below half");
            assert!(jittered < nominal, "{jittered:?} not below {nominal:?}");
        }
    }

    #[test]
    fn zero_nominal_yields_zero() {
        assert_eq!(JitterPolicy::Full.apply(Duration::ZERO), Duration::ZERO);
        assert_eq!(JitterPolicy::Equal.apply(Duration::ZERO), Duration::ZERO);
    }

    #[test]
    fn decorrelated_stays_within_base_and_cap() {
        let base = Duration::from_millis(100);
        let max = Duration::from_secs(30);
        let prev = Duration::from_millis(400);
        for _ in 0..200 {
            let jittered = JitterPolicy::Decorrelated.apply_decorrelated(base, prev, max);
            assert!(jittered >= base, "{jittered:?} below base");
            assert!(
                jittered < Duration::from_millis(1200),
                "{jittered:?} not below prev*3"
            );
        }
    }

    #[test]
    fn decorrelated_is_capped_by_max_interval() {
        let base = Duration::from_millis(100);
        let max = Duration::from_millis(500);
        let prev = Duration::from_secs(10);
        for _ in 0..200 {
            let jittered = JitterPolicy::Decorrelated.apply_decorrelated(base, prev, max);
            assert!(jittered >= base);
            assert!(jittered < max, "{jittered:?} not below cap");
        }
    }

    #[test]
    fn decorrelated_collapsed_window_returns_base() {
        let base = Duration::from_millis(300);
        // prev*3 = 300 == base, so the window is empty.
        let prev = Duration::from_millis(100);
        let out =
            JitterPolicy::Decorrelated.apply_decorrelated(base, prev, Duration::from_secs(30));
        assert_eq!(out, base);
    }

    #[test]
    fn apply_leaves_decorrelated_untouched() {
        let nominal = Duration::from_millis(800);
        assert_eq!(JitterPolicy::Decorrelated.apply(nominal), nominal);
    }
}
