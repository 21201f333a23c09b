//! # Retrier: the attempt loop.
//!
//! [`Retrier`] owns one [`RetryPolicy`] and drives operations through it. One
//! [`run`](Retrier::run) call is a strictly sequential state machine:
//!
//! ```text
//! run()
//!   loop (attempt i = 0 ..= max_attempts) {
//!     ├─► token already signaled?          ─► Err(Aborted)
//!     ├─► operation.call()
//!     │     ├─ Ok(value)                   ─► Ok(value)
//!     │     └─ Err(e):
//!     │          ├─ i == max_attempts      ─► Err(Exhausted{e, i})
//!     │          │                             (or Err(Original(e)) if reraise)
//!     │          ├─ !filter.can_retry(&e)  ─► Err(Original(e))
//!     │          ├─ token signaled?        ─► Err(Aborted)
//!     │          └─ nominal = backoff(i); delay = jitter(nominal)
//!     │             sleep(delay)   — cancellable; cancel ─► Err(Aborted)
//!     └─► i += 1
//!   }
//! ```
//!
//! ## Ordering rules
//! - Exhaustion wins over classification: an error on the final attempt is
//!   wrapped (or reraised), never propagated raw, even if the filter would
//!   have rejected it.
//! - Cancellation wins at its two observation points (before an attempt,
//!   around/within the backoff wait) over everything else.
//! - Success is terminal immediately; remaining budget is ignored.
//!
//! ## Concurrency
//! Attempt and sleep phases never overlap within one call; the only suspension
//! points are the operation's own future and the backoff sleep. Any number of
//! `run` calls may share one `Retrier` concurrently — the policy is read-only
//! and each call keeps its own attempt counter and jitter state. A shared
//! cancellation token aborts every observing call independently.

use std::fmt;
use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::engine::sleeper::{sleep_cancellable, SleepOutcome};
use crate::error::RetryError;
use crate::ops::{Operation, OperationFn};
use crate::policies::{Classify, JitterPolicy, RetryPolicy};

/// Drives operations through one retry policy.
///
/// # Example
/// ```
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use insist::{Retrier, RetryPolicy};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let retrier = Retrier::new(RetryPolicy::builder(2).build());
///     let calls = AtomicU32::new(0);
///
///     let value = retrier
///         .run_fn(|| {
///             let attempt = calls.fetch_add(1, Ordering::SeqCst);
///             async move {
///                 if attempt == 0 {
///                     Err("flaky".to_string())
///                 } else {
///                     Ok(attempt)
///                 }
///             }
///         })
///         .await
///         .unwrap();
///
///     assert_eq!(value, 1);
/// }
/// ```
pub struct Retrier<E> {
    policy: RetryPolicy<E>,
}

impl<E> Retrier<E>
where
    E: Classify + fmt::Debug + Send,
{
    /// Creates a retrier bound to the given policy.
    pub fn new(policy: RetryPolicy<E>) -> Self {
        Self { policy }
    }

    /// Returns the governing policy.
    pub fn policy(&self) -> &RetryPolicy<E> {
        &self.policy
    }

    /// Runs the operation until success, exhaustion, a non-retryable failure,
    /// or cancellation.
    pub async fn run<O>(&self, mut operation: O) -> Result<O::Output, RetryError<E>>
    where
        O: Operation<Error = E>,
    {
        let token = self.policy.cancel_token();
        let max_interval = self.policy.exponential().max_interval;
        // Decorrelated jitter evolves from the previous actual delay, seeded
        // at the base delay (never above the cap).
        let decorrelated_base = self.policy.base_delay().min(max_interval);
        let mut prev_delay = decorrelated_base;
        let mut attempt: u32 = 0;

        loop {
            if is_cancelled(token) {
                debug!(attempt, "aborted before attempt");
                return Err(RetryError::Aborted);
            }

            let err = match operation.call().await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!(attempt, "succeeded after retrying");
                    }
                    return Ok(value);
                }
                Err(err) => err,
            };

            // Exhaustion precedes classification: a non-retryable error on the
            // final attempt is still wrapped or reraised.
            if attempt == self.policy.max_attempts() {
                warn!(retries = attempt, error = ?err, "attempt budget exhausted");
                return Err(if self.policy.reraise() {
                    RetryError::Original(err)
                } else {
                    RetryError::Exhausted {
                        error: err,
                        retries: attempt,
                    }
                });
            }

            if !self.policy.filter().can_retry(&err) {
                debug!(attempt, error = ?err, "error classified non-retryable");
                return Err(RetryError::Original(err));
            }

            if is_cancelled(token) {
                debug!(attempt, "aborted before backoff");
                return Err(RetryError::Aborted);
            }

            let delay = match self.policy.jitter() {
                JitterPolicy::Decorrelated => {
                    let next = JitterPolicy::Decorrelated.apply_decorrelated(
                        decorrelated_base,
                        prev_delay,
                        max_interval,
                    );
                    prev_delay = next;
                    next
                }
                jitter => jitter.apply(self.policy.nominal_delay(attempt)),
            };

            debug!(
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = ?err,
                "attempt failed; backing off"
            );

            if sleep_cancellable(delay, token).await == SleepOutcome::Cancelled {
                debug!(attempt, "aborted during backoff");
                return Err(RetryError::Aborted);
            }

            attempt += 1;
        }
    }

    /// Convenience surface for plain closures; forwards to [`run`](Self::run)
    /// via [`OperationFn`].
    pub async fn run_fn<F, Fut, T>(&self, f: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<T, E>> + Send,
        T: Send,
    {
        self.run(OperationFn::new(f)).await
    }
}

fn is_cancelled(token: Option<&CancellationToken>) -> bool {
    token.is_some_and(|t| t.is_cancelled())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::time::Instant;

    use crate::policies::{BackoffPolicy, ErrorKind};

    #[derive(Debug, PartialEq)]
    enum TestError {
        Transient(&'static str),
        Syntax(&'static str),
    }

    impl Classify for TestError {
        fn kind(&self) -> ErrorKind {
            match self {
                TestError::Transient(_) => ErrorKind::named("transient"),
                TestError::Syntax(_) => ErrorKind::named("syntax"),
            }
        }
    }

    fn retrier(policy: RetryPolicy<TestError>) -> Retrier<TestError> {
        Retrier::new(policy)
    }

    #[tokio::test]
    async fn success_on_first_attempt_invokes_once() {
        let engine = retrier(RetryPolicy::builder(5).build());
        let calls = AtomicU32::new(0);

        let out = engine
            .run_fn(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, TestError>("ok") }
            })
            .await;

        assert_eq!(out.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn succeeds_after_one_retry() {
        let engine = retrier(RetryPolicy::builder(2).build());
        let calls = AtomicU32::new(0);

        let out = engine
            .run_fn(|| {
                let attempt = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt == 0 {
                        Err(TestError::Transient("rejected"))
                    } else {
                        Ok("fulfilled")
                    }
                }
            })
            .await;

        assert_eq!(out.unwrap(), "fulfilled");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn exhaustion_wraps_the_final_error() {
        let engine = retrier(RetryPolicy::builder(2).build());
        let calls = AtomicU32::new(0);

        let out: Result<(), _> = engine
            .run_fn(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(TestError::Transient("rejected")) }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match out {
            Err(RetryError::Exhausted { error, retries }) => {
                assert_eq!(error, TestError::Transient("rejected"));
                assert_eq!(retries, 2);
            }
            other => panic!("expected exhaustion, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn invocations_never_exceed_the_budget() {
        let engine = retrier(RetryPolicy::builder(5).build());
        let calls = AtomicU32::new(0);

        let _: Result<(), _> = engine
            .run_fn(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(TestError::Transient("down")) }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn kind_filter_permits_listed_kinds() {
        let engine = retrier(
            RetryPolicy::builder(2)
                .retry_on([ErrorKind::named("syntax")])
                .build(),
        );
        let calls = AtomicU32::new(0);

        let out = engine
            .run_fn(|| {
                let attempt = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt == 0 {
                        Err(TestError::Syntax("unexpected token"))
                    } else {
                        Ok("parsed")
                    }
                }
            })
            .await;

        assert_eq!(out.unwrap(), "parsed");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn kind_mismatch_fails_unwrapped_after_one_invocation() {
        let engine = retrier(
            RetryPolicy::builder(2)
                .retry_on([ErrorKind::named("syntax")])
                .build(),
        );
        let calls = AtomicU32::new(0);

        let out: Result<(), _> = engine
            .run_fn(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(TestError::Transient("rejected")) }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        match out {
            Err(RetryError::Original(error)) => {
                assert_eq!(error, TestError::Transient("rejected"));
            }
            other => panic!("expected the original error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn false_predicate_stops_after_one_invocation() {
        let engine = retrier(RetryPolicy::builder(4).retry_if(|_| false).build());
        let calls = AtomicU32::new(0);

        let out: Result<(), _> = engine
            .run_fn(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(TestError::Transient("no")) }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(out, Err(RetryError::Original(_))));
    }

    #[tokio::test]
    async fn final_attempt_wraps_even_non_retryable_errors() {
        // With a zero budget the single attempt is also the final one; the
        // always-false predicate must never be consulted.
        let engine = retrier(RetryPolicy::builder(0).retry_if(|_| false).build());

        let out: Result<(), _> = engine
            .run_fn(|| async { Err(TestError::Transient("fatal")) })
            .await;

        match out {
            Err(RetryError::Exhausted { retries, .. }) => assert_eq!(retries, 0),
            other => panic!("expected exhaustion, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn reraise_overrides_a_failing_classifier_at_exhaustion() {
        let engine = retrier(
            RetryPolicy::builder(0)
                .retry_if(|_| false)
                .reraise(true)
                .build(),
        );

        let out: Result<(), _> = engine
            .run_fn(|| async { Err(TestError::Transient("fatal")) })
            .await;

        match out {
            Err(RetryError::Original(error)) => {
                assert_eq!(error, TestError::Transient("fatal"));
            }
            other => panic!("expected the original error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn reraise_propagates_the_final_error_unchanged() {
        let engine = retrier(RetryPolicy::builder(1).reraise(true).build());
        let calls = AtomicU32::new(0);

        let out: Result<(), _> = engine
            .run_fn(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(TestError::Transient("test-error")) }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        match out {
            Err(RetryError::Original(error)) => {
                assert_eq!(error, TestError::Transient("test-error"));
            }
            other => panic!("expected the original error, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fixed_backoff_sleeps_base_delay_between_attempts() {
        let engine = retrier(
            RetryPolicy::builder(3)
                .base_delay(Duration::from_millis(1000))
                .build(),
        );
        let calls = AtomicU32::new(0);
        let started = Instant::now();

        let out: Result<(), _> = engine
            .run_fn(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(TestError::Transient("down")) }
            })
            .await;

        // 4 invocations separated by three 1000ms waits.
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(started.elapsed(), Duration::from_millis(3000));
        assert!(matches!(out, Err(RetryError::Exhausted { retries: 3, .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn exponential_backoff_waits_grow_until_the_cap() {
        let engine = retrier(
            RetryPolicy::builder(3)
                .backoff(BackoffPolicy::Exponential)
                .base_delay(Duration::from_millis(100))
                .max_interval(Duration::from_millis(250))
                .build(),
        );
        let started = Instant::now();

        let _: Result<(), _> = engine
            .run_fn(|| async { Err(TestError::Transient("down")) })
            .await;

        // 100 + 200 + 250 (capped).
        assert_eq!(started.elapsed(), Duration::from_millis(550));
    }

    #[tokio::test(start_paused = true)]
    async fn decorrelated_waits_stay_within_bounds() {
        let engine = retrier(
            RetryPolicy::builder(3)
                .base_delay(Duration::from_millis(100))
                .use_jitter(true)
                .jitter_type(JitterPolicy::Decorrelated)
                .build(),
        );
        let started = Instant::now();

        let _: Result<(), _> = engine
            .run_fn(|| async { Err(TestError::Transient("down")) })
            .await;

        // Three waits, each within [base, max_interval] = [100ms, 2s].
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(300), "elapsed {elapsed:?}");
        assert!(elapsed <= Duration::from_secs(6), "elapsed {elapsed:?}");
    }

    #[tokio::test]
    async fn pre_signaled_token_aborts_with_zero_invocations() {
        let token = CancellationToken::new();
        token.cancel();
        let engine = retrier(RetryPolicy::builder(3).cancel_token(token).build());
        let calls = AtomicU32::new(0);

        let out: Result<(), _> = engine
            .run_fn(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(()) }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(matches!(out, Err(RetryError::Aborted)));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_the_backoff_wait() {
        let token = CancellationToken::new();
        let engine = retrier(
            RetryPolicy::builder(3)
                .base_delay(Duration::from_secs(60))
                .cancel_token(token.clone())
                .build(),
        );
        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            token.cancel();
        });
        let calls = AtomicU32::new(0);
        let started = Instant::now();

        let out: Result<(), _> = engine
            .run_fn(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(TestError::Transient("down")) }
            })
            .await;

        // One invocation, then the 60s wait is cut short at 100ms.
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(started.elapsed(), Duration::from_millis(100));
        assert!(matches!(out, Err(RetryError::Aborted)));
        canceller.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn one_token_aborts_every_observing_call() {
        let token = CancellationToken::new();
        let engine = retrier(
            RetryPolicy::builder(10)
                .base_delay(Duration::from_secs(60))
                .cancel_token(token.clone())
                .build(),
        );
        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            token.cancel();
        });

        let (a, b): (Result<(), _>, Result<(), _>) = tokio::join!(
            engine.run_fn(|| async { Err(TestError::Transient("a")) }),
            engine.run_fn(|| async { Err(TestError::Transient("b")) }),
        );

        assert!(matches!(a, Err(RetryError::Aborted)));
        assert!(matches!(b, Err(RetryError::Aborted)));
        canceller.await.unwrap();
    }

    #[tokio::test]
    async fn trait_backed_operations_keep_receiver_state() {
        struct Flaky {
            failures_left: u32,
            calls: u32,
        }

        #[async_trait]
        impl Operation for Flaky {
            type Output = u32;
            type Error = TestError;

            async fn call(&mut self) -> Result<u32, TestError> {
                self.calls += 1;
                if self.failures_left > 0 {
                    self.failures_left -= 1;
                    Err(TestError::Transient("warming up"))
                } else {
                    Ok(self.calls)
                }
            }
        }

        let engine = retrier(RetryPolicy::builder(5).build());
        let out = engine
            .run(Flaky {
                failures_left: 3,
                calls: 0,
            })
            .await;

        assert_eq!(out.unwrap(), 4);
    }
}
