//! # Cancellable backoff wait.
//!
//! [`sleep_cancellable`] waits out a backoff delay while staying responsive to
//! an external [`CancellationToken`]. There is no polling: the timer and the
//! token's `cancelled()` notification race inside a `select!`, and the losing
//! branch is dropped. A token that is already signaled short-circuits before
//! the timer is even created.

use std::time::Duration;

use tokio::{select, time};
use tokio_util::sync::CancellationToken;

/// How a backoff wait ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SleepOutcome {
    /// The full delay passed.
    Elapsed,
    /// The cancellation token fired first (or was already signaled).
    Cancelled,
}

/// Sleeps for `delay`, racing the token's cancellation notification.
pub(crate) async fn sleep_cancellable(
    delay: Duration,
    cancel: Option<&CancellationToken>,
) -> SleepOutcome {
    let Some(token) = cancel else {
        time::sleep(delay).await;
        return SleepOutcome::Elapsed;
    };

    if token.is_cancelled() {
        return SleepOutcome::Cancelled;
    }

    let sleep = time::sleep(delay);
    tokio::pin!(sleep);
    select! {
        _ = &mut sleep => SleepOutcome::Elapsed,
        _ = token.cancelled() => SleepOutcome::Cancelled,
    }
}
