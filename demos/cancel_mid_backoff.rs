//! # Demo: cancel_mid_backoff
//!
//! An operation that always fails, retried with a long fixed backoff. A
//! separate task cancels the shared token 300ms in; the engine aborts the
//! in-progress wait instead of sleeping out the full five seconds.
//!
//! ## Run
//! ```bash
//! cargo run --example cancel_mid_backoff
//! ```

use std::time::Duration;

use insist::{Retrier, RetryError, RetryPolicy};
use tokio_util::sync::CancellationToken;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt().init();

    let token = CancellationToken::new();
    let policy = RetryPolicy::<String>::builder(10)
        .base_delay(Duration::from_secs(5))
        .cancel_token(token.clone())
        .build();
    let retrier = Retrier::new(policy);

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        println!("[ctl] cancelling");
        token.cancel();
    });

    let out: Result<(), _> = retrier
        .run_fn(|| async { Err("upstream unavailable".to_string()) })
        .await;

    match out {
        Err(err @ RetryError::Aborted) => println!("[main] stopped early: {err}"),
        other => println!("[main] unexpected outcome: {other:?}"),
    }
    canceller.await.unwrap();
}
