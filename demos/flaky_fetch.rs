//! # Demo: flaky_fetch
//!
//! A fetch that fails three times before succeeding, retried under
//! exponential backoff with equal jitter. The engine's `tracing` output shows
//! each backoff decision.
//!
//! ## Run
//! ```bash
//! cargo run --example flaky_fetch
//! ```

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use insist::{BackoffPolicy, JitterPolicy, Retrier, RetryPolicy};

static CALLS: AtomicU32 = AtomicU32::new(0);

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let policy = RetryPolicy::builder(4)
        .backoff(BackoffPolicy::Exponential)
        .base_delay(Duration::from_millis(100))
        .max_interval(Duration::from_secs(2))
        .use_jitter(true)
        .jitter_type(JitterPolicy::Equal)
        .build();
    let retrier = Retrier::new(policy);

    let body = retrier
        .run_fn(|| {
            let attempt = CALLS.fetch_add(1, Ordering::Relaxed) + 1;
            async move {
                println!("[fetch] attempt {attempt}");
                if attempt <= 3 {
                    Err(format!("connection reset (attempt {attempt})"))
                } else {
                    Ok("200 OK".to_string())
                }
            }
        })
        .await?;

    println!("[fetch] got: {body}");
    Ok(())
}
