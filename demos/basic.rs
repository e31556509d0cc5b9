//! Basic composition example.
//!
//! This example shows how to:
//! - Build a policy with a timeout, a retry template, and a circuit breaker
//! - Execute a flaky operation through the composed executor
//! - Observe which guard produced each failure
//!
//! Run with: cargo run --example basic

use faultguard::prelude::*;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("=== Basic Composition Example ===\n");

    let breaker = Arc::new(CircuitBreaker::new(
        "flaky-upstream",
        CircuitBreakerConfig::default()
            .with_failure_threshold(3)
            .with_open_duration(Duration::from_secs(2)),
    ));

    let policy = Policy::new()
        .with_timeout(Duration::from_millis(200))
        .with_retry(RetryPolicy::new(Duration::from_millis(50), 2))
        .with_circuit_breaker(breaker.clone());

    let executor = Executor::new(Context::new(), policy);

    // An operation that fails for a while, then recovers.
    let calls = Arc::new(AtomicU32::new(0));

    for round in 1..=6 {
        let calls = calls.clone();
        let result = executor
            .execute(move |_ctx| {
                let calls = calls.clone();
                async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                    if n <= 4 {
                        Err(FaultError::operation(format!("upstream glitch #{n}")))
                    } else {
                        Ok(format!("payload from call #{n}"))
                    }
                }
            })
            .await;

        match result {
            Ok(payload) => println!("round {round}: ok: {payload}"),
            Err(err) if err.is_rejection() => {
                println!("round {round}: rejected fast: {err}")
            }
            Err(err) => println!("round {round}: failed: {err}"),
        }
        println!(
            "          breaker '{}' is {}",
            breaker.name(),
            breaker.state()
        );

        tokio::time::sleep(Duration::from_millis(500)).await;
    }

    println!("\nFinal breaker counters: {:?}", breaker.counts());
    Ok(())
}
