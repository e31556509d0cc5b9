//! Named policy registry example.
//!
//! This example shows how to:
//! - Declare timeouts, retries, and circuit breakers by name in JSON
//! - Resolve the whole set once at startup into a `PolicyRegistry`
//! - Hand out per-target executors and watch a shared breaker trip
//!
//! Run with: cargo run --example named_policies

use faultguard::prelude::*;
use std::time::Duration;

const CONFIG: &str = r#"{
    "timeouts": { "short": "150ms" },
    "retries": { "eager": { "duration": "50ms", "maxRetries": 2 } },
    "circuitBreakers": {
        "ledger": {
            "maxRequests": 1,
            "interval": "10s",
            "timeout": "1s",
            "failures": 2
        }
    },
    "targets": {
        "read-ledger": {
            "timeout": "short",
            "retry": "eager",
            "circuitBreaker": "ledger"
        },
        "write-audit": {
            "retry": "eager"
        }
    }
}"#;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("=== Named Policy Registry Example ===\n");

    let config: ResilienceConfig = serde_json::from_str(CONFIG)?;
    let registry = PolicyRegistry::from_config(&config)?;

    let ctx = Context::new();
    let read_ledger = registry.executor(ctx.clone(), "read-ledger");

    println!("Hammering 'read-ledger' with a dead upstream...\n");
    for round in 1..=3 {
        let result = read_ledger
            .execute(|_ctx| async {
                Err::<String, _>(FaultError::operation("connection refused"))
            })
            .await;

        match result {
            Ok(payload) => println!("round {round}: ok: {payload}"),
            Err(err) if err.is_rejection() => {
                println!("round {round}: fail-fast, retries skipped: {err}")
            }
            Err(err) => println!("round {round}: exhausted retries: {err}"),
        }
    }

    let breaker = registry
        .circuit_breaker("ledger")
        .expect("breaker is defined in the config");
    println!("\nBreaker 'ledger' is now {}", breaker.state());

    println!("\nWaiting out the cool-down, then probing with a healthy upstream...");
    tokio::time::sleep(Duration::from_millis(1100)).await;

    let recovered = read_ledger
        .execute(|_ctx| async { Ok::<_, FaultError>("ledger entry 42".to_string()) })
        .await?;
    println!("probe succeeded: {recovered}");
    println!("Breaker 'ledger' is back to {}", breaker.state());

    // A target with no breaker keeps retrying independently.
    let write_audit = registry.executor(ctx, "write-audit");
    let err = write_audit
        .execute(|_ctx| async { Err::<(), _>(FaultError::operation("disk full")) })
        .await
        .unwrap_err();
    println!("\n'write-audit' exhausted its own retries: {err}");

    Ok(())
}
