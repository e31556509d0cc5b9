//! Deadline enforcement for a single operation attempt.
//!
//! The guard runs the operation on an independently spawned task so that a
//! non-cooperative operation cannot block the caller past its deadline. The
//! task reports its outcome over a single-slot channel whose send never
//! blocks; the waiter races that channel against the deadline and the
//! ambient cancellation signal, and abandons — but does not kill — the
//! losing side. A panic inside the operation is caught on the spawned task
//! and converted into [`FaultError::Aborted`].

use crate::core::{Context, FaultError, FaultResult};

use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tokio::sync::oneshot;

/// Runs `operation` with a deadline of `budget`, derived from `ctx`.
///
/// The operation receives a child context that is cancelled when the
/// deadline fires or the ambient context is cancelled, so a cooperative
/// operation can stop early; an uncooperative one is simply abandoned and
/// allowed to run to completion in the background, its result discarded.
///
/// # Errors
///
/// - [`FaultError::DeadlineExceeded`] if the budget elapses first.
/// - [`FaultError::Cancelled`] if the ambient context is cancelled first.
/// - [`FaultError::Aborted`] if the operation panicked.
/// - Otherwise, whatever the operation itself returned.
pub async fn with_deadline<T, F, Fut>(ctx: &Context, budget: Duration, operation: &F) -> FaultResult<T>
where
    F: Fn(Context) -> Fut,
    Fut: Future<Output = FaultResult<T>> + Send + 'static,
    T: Send + 'static,
{
    let attempt = ctx.child();
    let (outcome_tx, outcome_rx) = oneshot::channel();

    let fut = operation(attempt.clone());
    tokio::spawn(async move {
        let outcome = match AssertUnwindSafe(fut).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => Err(FaultError::aborted(panic_reason(panic.as_ref()))),
        };
        // The waiter may have given up already; the send must not block so
        // this task can always finish and exit.
        let _ = outcome_tx.send(outcome);
    });

    let result = tokio::select! {
        outcome = outcome_rx => outcome
            .unwrap_or_else(|_| Err(FaultError::aborted("operation task exited without reporting"))),
        _ = tokio::time::sleep(budget) => {
            tracing::debug!(budget = ?budget, "operation attempt exceeded its deadline");
            Err(FaultError::deadline_exceeded(budget))
        }
        _ = ctx.cancelled() => Err(FaultError::Cancelled),
    };

    // Signal the abandoned attempt so a cooperative operation stops early.
    attempt.cancel();
    result
}

fn panic_reason(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Instant;

    #[tokio::test]
    async fn test_fast_operation_passes_through() {
        let ctx = Context::new();
        let operation = |_ctx: Context| async { Ok("done") };

        let value = with_deadline(&ctx, Duration::from_secs(1), &operation)
            .await
            .unwrap();
        assert_eq!(value, "done");
    }

    #[tokio::test]
    async fn test_operation_error_passes_through_unchanged() {
        let ctx = Context::new();
        let operation = |_ctx: Context| async { Err::<(), _>(FaultError::operation("own error")) };

        let err = with_deadline(&ctx, Duration::from_secs(1), &operation)
            .await
            .unwrap_err();
        assert!(matches!(err, FaultError::Operation { .. }));
    }

    #[tokio::test]
    async fn test_slow_operation_hits_the_deadline() {
        let ctx = Context::new();
        let invoked = Arc::new(AtomicU32::new(0));
        let counter = invoked.clone();
        let operation = move |_ctx: Context| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok("too late")
            }
        };

        let budget = Duration::from_millis(30);
        let started = Instant::now();
        let err = with_deadline(&ctx, budget, &operation).await.unwrap_err();
        let elapsed = started.elapsed();

        assert!(matches!(err, FaultError::DeadlineExceeded { .. }));
        assert_eq!(invoked.load(Ordering::SeqCst), 1);
        assert!(elapsed >= budget);
        assert!(elapsed < budget + Duration::from_millis(100));
    }

    async fn exploding(_ctx: Context) -> FaultResult<()> {
        panic!("exploded")
    }

    #[tokio::test]
    async fn test_panicking_operation_becomes_an_error() {
        let ctx = Context::new();

        let err = with_deadline(&ctx, Duration::from_secs(1), &exploding)
            .await
            .unwrap_err();
        match err {
            FaultError::Aborted { reason } => assert!(reason.contains("exploded")),
            other => panic!("expected Aborted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_ambient_cancellation_wins_the_race() {
        let ctx = Context::new();
        let cancel_ctx = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            cancel_ctx.cancel();
        });

        let operation = |_ctx: Context| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("too late")
        };

        let err = with_deadline(&ctx, Duration::from_secs(10), &operation)
            .await
            .unwrap_err();
        assert!(matches!(err, FaultError::Cancelled));
    }

    #[tokio::test]
    async fn test_abandoned_operation_observes_cancellation() {
        let ctx = Context::new();
        let observed = Arc::new(AtomicU32::new(0));
        let counter = observed.clone();
        let operation = move |attempt: Context| {
            let counter = counter.clone();
            async move {
                attempt.cancelled().await;
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        };

        let err = with_deadline(&ctx, Duration::from_millis(20), &operation)
            .await
            .unwrap_err();
        assert!(matches!(err, FaultError::DeadlineExceeded { .. }));

        // The background task finishes on its own once the child context
        // is cancelled, even though nobody is listening anymore.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(observed.load(Ordering::SeqCst), 1);
    }
}
