//! Policy composition: one callable out of zero or more guards.
//!
//! A [`Policy`] declares which guards apply to a call — an optional
//! per-attempt timeout, an optional [`RetryPolicy`], an optional shared
//! [`CircuitBreaker`]. An [`Executor`] binds a policy to an ambient
//! [`Context`] once and is then invoked many times, possibly concurrently.
//!
//! ## Composition order
//!
//! The nesting is fixed. The timeout bounds the raw operation, the breaker
//! gates the timeout-bounded operation (so a timed-out attempt is recorded
//! as a breaker failure), and the retry loop drives the whole guarded
//! attempt:
//!
//! ```text
//! retry ( circuit_breaker ( timeout ( operation ) ) )
//! ```
//!
//! Absent guards are skipped entirely — never substituted with permissive
//! defaults. With no guards at all, the executor is an identity wrapper
//! invoking the operation once against the ambient context.

use crate::circuit_breaker::CircuitBreaker;
use crate::core::{Context, FaultResult};
use crate::retry::{self, RetryPolicy};
use crate::timeout;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// A declarative bundle selecting which guards apply to a call.
///
/// Immutable once built into an [`Executor`]; safe to share across
/// concurrent invocations — it holds no per-call state. The breaker is the
/// only shared mutable component and is held by `Arc`, so every policy and
/// every invocation naming the same breaker drives the same state machine.
#[derive(Debug, Clone, Default)]
pub struct Policy {
    /// Per-attempt time budget. `None` or zero disables the timeout guard.
    pub timeout: Option<Duration>,

    /// Retry template. `None` disables the retry loop.
    pub retry: Option<RetryPolicy>,

    /// Shared circuit breaker instance. `None` disables the breaker gate.
    pub circuit_breaker: Option<Arc<CircuitBreaker>>,
}

impl Policy {
    /// Creates an empty policy (no guards).
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the per-attempt time budget.
    pub fn with_timeout(mut self, budget: Duration) -> Self {
        self.timeout = Some(budget);
        self
    }

    /// Sets the retry template.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Sets the shared circuit breaker.
    pub fn with_circuit_breaker(mut self, breaker: Arc<CircuitBreaker>) -> Self {
        self.circuit_breaker = Some(breaker);
        self
    }

    /// Returns `true` if no guard is configured.
    pub fn is_empty(&self) -> bool {
        self.timeout.map_or(true, |budget| budget.is_zero())
            && self.retry.is_none()
            && self.circuit_breaker.is_none()
    }
}

/// Applies a [`Policy`] to operations, bound to an ambient [`Context`].
///
/// Built once, invoked many times. Each invocation flows retry loop →
/// breaker gate → timeout guard → operation, and the terminal value or
/// error of the innermost attempt is always returned to the caller —
/// intermediate layers never swallow anything.
///
/// # Example
///
/// ```rust,ignore
/// use faultguard::{Context, Executor, Policy, RetryPolicy};
/// use std::time::Duration;
///
/// let policy = Policy::new()
///     .with_timeout(Duration::from_secs(2))
///     .with_retry(RetryPolicy::new(Duration::from_millis(100), 3));
///
/// let executor = Executor::new(Context::new(), policy);
/// let value = executor.execute(|ctx| async move { fetch(ctx).await }).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Executor {
    ctx: Context,
    policy: Policy,
}

impl Executor {
    /// Binds `policy` to the ambient context `ctx`.
    pub fn new(ctx: Context, policy: Policy) -> Self {
        Self { ctx, policy }
    }

    /// Returns the ambient context.
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Returns the bound policy.
    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Runs `operation` under the bound policy.
    ///
    /// The operation is handed a cancellable [`Context`]; with a timeout
    /// configured this is a per-attempt child of the ambient context,
    /// otherwise the ambient context itself.
    pub async fn execute<T, F, Fut>(&self, operation: F) -> FaultResult<T>
    where
        F: Fn(Context) -> Fut + Send + Sync,
        Fut: Future<Output = FaultResult<T>> + Send + 'static,
        T: Send + 'static,
    {
        match &self.policy.retry {
            Some(policy) => {
                retry::retry(policy, &self.ctx, |ctx| self.attempt(&operation, ctx)).await
            }
            None => self.attempt(&operation, self.ctx.clone()).await,
        }
    }

    /// One guarded attempt: breaker gate around the timeout-bounded call.
    async fn attempt<T, F, Fut>(&self, operation: &F, ctx: Context) -> FaultResult<T>
    where
        F: Fn(Context) -> Fut + Send + Sync,
        Fut: Future<Output = FaultResult<T>> + Send + 'static,
        T: Send + 'static,
    {
        match &self.policy.circuit_breaker {
            Some(breaker) => breaker.execute(|| self.bounded(operation, ctx)).await,
            None => self.bounded(operation, ctx).await,
        }
    }

    async fn bounded<T, F, Fut>(&self, operation: &F, ctx: Context) -> FaultResult<T>
    where
        F: Fn(Context) -> Fut + Send + Sync,
        Fut: Future<Output = FaultResult<T>> + Send + 'static,
        T: Send + 'static,
    {
        match self.policy.timeout {
            Some(budget) if !budget.is_zero() => {
                timeout::with_deadline(&ctx, budget, operation).await
            }
            _ => operation(ctx).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit_breaker::CircuitBreakerConfig;
    use crate::core::FaultError;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// A named operation type so the always-failing closure can be reused
    /// across tests without repeating the counting boilerplate.
    struct CountingFailure(Arc<AtomicU32>);

    impl CountingFailure {
        fn call(&self, _ctx: Context) -> impl Future<Output = FaultResult<&'static str>> {
            let counter = self.0.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(FaultError::operation("always fails"))
            }
        }
    }

    #[tokio::test]
    async fn test_no_guards_is_an_identity_wrapper() {
        let executor = Executor::new(Context::new(), Policy::new());
        let attempts = Arc::new(AtomicU32::new(0));

        let counter = attempts.clone();
        let value = executor
            .execute(move |_ctx| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(42)
                }
            })
            .await
            .unwrap();

        assert_eq!(value, 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert!(executor.policy().is_empty());
    }

    #[tokio::test]
    async fn test_no_guards_error_attempts_once() {
        let executor = Executor::new(Context::new(), Policy::new());
        let attempts = Arc::new(AtomicU32::new(0));

        let operation = CountingFailure(attempts.clone());
        let err = executor
            .execute(move |ctx| operation.call(ctx))
            .await
            .unwrap_err();

        assert!(matches!(err, FaultError::Operation { .. }));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_drives_the_guarded_operation() {
        let policy = Policy::new().with_retry(RetryPolicy::new(Duration::from_millis(1), 3));
        let executor = Executor::new(Context::new(), policy);
        let attempts = Arc::new(AtomicU32::new(0));

        let operation = CountingFailure(attempts.clone());
        executor
            .execute(move |ctx| operation.call(ctx))
            .await
            .unwrap_err();

        assert_eq!(attempts.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_timeout_applies_per_attempt_and_is_retried() {
        // Breaker disabled: a slow operation must be retried, not rejected.
        let policy = Policy::new()
            .with_timeout(Duration::from_millis(20))
            .with_retry(RetryPolicy::new(Duration::from_millis(1), 2));
        let executor = Executor::new(Context::new(), policy);
        let attempts = Arc::new(AtomicU32::new(0));

        let counter = attempts.clone();
        let err = executor
            .execute(move |_ctx| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Ok(())
                }
            })
            .await
            .unwrap_err();

        assert!(matches!(err, FaultError::DeadlineExceeded { .. }));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_breaker_rejection_short_circuits_the_retry_loop() {
        let breaker = Arc::new(CircuitBreaker::new(
            "upstream",
            CircuitBreakerConfig::new()
                .with_failure_threshold(1)
                .with_open_duration(Duration::from_secs(60)),
        ));
        let policy = Policy::new()
            .with_retry(RetryPolicy::new(Duration::from_millis(1), 10))
            .with_circuit_breaker(breaker.clone());
        let executor = Executor::new(Context::new(), policy);
        let attempts = Arc::new(AtomicU32::new(0));

        let operation = CountingFailure(attempts.clone());
        let err = executor
            .execute(move |ctx| operation.call(ctx))
            .await
            .unwrap_err();

        // First attempt fails and trips the breaker; the second attempt is
        // rejected without invoking the operation, and the rejection is
        // permanent so the remaining retries are not spent.
        assert!(matches!(err, FaultError::CircuitOpen { .. }));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert!(breaker.state().is_open());
    }

    #[tokio::test]
    async fn test_timeout_counts_as_a_breaker_failure() {
        let breaker = Arc::new(CircuitBreaker::new(
            "upstream",
            CircuitBreakerConfig::new()
                .with_failure_threshold(2)
                .with_open_duration(Duration::from_secs(60)),
        ));
        let policy = Policy::new()
            .with_timeout(Duration::from_millis(10))
            .with_circuit_breaker(breaker.clone());
        let executor = Executor::new(Context::new(), policy);

        for _ in 0..2 {
            let err = executor
                .execute(|_ctx| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Ok(())
                })
                .await
                .unwrap_err();
            assert!(matches!(err, FaultError::DeadlineExceeded { .. }));
        }

        assert!(breaker.state().is_open());
    }

    #[tokio::test]
    async fn test_success_on_kth_attempt_stops_the_loop() {
        let policy = Policy::new().with_retry(RetryPolicy::new(Duration::from_millis(1), 5));
        let executor = Executor::new(Context::new(), policy);
        let attempts = Arc::new(AtomicU32::new(0));

        let counter = attempts.clone();
        let value = executor
            .execute(move |_ctx| {
                let counter = counter.clone();
                async move {
                    let current = counter.fetch_add(1, Ordering::SeqCst) + 1;
                    if current < 3 {
                        Err(FaultError::operation("temporary failure"))
                    } else {
                        Ok("success")
                    }
                }
            })
            .await
            .unwrap();

        assert_eq!(value, "success");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_shared_breaker_protects_across_executors() {
        let breaker = Arc::new(CircuitBreaker::new(
            "shared",
            CircuitBreakerConfig::new()
                .with_failure_threshold(1)
                .with_open_duration(Duration::from_secs(60)),
        ));

        let first = Executor::new(
            Context::new(),
            Policy::new().with_circuit_breaker(breaker.clone()),
        );
        let second = Executor::new(
            Context::new(),
            Policy::new().with_circuit_breaker(breaker.clone()),
        );

        first
            .execute(|_ctx| async { Err::<(), _>(FaultError::operation("boom")) })
            .await
            .unwrap_err();

        // The other executor sees the same open breaker.
        let err = second
            .execute(|_ctx| async { Ok("never runs") })
            .await
            .unwrap_err();
        assert!(matches!(err, FaultError::CircuitOpen { .. }));
    }
}
