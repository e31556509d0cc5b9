//! Fixed-delay retry policies.
//!
//! A [`RetryPolicy`] is an immutable template: a fixed delay between
//! attempts and a maximum number of retries. Each invocation derives its
//! own [`Backoff`] sequence from the template, bound to the ambient
//! [`Context`] so that cancellation interrupts any pending delay.
//!
//! ## Semantics
//!
//! - The first attempt is immediate; every subsequent attempt waits the
//!   fixed delay.
//! - `max_retries < 0` retries without bound; `max_retries == 0` means a
//!   single attempt.
//! - An error marked permanent (see [`FaultError::is_permanent`]) stops the
//!   loop immediately, regardless of remaining retries.

use crate::core::{Context, FaultError, FaultResult};
use std::future::Future;
use std::time::Duration;

/// Configuration template for retry behavior.
///
/// Immutable after construction; a fresh [`Backoff`] sequence is derived
/// per invocation via [`backoff`](RetryPolicy::backoff).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Fixed delay between attempts.
    pub delay: Duration,

    /// Maximum number of retries after the first attempt.
    ///
    /// Negative means unlimited; zero means no retry at all.
    pub max_retries: i32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(100),
            max_retries: 3,
        }
    }
}

impl RetryPolicy {
    /// Creates a new retry policy.
    pub fn new(delay: Duration, max_retries: i32) -> Self {
        Self { delay, max_retries }
    }

    /// Creates a policy that never retries (single attempt).
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Creates a policy that retries without bound.
    ///
    /// Such a policy only terminates through success, a permanent error, or
    /// cancellation of the ambient context.
    pub fn unlimited(delay: Duration) -> Self {
        Self {
            delay,
            max_retries: -1,
        }
    }

    /// Sets the delay between attempts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Sets the maximum number of retries.
    pub fn with_max_retries(mut self, max_retries: i32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Derives a delay sequence for one invocation, bound to `ctx`.
    pub fn backoff(&self, ctx: &Context) -> Backoff {
        Backoff {
            delay: self.delay,
            remaining: if self.max_retries < 0 {
                None
            } else {
                Some(self.max_retries as u32)
            },
            attempt: 0,
            ctx: ctx.clone(),
        }
    }
}

/// Why a [`Backoff`] sequence refused to schedule another attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffStop {
    /// The retry budget is used up; return the last error unchanged.
    Exhausted,
    /// The bound context was cancelled while waiting.
    Cancelled,
}

/// A stateful delay sequence for a single invocation.
///
/// Obtained from [`RetryPolicy::backoff`]; consumed by awaiting
/// [`wait`](Backoff::wait) between attempts.
#[derive(Debug)]
pub struct Backoff {
    delay: Duration,
    remaining: Option<u32>,
    attempt: u32,
    ctx: Context,
}

impl Backoff {
    /// Waits out the delay before the next attempt.
    ///
    /// Returns `Ok(())` once another attempt may proceed. Returns
    /// [`BackoffStop::Exhausted`] when the retry budget is used up and
    /// [`BackoffStop::Cancelled`] the moment the bound context is
    /// cancelled — independent of remaining retries.
    pub async fn wait(&mut self) -> Result<(), BackoffStop> {
        match self.remaining {
            Some(0) => return Err(BackoffStop::Exhausted),
            Some(ref mut n) => *n -= 1,
            None => {}
        }
        self.attempt += 1;

        tokio::select! {
            _ = tokio::time::sleep(self.delay) => {
                tracing::debug!(
                    attempt = self.attempt,
                    delay = ?self.delay,
                    "retrying operation"
                );
                Ok(())
            }
            _ = self.ctx.cancelled() => Err(BackoffStop::Cancelled),
        }
    }

    /// Returns the number of retries already granted by this sequence.
    pub fn attempts(&self) -> u32 {
        self.attempt
    }
}

/// Invokes `operation` under `policy` until it succeeds, fails permanently,
/// exhausts its retries, or the context is cancelled.
///
/// Attempts are strictly sequential; the inter-attempt delay is the only
/// suspension point and is interrupted by cancellation of `ctx`.
pub async fn retry<T, F, Fut>(policy: &RetryPolicy, ctx: &Context, operation: F) -> FaultResult<T>
where
    F: Fn(Context) -> Fut,
    Fut: Future<Output = FaultResult<T>>,
{
    let mut backoff = policy.backoff(ctx);
    loop {
        match operation(ctx.clone()).await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_permanent() => return Err(err),
            Err(err) => match backoff.wait().await {
                Ok(()) => {}
                Err(BackoffStop::Exhausted) => return Err(err),
                Err(BackoffStop::Cancelled) => return Err(FaultError::Cancelled),
            },
        }
    }
}
