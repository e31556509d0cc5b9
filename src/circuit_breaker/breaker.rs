//! Circuit breaker implementation.

use crate::circuit_breaker::config::CircuitBreakerConfig;
use crate::circuit_breaker::state::{CircuitState, Counts};
use crate::core::{FaultError, FaultResult};

use std::fmt;
use std::future::Future;
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

/// A three-state circuit breaker shared by every caller of the same
/// named policy.
///
/// The breaker tracks consecutive failures and short-circuits calls when
/// the wrapped dependency looks unhealthy, so a persistently failing
/// dependency fails fast instead of absorbing every caller's time budget.
///
/// # States
///
/// - **Closed**: Normal operation. Calls pass through, failures are counted.
/// - **Open**: The dependency is failing. Calls are rejected immediately
///   with [`FaultError::CircuitOpen`] until the cool-down elapses.
/// - **Half-Open**: Probing. Up to `max_requests` calls are allowed through
///   to test recovery; the rest are rejected with
///   [`FaultError::TooManyRequests`].
///
/// All state lives behind a single mutex. Every recorded outcome is stamped
/// with the generation it was admitted under; outcomes from a previous
/// generation are discarded, so a result that arrives after a state change
/// can never corrupt the new state's counters.
///
/// # Example
///
/// ```rust,ignore
/// use faultguard::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
///
/// let breaker = CircuitBreaker::new("payments", CircuitBreakerConfig::default());
/// let result = breaker.execute(|| async { fetch_balance().await }).await;
/// ```
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    shared: Mutex<Shared>,
}

#[derive(Debug)]
struct Shared {
    state: CircuitState,
    generation: u64,
    counts: Counts,
    expiry: Option<Instant>,
}

impl CircuitBreaker {
    /// Creates a new circuit breaker with the given name and configuration.
    ///
    /// The name identifies the breaker in rejection errors and logs.
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        let now = Instant::now();
        let expiry = if config.interval.is_zero() {
            None
        } else {
            Some(now + config.interval)
        };

        Self {
            name: name.into(),
            config,
            shared: Mutex::new(Shared {
                state: CircuitState::Closed,
                generation: 0,
                counts: Counts::default(),
                expiry,
            }),
        }
    }

    /// Creates a new circuit breaker with default configuration.
    pub fn with_defaults(name: impl Into<String>) -> Self {
        Self::new(name, CircuitBreakerConfig::default())
    }

    /// Returns the breaker's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns a reference to the configuration.
    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Returns the current state, evaluated against the clock.
    ///
    /// Reading the state performs any transition that is due purely to
    /// elapsed time (open → half-open, closed-interval counter reset).
    pub fn state(&self) -> CircuitState {
        let mut shared = self.lock();
        self.refresh(&mut shared, Instant::now());
        shared.state
    }

    /// Returns a snapshot of the current generation's counters.
    pub fn counts(&self) -> Counts {
        let mut shared = self.lock();
        self.refresh(&mut shared, Instant::now());
        shared.counts
    }

    /// Runs `operation` through the breaker.
    ///
    /// If the circuit is open the operation is never invoked and
    /// [`FaultError::CircuitOpen`] is returned immediately; if it is
    /// half-open and the probe cap is reached, [`FaultError::TooManyRequests`]
    /// is returned instead. Otherwise the operation runs and its outcome is
    /// recorded, driving the state machine.
    ///
    /// Both rejection errors are permanent (see
    /// [`FaultError::is_permanent`]), so an enclosing retry loop surfaces
    /// them after a single check instead of hammering an open breaker.
    pub async fn execute<T, F, Fut>(&self, operation: F) -> FaultResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = FaultResult<T>>,
    {
        let generation = self.acquire()?;
        let result = operation().await;
        self.record(generation, result.is_ok());
        result
    }

    /// Admits or rejects a call, returning the generation it was admitted
    /// under.
    fn acquire(&self) -> Result<u64, FaultError> {
        let mut shared = self.lock();
        self.refresh(&mut shared, Instant::now());

        match shared.state {
            CircuitState::Closed => {
                shared.counts.on_request();
                Ok(shared.generation)
            }
            CircuitState::Open => Err(FaultError::circuit_open(&self.name)),
            CircuitState::HalfOpen => {
                if shared.counts.requests >= self.config.effective_max_requests() {
                    return Err(FaultError::too_many_requests(&self.name));
                }
                shared.counts.on_request();
                Ok(shared.generation)
            }
        }
    }

    /// Records a call outcome admitted under `generation`.
    fn record(&self, generation: u64, success: bool) {
        let mut shared = self.lock();
        let now = Instant::now();
        self.refresh(&mut shared, now);

        // The state machine moved on while this call was in flight; its
        // outcome belongs to a generation that no longer exists.
        if shared.generation != generation {
            return;
        }

        if success {
            self.on_success(&mut shared, now);
        } else {
            self.on_failure(&mut shared, now);
        }
    }

    fn on_success(&self, shared: &mut Shared, now: Instant) {
        match shared.state {
            CircuitState::Closed => shared.counts.on_success(),
            CircuitState::HalfOpen => {
                shared.counts.on_success();
                if shared.counts.consecutive_successes >= self.config.effective_max_requests() {
                    self.transition(shared, CircuitState::Closed, now);
                }
            }
            CircuitState::Open => {}
        }
    }

    fn on_failure(&self, shared: &mut Shared, now: Instant) {
        match shared.state {
            CircuitState::Closed => {
                shared.counts.on_failure();
                if shared.counts.consecutive_failures >= self.config.failure_threshold.max(1) {
                    self.transition(shared, CircuitState::Open, now);
                }
            }
            CircuitState::HalfOpen => self.transition(shared, CircuitState::Open, now),
            CircuitState::Open => {}
        }
    }

    /// Applies transitions that are due purely to elapsed time.
    fn refresh(&self, shared: &mut Shared, now: Instant) {
        match shared.state {
            CircuitState::Closed => {
                if let Some(expiry) = shared.expiry {
                    if now >= expiry {
                        self.new_generation(shared, now);
                    }
                }
            }
            CircuitState::Open => {
                if let Some(expiry) = shared.expiry {
                    if now >= expiry {
                        self.transition(shared, CircuitState::HalfOpen, now);
                    }
                }
            }
            CircuitState::HalfOpen => {}
        }
    }

    fn transition(&self, shared: &mut Shared, next: CircuitState, now: Instant) {
        if shared.state == next {
            return;
        }
        let previous = shared.state;
        shared.state = next;
        self.new_generation(shared, now);

        match next {
            CircuitState::Open => tracing::warn!(
                circuit = %self.name,
                from = %previous,
                cool_down = ?self.config.effective_open_duration(),
                "circuit breaker opened"
            ),
            CircuitState::HalfOpen => tracing::info!(
                circuit = %self.name,
                "circuit breaker half-open, probing for recovery"
            ),
            CircuitState::Closed => tracing::info!(
                circuit = %self.name,
                "circuit breaker closed"
            ),
        }
    }

    fn new_generation(&self, shared: &mut Shared, now: Instant) {
        shared.generation += 1;
        shared.counts.clear();
        shared.expiry = match shared.state {
            CircuitState::Closed => {
                if self.config.interval.is_zero() {
                    None
                } else {
                    Some(now + self.config.interval)
                }
            }
            CircuitState::Open => Some(now + self.config.effective_open_duration()),
            CircuitState::HalfOpen => None,
        };
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shared = self.lock();
        f.debug_struct("CircuitBreaker")
            .field("name", &self.name)
            .field("state", &shared.state)
            .field("counts", &shared.counts)
            .field("config", &self.config)
            .finish()
    }
}
