//! Named policy definitions and their resolution.
//!
//! Configuration names timeouts, retries, and circuit breakers once, then
//! binds them to *targets* — each target selecting at most one of each by
//! name. [`PolicyRegistry::from_config`] resolves the whole set up front:
//! every duration string is parsed and every reference checked, so a bad
//! configuration fails at startup instead of at call time.
//!
//! ## Example configuration (JSON)
//!
//! ```json
//! {
//!   "timeouts": { "short": "500ms" },
//!   "retries": { "standard": { "duration": "100ms", "maxRetries": 3 } },
//!   "circuitBreakers": {
//!     "upstream": {
//!       "maxRequests": 1, "interval": "10s",
//!       "timeout": "30s", "failures": 5
//!     }
//!   },
//!   "targets": {
//!     "fetch-balance": {
//!       "timeout": "short", "retry": "standard", "circuitBreaker": "upstream"
//!     }
//!   }
//! }
//! ```

use crate::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
use crate::core::{parse_duration, Context, FaultError, FaultResult};
use crate::executor::{Executor, Policy};
use crate::retry::RetryPolicy;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// The full set of named fault-tolerance definitions.
///
/// All maps default to empty, so a configuration file may omit any of them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResilienceConfig {
    /// Named timeouts: name → duration string.
    pub timeouts: HashMap<String, String>,

    /// Named retry templates.
    pub retries: HashMap<String, RetryDefinition>,

    /// Named circuit breakers.
    pub circuit_breakers: HashMap<String, CircuitBreakerDefinition>,

    /// Named targets, each selecting at most one definition of each kind.
    pub targets: HashMap<String, TargetDefinition>,
}

/// A named retry definition, prior to resolution.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RetryDefinition {
    /// Fixed delay between attempts, as a duration string.
    pub duration: String,

    /// Maximum retries; negative means unlimited, zero means no retry.
    pub max_retries: i32,
}

/// A named circuit breaker definition, prior to resolution.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CircuitBreakerDefinition {
    /// Half-open probe cap.
    pub max_requests: u32,

    /// Closed-state counter-reset interval, as a duration string.
    pub interval: String,

    /// Open-state cool-down, as a duration string.
    pub timeout: String,

    /// Consecutive failures that trip the circuit.
    pub failures: u32,
}

/// A named target binding guards together by name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TargetDefinition {
    /// Name of the timeout to apply, if any.
    pub timeout: Option<String>,

    /// Name of the retry template to apply, if any.
    pub retry: Option<String>,

    /// Name of the circuit breaker to apply, if any.
    pub circuit_breaker: Option<String>,
}

/// Resolved named policies, ready to hand out.
///
/// Breakers are constructed once and shared: every target naming the same
/// breaker drives the same state machine instance.
#[derive(Debug)]
pub struct PolicyRegistry {
    timeouts: HashMap<String, Duration>,
    retries: HashMap<String, RetryPolicy>,
    circuit_breakers: HashMap<String, Arc<CircuitBreaker>>,
    targets: HashMap<String, TargetDefinition>,
}

impl PolicyRegistry {
    /// Resolves a configuration into a registry.
    ///
    /// # Errors
    ///
    /// Returns [`FaultError::Configuration`] for any invalid duration string
    /// and for any target referencing an undefined name. Construction errors
    /// are fatal; nothing is partially resolved.
    pub fn from_config(config: &ResilienceConfig) -> FaultResult<Self> {
        let mut timeouts = HashMap::new();
        for (name, value) in &config.timeouts {
            let duration = parse_duration(value).map_err(|err| {
                FaultError::configuration(format!("timeout '{name}': {err}"))
            })?;
            timeouts.insert(name.clone(), duration);
        }

        let mut retries = HashMap::new();
        for (name, definition) in &config.retries {
            let delay = parse_duration(&definition.duration).map_err(|err| {
                FaultError::configuration(format!("retry '{name}': {err}"))
            })?;
            retries.insert(name.clone(), RetryPolicy::new(delay, definition.max_retries));
        }

        let mut circuit_breakers = HashMap::new();
        for (name, definition) in &config.circuit_breakers {
            let interval = parse_duration(&definition.interval).map_err(|err| {
                FaultError::configuration(format!("circuit breaker '{name}': {err}"))
            })?;
            let open_duration = parse_duration(&definition.timeout).map_err(|err| {
                FaultError::configuration(format!("circuit breaker '{name}': {err}"))
            })?;

            let breaker_config = CircuitBreakerConfig::new()
                .with_failure_threshold(definition.failures)
                .with_max_requests(definition.max_requests)
                .with_interval(interval)
                .with_open_duration(open_duration);
            circuit_breakers.insert(
                name.clone(),
                Arc::new(CircuitBreaker::new(name.clone(), breaker_config)),
            );
        }

        for (name, target) in &config.targets {
            if let Some(reference) = &target.timeout {
                if !timeouts.contains_key(reference) {
                    return Err(FaultError::configuration(format!(
                        "target '{name}' references unknown timeout '{reference}'"
                    )));
                }
            }
            if let Some(reference) = &target.retry {
                if !retries.contains_key(reference) {
                    return Err(FaultError::configuration(format!(
                        "target '{name}' references unknown retry '{reference}'"
                    )));
                }
            }
            if let Some(reference) = &target.circuit_breaker {
                if !circuit_breakers.contains_key(reference) {
                    return Err(FaultError::configuration(format!(
                        "target '{name}' references unknown circuit breaker '{reference}'"
                    )));
                }
            }
        }

        Ok(Self {
            timeouts,
            retries,
            circuit_breakers,
            targets: config.targets.clone(),
        })
    }

    /// Composes the policy for `target`.
    ///
    /// An unknown target yields the empty policy, so its executor is a plain
    /// pass-through.
    pub fn policy(&self, target: &str) -> Policy {
        let mut policy = Policy::new();

        if let Some(definition) = self.targets.get(target) {
            if let Some(name) = &definition.timeout {
                if let Some(duration) = self.timeouts.get(name) {
                    policy.timeout = Some(*duration);
                }
            }
            if let Some(name) = &definition.retry {
                if let Some(retry) = self.retries.get(name) {
                    policy.retry = Some(*retry);
                }
            }
            if let Some(name) = &definition.circuit_breaker {
                if let Some(breaker) = self.circuit_breakers.get(name) {
                    policy.circuit_breaker = Some(breaker.clone());
                }
            }
        }

        policy
    }

    /// Builds an executor for `target`, bound to `ctx`.
    pub fn executor(&self, ctx: Context, target: &str) -> Executor {
        Executor::new(ctx, self.policy(target))
    }

    /// Returns the named circuit breaker, if defined.
    ///
    /// Useful for observing breaker state and counters out of band.
    pub fn circuit_breaker(&self, name: &str) -> Option<&Arc<CircuitBreaker>> {
        self.circuit_breakers.get(name)
    }

    /// Returns the named resolved timeout, if defined.
    pub fn timeout(&self, name: &str) -> Option<Duration> {
        self.timeouts.get(name).copied()
    }

    /// Returns the named retry template, if defined.
    pub fn retry(&self, name: &str) -> Option<&RetryPolicy> {
        self.retries.get(name)
    }
}
