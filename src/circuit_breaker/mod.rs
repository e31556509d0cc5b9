//! Circuit breaker: fail-fast protection against a persistently failing
//! dependency.
//!
//! The circuit breaker pattern prevents cascading failures by temporarily
//! rejecting calls to an unhealthy dependency and periodically probing it
//! to detect recovery.
//!
//! ## States
//!
//! - **Closed**: Normal operation; calls pass through and failures are
//!   counted.
//! - **Open**: The dependency is failing; calls are rejected immediately.
//! - **Half-Open**: Probing the dependency to see if it has recovered.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use faultguard::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
//! use std::time::Duration;
//!
//! let config = CircuitBreakerConfig::default()
//!     .with_failure_threshold(5)
//!     .with_open_duration(Duration::from_secs(30));
//!
//! let breaker = CircuitBreaker::new("upstream", config);
//! ```

mod breaker;
mod config;
mod state;

pub use breaker::CircuitBreaker;
pub use config::CircuitBreakerConfig;
pub use state::{CircuitState, Counts};
