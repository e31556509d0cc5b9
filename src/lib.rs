//! # Faultguard
//!
//! Composable fault-tolerance policies for async operations: a bounded
//! execution time, automatic re-invocation on failure, and fail-fast
//! protection against a persistently failing dependency — without the
//! operation itself knowing about any of it.
//!
//! ## Overview
//!
//! Faultguard wraps an arbitrary async unit of work (an *operation*) with
//! zero or more guards, composed in a fixed, well-defined order:
//!
//! - **Timeout**: bounds each attempt's execution time, racing the
//!   operation on its own task against a deadline.
//! - **Circuit breaker**: a shared closed/open/half-open state machine that
//!   rejects calls outright while a dependency looks unhealthy.
//! - **Retry**: re-invokes the guarded operation on failure with a fixed
//!   delay, stopping early on permanent errors and cancellation.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use faultguard::{Context, Executor, Policy, RetryPolicy};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let policy = Policy::new()
//!         .with_timeout(Duration::from_secs(2))
//!         .with_retry(RetryPolicy::new(Duration::from_millis(100), 3));
//!
//!     let executor = Executor::new(Context::new(), policy);
//!
//!     let balance = executor
//!         .execute(|ctx| async move { fetch_balance(ctx).await })
//!         .await?;
//!
//!     println!("balance: {balance}");
//!     Ok(())
//! }
//! ```
//!
//! Policies can also be named in configuration and resolved once at
//! startup through [`PolicyRegistry`]; see the [`registry`] module.
//!
//! ## Architecture
//!
//! The library is organized into several layers:
//!
//! - **Core**: errors, the cancellable [`Context`], duration resolution
//! - **Retry**: fixed-delay retry templates and per-invocation backoff
//! - **Circuit Breaker**: the shared three-state machine
//! - **Timeout**: per-attempt deadline enforcement
//! - **Executor**: policy composition into a single callable
//! - **Registry**: named definitions resolved into ready-to-use policies

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod circuit_breaker;
pub mod core;
pub mod executor;
pub mod registry;
pub mod retry;
pub mod timeout;

// Re-export commonly used types at the crate root
pub use crate::core::{parse_duration, BoxError, Context, FaultError, FaultResult};

pub use crate::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState, Counts};
pub use crate::executor::{Executor, Policy};
pub use crate::registry::{
    CircuitBreakerDefinition, PolicyRegistry, ResilienceConfig, RetryDefinition, TargetDefinition,
};
pub use crate::retry::{Backoff, BackoffStop, RetryPolicy};

/// Prelude module for convenient imports.
///
/// ```rust
/// use faultguard::prelude::*;
/// ```
pub mod prelude {
    pub use crate::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState, Counts};
    pub use crate::core::{parse_duration, BoxError, Context, FaultError, FaultResult};
    pub use crate::executor::{Executor, Policy};
    pub use crate::registry::{PolicyRegistry, ResilienceConfig};
    pub use crate::retry::{Backoff, BackoffStop, RetryPolicy};
}
