//! Error types for the faultguard library.
//!
//! This module provides structured, typed errors for every failure scenario.
//! The library never panics; all errors are returned as `Result` values, and
//! a panic inside a guarded operation is converted into [`FaultError::Aborted`]
//! by the timeout guard rather than propagated.

use std::time::Duration;
use thiserror::Error;

/// A boxed error suitable for crossing the operation boundary.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The main error type for guarded operations.
///
/// All error variants include context about what failed and why. The
/// [`is_permanent`](FaultError::is_permanent) predicate drives the retry
/// loop: permanent errors stop it immediately, everything else is retried.
#[derive(Debug, Error)]
pub enum FaultError {
    /// The circuit breaker is open; the operation was not invoked.
    #[error("circuit breaker '{name}' is open")]
    CircuitOpen {
        /// Name of the breaker that rejected the call.
        name: String,
    },

    /// The circuit breaker is half-open and its probe limit is reached;
    /// the operation was not invoked.
    #[error("circuit breaker '{name}' rejected the call: too many requests while half-open")]
    TooManyRequests {
        /// Name of the breaker that rejected the call.
        name: String,
    },

    /// The operation exceeded its per-attempt time budget.
    #[error("operation exceeded its time budget of {budget:?}")]
    DeadlineExceeded {
        /// The time budget that was exceeded.
        budget: Duration,
    },

    /// The ambient context was cancelled while a guard layer was waiting.
    #[error("operation was cancelled")]
    Cancelled,

    /// The operation aborted abnormally (panicked) instead of returning
    /// an error.
    #[error("operation aborted abnormally: {reason}")]
    Aborted {
        /// Description of the abnormal termination.
        reason: String,
    },

    /// A textual duration could not be parsed.
    #[error("invalid duration '{value}': {reason}")]
    InvalidDuration {
        /// The text that failed to parse.
        value: String,
        /// Why it failed to parse.
        reason: String,
    },

    /// A policy or registry could not be constructed.
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of the configuration problem.
        message: String,
    },

    /// A failure produced by the wrapped operation itself.
    #[error("operation failed: {source}")]
    Operation {
        /// The caller-supplied cause.
        #[source]
        source: BoxError,
    },

    /// A failure explicitly marked as non-retryable by the caller.
    ///
    /// Wrapping any error in this variant stops an enclosing retry loop
    /// immediately, the same way a breaker rejection does.
    #[error("{source}")]
    Permanent {
        /// The underlying failure.
        #[source]
        source: Box<FaultError>,
    },
}

impl FaultError {
    /// Returns `true` if this error must stop a retry loop immediately.
    ///
    /// Breaker rejections are permanent so that a retry loop does not keep
    /// hammering an already-open breaker; callers can mark their own errors
    /// permanent with [`FaultError::permanent`].
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            Self::CircuitOpen { .. } | Self::TooManyRequests { .. } | Self::Permanent { .. }
        )
    }

    /// Returns `true` if this error may be retried.
    pub fn is_retryable(&self) -> bool {
        !self.is_permanent()
    }

    /// Returns `true` if this error was raised without invoking the
    /// operation (a breaker fail-fast rejection).
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::CircuitOpen { .. } | Self::TooManyRequests { .. })
    }

    /// Returns the breaker name if this error came from a circuit breaker.
    pub fn circuit(&self) -> Option<&str> {
        match self {
            Self::CircuitOpen { name } | Self::TooManyRequests { name } => Some(name),
            Self::Permanent { source } => source.circuit(),
            _ => None,
        }
    }

    /// Creates a `CircuitOpen` error.
    pub fn circuit_open(name: impl Into<String>) -> Self {
        Self::CircuitOpen { name: name.into() }
    }

    /// Creates a `TooManyRequests` error.
    pub fn too_many_requests(name: impl Into<String>) -> Self {
        Self::TooManyRequests { name: name.into() }
    }

    /// Creates a `DeadlineExceeded` error.
    pub fn deadline_exceeded(budget: Duration) -> Self {
        Self::DeadlineExceeded { budget }
    }

    /// Creates an `Aborted` error.
    pub fn aborted(reason: impl Into<String>) -> Self {
        Self::Aborted {
            reason: reason.into(),
        }
    }

    /// Creates an `InvalidDuration` error.
    pub fn invalid_duration(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDuration {
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Creates a `Configuration` error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates an `Operation` error from any caller-supplied cause.
    pub fn operation<E>(source: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::Operation {
            source: source.into(),
        }
    }

    /// Marks an error as permanent, stopping any enclosing retry loop.
    pub fn permanent(source: FaultError) -> Self {
        Self::Permanent {
            source: Box::new(source),
        }
    }
}

/// A specialized `Result` type for guarded operations.
pub type FaultResult<T> = Result<T, FaultError>;
