//! Core types for the faultguard library.
//!
//! This module provides the fundamental building blocks used throughout
//! the library:
//!
//! - [`error`] - Structured error types and the permanence predicate
//! - [`duration`] - Textual duration resolution
//! - [`context`] - The cancellable execution context handed to operations

pub mod context;
pub mod duration;
pub mod error;

// Re-export commonly used types at the core level
pub use context::Context;
pub use duration::parse_duration;
pub use error::{BoxError, FaultError, FaultResult};
