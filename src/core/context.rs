//! The ambient execution context handed to operations.
//!
//! A [`Context`] carries a cooperative cancellation signal from the caller
//! down through every guard layer and into the operation itself. Guards stop
//! waiting the moment the signal fires; the operation is expected to observe
//! it cooperatively — nothing is forcibly terminated.

use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// A cancellable execution context.
///
/// Contexts form a tree: cancelling a parent cancels all of its children,
/// while cancelling a child leaves the parent untouched. Cloning a context
/// shares the same cancellation state.
#[derive(Debug, Clone, Default)]
pub struct Context {
    token: CancellationToken,
}

impl Context {
    /// Creates a new root context that is never cancelled unless
    /// [`cancel`](Context::cancel) is called.
    pub fn new() -> Self {
        Self::default()
    }

    /// Signals cancellation to this context and all contexts derived from it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Returns `true` if this context has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once this context is cancelled.
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }

    /// Derives a child context.
    ///
    /// The child is cancelled when the parent is; cancelling the child does
    /// not affect the parent.
    pub fn child(&self) -> Context {
        Context {
            token: self.token.child_token(),
        }
    }

    /// Derives a child context that is cancelled automatically once `budget`
    /// elapses (or when the parent is cancelled, whichever happens first).
    pub fn with_timeout(&self, budget: Duration) -> Context {
        let child = self.child();
        let token = child.token.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(budget) => token.cancel(),
                _ = token.cancelled() => {}
            }
        });
        child
    }
}
