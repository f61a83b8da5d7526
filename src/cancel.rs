//! Cooperative cancellation for analysis passes.
//!
//! All long-running walks (symbol scans, attribute expansion, nested
//! invocation walks) check the token at loop heads and recursion entry
//! points and return [`Cancelled`] instead of a partial result.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;

/// Signal that an analysis pass was cancelled by the host.
///
/// This is deliberately a distinct type rather than a variant of a broader
/// error enum: cancellation is a control-flow signal, not a domain error,
/// and callers must be able to tell the two apart without inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("analysis was cancelled")]
pub struct Cancelled;

/// Shared flag polled cooperatively by analysis code.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token that has not been cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. All clones of this token observe the signal.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Check the token, returning `Err(Cancelled)` if cancellation was
    /// requested. Intended for use with `?` at loop heads.
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}
