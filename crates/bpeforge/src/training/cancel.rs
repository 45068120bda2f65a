//! # Cooperative Cancellation

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use crate::errors::{BFResult, BpeForgeError};

/// A shared cancellation flag.
///
/// Training checks the flag between chunks while pre-tokenizing,
/// and before every merge step.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    cancelled: Arc<AtomicBool>,
}

impl CancelFlag {
    /// Create a new, un-cancelled flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; visible to every clone of this flag.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Has cancellation been requested?
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Return [`BpeForgeError::Cancelled`] if cancellation has been requested.
    pub fn check(&self) -> BFResult<()> {
        if self.is_cancelled() {
            Err(BpeForgeError::Cancelled)
        } else {
            Ok(())
        }
    }
}
