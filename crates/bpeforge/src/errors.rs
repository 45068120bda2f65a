//! # Error Types

use crate::regex::ErrorWrapper;

/// Errors from bpeforge operations.
#[derive(Debug, thiserror::Error)]
pub enum BpeForgeError {
    /// The training configuration is unusable.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Vocab size exceeds the capacity of the target token type.
    #[error("vocab size ({size}) exceeds token type capacity")]
    VocabSizeOverflow {
        /// The vocab size that exceeded the capacity.
        size: usize,
    },

    /// Vocabulary data is inconsistent.
    #[error("{0}")]
    VocabConflict(String),

    /// A regex pattern failed to compile or to match.
    #[error("regex error: {0}")]
    Regex(#[from] ErrorWrapper),

    /// I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Parse error (base64, integer, etc.)
    #[error("parse error: {0}")]
    Parse(String),

    /// The worker pool could not be built.
    #[error("thread pool error: {0}")]
    ThreadPool(String),

    /// Training observed a cancellation request.
    #[error("training cancelled")]
    Cancelled,
}

/// Result type for bpeforge operations.
pub type BFResult<T> = core::result::Result<T, BpeForgeError>;
