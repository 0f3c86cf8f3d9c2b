//! Error types for the rotating log.

use conlog_storage::StorageError;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in the rotating log.
///
/// Only failures that leave the log without an open segment are errors.
/// Short writes, refused deletions and failed rotations are reported through
/// `tracing` and the returned counts or [`crate::RotationReport`].
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The segment to write to could not be created or opened.
    #[error("segment {path} unavailable: {source}")]
    SegmentUnavailable {
        /// Display path of the segment.
        path: String,
        /// Underlying storage error.
        source: StorageError,
    },

    /// A configuration value is out of range.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the problem.
        message: String,
    },
}

impl CoreError {
    /// Creates a segment unavailable error.
    pub fn segment_unavailable(path: impl Into<String>, source: StorageError) -> Self {
        Self::SegmentUnavailable {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}
