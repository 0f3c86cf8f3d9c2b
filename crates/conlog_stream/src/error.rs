//! Error types for stream adapters.

use std::io;
use thiserror::Error;

/// Result type for stream operations.
pub type StreamResult<T> = Result<T, StreamError>;

/// Errors that can occur while opening or binding a stream.
#[derive(Debug, Error)]
pub enum StreamError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A device could not be opened.
    #[error("cannot open device {path}: {source}")]
    Device {
        /// Device path.
        path: String,
        /// Underlying error.
        source: io::Error,
    },

    /// A listening socket could not be bound.
    #[error("cannot bind {addr}: {source}")]
    Bind {
        /// Requested address.
        addr: String,
        /// Underlying error.
        source: io::Error,
    },
}
