//! Error types for the bridge.

use conlog_stream::StreamError;
use thiserror::Error;

/// Result type for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Errors that can occur when setting up the bridge.
///
/// Once running, the bridge has no error states: a full pool rejects peers
/// and a congested peer misses data, both reported through `tracing`.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Stream or socket error.
    #[error("stream error: {0}")]
    Stream(#[from] StreamError),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
