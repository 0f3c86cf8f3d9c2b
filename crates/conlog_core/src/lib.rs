//! # conlog_core
//!
//! Rotating persistent console log.
//!
//! Captured bytes go to one open segment in a [`SegmentDirectory`]. Segments
//! are named by a monotonically increasing decimal index. A rotation check,
//! run at start and on a periodic timer, keeps the log within its budget:
//!
//! 1. **Space reclamation**: below the free-space floor the oldest segment is
//!    deleted, unless it is the open one.
//! 2. **Size rotation**: an oversized open segment is closed and
//!    `newest + 1` opened.
//! 3. **Idle flush**: otherwise, pending bytes are committed behind a fresh
//!    timestamp marker.
//!
//! The driver owns the [`RotationEngine`] and calls it from one context:
//! [`ConsoleCapture::pump`] on every poll and
//! [`RotationEngine::poll_timer`] whenever the renewal deadline passes.
//!
//! [`SegmentDirectory`]: conlog_storage::SegmentDirectory

mod capture;
mod config;
mod engine;
mod error;
mod index;
mod marker;
mod stats;
mod timer;

pub use capture::ConsoleCapture;
pub use config::{
    validate_renew_interval, RotationConfig, DEFAULT_MAX_SEGMENT_SIZE, DEFAULT_RENEW_INTERVAL,
    DEFAULT_RESERVE_FREE_BYTES, MAX_RENEW_INTERVAL,
};
pub use engine::{RotationEngine, RotationReport};
pub use error::{CoreError, CoreResult};
pub use index::{parse_segment_name, segment_name, SegmentIndexTracker};
pub use marker::{
    local_now, parse_marker, split_markers, strip_markers, timestamp_marker, Chunk,
    SegmentReader, MARKER_LEN, MARKER_PREFIX, MARKER_SUFFIX, TIMESTAMP_FORMAT,
};
pub use stats::LogStats;
pub use timer::RenewalTimer;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
