//! Segment index tracking.
//!
//! Segments are named by their decimal index with no padding, sign or
//! extension. Anything else in the directory is ignored.

use conlog_storage::{SegmentDirectory, StorageResult};

/// Returns the directory entry name for a segment index.
#[must_use]
pub fn segment_name(index: u64) -> String {
    index.to_string()
}

/// Parses a directory entry name as a segment index.
///
/// Only the canonical form produced by [`segment_name`] is accepted, so
/// `"05"`, `"+5"` and `"5.log"` are not segments.
#[must_use]
pub fn parse_segment_name(name: &str) -> Option<u64> {
    let index: u64 = name.parse().ok()?;
    (segment_name(index) == name).then_some(index)
}

/// Lowest and highest segment indices present in a directory.
///
/// Both are `None` until the first [`refresh`](Self::refresh). After a scan
/// of a directory with no segments, `newest` is `Some(0)` (the index the
/// first segment will get) and `oldest` stays `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmentIndexTracker {
    oldest: Option<u64>,
    newest: Option<u64>,
}

impl SegmentIndexTracker {
    /// Creates a tracker that has not scanned yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rescans `dir` and recomputes the extremes.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be listed. The previous
    /// values are kept in that case.
    pub fn refresh(&mut self, dir: &dyn SegmentDirectory) -> StorageResult<()> {
        let mut oldest = None;
        let mut newest = None;

        for index in dir.list()?.iter().filter_map(|n| parse_segment_name(n)) {
            oldest = Some(oldest.map_or(index, |o: u64| o.min(index)));
            newest = Some(newest.map_or(index, |n: u64| n.max(index)));
        }

        self.oldest = oldest;
        self.newest = Some(newest.unwrap_or(0));
        Ok(())
    }

    /// Returns the lowest existing index, if any.
    #[must_use]
    pub fn oldest(&self) -> Option<u64> {
        self.oldest
    }

    /// Returns the highest existing index, `Some(0)` for an empty directory,
    /// or `None` before the first scan.
    #[must_use]
    pub fn newest(&self) -> Option<u64> {
        self.newest
    }

    /// Returns true once a scan has completed.
    #[must_use]
    pub fn is_scanned(&self) -> bool {
        self.newest.is_some()
    }
}
