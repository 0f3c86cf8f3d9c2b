//! Segment directory statistics.

use crate::index::parse_segment_name;
use conlog_storage::{SegmentDirectory, StorageResult};
use serde::Serialize;

/// Summary of the segments in a directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LogStats {
    /// Number of segments.
    pub segment_count: usize,
    /// Sum of segment sizes in bytes.
    pub total_bytes: u64,
    /// Lowest segment index.
    pub oldest: Option<u64>,
    /// Highest segment index.
    pub newest: Option<u64>,
    /// Free space on the medium in bytes.
    pub free_bytes: u64,
    /// Total capacity of the medium in bytes.
    pub capacity_bytes: u64,
    /// Segment index and size, in index order.
    pub segments: Vec<(u64, u64)>,
}

impl LogStats {
    /// Scans `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be listed or queried.
    pub fn collect(dir: &dyn SegmentDirectory) -> StorageResult<Self> {
        let mut segments = Vec::new();
        for name in dir.list()? {
            if let Some(index) = parse_segment_name(&name) {
                segments.push((index, dir.segment_size(&name)?));
            }
        }
        segments.sort_unstable();

        let space = dir.space()?;
        Ok(Self {
            segment_count: segments.len(),
            total_bytes: segments.iter().map(|(_, size)| size).sum(),
            oldest: segments.first().map(|(index, _)| *index),
            newest: segments.last().map(|(index, _)| *index),
            free_bytes: space.free_bytes(),
            capacity_bytes: space.total_bytes,
            segments,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conlog_storage::InMemoryDirectory;

    #[test]
    fn empty_directory() {
        let dir = InMemoryDirectory::with_capacity(1000);
        let stats = LogStats::collect(&dir).unwrap();
        assert_eq!(stats.segment_count, 0);
        assert_eq!(stats.oldest, None);
        assert_eq!(stats.newest, None);
        assert_eq!(stats.free_bytes, 1000);
    }

    #[test]
    fn counts_only_segments() {
        let dir = InMemoryDirectory::with_capacity(1000);
        dir.insert("10", vec![0; 30]);
        dir.insert("2", vec![0; 20]);
        dir.insert("readme", vec![0; 100]);

        let stats = LogStats::collect(&dir).unwrap();
        assert_eq!(stats.segment_count, 2);
        assert_eq!(stats.total_bytes, 50);
        assert_eq!(stats.oldest, Some(2));
        assert_eq!(stats.newest, Some(10));
        assert_eq!(stats.segments, vec![(2, 20), (10, 30)]);
        assert_eq!(stats.free_bytes, 850);
        assert_eq!(stats.capacity_bytes, 1000);
    }
}
