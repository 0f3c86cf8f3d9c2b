//! Log directory fixtures and engine helpers.

use chrono::{NaiveDate, NaiveDateTime};
use conlog_core::{RotationConfig, RotationEngine};
use conlog_storage::{FileDirectory, InMemoryDirectory};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

/// Renewal interval used by the fixtures.
pub const TEST_RENEW_INTERVAL: Duration = Duration::from_secs(600);

/// The time every fixture clock reports.
pub fn fixed_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 2)
        .and_then(|d| d.and_hms_opt(3, 4, 5))
        .unwrap_or_default()
}

/// Creates a stopped engine over a clone of `dir` with a fixed clock.
pub fn memory_engine(dir: &InMemoryDirectory, config: RotationConfig) -> RotationEngine {
    RotationEngine::new(Box::new(dir.clone()), config).with_clock(fixed_time)
}

/// Creates an engine over a clone of `dir` and starts it.
pub fn started_engine(dir: &InMemoryDirectory, config: RotationConfig) -> RotationEngine {
    let mut engine = memory_engine(dir, config);
    engine
        .start(TEST_RENEW_INTERVAL)
        .expect("Failed to start engine");
    engine
}

/// Creates an in-memory directory on a medium of `capacity` bytes holding
/// segments of the given index and size, filled with `b'.'`.
pub fn prefilled_directory(capacity: u64, segments: &[(u64, usize)]) -> InMemoryDirectory {
    let dir = InMemoryDirectory::with_capacity(capacity);
    for &(index, size) in segments {
        dir.insert(index.to_string(), vec![b'.'; size]);
    }
    dir
}

/// A segment directory in a temporary directory, removed on drop.
pub struct TestLogDir {
    dir: FileDirectory,
    _temp_dir: TempDir,
}

impl TestLogDir {
    /// Creates an empty log directory.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = FileDirectory::open(&temp_dir.path().join("log"))
            .expect("Failed to open log directory");
        Self {
            dir,
            _temp_dir: temp_dir,
        }
    }

    /// Returns the log directory path.
    pub fn path(&self) -> &Path {
        self.dir.root()
    }

    /// Returns a handle on the directory.
    pub fn directory(&self) -> FileDirectory {
        self.dir.clone()
    }

    /// Creates a stopped engine over this directory with a fixed clock.
    pub fn engine(&self, config: RotationConfig) -> RotationEngine {
        RotationEngine::new(Box::new(self.directory()), config).with_clock(fixed_time)
    }
}

impl Default for TestLogDir {
    fn default() -> Self {
        Self::new()
    }
}
