//! In-memory segments and segment directory for testing.

use crate::backend::{SegmentDirectory, SpaceInfo, StorageBackend};
use crate::error::{StorageError, StorageResult};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

type SharedBytes = Arc<RwLock<Vec<u8>>>;

/// An in-memory segment.
///
/// Writes are buffered in the handle until `sync` or `close`, which makes
/// the difference between accepted and durable bytes observable in tests.
/// `flush` commits nothing, the same as `File::flush` on an unbuffered file.
/// Dropping a handle without closing it discards unsynced bytes, like a
/// power cut would.
#[derive(Debug)]
pub struct InMemoryBackend {
    name: String,
    durable: SharedBytes,
    pending: Vec<u8>,
    write_limit: Option<usize>,
}

impl InMemoryBackend {
    /// Creates a standalone, empty in-memory segment.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::attached(name.into(), Arc::new(RwLock::new(Vec::new())), None)
    }

    fn attached(name: String, durable: SharedBytes, write_limit: Option<usize>) -> Self {
        Self {
            name,
            durable,
            pending: Vec::new(),
            write_limit,
        }
    }

    /// Returns a copy of the bytes made durable so far.
    #[must_use]
    pub fn durable_data(&self) -> Vec<u8> {
        self.durable.read().clone()
    }

    /// Returns the number of accepted but not yet synced bytes.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

impl StorageBackend for InMemoryBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        let durable = self.durable.read();
        let size = (durable.len() + self.pending.len()) as u64;
        let end = offset.saturating_add(len as u64);

        if offset > size || end > size {
            return Err(StorageError::ReadPastEnd { offset, len, size });
        }

        let mut all = Vec::with_capacity(size as usize);
        all.extend_from_slice(&durable);
        all.extend_from_slice(&self.pending);
        Ok(all[offset as usize..end as usize].to_vec())
    }

    fn write(&mut self, data: &[u8]) -> StorageResult<usize> {
        let accepted = self.write_limit.map_or(data.len(), |limit| limit.min(data.len()));
        if accepted == 0 && !data.is_empty() {
            return Err(StorageError::unavailable("medium accepted no bytes"));
        }
        self.pending.extend_from_slice(&data[..accepted]);
        Ok(accepted)
    }

    fn flush(&mut self) -> StorageResult<()> {
        Ok(())
    }

    fn size(&self) -> StorageResult<u64> {
        Ok((self.durable.read().len() + self.pending.len()) as u64)
    }

    fn sync(&mut self) -> StorageResult<()> {
        if !self.pending.is_empty() {
            self.durable.write().append(&mut self.pending);
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct DirectoryState {
    files: BTreeMap<String, SharedBytes>,
    capacity: u64,
    foreign_bytes: u64,
    fail_create: bool,
    fail_open: bool,
    write_limit: Option<usize>,
}

/// An in-memory segment directory.
///
/// Clones share the same state, so a test can keep one clone for
/// inspection and fault injection while the engine owns another.
///
/// # Example
///
/// ```rust
/// use conlog_storage::{InMemoryDirectory, SegmentDirectory, StorageBackend};
///
/// let mut dir = InMemoryDirectory::with_capacity(1024);
/// let mut segment = dir.create("0").unwrap();
/// segment.write(b"boot").unwrap();
/// segment.close().unwrap();
/// assert_eq!(dir.contents("0").unwrap(), b"boot");
/// assert_eq!(dir.space().unwrap().free_bytes(), 1020);
/// ```
#[derive(Debug, Clone)]
pub struct InMemoryDirectory {
    state: Arc<RwLock<DirectoryState>>,
}

impl Default for InMemoryDirectory {
    fn default() -> Self {
        Self::with_capacity(u64::MAX / 2)
    }
}

impl InMemoryDirectory {
    /// Creates an empty directory with practically unlimited capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty directory on a medium of `capacity` bytes.
    #[must_use]
    pub fn with_capacity(capacity: u64) -> Self {
        Self {
            state: Arc::new(RwLock::new(DirectoryState {
                capacity,
                ..DirectoryState::default()
            })),
        }
    }

    /// Inserts (or replaces) a segment with durable content.
    pub fn insert(&self, name: impl Into<String>, data: impl Into<Vec<u8>>) {
        self.state
            .write()
            .files
            .insert(name.into(), Arc::new(RwLock::new(data.into())));
    }

    /// Returns the durable content of a segment.
    #[must_use]
    pub fn contents(&self, name: &str) -> Option<Vec<u8>> {
        self.state.read().files.get(name).map(|f| f.read().clone())
    }

    /// Returns the sorted names of all segments.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.state.read().files.keys().cloned().collect()
    }

    /// Changes the medium capacity.
    pub fn set_capacity(&self, capacity: u64) {
        self.state.write().capacity = capacity;
    }

    /// Accounts `bytes` of the medium as used by something other than
    /// segments.
    pub fn set_foreign_bytes(&self, bytes: u64) {
        self.state.write().foreign_bytes = bytes;
    }

    /// Makes every subsequent `create` fail.
    pub fn set_fail_create(&self, fail: bool) {
        self.state.write().fail_create = fail;
    }

    /// Makes every subsequent `open_append` fail.
    pub fn set_fail_open(&self, fail: bool) {
        self.state.write().fail_open = fail;
    }

    /// Caps how many bytes a single write accepts on handles opened from
    /// now on.
    pub fn set_write_limit(&self, limit: Option<usize>) {
        self.state.write().write_limit = limit;
    }

    fn handle(&self, name: &str, truncate: bool) -> Box<dyn StorageBackend> {
        let mut state = self.state.write();
        let write_limit = state.write_limit;
        let file = state
            .files
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(RwLock::new(Vec::new())))
            .clone();
        if truncate {
            file.write().clear();
        }
        Box::new(InMemoryBackend::attached(
            name.to_string(),
            file,
            write_limit,
        ))
    }
}

impl SegmentDirectory for InMemoryDirectory {
    fn list(&self) -> StorageResult<Vec<String>> {
        Ok(self.names())
    }

    fn exists(&self, name: &str) -> StorageResult<bool> {
        Ok(self.state.read().files.contains_key(name))
    }

    fn segment_size(&self, name: &str) -> StorageResult<u64> {
        self.state
            .read()
            .files
            .get(name)
            .map(|f| f.read().len() as u64)
            .ok_or_else(|| StorageError::NotFound(name.to_string()))
    }

    fn read_segment(&self, name: &str) -> StorageResult<Vec<u8>> {
        self.contents(name)
            .ok_or_else(|| StorageError::NotFound(name.to_string()))
    }

    fn create(&mut self, name: &str) -> StorageResult<Box<dyn StorageBackend>> {
        if self.state.read().fail_create {
            return Err(StorageError::unavailable(format!("cannot create {name}")));
        }
        Ok(self.handle(name, true))
    }

    fn open_append(&mut self, name: &str) -> StorageResult<Box<dyn StorageBackend>> {
        if self.state.read().fail_open {
            return Err(StorageError::unavailable(format!("cannot open {name}")));
        }
        Ok(self.handle(name, false))
    }

    fn remove(&mut self, name: &str) -> StorageResult<()> {
        self.state
            .write()
            .files
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(name.to_string()))
    }

    fn space(&self) -> StorageResult<SpaceInfo> {
        let state = self.state.read();
        let segment_bytes: u64 = state.files.values().map(|f| f.read().len() as u64).sum();
        Ok(SpaceInfo {
            total_bytes: state.capacity,
            used_bytes: segment_bytes + state.foreign_bytes,
        })
    }

    fn display_path(&self, name: &str) -> String {
        format!("mem:/{name}")
    }
}
