//! Segment handle and segment directory traits.

use crate::error::StorageResult;

/// An open log segment.
///
/// Backends are **opaque byte stores**. They append, flush and report their
/// size; the rotation engine owns all interpretation of the bytes (payload
/// versus timestamp markers).
///
/// # Invariants
///
/// - `write` appends at the end and returns how many bytes were accepted,
///   which may be fewer than requested when the medium fills up
/// - `flush` pushes accepted bytes towards durable storage
/// - `close` makes everything accepted so far durable and releases the handle
///
/// # Implementors
///
/// - [`super::InMemoryBackend`] - For testing
/// - [`super::FileBackend`] - For persistent storage
pub trait StorageBackend: Send {
    /// Returns the segment name inside its directory.
    fn name(&self) -> &str;

    /// Reads `len` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error if the range extends beyond the current size or an
    /// I/O error occurs.
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>>;

    /// Appends `data` and returns the number of bytes accepted.
    ///
    /// A short count is not an error: it means the medium accepted only a
    /// prefix of `data`.
    ///
    /// # Errors
    ///
    /// Returns an error only when nothing could be written.
    fn write(&mut self, data: &[u8]) -> StorageResult<usize>;

    /// Pushes accepted writes out of any user-space buffer.
    ///
    /// This is not a durability point. Bytes only survive a power cut after
    /// [`sync`](Self::sync) or [`close`](Self::close).
    ///
    /// # Errors
    ///
    /// Returns an error if the flush operation fails.
    fn flush(&mut self) -> StorageResult<()>;

    /// Returns the current size of the segment in bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be determined.
    fn size(&self) -> StorageResult<u64>;

    /// Syncs data and metadata to durable storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync operation fails.
    fn sync(&mut self) -> StorageResult<()>;

    /// Syncs and releases the handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the final sync fails. The handle is released
    /// either way.
    fn close(mut self: Box<Self>) -> StorageResult<()> {
        self.sync()
    }
}

/// Space accounting for the medium holding a segment directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpaceInfo {
    /// Total capacity in bytes.
    pub total_bytes: u64,
    /// Bytes currently in use (by segments and anything else on the medium).
    pub used_bytes: u64,
}

impl SpaceInfo {
    /// Returns the free space in bytes.
    #[must_use]
    pub fn free_bytes(&self) -> u64 {
        self.total_bytes.saturating_sub(self.used_bytes)
    }
}

/// A flat namespace of segments plus free-space accounting.
///
/// Segment names are opaque to the directory. The rotation engine names
/// segments by their decimal index.
pub trait SegmentDirectory: Send {
    /// Lists the names of all entries in the directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read.
    fn list(&self) -> StorageResult<Vec<String>>;

    /// Returns true if a segment with this name exists.
    ///
    /// # Errors
    ///
    /// Returns an error if existence cannot be determined.
    fn exists(&self, name: &str) -> StorageResult<bool>;

    /// Returns the size of a segment in bytes.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StorageError::NotFound`] if the segment does not
    /// exist, or an I/O error.
    fn segment_size(&self, name: &str) -> StorageResult<u64>;

    /// Reads the whole durable content of a segment.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StorageError::NotFound`] if the segment does not
    /// exist, or an I/O error.
    fn read_segment(&self, name: &str) -> StorageResult<Vec<u8>>;

    /// Creates (or truncates) a segment and opens it for writing.
    ///
    /// # Errors
    ///
    /// Returns an error if the segment cannot be created.
    fn create(&mut self, name: &str) -> StorageResult<Box<dyn StorageBackend>>;

    /// Opens a segment for appending, creating it if missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the segment cannot be opened.
    fn open_append(&mut self, name: &str) -> StorageResult<Box<dyn StorageBackend>>;

    /// Removes a segment.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StorageError::NotFound`] if the segment does not
    /// exist, or an I/O error.
    fn remove(&mut self, name: &str) -> StorageResult<()>;

    /// Reports capacity and usage of the underlying medium.
    ///
    /// # Errors
    ///
    /// Returns an error if the medium cannot be queried.
    fn space(&self) -> StorageResult<SpaceInfo>;

    /// Returns a human-readable location for `name`, used in log messages.
    fn display_path(&self, name: &str) -> String;
}
