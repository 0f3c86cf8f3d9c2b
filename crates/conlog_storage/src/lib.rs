//! # conlog storage
//!
//! Storage collaborators for the conlog rotating segment log.
//!
//! This crate provides the lowest-level storage abstraction. Segments are
//! **opaque byte stores** and directories are flat namespaces with
//! free-space accounting; neither knows about segment numbering or
//! timestamp markers.
//!
//! ## Design Principles
//!
//! - Segments append, flush and report their size
//! - A short write is a count, not an error
//! - Directories list, create, open, remove and report free space
//! - The rotation engine owns all naming and format interpretation
//!
//! ## Available Implementations
//!
//! - [`InMemoryDirectory`] / [`InMemoryBackend`] - For testing, with fault
//!   injection and an explicit durable/pending split
//! - [`FileDirectory`] / [`FileBackend`] - For persistent storage using OS
//!   file APIs
//!
//! ## Example
//!
//! ```rust
//! use conlog_storage::{InMemoryDirectory, SegmentDirectory, StorageBackend};
//!
//! let mut dir = InMemoryDirectory::new();
//! let mut segment = dir.open_append("0").unwrap();
//! assert_eq!(segment.write(b"hello world").unwrap(), 11);
//! segment.sync().unwrap();
//! assert_eq!(dir.contents("0").unwrap(), b"hello world");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::{SegmentDirectory, SpaceInfo, StorageBackend};
pub use error::{StorageError, StorageResult};
pub use file::{FileBackend, FileDirectory};
pub use memory::{InMemoryBackend, InMemoryDirectory};
