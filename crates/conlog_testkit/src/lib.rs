//! # conlog testkit
//!
//! Test utilities for conlog.
//!
//! This crate provides:
//! - Mock peers and a mock listener for the bridge
//! - Log directory fixtures and engines with a fixed clock
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust
//! use conlog_testkit::prelude::*;
//!
//! let listener = MockListener::new();
//! let peer = MockPeer::new("telnet");
//! listener.connect(peer.clone());
//! assert_eq!(listener.pending(), 1);
//! ```

pub mod fixtures;
pub mod generators;
pub mod peers;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::peers::*;
}

pub use fixtures::*;
pub use generators::*;
pub use peers::*;
