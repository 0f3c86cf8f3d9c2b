//! # conlog stream
//!
//! Byte-stream collaborators for the console capture loop and the serial
//! bridge.
//!
//! The capture and bridge pumps never block: they ask a stream how much can
//! move right now and move at most that. This crate defines that view
//! ([`ByteSource`], [`ByteSink`], [`PeerConnection`], [`PeerListener`]) and
//! provides adapters that present real devices through it:
//!
//! - [`Fifo`] - bounded byte queue shared with an I/O task
//! - [`StreamPort`] - any tokio reader/writer pair behind two FIFOs
//! - [`open_device`], [`open_source`], [`stdin_source`] - serial lines,
//!   console devices and standard input
//! - [`TcpPeerListener`] / [`TcpPeer`] - network peers
//! - [`MemoryPort`] - caller-driven port for tests and loopback wiring
//!
//! ## Execution model
//!
//! The adapters spawn tasks on the ambient tokio runtime. Run them on a
//! `current_thread` runtime to keep the single-execution-context model: the
//! I/O tasks and the poll loop then interleave only at `.await` points.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod device;
mod error;
mod fifo;
mod net;
mod port;
mod traits;

pub use device::{open_device, open_source, stdin_source};
pub use error::{StreamError, StreamResult};
pub use fifo::Fifo;
pub use net::{TcpPeer, TcpPeerListener, TcpPeerOptions};
pub use port::{MemoryPort, StreamPort, DEFAULT_RX_BUFFER, DEFAULT_TX_BUFFER};
pub use traits::{ByteSink, ByteSource, DuplexStream, PeerConnection, PeerListener};
