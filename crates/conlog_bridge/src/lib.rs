//! # conlog_bridge
//!
//! Serial line to network bridge.
//!
//! A [`BridgeConnectionPool`] keeps a fixed number of peer slots filled from
//! a listener and reports debounced connectivity changes. A
//! [`SerialNetworkPump`] moves bytes both ways on every poll:
//!
//! - peer to serial, one byte at a time while the serial line has room
//! - serial to peers, one block per poll no larger than the smallest
//!   non-zero peer capacity; a peer that cannot take the whole block misses
//!   it
//!
//! [`SerialBridge`] combines the two behind `begin` / `pump` / `end`.
//!
//! ```rust,no_run
//! use conlog_bridge::{listen, BridgeConfig, SerialBridge};
//! use conlog_stream::MemoryPort;
//!
//! # async fn run() -> Result<(), conlog_bridge::BridgeError> {
//! let config = BridgeConfig::default();
//! let listener = listen(&config).await?;
//! let mut bridge = SerialBridge::new(MemoryPort::new(256, 256), &config)?;
//! bridge.begin(listener, Some(Box::new(|up| println!("connected: {up}"))));
//!
//! let mut scratch = [0u8; 256];
//! loop {
//!     bridge.pump(&mut scratch);
//!     tokio::task::yield_now().await;
//! }
//! # }
//! ```

mod bridge;
mod config;
mod error;
mod pool;
mod pump;

pub use bridge::{listen, SerialBridge};
pub use config::{BridgeConfig, DEFAULT_BUSY_MESSAGE, DEFAULT_PORT};
pub use error::{BridgeError, BridgeResult};
pub use pool::{BridgeConnectionPool, ConnectedCallback};
pub use pump::{max_to_network, SerialNetworkPump};
