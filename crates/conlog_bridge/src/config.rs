//! Bridge configuration.

use crate::error::{BridgeError, BridgeResult};
use conlog_stream::{TcpPeerOptions, DEFAULT_RX_BUFFER, DEFAULT_TX_BUFFER};
use std::net::SocketAddr;

/// Default telnet port.
pub const DEFAULT_PORT: u16 = 23;

/// Line sent to a peer that finds every slot taken.
pub const DEFAULT_BUSY_MESSAGE: &[u8] = b"busy\r\n";

/// Configuration for the serial bridge.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Address to listen on.
    pub bind_addr: SocketAddr,
    /// Number of peer slots.
    pub max_peers: usize,
    /// Sent to and flushed on a rejected peer before it is closed.
    pub busy_message: Vec<u8>,
    /// Whether to disable Nagle's algorithm on peers.
    pub nodelay: bool,
    /// Receive buffer per peer.
    pub peer_rx_buffer: usize,
    /// Transmit buffer per peer; bounds one serial-to-network transfer.
    pub peer_tx_buffer: usize,
    /// Receive buffer of the serial device.
    pub serial_rx_buffer: usize,
    /// Transmit buffer of the serial device.
    pub serial_tx_buffer: usize,
}

impl BridgeConfig {
    /// Creates a configuration listening on `bind_addr`.
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            max_peers: 1,
            busy_message: DEFAULT_BUSY_MESSAGE.to_vec(),
            nodelay: true,
            peer_rx_buffer: DEFAULT_RX_BUFFER,
            peer_tx_buffer: DEFAULT_TX_BUFFER * 4,
            serial_rx_buffer: DEFAULT_RX_BUFFER,
            serial_tx_buffer: DEFAULT_TX_BUFFER,
        }
    }

    /// Sets the number of peer slots.
    pub fn with_max_peers(mut self, max: usize) -> Self {
        self.max_peers = max;
        self
    }

    /// Sets the busy message.
    pub fn with_busy_message(mut self, message: impl Into<Vec<u8>>) -> Self {
        self.busy_message = message.into();
        self
    }

    /// Sets whether to disable Nagle's algorithm.
    pub fn with_nodelay(mut self, nodelay: bool) -> Self {
        self.nodelay = nodelay;
        self
    }

    /// Sets the per-peer buffer sizes.
    pub fn with_peer_buffers(mut self, rx: usize, tx: usize) -> Self {
        self.peer_rx_buffer = rx;
        self.peer_tx_buffer = tx;
        self
    }

    /// Sets the serial device buffer sizes.
    pub fn with_serial_buffers(mut self, rx: usize, tx: usize) -> Self {
        self.serial_rx_buffer = rx;
        self.serial_tx_buffer = tx;
        self
    }

    /// Socket options for accepted peers.
    pub fn peer_options(&self) -> TcpPeerOptions {
        TcpPeerOptions {
            rx_buffer: self.peer_rx_buffer,
            tx_buffer: self.peer_tx_buffer,
            nodelay: self.nodelay,
            ..TcpPeerOptions::default()
        }
    }

    /// Checks that the values are usable.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidConfig`] for zero slots or buffers, or
    /// a busy message that does not fit in a peer's transmit buffer.
    pub fn validate(&self) -> BridgeResult<()> {
        if self.max_peers == 0 {
            return Err(BridgeError::InvalidConfig(
                "at least one peer slot is required".into(),
            ));
        }
        let buffers = [
            self.peer_rx_buffer,
            self.peer_tx_buffer,
            self.serial_rx_buffer,
            self.serial_tx_buffer,
        ];
        if buffers.contains(&0) {
            return Err(BridgeError::InvalidConfig(
                "buffer sizes must be positive".into(),
            ));
        }
        if self.busy_message.len() > self.peer_tx_buffer {
            return Err(BridgeError::InvalidConfig(format!(
                "busy message ({} bytes) exceeds peer transmit buffer ({} bytes)",
                self.busy_message.len(),
                self.peer_tx_buffer
            )));
        }
        Ok(())
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self::new(SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)))
    }
}
