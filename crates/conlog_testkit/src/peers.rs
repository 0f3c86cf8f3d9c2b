//! Mock network peers.
//!
//! Every mock is a handle: clones share state, so a test keeps one clone to
//! play the remote end while the bridge owns another.

use conlog_stream::{ByteSink, ByteSource, MemoryPort, PeerConnection, PeerListener};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Receive buffer of a default mock peer.
pub const MOCK_RX_BUFFER: usize = 256;

/// Transmit buffer of a default mock peer.
pub const MOCK_TX_BUFFER: usize = 1024;

/// A scripted peer connection.
#[derive(Debug, Clone)]
pub struct MockPeer {
    label: String,
    port: MemoryPort,
    connected: Arc<AtomicBool>,
}

impl MockPeer {
    /// Creates a connected peer with default buffers.
    pub fn new(label: impl Into<String>) -> Self {
        Self::with_buffers(label, MOCK_RX_BUFFER, MOCK_TX_BUFFER)
    }

    /// Creates a connected peer with the given buffer sizes.
    pub fn with_buffers(label: impl Into<String>, rx: usize, tx: usize) -> Self {
        Self {
            label: label.into(),
            port: MemoryPort::new(rx, tx),
            connected: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Sends bytes from the remote end. Returns how many fit.
    pub fn inject(&self, data: &[u8]) -> usize {
        self.port.inject(data)
    }

    /// Takes what the bridge sent to the remote end.
    pub fn drain(&self) -> Vec<u8> {
        self.port.drain()
    }

    /// Closes the connection from the remote end.
    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
        self.port.tx().close();
    }
}

impl ByteSource for MockPeer {
    fn available(&self) -> usize {
        self.port.available()
    }

    fn read(&mut self, buf: &mut [u8]) -> usize {
        self.port.read(buf)
    }
}

impl ByteSink for MockPeer {
    fn write_capacity(&self) -> usize {
        self.port.write_capacity()
    }

    fn write(&mut self, data: &[u8]) -> usize {
        self.port.write(data)
    }
}

impl PeerConnection for MockPeer {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn label(&self) -> String {
        self.label.clone()
    }
}

/// A listener whose incoming connections are queued by the test.
#[derive(Debug, Clone, Default)]
pub struct MockListener {
    queue: Arc<Mutex<VecDeque<MockPeer>>>,
}

impl MockListener {
    /// Creates a listener with no pending connections.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an incoming connection.
    pub fn connect(&self, peer: MockPeer) {
        self.queue.lock().push_back(peer);
    }

    /// Returns the number of connections not yet accepted.
    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }
}

impl PeerListener for MockListener {
    type Connection = MockPeer;

    fn has_pending(&self) -> bool {
        !self.queue.lock().is_empty()
    }

    fn accept(&mut self) -> Option<MockPeer> {
        self.queue.lock().pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let remote = MockPeer::with_buffers("p", 8, 8);
        let mut local = remote.clone();

        remote.inject(b"hi");
        let mut buf = [0u8; 4];
        assert_eq!(local.read(&mut buf), 2);

        local.write(b"yo");
        assert_eq!(remote.drain(), b"yo");
    }

    #[test]
    fn disconnect_closes_transmit() {
        let peer = MockPeer::new("p");
        assert!(peer.is_connected());
        assert_eq!(peer.write_capacity(), MOCK_TX_BUFFER);

        peer.disconnect();
        assert!(!peer.is_connected());
        assert_eq!(peer.write_capacity(), 0);
    }

    #[test]
    fn listener_is_fifo() {
        let mut listener = MockListener::new();
        assert!(!listener.has_pending());
        listener.connect(MockPeer::new("a"));
        listener.connect(MockPeer::new("b"));

        assert_eq!(listener.accept().unwrap().label(), "a");
        assert_eq!(listener.accept().unwrap().label(), "b");
        assert!(listener.accept().is_none());
    }
}
