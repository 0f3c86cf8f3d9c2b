//! Collaborator traits for byte streams and network peers.
//!
//! All operations are non-blocking: they report what is possible right now
//! and move at most that much. Callers poll them from a single cooperative
//! loop.

/// A readable byte stream, such as a console or the receive side of a
/// serial line.
pub trait ByteSource {
    /// Returns the number of bytes that can be read without waiting.
    fn available(&self) -> usize;

    /// Reads up to `buf.len()` bytes and returns how many were read.
    fn read(&mut self, buf: &mut [u8]) -> usize;

    /// Reads a single byte, if one is available.
    fn read_byte(&mut self) -> Option<u8> {
        let mut byte = [0u8; 1];
        (self.read(&mut byte) == 1).then_some(byte[0])
    }
}

/// A writable byte stream with a bounded buffer.
pub trait ByteSink {
    /// Returns how many bytes can be written without waiting.
    fn write_capacity(&self) -> usize;

    /// Writes up to `data.len()` bytes and returns how many were accepted.
    fn write(&mut self, data: &[u8]) -> usize;
}

/// A bidirectional byte stream, such as a serial line.
pub trait DuplexStream: ByteSource + ByteSink {}

impl<T: ByteSource + ByteSink> DuplexStream for T {}

/// One accepted network peer.
pub trait PeerConnection: ByteSource + ByteSink {
    /// Returns true while the peer is connected or still has unread bytes.
    fn is_connected(&self) -> bool;

    /// Returns a label for log messages (typically the remote address).
    fn label(&self) -> String;
}

/// A listening endpoint that hands out peer connections.
pub trait PeerListener {
    /// The connection type produced by this listener.
    type Connection: PeerConnection;

    /// Returns true if a connection is waiting to be accepted.
    fn has_pending(&self) -> bool;

    /// Accepts the next pending connection, if any.
    fn accept(&mut self) -> Option<Self::Connection>;
}
