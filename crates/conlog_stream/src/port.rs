//! FIFO-backed duplex ports.
//!
//! A port exposes the non-blocking [`ByteSource`]/[`ByteSink`] view of a
//! device. [`StreamPort`] moves bytes between its FIFOs and an async reader
//! and writer on tokio tasks; [`MemoryPort`] leaves the far ends of the FIFOs
//! to the caller, for tests and loopback wiring.

use crate::fifo::Fifo;
use crate::traits::{ByteSink, ByteSource};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::task::JoinHandle;
use tracing::debug;

/// Default receive buffer size, matching a typical UART driver buffer.
pub const DEFAULT_RX_BUFFER: usize = 256;

/// Default transmit buffer size.
pub const DEFAULT_TX_BUFFER: usize = 256;

/// A port whose far side is driven by tokio tasks.
///
/// Dropping the port stops the reader immediately and lets the writer drain
/// what is already queued before shutting the write half down.
#[derive(Debug)]
pub struct StreamPort {
    label: String,
    rx: Fifo,
    tx: Fifo,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl StreamPort {
    /// Spawns the I/O tasks for `reader`/`writer` on the current runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn spawn<R, W>(
        label: impl Into<String>,
        reader: R,
        writer: W,
        rx_capacity: usize,
        tx_capacity: usize,
    ) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let label = label.into();
        let rx = Fifo::new(rx_capacity);
        let tx = Fifo::new(tx_capacity);

        let reader = tokio::spawn(read_into(label.clone(), reader, rx.clone(), tx.clone()));
        let writer = tokio::spawn(write_from(label.clone(), writer, tx.clone(), rx.clone()));

        Self {
            label,
            rx,
            tx,
            reader,
            writer,
        }
    }

    /// Returns the port label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns true while both directions are open or unread bytes remain.
    #[must_use]
    pub fn is_open(&self) -> bool {
        !(self.rx.is_closed() || self.tx.is_closed()) || !self.rx.is_empty()
    }

    /// Returns true once both I/O tasks have finished.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.reader.is_finished() && self.writer.is_finished()
    }
}

impl ByteSource for StreamPort {
    fn available(&self) -> usize {
        self.rx.len()
    }

    fn read(&mut self, buf: &mut [u8]) -> usize {
        self.rx.pop(buf)
    }
}

impl ByteSink for StreamPort {
    fn write_capacity(&self) -> usize {
        self.tx.free()
    }

    fn write(&mut self, data: &[u8]) -> usize {
        self.tx.push(data)
    }
}

impl Drop for StreamPort {
    fn drop(&mut self) {
        self.reader.abort();
        self.tx.close();
    }
}

async fn read_into<R>(label: String, mut reader: R, rx: Fifo, tx: Fifo)
where
    R: AsyncRead + Unpin,
{
    let mut chunk = vec![0u8; rx.capacity().max(1)];
    loop {
        rx.writable().await;
        let room = rx.free();
        if room == 0 {
            break;
        }
        match reader.read(&mut chunk[..room]).await {
            Ok(0) => {
                debug!(port = %label, "end of stream");
                break;
            }
            Ok(n) => {
                rx.push(&chunk[..n]);
            }
            Err(e) => {
                debug!(port = %label, error = %e, "read failed");
                break;
            }
        }
    }
    rx.close();
    tx.close();
}

async fn write_from<W>(label: String, mut writer: W, tx: Fifo, rx: Fifo)
where
    W: AsyncWrite + Unpin,
{
    let mut chunk = vec![0u8; tx.capacity().max(1)];
    loop {
        tx.readable().await;
        let n = tx.pop(&mut chunk);
        if n == 0 {
            // Closed and drained.
            break;
        }
        if let Err(e) = writer.write_all(&chunk[..n]).await {
            debug!(port = %label, error = %e, "write failed");
            tx.close();
            rx.close();
            return;
        }
        if let Err(e) = writer.flush().await {
            debug!(port = %label, error = %e, "flush failed");
        }
    }
    let _ = writer.shutdown().await;
}

/// A port whose far side is handled by the caller.
///
/// `inject` feeds bytes that the port will then read; `drain` collects what
/// the port wrote. Clones share the same FIFOs.
#[derive(Debug, Clone)]
pub struct MemoryPort {
    rx: Fifo,
    tx: Fifo,
}

impl MemoryPort {
    /// Creates a port with the given buffer sizes.
    #[must_use]
    pub fn new(rx_capacity: usize, tx_capacity: usize) -> Self {
        Self {
            rx: Fifo::new(rx_capacity),
            tx: Fifo::new(tx_capacity),
        }
    }

    /// Queues bytes for the port to read. Returns how many fit.
    pub fn inject(&self, data: &[u8]) -> usize {
        self.rx.push(data)
    }

    /// Takes everything the port has written so far.
    pub fn drain(&self) -> Vec<u8> {
        let mut out = vec![0u8; self.tx.len()];
        let n = self.tx.pop(&mut out);
        out.truncate(n);
        out
    }

    /// Returns the receive FIFO.
    #[must_use]
    pub fn rx(&self) -> &Fifo {
        &self.rx
    }

    /// Returns the transmit FIFO.
    #[must_use]
    pub fn tx(&self) -> &Fifo {
        &self.tx
    }
}

impl ByteSource for MemoryPort {
    fn available(&self) -> usize {
        self.rx.len()
    }

    fn read(&mut self, buf: &mut [u8]) -> usize {
        self.rx.pop(buf)
    }
}

impl ByteSink for MemoryPort {
    fn write_capacity(&self) -> usize {
        self.tx.free()
    }

    fn write(&mut self, data: &[u8]) -> usize {
        self.tx.push(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn memory_port_roundtrip() {
        let mut port = MemoryPort::new(4, 4);
        assert_eq!(port.inject(b"hello"), 4);
        assert_eq!(port.available(), 4);

        let mut buf = [0u8; 8];
        assert_eq!(port.read(&mut buf), 4);
        assert_eq!(&buf[..4], b"hell");

        assert_eq!(port.write_capacity(), 4);
        assert_eq!(port.write(b"abcdef"), 4);
        assert_eq!(port.write_capacity(), 0);
        assert_eq!(port.drain(), b"abcd");
        assert_eq!(port.write_capacity(), 4);
    }

    #[test]
    fn read_byte_default() {
        let mut port = MemoryPort::new(4, 4);
        assert_eq!(port.read_byte(), None);
        port.inject(b"q");
        assert_eq!(port.read_byte(), Some(b'q'));
    }

    async fn wait_for<F: Fn() -> bool>(cond: F) {
        for _ in 0..200 {
            if cond() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[tokio::test]
    async fn stream_port_moves_bytes_both_ways() {
        let (near, far) = tokio::io::duplex(64);
        let (near_r, near_w) = tokio::io::split(near);
        let (mut far_r, mut far_w) = tokio::io::split(far);

        let mut port = StreamPort::spawn("duplex", near_r, near_w, 16, 16);
        assert_eq!(port.label(), "duplex");

        far_w.write_all(b"from device").await.unwrap();
        wait_for(|| port.available() == 11).await;
        let mut buf = [0u8; 16];
        assert_eq!(port.read(&mut buf), 11);
        assert_eq!(&buf[..11], b"from device");

        assert_eq!(port.write(b"to device"), 9);
        let mut out = [0u8; 9];
        far_r.read_exact(&mut out).await.unwrap();
        assert_eq!(&out, b"to device");
        assert!(port.is_open());
    }

    #[tokio::test]
    async fn stream_port_reports_closed_peer() {
        let (near, far) = tokio::io::duplex(64);
        let (near_r, near_w) = tokio::io::split(near);
        let port = StreamPort::spawn("duplex", near_r, near_w, 16, 16);

        drop(far);
        wait_for(|| !port.is_open()).await;
        assert!(!port.is_open());
        assert_eq!(port.write_capacity(), 0);
    }
}
