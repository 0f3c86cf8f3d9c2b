//! TCP listener and peers.

use crate::error::{StreamError, StreamResult};
use crate::port::{StreamPort, DEFAULT_RX_BUFFER, DEFAULT_TX_BUFFER};
use crate::traits::{ByteSink, ByteSource, PeerConnection, PeerListener};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Socket options applied to accepted peers.
#[derive(Debug, Clone, Copy)]
pub struct TcpPeerOptions {
    /// Receive buffer per peer, in bytes.
    pub rx_buffer: usize,
    /// Transmit buffer per peer, in bytes. This is the write capacity the
    /// bridge sees.
    pub tx_buffer: usize,
    /// Whether to disable Nagle's algorithm.
    pub nodelay: bool,
    /// Accepted connections waiting for the pool, beyond which new ones are
    /// closed immediately.
    pub backlog: usize,
}

impl Default for TcpPeerOptions {
    fn default() -> Self {
        Self {
            rx_buffer: DEFAULT_RX_BUFFER,
            tx_buffer: DEFAULT_TX_BUFFER * 4,
            nodelay: true,
            backlog: 4,
        }
    }
}

/// A connected TCP peer.
#[derive(Debug)]
pub struct TcpPeer {
    port: StreamPort,
}

impl TcpPeer {
    fn new(stream: TcpStream, addr: SocketAddr, options: &TcpPeerOptions) -> Self {
        if options.nodelay {
            if let Err(e) = stream.set_nodelay(true) {
                warn!(peer = %addr, error = %e, "cannot set TCP_NODELAY");
            }
        }
        let (reader, writer) = stream.into_split();
        Self {
            port: StreamPort::spawn(
                addr.to_string(),
                reader,
                writer,
                options.rx_buffer,
                options.tx_buffer,
            ),
        }
    }
}

impl ByteSource for TcpPeer {
    fn available(&self) -> usize {
        self.port.available()
    }

    fn read(&mut self, buf: &mut [u8]) -> usize {
        self.port.read(buf)
    }
}

impl ByteSink for TcpPeer {
    fn write_capacity(&self) -> usize {
        self.port.write_capacity()
    }

    fn write(&mut self, data: &[u8]) -> usize {
        self.port.write(data)
    }
}

impl PeerConnection for TcpPeer {
    fn is_connected(&self) -> bool {
        self.port.is_open()
    }

    fn label(&self) -> String {
        self.port.label().to_string()
    }
}

/// A TCP listening socket feeding accepted peers to a poll loop.
///
/// Accepting happens on a background task; [`PeerListener::has_pending`]
/// and [`PeerListener::accept`] only look at the queue it fills.
#[derive(Debug)]
pub struct TcpPeerListener {
    local_addr: SocketAddr,
    pending: Arc<Mutex<VecDeque<TcpPeer>>>,
    task: JoinHandle<()>,
}

impl TcpPeerListener {
    /// Binds to `addr` and starts accepting.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Bind`] if the socket cannot be bound.
    pub async fn bind(addr: SocketAddr, options: TcpPeerOptions) -> StreamResult<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| StreamError::Bind {
                addr: addr.to_string(),
                source,
            })?;
        let local_addr = listener.local_addr()?;
        let pending = Arc::new(Mutex::new(VecDeque::new()));
        let task = tokio::spawn(accept_loop(listener, Arc::clone(&pending), options));

        debug!(addr = %local_addr, "listening");
        Ok(Self {
            local_addr,
            pending,
            task,
        })
    }

    /// Returns the bound address.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

impl PeerListener for TcpPeerListener {
    type Connection = TcpPeer;

    fn has_pending(&self) -> bool {
        !self.pending.lock().is_empty()
    }

    fn accept(&mut self) -> Option<TcpPeer> {
        self.pending.lock().pop_front()
    }
}

impl Drop for TcpPeerListener {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn accept_loop(
    listener: TcpListener,
    pending: Arc<Mutex<VecDeque<TcpPeer>>>,
    options: TcpPeerOptions,
) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let peer = TcpPeer::new(stream, addr, &options);
                let mut queue = pending.lock();
                if queue.len() < options.backlog {
                    queue.push_back(peer);
                } else {
                    debug!(peer = %addr, "backlog full, closing");
                }
            }
            Err(e) => {
                warn!(error = %e, "accept failed");
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    async fn wait_for<F: Fn() -> bool>(cond: F) {
        for _ in 0..400 {
            if cond() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    fn loopback() -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], 0))
    }

    #[tokio::test]
    async fn accepted_peer_exchanges_bytes() {
        let mut listener = TcpPeerListener::bind(loopback(), TcpPeerOptions::default())
            .await
            .unwrap();
        assert!(!listener.has_pending());

        let mut client = TcpStream::connect(listener.local_addr()).await.unwrap();
        wait_for(|| listener.has_pending()).await;

        let mut peer = listener.accept().unwrap();
        assert!(peer.is_connected());
        assert!(peer.label().starts_with("127.0.0.1:"));

        client.write_all(b"ping").await.unwrap();
        wait_for(|| peer.available() == 4).await;
        let mut buf = [0u8; 4];
        assert_eq!(peer.read(&mut buf), 4);
        assert_eq!(&buf, b"ping");

        assert_eq!(peer.write(b"pong"), 4);
        let mut reply = [0u8; 4];
        client.read_exact(&mut reply).await.unwrap();
        assert_eq!(&reply, b"pong");
    }

    #[tokio::test]
    async fn peer_reports_disconnect() {
        let mut listener = TcpPeerListener::bind(loopback(), TcpPeerOptions::default())
            .await
            .unwrap();
        let client = TcpStream::connect(listener.local_addr()).await.unwrap();
        wait_for(|| listener.has_pending()).await;
        let peer = listener.accept().unwrap();

        drop(client);
        wait_for(|| !peer.is_connected()).await;
        assert!(!peer.is_connected());
    }

    #[tokio::test]
    async fn dropped_peer_flushes_queued_bytes() {
        let mut listener = TcpPeerListener::bind(loopback(), TcpPeerOptions::default())
            .await
            .unwrap();
        let mut client = TcpStream::connect(listener.local_addr()).await.unwrap();
        wait_for(|| listener.has_pending()).await;

        let mut peer = listener.accept().unwrap();
        peer.write(b"busy\r\n");
        drop(peer);

        let mut reply = Vec::new();
        client.read_to_end(&mut reply).await.unwrap();
        assert_eq!(reply, b"busy\r\n");
    }
}
