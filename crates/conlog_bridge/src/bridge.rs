//! Serial bridge facade.

use crate::config::BridgeConfig;
use crate::error::{BridgeError, BridgeResult};
use crate::pool::{BridgeConnectionPool, ConnectedCallback};
use crate::pump::SerialNetworkPump;
use conlog_stream::{DuplexStream, PeerListener, TcpPeerListener};
use tracing::info;

/// A serial line shared with network peers.
///
/// Each [`pump`](Self::pump) updates the peer slots and then runs one
/// transfer cycle. Nothing blocks; the caller decides the poll cadence.
pub struct SerialBridge<S, L: PeerListener> {
    pool: BridgeConnectionPool<L>,
    pump: SerialNetworkPump<S>,
}

impl<S: DuplexStream, L: PeerListener> SerialBridge<S, L> {
    /// Creates a stopped bridge over `serial`.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` does not validate.
    pub fn new(serial: S, config: &BridgeConfig) -> BridgeResult<Self> {
        config.validate()?;
        Ok(Self {
            pool: BridgeConnectionPool::new(config.max_peers, config.busy_message.clone()),
            pump: SerialNetworkPump::new(serial),
        })
    }

    /// Starts serving peers from `listener`.
    pub fn begin(&mut self, listener: L, callback: Option<ConnectedCallback>) {
        self.pool.begin(listener, callback);
    }

    /// Stops serving and drops every peer.
    pub fn end(&mut self) {
        self.pool.end();
    }

    /// Replaces the connectivity callback.
    pub fn set_connected_callback(&mut self, callback: Option<ConnectedCallback>) {
        self.pool.set_connected_callback(callback);
    }

    /// Runs one bridge cycle and returns the number of serial bytes sent to
    /// the network.
    pub fn pump(&mut self, scratch: &mut [u8]) -> usize {
        self.pool.pump();
        self.pump.pump(self.pool.slots_mut(), scratch)
    }

    /// Returns the connection pool.
    pub fn pool(&self) -> &BridgeConnectionPool<L> {
        &self.pool
    }

    /// Returns the serial device.
    pub fn serial(&self) -> &S {
        self.pump.serial()
    }

    /// Returns true while at least one peer is connected.
    pub fn is_connected(&self) -> bool {
        self.pool.is_connected()
    }
}

impl<S, L: PeerListener> std::fmt::Debug for SerialBridge<S, L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialBridge")
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}

/// Binds the TCP listener described by `config`.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the address cannot
/// be bound.
pub async fn listen(config: &BridgeConfig) -> BridgeResult<TcpPeerListener> {
    config.validate()?;
    let listener = TcpPeerListener::bind(config.bind_addr, config.peer_options())
        .await
        .map_err(BridgeError::from)?;
    info!("Serial bridge listening on {}", listener.local_addr());
    Ok(listener)
}

#[cfg(test)]
mod tests {
    use super::*;
    use conlog_stream::MemoryPort;
    use conlog_testkit::{MockListener, MockPeer};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn rejects_invalid_config() {
        let config = BridgeConfig::default().with_max_peers(0);
        let result = SerialBridge::<MemoryPort, MockListener>::new(MemoryPort::new(8, 8), &config);
        assert!(matches!(result, Err(BridgeError::InvalidConfig(_))));
    }

    #[test]
    fn pump_bridges_both_directions() {
        let line = MemoryPort::new(64, 64);
        let listener = MockListener::new();
        let mut bridge = SerialBridge::new(line.clone(), &BridgeConfig::default()).unwrap();
        let ups = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ups);
        bridge.begin(
            listener.clone(),
            Some(Box::new(move |up| {
                if up {
                    counter.fetch_add(1, Ordering::SeqCst);
                }
            })),
        );

        let peer = MockPeer::new("telnet");
        listener.connect(peer.clone());
        peer.inject(b"reboot\r\n");
        line.inject(b"ok\r\n");

        let mut scratch = [0u8; 64];
        assert_eq!(bridge.pump(&mut scratch), 4);
        assert!(bridge.is_connected());
        assert_eq!(ups.load(Ordering::SeqCst), 1);
        assert_eq!(line.drain(), b"reboot\r\n");
        assert_eq!(peer.drain(), b"ok\r\n");
    }

    #[test]
    fn end_disconnects() {
        let line = MemoryPort::new(64, 64);
        let listener = MockListener::new();
        let mut bridge = SerialBridge::new(line, &BridgeConfig::default()).unwrap();
        bridge.begin(listener.clone(), None);

        listener.connect(MockPeer::new("a"));
        bridge.pump(&mut [0u8; 8]);
        assert_eq!(bridge.pool().occupied(), 1);

        bridge.end();
        assert!(!bridge.is_connected());
        assert_eq!(bridge.pool().occupied(), 0);
    }

    #[tokio::test]
    async fn listen_binds_ephemeral_port() {
        let config = BridgeConfig::new("127.0.0.1:0".parse().unwrap());
        let listener = listen(&config).await.unwrap();
        assert_ne!(listener.local_addr().port(), 0);
    }
}
