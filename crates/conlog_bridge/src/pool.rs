//! Peer slots and connectivity notification.

use conlog_stream::{ByteSink, PeerConnection, PeerListener};
use tracing::{debug, info};

/// Callback invoked with `true` when the first peer connects and `false`
/// when the last one goes away.
pub type ConnectedCallback = Box<dyn FnMut(bool) + Send>;

/// A fixed array of peer slots fed by a listener.
///
/// The slot array is allocated once and never grows. A peer arriving while
/// every slot is taken gets the busy message and is closed.
pub struct BridgeConnectionPool<L: PeerListener> {
    listener: Option<L>,
    slots: Box<[Option<L::Connection>]>,
    busy_message: Vec<u8>,
    callback: Option<ConnectedCallback>,
    last_connected: bool,
}

impl<L: PeerListener> BridgeConnectionPool<L> {
    /// Creates a pool with `max_peers` empty slots.
    pub fn new(max_peers: usize, busy_message: impl Into<Vec<u8>>) -> Self {
        Self {
            listener: None,
            slots: (0..max_peers).map(|_| None).collect(),
            busy_message: busy_message.into(),
            callback: None,
            last_connected: false,
        }
    }

    /// Starts accepting peers from `listener`.
    pub fn begin(&mut self, listener: L, callback: Option<ConnectedCallback>) {
        self.listener = Some(listener);
        self.callback = callback;
        self.last_connected = false;
    }

    /// Stops accepting and drops every peer.
    ///
    /// Fires `callback(false)` if a peer was connected.
    pub fn end(&mut self) {
        self.listener = None;
        for slot in self.slots.iter_mut() {
            *slot = None;
        }
        if self.last_connected {
            self.last_connected = false;
            self.notify(false);
        }
    }

    /// Replaces the connectivity callback.
    pub fn set_connected_callback(&mut self, callback: Option<ConnectedCallback>) {
        self.callback = callback;
    }

    /// Clears dead slots, then accepts at most one pending peer.
    pub fn pump(&mut self) {
        self.sweep();
        self.accept();
    }

    /// Returns the slots.
    pub fn slots(&self) -> &[Option<L::Connection>] {
        &self.slots
    }

    /// Returns the slots mutably.
    pub fn slots_mut(&mut self) -> &mut [Option<L::Connection>] {
        &mut self.slots
    }

    /// Returns the number of occupied slots.
    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Returns the debounced connectivity state.
    pub fn is_connected(&self) -> bool {
        self.last_connected
    }

    /// Returns true between [`begin`](Self::begin) and [`end`](Self::end).
    pub fn is_listening(&self) -> bool {
        self.listener.is_some()
    }

    /// Returns the listener.
    pub fn listener(&self) -> Option<&L> {
        self.listener.as_ref()
    }

    fn sweep(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.as_ref().is_some_and(|peer| !peer.is_connected()) {
                if let Some(peer) = slot.take() {
                    info!("Client {} disconnected: index {}", peer.label(), index);
                }
            }
        }

        if self.last_connected && self.occupied() == 0 {
            self.last_connected = false;
            self.notify(false);
        }
    }

    fn accept(&mut self) {
        let Some(listener) = self.listener.as_mut() else {
            return;
        };
        if !listener.has_pending() {
            return;
        }
        let Some(mut peer) = listener.accept() else {
            return;
        };

        match self.slots.iter().position(Option::is_none) {
            Some(index) => {
                info!("New client {}: index {}", peer.label(), index);
                self.slots[index] = Some(peer);
                if !self.last_connected {
                    self.last_connected = true;
                    self.notify(true);
                }
            }
            None => {
                debug!("Client {} rejected, all {} slots busy", peer.label(), self.slots.len());
                peer.write(&self.busy_message);
            }
        }
    }

    fn notify(&mut self, connected: bool) {
        debug!("Connectivity changed: {}", connected);
        if let Some(callback) = self.callback.as_mut() {
            callback(connected);
        }
    }
}

impl<L: PeerListener> std::fmt::Debug for BridgeConnectionPool<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeConnectionPool")
            .field("slots", &self.slots.len())
            .field("occupied", &self.occupied())
            .field("listening", &self.is_listening())
            .field("last_connected", &self.last_connected)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conlog_testkit::{MockListener, MockPeer};
    use std::sync::{Arc, Mutex};

    fn recorder() -> (Arc<Mutex<Vec<bool>>>, ConnectedCallback) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let callback: ConnectedCallback = Box::new(move |up| sink.lock().unwrap().push(up));
        (events, callback)
    }

    #[test]
    fn accepts_into_first_free_slot() {
        let listener = MockListener::new();
        let mut pool = BridgeConnectionPool::new(2, "busy\r\n");
        let (events, callback) = recorder();
        pool.begin(listener.clone(), Some(callback));

        let a = MockPeer::new("a");
        listener.connect(a.clone());
        pool.pump();
        assert_eq!(pool.occupied(), 1);
        assert!(pool.slots()[0].is_some());
        assert!(pool.is_connected());

        let b = MockPeer::new("b");
        listener.connect(b.clone());
        pool.pump();
        assert_eq!(pool.occupied(), 2);

        assert_eq!(*events.lock().unwrap(), vec![true]);
    }

    #[test]
    fn full_pool_sends_busy_and_discards() {
        let listener = MockListener::new();
        let mut pool = BridgeConnectionPool::new(1, "busy\r\n");
        pool.begin(listener.clone(), None);

        listener.connect(MockPeer::new("first"));
        pool.pump();

        let second = MockPeer::new("second");
        listener.connect(second.clone());
        pool.pump();

        assert_eq!(pool.occupied(), 1);
        assert_eq!(second.drain(), b"busy\r\n");
        assert_eq!(listener.pending(), 0);
    }

    #[test]
    fn one_accept_per_pump() {
        let listener = MockListener::new();
        let mut pool = BridgeConnectionPool::new(3, "busy\r\n");
        pool.begin(listener.clone(), None);

        listener.connect(MockPeer::new("a"));
        listener.connect(MockPeer::new("b"));
        pool.pump();
        assert_eq!(pool.occupied(), 1);
        assert_eq!(listener.pending(), 1);
        pool.pump();
        assert_eq!(pool.occupied(), 2);
    }

    #[test]
    fn last_disconnect_fires_false_once() {
        let listener = MockListener::new();
        let mut pool = BridgeConnectionPool::new(2, "busy\r\n");
        let (events, callback) = recorder();
        pool.begin(listener.clone(), Some(callback));

        let a = MockPeer::new("a");
        let b = MockPeer::new("b");
        listener.connect(a.clone());
        pool.pump();
        listener.connect(b.clone());
        pool.pump();

        a.disconnect();
        pool.pump();
        assert_eq!(pool.occupied(), 1);
        assert!(pool.is_connected());

        b.disconnect();
        pool.pump();
        pool.pump();
        assert_eq!(pool.occupied(), 0);
        assert!(!pool.is_connected());
        assert_eq!(*events.lock().unwrap(), vec![true, false]);
    }

    #[test]
    fn slot_is_reused_after_disconnect() {
        let listener = MockListener::new();
        let mut pool = BridgeConnectionPool::new(1, "busy\r\n");
        let (events, callback) = recorder();
        pool.begin(listener.clone(), Some(callback));

        let a = MockPeer::new("a");
        listener.connect(a.clone());
        pool.pump();
        a.disconnect();

        let b = MockPeer::new("b");
        listener.connect(b.clone());
        pool.pump();

        assert_eq!(pool.occupied(), 1);
        assert!(b.drain().is_empty());
        assert_eq!(*events.lock().unwrap(), vec![true, false, true]);
    }

    #[test]
    fn callback_can_be_replaced() {
        let listener = MockListener::new();
        let mut pool = BridgeConnectionPool::new(1, "busy\r\n");
        let (first, callback) = recorder();
        pool.begin(listener.clone(), Some(callback));

        let (second, replacement) = recorder();
        pool.set_connected_callback(Some(replacement));

        listener.connect(MockPeer::new("a"));
        pool.pump();
        assert!(first.lock().unwrap().is_empty());
        assert_eq!(*second.lock().unwrap(), vec![true]);
    }

    #[test]
    fn end_drops_peers_and_notifies() {
        let listener = MockListener::new();
        let mut pool = BridgeConnectionPool::new(1, "busy\r\n");
        let (events, callback) = recorder();
        pool.begin(listener.clone(), Some(callback));

        listener.connect(MockPeer::new("a"));
        pool.pump();
        pool.end();

        assert!(!pool.is_listening());
        assert_eq!(pool.occupied(), 0);
        assert_eq!(*events.lock().unwrap(), vec![true, false]);

        listener.connect(MockPeer::new("late"));
        pool.pump();
        assert_eq!(pool.occupied(), 0);
    }

    #[test]
    fn pump_before_begin_is_inert() {
        let mut pool: BridgeConnectionPool<MockListener> = BridgeConnectionPool::new(1, "busy");
        pool.pump();
        assert_eq!(pool.slots().len(), 1);
        assert!(!pool.is_connected());
    }
}
