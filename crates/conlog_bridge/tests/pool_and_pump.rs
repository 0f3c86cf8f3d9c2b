//! Bridge scenarios and properties with mock peers.

use conlog_bridge::{max_to_network, BridgeConfig, BridgeConnectionPool, SerialBridge, SerialNetworkPump};
use conlog_stream::MemoryPort;
use conlog_testkit::prelude::*;
use proptest::prelude::*;
use proptest::sample::Index;
use std::sync::{Arc, Mutex};

fn recorder() -> (Arc<Mutex<Vec<bool>>>, conlog_bridge::ConnectedCallback) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    (events, Box::new(move |up| sink.lock().unwrap().push(up)))
}

#[test]
fn single_slot_accepts_then_reports_busy() {
    let listener = MockListener::new();
    let line = MemoryPort::new(64, 64);
    let mut bridge = SerialBridge::new(line, &BridgeConfig::default()).unwrap();
    let (events, callback) = recorder();
    bridge.begin(listener.clone(), Some(callback));

    let first = MockPeer::new("first");
    listener.connect(first.clone());
    bridge.pump(&mut [0u8; 16]);
    assert_eq!(bridge.pool().occupied(), 1);
    assert_eq!(*events.lock().unwrap(), vec![true]);

    let second = MockPeer::new("second");
    listener.connect(second.clone());
    bridge.pump(&mut [0u8; 16]);
    assert_eq!(bridge.pool().occupied(), 1);
    assert_eq!(second.drain(), b"busy\r\n");
    assert!(first.drain().is_empty());
    assert_eq!(*events.lock().unwrap(), vec![true]);
}

#[test]
fn congested_peer_catches_up_on_later_blocks() {
    let line = MemoryPort::new(64, 64);
    let mut pump = SerialNetworkPump::new(line.clone());
    let fast = MockPeer::with_buffers("fast", 16, 32);
    let slow = MockPeer::with_buffers("slow", 16, 4);
    let mut slots = vec![Some(fast.clone()), Some(slow.clone())];
    let mut scratch = [0u8; 32];

    line.inject(b"abcdefgh");
    assert_eq!(pump.pump(&mut slots, &mut scratch), 4);
    assert_eq!(slow.drain(), b"abcd");
    assert_eq!(pump.pump(&mut slots, &mut scratch), 4);

    assert_eq!(fast.drain(), b"abcdefgh");
    assert_eq!(slow.drain(), b"efgh");
}

proptest! {
    #[test]
    fn serial_block_goes_whole_to_every_peer_with_room(
        rooms in peer_room_strategy(4),
        serial_bytes in prop::collection::vec(any::<u8>(), 0..200),
        scratch_len in 1usize..64,
    ) {
        let line = MemoryPort::new(256, 256);
        line.inject(&serial_bytes);
        let mut pump = SerialNetworkPump::new(line.clone());

        let peers: Vec<Option<MockPeer>> = rooms
            .iter()
            .enumerate()
            .map(|(i, room)| room.map(|r| MockPeer::with_buffers(format!("p{i}"), 16, r)))
            .collect();
        let mut slots = peers.clone();
        let limit = max_to_network(&slots);

        let mut scratch = vec![0u8; scratch_len];
        let len = pump.pump(&mut slots, &mut scratch);

        prop_assert_eq!(len, serial_bytes.len().min(limit).min(scratch_len));
        for (room, peer) in rooms.iter().zip(&peers) {
            let (Some(room), Some(peer)) = (room, peer) else { continue };
            let received = peer.drain();
            if len > 0 && *room >= len {
                prop_assert_eq!(&received[..], &serial_bytes[..len]);
            } else {
                prop_assert!(received.is_empty());
            }
            if *room > 0 {
                prop_assert!(len <= *room);
            }
        }
        prop_assert_eq!(line.rx().len(), serial_bytes.len() - len);
    }

    #[test]
    fn connectivity_events_are_debounced(
        steps in prop::collection::vec((any::<bool>(), any::<Index>()), 1..40),
    ) {
        let listener = MockListener::new();
        let mut pool = BridgeConnectionPool::new(2, "busy\r\n");
        let (events, callback) = recorder();
        pool.begin(listener.clone(), Some(callback));

        let mut peers: Vec<MockPeer> = Vec::new();
        for (n, (connect, pick)) in steps.into_iter().enumerate() {
            if connect || peers.is_empty() {
                let peer = MockPeer::new(format!("peer{n}"));
                listener.connect(peer.clone());
                peers.push(peer);
            } else {
                peers[pick.index(peers.len())].disconnect();
            }
            pool.pump();

            prop_assert_eq!(pool.is_connected(), pool.occupied() > 0);
            let events = events.lock().unwrap();
            for (i, up) in events.iter().enumerate() {
                prop_assert_eq!(*up, i % 2 == 0);
            }
            if let Some(last) = events.last() {
                prop_assert_eq!(*last, pool.is_connected());
            }
        }
    }
}
