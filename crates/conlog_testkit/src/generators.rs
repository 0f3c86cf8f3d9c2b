//! Property-based test generators using proptest.

use proptest::prelude::*;
use std::collections::BTreeSet;

/// Strategy for console output arriving in bursts.
pub fn console_bursts_strategy() -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::vec(prop::collection::vec(any::<u8>(), 0..200), 0..40)
}

/// Strategy for the indices present in a log directory (non-empty,
/// not necessarily contiguous).
pub fn segment_indices_strategy() -> impl Strategy<Value = BTreeSet<u64>> {
    prop::collection::btree_set(0u64..500, 1..8)
}

/// Strategy for the free transmit room of up to `max_peers` peer slots.
/// `None` is an empty slot; `Some(0)` is a congested peer.
pub fn peer_room_strategy(max_peers: usize) -> impl Strategy<Value = Vec<Option<usize>>> {
    prop::collection::vec(prop::option::of(0usize..64), 1..=max_peers.max(1))
}

/// Steps a test driver can interleave with capture.
#[derive(Debug, Clone)]
pub enum LogStep {
    /// Console bytes to ingest.
    Ingest(Vec<u8>),
    /// Run a rotation check.
    Check,
    /// Pretend something else filled the medium up to this many bytes.
    Pressure(u64),
}

/// Strategy for sequences of ingest, rotation check and space pressure.
pub fn log_steps_strategy() -> impl Strategy<Value = Vec<LogStep>> {
    let step = prop_oneof![
        4 => prop::collection::vec(any::<u8>(), 1..120).prop_map(LogStep::Ingest),
        2 => Just(LogStep::Check),
        1 => (0u64..4096).prop_map(LogStep::Pressure),
    ];
    prop::collection::vec(step, 1..60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::strategy::ValueTree;
    use proptest::test_runner::TestRunner;

    #[test]
    fn strategies_generate() {
        let mut runner = TestRunner::default();
        let indices = segment_indices_strategy()
            .new_tree(&mut runner)
            .unwrap()
            .current();
        assert!(!indices.is_empty());

        let rooms = peer_room_strategy(3).new_tree(&mut runner).unwrap().current();
        assert!((1..=3).contains(&rooms.len()));
    }
}
