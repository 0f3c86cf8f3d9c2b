//! Byte transfer between the serial line and the peers.

use conlog_stream::{DuplexStream, PeerConnection};
use tracing::{trace, warn};

/// Moves bytes between a serial device and a set of peer slots.
///
/// Network to serial is byte by byte, bounded by what the serial line
/// accepts. Serial to network reads one block per call, sized so every
/// uncongested peer can take all of it; a peer with less room skips the
/// block.
#[derive(Debug)]
pub struct SerialNetworkPump<S> {
    serial: S,
}

impl<S: DuplexStream> SerialNetworkPump<S> {
    /// Wraps the serial device.
    pub fn new(serial: S) -> Self {
        Self { serial }
    }

    /// Runs one transfer cycle and returns the number of serial bytes sent
    /// to the network.
    pub fn pump<C: PeerConnection>(&mut self, slots: &mut [Option<C>], scratch: &mut [u8]) -> usize {
        self.to_serial(slots);
        self.to_network(slots, scratch)
    }

    /// Returns the serial device.
    pub fn serial(&self) -> &S {
        &self.serial
    }

    /// Returns the serial device mutably.
    pub fn serial_mut(&mut self) -> &mut S {
        &mut self.serial
    }

    /// Unwraps the serial device.
    pub fn into_inner(self) -> S {
        self.serial
    }

    fn to_serial<C: PeerConnection>(&mut self, slots: &mut [Option<C>]) {
        for peer in slots.iter_mut().flatten() {
            while peer.available() > 0 && self.serial.write_capacity() > 0 {
                let Some(byte) = peer.read_byte() else {
                    break;
                };
                self.serial.write(&[byte]);
            }
        }
    }

    fn to_network<C: PeerConnection>(&mut self, slots: &mut [Option<C>], scratch: &mut [u8]) -> usize {
        let max_to_tcp = max_to_network(slots);
        let len = self.serial.available().min(max_to_tcp).min(scratch.len());
        if len == 0 {
            return 0;
        }

        let got = self.serial.read(&mut scratch[..len]);
        if got == 0 {
            return 0;
        }

        for (index, peer) in slots.iter_mut().enumerate() {
            let Some(peer) = peer else {
                continue;
            };
            if peer.write_capacity() < got {
                trace!("Client index {} congested, skipping {} bytes", index, got);
                continue;
            }
            let sent = peer.write(&scratch[..got]);
            if sent != got {
                warn!(
                    "len mismatch: available:{} serial-read:{} tcp-write:{}",
                    len, got, sent
                );
            }
        }
        got
    }
}

/// Smallest non-zero write capacity among occupied slots, or 0.
pub fn max_to_network<C: PeerConnection>(slots: &[Option<C>]) -> usize {
    slots
        .iter()
        .flatten()
        .map(|peer| peer.write_capacity())
        .filter(|&capacity| capacity > 0)
        .min()
        .unwrap_or(0)
}
