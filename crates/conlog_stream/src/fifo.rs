//! Bounded byte FIFO shared between a poll loop and an I/O task.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Debug)]
struct FifoState {
    bytes: VecDeque<u8>,
    capacity: usize,
    closed: bool,
}

#[derive(Debug)]
struct FifoShared {
    state: Mutex<FifoState>,
    readable: Notify,
    writable: Notify,
}

/// A fixed-capacity byte queue.
///
/// Models the hardware or socket buffer behind a stream: the producer sees
/// how much room is left, the consumer sees how much is queued, and the
/// queue never grows past its capacity. Clones share the same queue.
#[derive(Debug, Clone)]
pub struct Fifo {
    shared: Arc<FifoShared>,
}

impl Fifo {
    /// Creates an empty FIFO holding at most `capacity` bytes.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            shared: Arc::new(FifoShared {
                state: Mutex::new(FifoState {
                    bytes: VecDeque::with_capacity(capacity),
                    capacity,
                    closed: false,
                }),
                readable: Notify::new(),
                writable: Notify::new(),
            }),
        }
    }

    /// Returns the number of queued bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.state.lock().bytes.len()
    }

    /// Returns true if no bytes are queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the free room in bytes. A closed FIFO has no room.
    #[must_use]
    pub fn free(&self) -> usize {
        let state = self.shared.state.lock();
        if state.closed {
            0
        } else {
            state.capacity - state.bytes.len()
        }
    }

    /// Returns the fixed capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.shared.state.lock().capacity
    }

    /// Queues as much of `data` as fits and returns the count.
    pub fn push(&self, data: &[u8]) -> usize {
        let accepted = {
            let mut state = self.shared.state.lock();
            if state.closed {
                return 0;
            }
            let room = state.capacity - state.bytes.len();
            let accepted = room.min(data.len());
            state.bytes.extend(&data[..accepted]);
            accepted
        };
        if accepted > 0 {
            self.shared.readable.notify_one();
        }
        accepted
    }

    /// Dequeues up to `buf.len()` bytes and returns the count.
    pub fn pop(&self, buf: &mut [u8]) -> usize {
        let taken = {
            let mut state = self.shared.state.lock();
            let taken = buf.len().min(state.bytes.len());
            for (slot, byte) in buf.iter_mut().zip(state.bytes.drain(..taken)) {
                *slot = byte;
            }
            taken
        };
        if taken > 0 {
            self.shared.writable.notify_one();
        }
        taken
    }

    /// Marks the FIFO closed. Queued bytes stay readable.
    pub fn close(&self) {
        self.shared.state.lock().closed = true;
        self.shared.readable.notify_waiters();
        self.shared.writable.notify_waiters();
        self.shared.readable.notify_one();
        self.shared.writable.notify_one();
    }

    /// Returns true once [`Fifo::close`] was called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shared.state.lock().closed
    }

    /// Waits until bytes are queued or the FIFO is closed.
    pub async fn readable(&self) {
        loop {
            let notified = self.shared.readable.notified();
            {
                let state = self.shared.state.lock();
                if !state.bytes.is_empty() || state.closed {
                    return;
                }
            }
            notified.await;
        }
    }

    /// Waits until there is room or the FIFO is closed.
    pub async fn writable(&self) {
        loop {
            let notified = self.shared.writable.notified();
            {
                let state = self.shared.state.lock();
                if state.bytes.len() < state.capacity || state.closed {
                    return;
                }
            }
            notified.await;
        }
    }
}
