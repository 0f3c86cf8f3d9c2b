//! Periodic renewal deadline.

use std::time::{Duration, Instant};

/// A periodic deadline polled by the owner of the rotation engine.
///
/// The timer holds no thread or task of its own. The driver asks
/// [`fire_if_due`](Self::fire_if_due) between pump calls, so a rotation
/// check never overlaps with capture. Ticks missed while the driver was busy
/// are coalesced into one.
#[derive(Debug, Clone, Default)]
pub struct RenewalTimer {
    interval: Option<Duration>,
    next: Option<Instant>,
}

impl RenewalTimer {
    /// Creates a disarmed timer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms the timer to fire every `interval`, first at `now + interval`.
    ///
    /// Returns false, leaving the timer disarmed, if that deadline is not
    /// representable.
    pub fn arm(&mut self, interval: Duration, now: Instant) -> bool {
        match now.checked_add(interval) {
            Some(next) => {
                self.interval = Some(interval);
                self.next = Some(next);
                true
            }
            None => {
                self.disarm();
                false
            }
        }
    }

    /// Disarms the timer.
    pub fn disarm(&mut self) {
        self.interval = None;
        self.next = None;
    }

    /// Returns true if the timer is armed.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.next.is_some()
    }

    /// Returns the next deadline.
    #[must_use]
    pub fn next_due(&self) -> Option<Instant> {
        self.next
    }

    /// Returns true (once) if the deadline has passed, and schedules the
    /// next one after `now`. The timer disarms itself when the next
    /// deadline is not representable.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        let (Some(interval), Some(mut next)) = (self.interval, self.next) else {
            return false;
        };
        if now < next {
            return false;
        }
        if interval.is_zero() {
            next = now;
        } else {
            while next <= now {
                let Some(later) = next.checked_add(interval) else {
                    self.disarm();
                    return true;
                };
                next = later;
            }
        }
        self.next = Some(next);
        true
    }
}
