//! The rotating log engine.

use crate::config::{validate_renew_interval, RotationConfig, MAX_RENEW_INTERVAL};
use crate::error::{CoreError, CoreResult};
use crate::index::{segment_name, SegmentIndexTracker};
use crate::marker::{local_now, timestamp_marker};
use crate::timer::RenewalTimer;
use chrono::NaiveDateTime;
use conlog_storage::{SegmentDirectory, StorageBackend, StorageResult};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// What a rotation check did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RotationReport {
    /// Index of the segment deleted to reclaim space.
    pub deleted: Option<u64>,
    /// Space was short but the oldest segment is the open one.
    pub deletion_refused: bool,
    /// Index of the segment rotated to.
    pub rotated_to: Option<u64>,
    /// The open segment was over size but the next one could not be created.
    pub rotation_failed: bool,
    /// The open segment was synced to storage without rotating.
    pub flushed: bool,
}

impl RotationReport {
    /// Returns true if the check added or removed a segment.
    #[must_use]
    pub fn mutated(&self) -> bool {
        self.deleted.is_some() || self.rotated_to.is_some()
    }
}

struct OpenSegment {
    index: u64,
    backend: Box<dyn StorageBackend>,
}

/// Owns the segment directory and the one open segment.
///
/// The engine is driven from a single context: the driver calls
/// [`ingest`](Self::ingest) (usually through [`crate::ConsoleCapture`]) and
/// [`poll_timer`](Self::poll_timer) in turn, both through `&mut self`, so a
/// rotation check can never run in the middle of a write.
///
/// # Example
///
/// ```rust
/// use conlog_core::{RotationConfig, RotationEngine};
/// use conlog_storage::InMemoryDirectory;
/// use std::time::Duration;
///
/// let dir = InMemoryDirectory::new();
/// let mut engine = RotationEngine::new(Box::new(dir.clone()), RotationConfig::default());
/// engine.start(Duration::from_secs(600)).unwrap();
/// assert_eq!(engine.ingest(b"boot\r\n"), 6);
/// engine.stop();
/// assert_eq!(dir.names(), vec!["0".to_string()]);
/// ```
pub struct RotationEngine {
    dir: Box<dyn SegmentDirectory>,
    config: RotationConfig,
    tracker: SegmentIndexTracker,
    open: Option<OpenSegment>,
    dirty: bool,
    timer: RenewalTimer,
    clock: fn() -> NaiveDateTime,
}

impl RotationEngine {
    /// Creates a stopped engine over `dir`.
    #[must_use]
    pub fn new(dir: Box<dyn SegmentDirectory>, config: RotationConfig) -> Self {
        Self {
            dir,
            config,
            tracker: SegmentIndexTracker::new(),
            open: None,
            dirty: false,
            timer: RenewalTimer::new(),
            clock: local_now,
        }
    }

    /// Replaces the wall clock used for markers.
    #[must_use]
    pub fn with_clock(mut self, clock: fn() -> NaiveDateTime) -> Self {
        self.clock = clock;
        self
    }

    /// Opens the newest segment (creating segment 0 in an empty directory),
    /// runs one rotation check and arms the renewal timer.
    ///
    /// Starting a running engine closes its open segment first.
    ///
    /// # Errors
    ///
    /// Returns an error if `renew_interval` is zero or longer than
    /// [`MAX_RENEW_INTERVAL`], the directory cannot be scanned, or the
    /// segment cannot be created or opened. The engine stays stopped in that
    /// case.
    pub fn start(&mut self, renew_interval: Duration) -> CoreResult<()> {
        validate_renew_interval(renew_interval)?;
        if self.open.is_some() {
            self.stop();
        }

        self.tracker.refresh(&*self.dir)?;
        let index = self.tracker.newest().unwrap_or(0);
        let name = segment_name(index);
        let path = self.dir.display_path(&name);

        let exists = self.dir.exists(&name)?;
        let backend = if exists {
            info!("Open file {}", path);
            self.dir.open_append(&name)
        } else {
            info!("Create file {}", path);
            self.create_segment(index)
        }
        .map_err(|e| CoreError::segment_unavailable(path, e))?;

        self.open = Some(OpenSegment { index, backend });
        self.dirty = false;
        if !exists {
            if let Err(e) = self.tracker.refresh(&*self.dir) {
                warn!("Cannot rescan log directory: {}", e);
            }
        }

        self.rotation_check();
        if !self.timer.arm(renew_interval, Instant::now()) {
            self.stop();
            return Err(CoreError::invalid_config(format!(
                "renew interval {:?} overflows the clock",
                renew_interval
            )));
        }
        debug!("Renewal every {:?}", renew_interval);
        Ok(())
    }

    /// Closes the open segment and disarms the timer. Safe to call at any
    /// time, including on a stopped engine.
    pub fn stop(&mut self) {
        self.timer.disarm();
        if let Some(segment) = self.open.take() {
            self.close_segment(segment);
        }
        self.dirty = false;
    }

    /// Appends captured bytes to the open segment and returns how many were
    /// written.
    ///
    /// A short write is logged and accepted as is. Without an open segment
    /// nothing is written.
    pub fn ingest(&mut self, data: &[u8]) -> usize {
        if data.is_empty() {
            return 0;
        }
        let Some(segment) = self.open.as_mut() else {
            error!("No log file open");
            return 0;
        };

        let written = match segment.backend.write(data) {
            Ok(n) => n,
            Err(e) => {
                error!("Write to {} failed: {}", segment.backend.name(), e);
                0
            }
        };
        if written != data.len() {
            warn!("Write failed: {}/{}", written, data.len());
        }
        if written > 0 {
            self.dirty = true;
        }
        written
    }

    /// Runs space reclamation, size rotation and the idle flush, in that
    /// order.
    ///
    /// Does nothing on a stopped engine.
    pub fn rotation_check(&mut self) -> RotationReport {
        let mut report = RotationReport::default();
        if self.open.is_none() {
            debug!("Rotation check skipped, no log file open");
            return report;
        }

        self.reclaim_space(&mut report);
        self.rotate_if_full(&mut report);

        if !report.mutated() && self.dirty {
            self.idle_flush(&mut report);
        }

        if report.mutated() {
            if let Err(e) = self.tracker.refresh(&*self.dir) {
                warn!("Cannot rescan log directory: {}", e);
            }
        }
        report
    }

    /// Runs a rotation check if the renewal deadline has passed.
    pub fn poll_timer(&mut self, now: Instant) -> Option<RotationReport> {
        if self.timer.fire_if_due(now) {
            Some(self.rotation_check())
        } else {
            None
        }
    }

    /// Returns the next renewal deadline while running.
    #[must_use]
    pub fn next_renewal(&self) -> Option<Instant> {
        self.timer.next_due()
    }

    /// Returns the lowest segment index seen by the last scan.
    #[must_use]
    pub fn oldest_index(&self) -> Option<u64> {
        self.tracker.oldest()
    }

    /// Returns the highest segment index seen by the last scan.
    #[must_use]
    pub fn newest_index(&self) -> Option<u64> {
        self.tracker.newest()
    }

    /// Returns the index of the open segment.
    #[must_use]
    pub fn open_index(&self) -> Option<u64> {
        self.open.as_ref().map(|s| s.index)
    }

    /// Returns the current size of the open segment.
    #[must_use]
    pub fn open_size(&self) -> Option<u64> {
        self.open.as_ref().and_then(|s| s.backend.size().ok())
    }

    /// Returns true if a segment is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// Returns true if bytes were written since the last flush.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &RotationConfig {
        &self.config
    }

    /// Returns the segment directory.
    #[must_use]
    pub fn directory(&self) -> &dyn SegmentDirectory {
        &*self.dir
    }

    fn reclaim_space(&mut self, report: &mut RotationReport) {
        let free = match self.dir.space() {
            Ok(space) => space.free_bytes(),
            Err(e) => {
                warn!("Cannot query free space: {}", e);
                return;
            }
        };
        if free >= self.config.reserve_free_bytes {
            return;
        }

        let Some(oldest) = self.tracker.oldest() else {
            return;
        };
        let name = segment_name(oldest);
        let path = self.dir.display_path(&name);

        if self.open_index() == Some(oldest) {
            warn!("Cannot delete current log file {} ({} bytes free)", path, free);
            report.deletion_refused = true;
            return;
        }

        info!("Deleting file {} ({} bytes free)", path, free);
        match self.dir.remove(&name) {
            Ok(()) => report.deleted = Some(oldest),
            Err(e) => {
                warn!("Cannot delete {}: {}", path, e);
                if let Err(e) = self.tracker.refresh(&*self.dir) {
                    warn!("Cannot rescan log directory: {}", e);
                }
            }
        }
    }

    fn rotate_if_full(&mut self, report: &mut RotationReport) {
        let Some(segment) = self.open.as_ref() else {
            return;
        };
        let size = match segment.backend.size() {
            Ok(size) => size,
            Err(e) => {
                warn!("Cannot size {}: {}", segment.backend.name(), e);
                return;
            }
        };
        if size <= self.config.max_segment_size {
            return;
        }

        let newest = self.tracker.newest().unwrap_or(segment.index).max(segment.index);
        let Some(next) = newest.checked_add(1) else {
            error!("Segment index space exhausted at {}", newest);
            report.rotation_failed = true;
            self.commit_open(report);
            return;
        };
        let path = self.dir.display_path(&segment_name(next));

        info!("Create file {}", path);
        match self.create_segment(next) {
            Ok(backend) => {
                let previous = self.open.replace(OpenSegment {
                    index: next,
                    backend,
                });
                if let Some(previous) = previous {
                    self.close_segment(previous);
                }
                self.dirty = false;
                report.rotated_to = Some(next);
            }
            Err(e) => {
                error!("Failed to create file {}: {}", path, e);
                report.rotation_failed = true;
                self.commit_open(report);
            }
        }
    }

    fn idle_flush(&mut self, report: &mut RotationReport) {
        let marker = timestamp_marker((self.clock)());
        let Some(segment) = self.open.as_mut() else {
            return;
        };
        match segment.backend.write(marker.as_bytes()) {
            Ok(n) if n == marker.len() => {}
            Ok(n) => warn!("Write failed: {}/{}", n, marker.len()),
            Err(e) => warn!("Cannot write marker to {}: {}", segment.backend.name(), e),
        }
        self.commit_open(report);
    }

    fn commit_open(&mut self, report: &mut RotationReport) {
        let Some(segment) = self.open.as_mut() else {
            return;
        };
        match segment.backend.sync() {
            Ok(()) => {
                self.dirty = false;
                report.flushed = true;
            }
            Err(e) => error!("Sync of {} failed: {}", segment.backend.name(), e),
        }
    }

    /// Creates segment `index` holding a single marker, made durable before
    /// the handle is returned.
    fn create_segment(&mut self, index: u64) -> StorageResult<Box<dyn StorageBackend>> {
        let name = segment_name(index);
        let marker = timestamp_marker((self.clock)());

        let result = self.dir.create(&name).and_then(|mut segment| {
            let written = segment.write(marker.as_bytes())?;
            if written != marker.len() {
                warn!("Write failed: {}/{}", written, marker.len());
            }
            segment.close()?;
            self.dir.open_append(&name)
        });

        if result.is_err() && matches!(self.dir.exists(&name), Ok(true)) {
            if let Err(e) = self.dir.remove(&name) {
                debug!("Cannot remove incomplete {}: {}", name, e);
            }
        }
        result
    }

    fn close_segment(&self, segment: OpenSegment) {
        let path = self.dir.display_path(&segment_name(segment.index));
        let size = segment.backend.size().unwrap_or(0);
        match segment.backend.close() {
            Ok(()) => info!("Closed file {}, size {}", path, size),
            Err(e) => error!("Close of {} failed: {}", path, e),
        }
    }
}

impl std::fmt::Debug for RotationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotationEngine")
            .field("config", &self.config)
            .field("tracker", &self.tracker)
            .field("open", &self.open_index())
            .field("dirty", &self.dirty)
            .field("timer", &self.timer)
            .finish_non_exhaustive()
    }
}

impl Drop for RotationEngine {
    fn drop(&mut self) {
        self.stop();
    }
}
