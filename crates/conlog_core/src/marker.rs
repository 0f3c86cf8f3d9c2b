//! Timestamp markers.
//!
//! A marker is an ASCII line pair inserted into segment content when a
//! segment is created and on every idle flush:
//!
//! ```text
//! \n\n<LogTimeStamp> YYYY-MM-DD HH:MM:SS\n\n
//! ```
//!
//! The time is local time at second resolution. Readers use markers as
//! delimiters between captured payload bytes; nothing escapes payload, so a
//! console that prints a well-formed marker line is indistinguishable from a
//! real one.

use chrono::{Local, NaiveDateTime};

/// Bytes preceding the timestamp.
pub const MARKER_PREFIX: &[u8] = b"\n\n<LogTimeStamp> ";

/// Bytes following the timestamp.
pub const MARKER_SUFFIX: &[u8] = b"\n\n";

/// `chrono` format of the timestamp.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const TIMESTAMP_LEN: usize = 19;

/// Length of every marker in bytes.
pub const MARKER_LEN: usize = MARKER_PREFIX.len() + TIMESTAMP_LEN + MARKER_SUFFIX.len();

/// Formats the marker for `time`.
#[must_use]
pub fn timestamp_marker(time: NaiveDateTime) -> String {
    format!("\n\n<LogTimeStamp> {}\n\n", time.format(TIMESTAMP_FORMAT))
}

/// Current local wall-clock time.
#[must_use]
pub fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Parses a marker at the start of `bytes`.
#[must_use]
pub fn parse_marker(bytes: &[u8]) -> Option<NaiveDateTime> {
    let marker = bytes.get(..MARKER_LEN)?;
    if !marker.starts_with(MARKER_PREFIX) || !marker.ends_with(MARKER_SUFFIX) {
        return None;
    }
    let stamp = &marker[MARKER_PREFIX.len()..MARKER_PREFIX.len() + TIMESTAMP_LEN];
    let stamp = std::str::from_utf8(stamp).ok()?;
    NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).ok()
}

/// A piece of segment content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chunk<'a> {
    /// A timestamp marker.
    Marker(NaiveDateTime),
    /// Captured bytes between markers.
    Payload(&'a [u8]),
}

/// Iterator splitting segment content into markers and payload.
///
/// Payload chunks are never empty and adjacent payload is never split, so
/// concatenating all payload chunks yields the captured bytes.
#[derive(Debug, Clone)]
pub struct SegmentReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SegmentReader<'a> {
    /// Creates a reader over a segment's bytes.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn find_marker(&self, from: usize) -> Option<(usize, NaiveDateTime)> {
        let mut start = from;
        while start < self.data.len() {
            let offset = self.data[start..]
                .windows(MARKER_PREFIX.len())
                .position(|w| w == MARKER_PREFIX)?;
            let at = start + offset;
            if let Some(time) = parse_marker(&self.data[at..]) {
                return Some((at, time));
            }
            start = at + 1;
        }
        None
    }
}

impl<'a> Iterator for SegmentReader<'a> {
    type Item = Chunk<'a>;

    fn next(&mut self) -> Option<Chunk<'a>> {
        if self.pos >= self.data.len() {
            return None;
        }
        match self.find_marker(self.pos) {
            Some((at, time)) if at == self.pos => {
                self.pos += MARKER_LEN;
                Some(Chunk::Marker(time))
            }
            Some((at, _)) => {
                let payload = &self.data[self.pos..at];
                self.pos = at;
                Some(Chunk::Payload(payload))
            }
            None => {
                let payload = &self.data[self.pos..];
                self.pos = self.data.len();
                Some(Chunk::Payload(payload))
            }
        }
    }
}

/// Splits segment content into markers and payload.
#[must_use]
pub fn split_markers(data: &[u8]) -> SegmentReader<'_> {
    SegmentReader::new(data)
}

/// Returns the segment content with all markers removed.
#[must_use]
pub fn strip_markers(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    for chunk in split_markers(data) {
        if let Chunk::Payload(bytes) = chunk {
            out.extend_from_slice(bytes);
        }
    }
    out
}
