//! Console capture loop.

use crate::engine::RotationEngine;
use conlog_stream::ByteSource;
use tracing::error;

/// Pumps bytes from a console source into the rotating log.
///
/// Each [`pump`](Self::pump) moves at most one scratch buffer worth of
/// bytes and never waits for input.
#[derive(Debug)]
pub struct ConsoleCapture<S> {
    source: S,
}

impl<S: ByteSource> ConsoleCapture<S> {
    /// Wraps a console source.
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Moves available console bytes into `engine` and returns how many were
    /// read from the source.
    ///
    /// Without an open segment the call is reported and the source is left
    /// untouched, so capture resumes where it paused once the engine is
    /// started. A driver that already tracks the closed log, such as the
    /// `conlog run` daemon, skips the call instead and reports the pause
    /// once.
    pub fn pump(&mut self, engine: &mut RotationEngine, scratch: &mut [u8]) -> usize {
        if !engine.is_open() {
            error!("No log file open, console capture paused");
            return 0;
        }

        let len = self.source.available().min(scratch.len());
        if len == 0 {
            return 0;
        }

        let read = self.source.read(&mut scratch[..len]);
        engine.ingest(&scratch[..read]);
        read
    }

    /// Returns the source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Returns the source mutably.
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Unwraps the source.
    pub fn into_inner(self) -> S {
        self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RotationConfig;
    use crate::marker::MARKER_LEN;
    use conlog_storage::InMemoryDirectory;
    use conlog_stream::MemoryPort;
    use std::time::Duration;

    fn started(dir: &InMemoryDirectory) -> RotationEngine {
        let mut engine = RotationEngine::new(Box::new(dir.clone()), RotationConfig::default());
        engine.start(Duration::from_secs(600)).unwrap();
        engine
    }

    #[test]
    fn pump_moves_available_bytes() {
        let dir = InMemoryDirectory::new();
        let mut engine = started(&dir);
        let console = MemoryPort::new(64, 0);
        let mut capture = ConsoleCapture::new(console.clone());

        console.inject(b"boot\r\n");
        let mut scratch = [0u8; 32];
        assert_eq!(capture.pump(&mut engine, &mut scratch), 6);
        assert_eq!(capture.pump(&mut engine, &mut scratch), 0);
        assert!(engine.is_dirty());

        engine.stop();
        assert_eq!(&dir.contents("0").unwrap()[MARKER_LEN..], b"boot\r\n");
    }

    #[test]
    fn pump_is_bounded_by_scratch() {
        let dir = InMemoryDirectory::new();
        let mut engine = started(&dir);
        let console = MemoryPort::new(64, 0);
        let mut capture = ConsoleCapture::new(console.clone());

        console.inject(b"0123456789");
        let mut scratch = [0u8; 4];
        assert_eq!(capture.pump(&mut engine, &mut scratch), 4);
        assert_eq!(capture.source().available(), 6);
        assert_eq!(capture.pump(&mut engine, &mut scratch), 4);
        assert_eq!(capture.pump(&mut engine, &mut scratch), 2);
        assert_eq!(capture.pump(&mut engine, &mut scratch), 0);
    }

    #[test]
    fn pump_pauses_without_open_segment() {
        let dir = InMemoryDirectory::new();
        let mut engine = RotationEngine::new(Box::new(dir.clone()), RotationConfig::default());
        let console = MemoryPort::new(64, 0);
        let mut capture = ConsoleCapture::new(console.clone());

        console.inject(b"early");
        let mut scratch = [0u8; 32];
        assert_eq!(capture.pump(&mut engine, &mut scratch), 0);
        assert_eq!(console.rx().len(), 5);

        engine.start(Duration::from_secs(600)).unwrap();
        assert_eq!(capture.pump(&mut engine, &mut scratch), 5);
    }

    #[test]
    fn empty_scratch_moves_nothing() {
        let dir = InMemoryDirectory::new();
        let mut engine = started(&dir);
        let console = MemoryPort::new(8, 0);
        let mut capture = ConsoleCapture::new(console.clone());
        console.inject(b"x");
        assert_eq!(capture.pump(&mut engine, &mut []), 0);
        assert_eq!(capture.into_inner().available(), 1);
    }
}
