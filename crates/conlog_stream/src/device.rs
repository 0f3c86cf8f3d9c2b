//! Character devices and standard input as ports.
//!
//! Line settings (baud rate, parity, raw mode) are left to the platform,
//! e.g. `stty -F /dev/ttyUSB0 115200 raw`, before the device is opened.

use crate::error::{StreamError, StreamResult};
use crate::port::StreamPort;
use std::path::Path;
use tokio::fs::OpenOptions;

/// Opens a character device (typically a serial line) as a duplex port.
///
/// The device is opened twice, once per direction, so a pending read never
/// holds up writes.
///
/// # Errors
///
/// Returns [`StreamError::Device`] if either handle cannot be opened.
pub async fn open_device(
    path: &Path,
    rx_capacity: usize,
    tx_capacity: usize,
) -> StreamResult<StreamPort> {
    let device_error = |source| StreamError::Device {
        path: path.display().to_string(),
        source,
    };

    let reader = OpenOptions::new()
        .read(true)
        .open(path)
        .await
        .map_err(device_error)?;
    let writer = OpenOptions::new()
        .write(true)
        .open(path)
        .await
        .map_err(device_error)?;

    Ok(StreamPort::spawn(
        path.display().to_string(),
        reader,
        writer,
        rx_capacity,
        tx_capacity,
    ))
}

/// Opens a device or file for reading only; writes to the port are
/// discarded.
///
/// # Errors
///
/// Returns [`StreamError::Device`] if the path cannot be opened.
pub async fn open_source(path: &Path, rx_capacity: usize) -> StreamResult<StreamPort> {
    let reader = OpenOptions::new()
        .read(true)
        .open(path)
        .await
        .map_err(|source| StreamError::Device {
            path: path.display().to_string(),
            source,
        })?;

    Ok(StreamPort::spawn(
        path.display().to_string(),
        reader,
        tokio::io::sink(),
        rx_capacity,
        1,
    ))
}

/// Wraps the process's standard input as a read-only port.
#[must_use]
pub fn stdin_source(rx_capacity: usize) -> StreamPort {
    StreamPort::spawn("stdin", tokio::io::stdin(), tokio::io::sink(), rx_capacity, 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::ByteSource;
    use std::time::Duration;

    #[tokio::test]
    async fn open_source_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("console.txt");
        std::fs::write(&path, b"boot ok\n").unwrap();

        let mut port = open_source(&path, 64).await.unwrap();
        for _ in 0..200 {
            if port.available() == 8 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let mut buf = [0u8; 64];
        let n = port.read(&mut buf);
        assert_eq!(&buf[..n], b"boot ok\n");
    }

    #[tokio::test]
    async fn missing_device_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let result = open_device(&dir.path().join("ttyNONE"), 16, 16).await;
        assert!(matches!(result, Err(StreamError::Device { .. })));
    }
}
