//! Dump command implementation.

use conlog_core::{parse_segment_name, segment_name, strip_markers};
use conlog_storage::{FileDirectory, SegmentDirectory};
use std::io::Write;
use std::path::Path;

/// Runs the dump command.
pub fn run(
    log_dir: &Path,
    segment: Option<u64>,
    no_markers: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !log_dir.is_dir() {
        return Err(format!("No log directory at {:?}", log_dir).into());
    }
    let dir = FileDirectory::open(log_dir)?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    write_segments(&dir, segment, no_markers, &mut out)?;
    out.flush()?;
    Ok(())
}

/// Writes one segment, or all of them oldest first, to `out`.
pub fn write_segments(
    dir: &dyn SegmentDirectory,
    segment: Option<u64>,
    no_markers: bool,
    out: &mut dyn Write,
) -> Result<(), Box<dyn std::error::Error>> {
    let indices = match segment {
        Some(index) => vec![index],
        None => {
            let mut all: Vec<u64> = dir
                .list()?
                .iter()
                .filter_map(|name| parse_segment_name(name))
                .collect();
            all.sort_unstable();
            all
        }
    };

    for index in indices {
        let content = dir.read_segment(&segment_name(index))?;
        if no_markers {
            out.write_all(&strip_markers(&content))?;
        } else {
            out.write_all(&content)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use conlog_core::{local_now, timestamp_marker, MARKER_LEN};
    use conlog_storage::InMemoryDirectory;

    fn marked(text: &str) -> Vec<u8> {
        let mut data = timestamp_marker(local_now()).into_bytes();
        data.extend_from_slice(text.as_bytes());
        data
    }

    #[test]
    fn dumps_all_segments_in_index_order() {
        let dir = InMemoryDirectory::new();
        dir.insert("10", marked("third"));
        dir.insert("2", marked("first"));
        dir.insert("3", marked("second"));
        dir.insert("notes", b"skipped".to_vec());

        let mut out = Vec::new();
        write_segments(&dir, None, true, &mut out).unwrap();
        assert_eq!(out, b"firstsecondthird");
    }

    #[test]
    fn dumps_one_segment_with_markers() {
        let dir = InMemoryDirectory::new();
        dir.insert("0", marked("zero"));
        dir.insert("1", marked("one"));

        let mut out = Vec::new();
        write_segments(&dir, Some(1), false, &mut out).unwrap();
        assert_eq!(out.len(), MARKER_LEN + 3);
        assert!(out.ends_with(b"one"));
    }

    #[test]
    fn missing_segment_is_an_error() {
        let dir = InMemoryDirectory::new();
        let mut out = Vec::new();
        assert!(write_segments(&dir, Some(7), false, &mut out).is_err());
    }
}
