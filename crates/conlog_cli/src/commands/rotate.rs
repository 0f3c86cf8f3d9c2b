//! Rotate command implementation.

use conlog_core::{RotationConfig, RotationEngine, RotationReport};
use conlog_storage::FileDirectory;
use std::path::Path;
use tracing::info;

/// Runs the rotate command.
pub fn run(log_dir: &Path, config: RotationConfig) -> Result<(), Box<dyn std::error::Error>> {
    let report = rotate(log_dir, config)?;
    println!("{}", describe(&report));
    Ok(())
}

/// Opens the log, runs one explicit rotation check and closes it again.
pub fn rotate(
    log_dir: &Path,
    config: RotationConfig,
) -> Result<RotationReport, Box<dyn std::error::Error>> {
    let dir = FileDirectory::open(log_dir)?;
    let renew_interval = config.renew_interval;
    let mut engine = RotationEngine::new(Box::new(dir), config);

    info!("Rotating log in {:?}", log_dir);
    engine.start(renew_interval)?;
    let report = engine.rotation_check();
    engine.stop();
    Ok(report)
}

fn describe(report: &RotationReport) -> String {
    let mut parts = Vec::new();
    if let Some(index) = report.deleted {
        parts.push(format!("deleted segment {}", index));
    }
    if report.deletion_refused {
        parts.push("low on space, oldest segment is in use".to_string());
    }
    if let Some(index) = report.rotated_to {
        parts.push(format!("rotated to segment {}", index));
    }
    if report.rotation_failed {
        parts.push("rotation failed".to_string());
    }
    if report.flushed {
        parts.push("flushed".to_string());
    }
    if parts.is_empty() {
        "nothing to do".to_string()
    } else {
        parts.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn rotates_oversized_segment() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("4"), vec![b'x'; 100]).unwrap();

        let config = RotationConfig::new().max_segment_size(64).reserve_free_bytes(0);
        rotate(dir.path(), config).unwrap();

        assert_eq!(fs::read(dir.path().join("4")).unwrap().len(), 100);
        assert!(dir.path().join("5").is_file());
    }

    #[test]
    fn describe_report() {
        assert_eq!(describe(&RotationReport::default()), "nothing to do");
        let report = RotationReport {
            deleted: Some(0),
            rotated_to: Some(9),
            ..RotationReport::default()
        };
        assert_eq!(describe(&report), "deleted segment 0, rotated to segment 9");
    }
}
