//! Inspect command implementation.

use conlog_core::LogStats;
use conlog_storage::FileDirectory;
use serde::Serialize;
use std::path::Path;

/// Log directory inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Log directory path.
    pub path: String,
    /// Segment statistics.
    #[serde(flatten)]
    pub stats: LogStats,
}

/// Runs the inspect command.
pub fn run(log_dir: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let result = inspect(log_dir)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print!("{}", render_text(&result));
        }
    }

    Ok(())
}

/// Collects statistics for an existing log directory.
pub fn inspect(log_dir: &Path) -> Result<InspectResult, Box<dyn std::error::Error>> {
    if !log_dir.is_dir() {
        return Err(format!("No log directory at {:?}", log_dir).into());
    }
    let dir = FileDirectory::open(log_dir)?;
    Ok(InspectResult {
        path: log_dir.display().to_string(),
        stats: LogStats::collect(&dir)?,
    })
}

fn index_or_dash(index: Option<u64>) -> String {
    index.map_or_else(|| "-".to_string(), |i| i.to_string())
}

fn render_text(result: &InspectResult) -> String {
    let stats = &result.stats;
    let mut out = String::new();
    out.push_str(&format!("Log directory: {}\n", result.path));
    out.push_str(&format!("Segments:      {}\n", stats.segment_count));
    out.push_str(&format!("Total size:    {} bytes\n", stats.total_bytes));
    out.push_str(&format!("Oldest:        {}\n", index_or_dash(stats.oldest)));
    out.push_str(&format!("Newest:        {}\n", index_or_dash(stats.newest)));
    out.push_str(&format!(
        "Free space:    {} of {} bytes\n",
        stats.free_bytes, stats.capacity_bytes
    ));
    if !stats.segments.is_empty() {
        out.push('\n');
        for (index, size) in &stats.segments {
            out.push_str(&format!("  {:>8}  {:>10} bytes\n", index, size));
        }
    }
    out
}
