//! Approach segment export.
//!
//! Writes one CSV per segment, named deterministically from the segment
//! start (`approach_<YYYYMMDD>_<HHMMSS>.csv`), in the layout the loader
//! reads back as Format S: `Timestamp,AltMSL,AltGPS,VSpd,IAS` with empty
//! cells for absent values.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

use crate::types::ApproachSegment;

const EXPORT_HEADER: &str = "Timestamp,AltMSL,AltGPS,VSpd,IAS";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Errors raised while exporting segments.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Write one segment to `out_dir`, returning the file path.
///
/// A colliding file name (two segments starting the same second) is
/// overwritten; the caller sees the same path twice.
pub fn export_segment(segment: &ApproachSegment, out_dir: &Path) -> Result<PathBuf, ExportError> {
    std::fs::create_dir_all(out_dir)?;
    let path = out_dir.join(segment.export_file_name());

    let mut writer = BufWriter::new(File::create(&path)?);
    writeln!(writer, "{EXPORT_HEADER}")?;
    for record in &segment.records {
        writeln!(
            writer,
            "{},{},{},{},{}",
            record.timestamp.format(TIMESTAMP_FORMAT),
            cell(record.alt_msl),
            cell(record.alt_gps),
            cell(record.vspd),
            cell(record.ias),
        )?;
    }
    writer.flush()?;
    Ok(path)
}

/// Write every segment to `out_dir`, returning the written paths.
///
/// Segments with no records are skipped with a warning — an empty
/// segment is never exported or scored.
pub fn export_segments(
    segments: &[ApproachSegment],
    out_dir: &Path,
) -> Result<Vec<PathBuf>, ExportError> {
    let mut paths = Vec::with_capacity(segments.len());
    for segment in segments {
        if segment.records.is_empty() {
            warn!(
                start = %segment.start,
                "skipping export of segment with no records"
            );
            continue;
        }
        paths.push(export_segment(segment, out_dir)?);
    }
    Ok(paths)
}
