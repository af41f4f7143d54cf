//! Flight Log CSV Adapter
//!
//! Parses flight-data-recorder CSV logs into `FlightRecord` series.
//! Supports three layouts, auto-detected from the header row:
//!
//! **Format A — avionics log:**
//! Descriptive mnemonic columns (`AltMSL`, `AltGPS`, `VSpd`, `IAS`) with
//! the timestamp split across `Lcl Date` + `Lcl Time`. Logs of this kind
//! carry free-form preamble lines before the header row; the header is
//! recognized by containing both `AltMSL` and `VSpd`.
//!
//! **Format B — generic logger:**
//! Lowercase headers with unit suffixes, e.g. `#yyy-mm-dd`, `hh:mm:ss`,
//! `ft msl`. Column names are trimmed and lowercased; duplicate columns
//! are dropped (first occurrence wins); numeric cells are scrubbed of
//! stray non-numeric characters before parsing.
//!
//! **Format S — exported segment:**
//! This crate's own export layout: a single `Timestamp` column plus the
//! record channels, so exported segments can be re-read by the same
//! loader.
//!
//! Rows without a parseable timestamp are dropped. The emitted series is
//! sorted ascending by timestamp with duplicate instants removed (first
//! sample wins).

use chrono::NaiveDateTime;
use regex::Regex;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::OnceLock;
use thiserror::Error;
use tracing::debug;

use crate::types::FlightRecord;

/// Timestamp layout shared by all three formats.
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// Fallback for segment files written with fractional seconds.
const DATETIME_FORMAT_FRACTIONAL: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Errors raised while loading one flight log.
///
/// Insufficient data is not an error — a short-but-parseable file loads
/// fine and simply yields too few samples downstream. These variants all
/// mean the file itself is malformed.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no recognizable header row in {path}")]
    MissingHeader { path: String },

    #[error("no valid records in {path}")]
    NoValidRecords { path: String },
}

// ============================================================================
// CSV Quote-Aware Parsing
// ============================================================================

/// Split a CSV line respecting quoted fields (commas inside quotes stay
/// inside their cell; doubled quotes unescape to one).
fn csv_split(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes && chars.peek() == Some(&'"') {
                    cell.push('"');
                    chars.next();
                } else {
                    in_quotes = !in_quotes;
                }
            }
            ',' if !in_quotes => {
                cells.push(std::mem::take(&mut cell));
            }
            _ => cell.push(ch),
        }
    }
    cells.push(cell);
    cells
}

// ============================================================================
// Format Detection & Column Mapping
// ============================================================================

/// Detected CSV layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    /// Avionics log: `Lcl Date` + `Lcl Time`, mnemonic channel columns
    Avionics,
    /// Generic logger: lowercase unit-suffixed headers
    Generic,
    /// Exported approach segment: single `Timestamp` column
    Segment,
}

/// Maps channel names to cell indices for the detected format.
#[derive(Debug, Clone, Copy, Default)]
struct ColumnMap {
    date: Option<usize>,
    time: Option<usize>,
    timestamp: Option<usize>,
    alt_msl: Option<usize>,
    alt_gps: Option<usize>,
    vspd: Option<usize>,
    ias: Option<usize>,
}

impl ColumnMap {
    fn from_header(header: &str, format: LogFormat) -> Self {
        let cells = csv_split(header);
        let mut map = Self::default();

        for (idx, cell) in cells.iter().enumerate() {
            let name = cell.trim();
            // First occurrence wins everywhere: duplicate columns are dropped.
            let slot = match format {
                LogFormat::Avionics => match name {
                    "Lcl Date" => &mut map.date,
                    "Lcl Time" => &mut map.time,
                    "AltMSL" => &mut map.alt_msl,
                    "AltGPS" => &mut map.alt_gps,
                    "VSpd" => &mut map.vspd,
                    "IAS" => &mut map.ias,
                    _ => continue,
                },
                LogFormat::Segment => match name {
                    "Timestamp" => &mut map.timestamp,
                    "AltMSL" => &mut map.alt_msl,
                    "AltGPS" => &mut map.alt_gps,
                    "VSpd" => &mut map.vspd,
                    "IAS" => &mut map.ias,
                    _ => continue,
                },
                LogFormat::Generic => match name.to_lowercase().as_str() {
                    "#yyy-mm-dd" | "date" => &mut map.date,
                    "hh:mm:ss" | "time" => &mut map.time,
                    "ft msl" | "altitude" => &mut map.alt_msl,
                    _ => continue,
                },
            };
            slot.get_or_insert(idx);
        }
        map
    }
}

/// Find the header row and its format.
///
/// Segment headers also contain the avionics mnemonics, so the
/// `Timestamp` check runs first.
fn detect_header(lines: &[String]) -> Option<(usize, LogFormat)> {
    for (i, line) in lines.iter().enumerate() {
        if line.contains("AltMSL") {
            if line.contains("Timestamp") {
                return Some((i, LogFormat::Segment));
            }
            if line.contains("VSpd") {
                return Some((i, LogFormat::Avionics));
            }
        }
        let lower = line.to_lowercase();
        if lower.contains("ft msl") && (lower.contains("hh:mm:ss") || lower.contains("#yyy")) {
            return Some((i, LogFormat::Generic));
        }
    }
    None
}

// ============================================================================
// Cell Parsing
// ============================================================================

fn numeric_scrub() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^0-9.\-]").expect("literal pattern"))
}

/// Parse one numeric cell. Falls back to scrubbing stray characters
/// (thousands separators, unit suffixes) before giving up. Non-finite
/// values are treated as absent.
fn parse_numeric(cells: &[String], idx: Option<usize>) -> Option<f64> {
    let raw = cells.get(idx?)?.trim();
    if raw.is_empty() {
        return None;
    }
    let value = raw
        .parse::<f64>()
        .ok()
        .or_else(|| numeric_scrub().replace_all(raw, "").parse::<f64>().ok())?;
    value.is_finite().then_some(value)
}

fn parse_timestamp(cells: &[String], map: &ColumnMap, format: LogFormat) -> Option<NaiveDateTime> {
    match format {
        LogFormat::Avionics | LogFormat::Generic => {
            let date = cells.get(map.date?)?.trim();
            let time = cells.get(map.time?)?.trim();
            if date.is_empty() || time.is_empty() {
                return None;
            }
            NaiveDateTime::parse_from_str(&format!("{date} {time}"), DATETIME_FORMAT).ok()
        }
        LogFormat::Segment => {
            let raw = cells.get(map.timestamp?)?.trim();
            NaiveDateTime::parse_from_str(raw, DATETIME_FORMAT)
                .or_else(|_| NaiveDateTime::parse_from_str(raw, DATETIME_FORMAT_FRACTIONAL))
                .ok()
        }
    }
}

// ============================================================================
// Loader
// ============================================================================

/// Load one flight log (or exported segment) into a record series.
///
/// The result is sorted ascending by timestamp with duplicate instants
/// removed. Rows without a parseable timestamp are dropped; a file with
/// no recognizable header or zero surviving rows is malformed.
pub fn load_flight_csv(path: &Path) -> Result<Vec<FlightRecord>, IngestError> {
    let file = File::open(path)?;
    let lines: Vec<String> = BufReader::new(file).lines().collect::<Result<_, _>>()?;

    let (header_idx, format) = detect_header(&lines).ok_or_else(|| IngestError::MissingHeader {
        path: path.display().to_string(),
    })?;
    let map = ColumnMap::from_header(&lines[header_idx], format);

    let mut records = Vec::with_capacity(lines.len().saturating_sub(header_idx + 1));
    let mut dropped_rows = 0usize;
    for line in &lines[header_idx + 1..] {
        if line.trim().is_empty() {
            continue;
        }
        let cells = csv_split(line);
        let Some(timestamp) = parse_timestamp(&cells, &map, format) else {
            dropped_rows += 1;
            continue;
        };
        records.push(FlightRecord {
            timestamp,
            alt_msl: parse_numeric(&cells, map.alt_msl),
            alt_gps: parse_numeric(&cells, map.alt_gps),
            vspd: parse_numeric(&cells, map.vspd),
            ias: parse_numeric(&cells, map.ias),
        });
    }

    records.sort_by_key(|r| r.timestamp);
    let parsed = records.len();
    records.dedup_by_key(|r| r.timestamp);
    let duplicates = parsed - records.len();

    if records.is_empty() {
        return Err(IngestError::NoValidRecords {
            path: path.display().to_string(),
        });
    }

    debug!(
        path = %path.display(),
        format = ?format,
        records = records.len(),
        dropped_rows,
        duplicates,
        "loaded flight log"
    );
    Ok(records)
}
