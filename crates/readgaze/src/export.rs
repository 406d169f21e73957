//! CSV export of processed samples and import of recorded sessions

use crate::error::{GazeError, Result};
use crate::types::{GazeSample, RawFrame};
use csv::StringRecord;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub const CSV_HEADER: [&str; 13] = [
    "RelativeTimestamp_ms",
    "RawX",
    "RawY",
    "SmoothX",
    "SmoothY",
    "VelX",
    "VelY",
    "Type",
    "ReturnSweep",
    "LineIndex",
    "CharIndex",
    "AlgoLineIndex",
    "Extrema",
];

/// Write a header record followed by one record per sample.
pub fn write_csv<W: Write>(out: W, samples: &[GazeSample]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(CSV_HEADER)?;
    for s in samples {
        writer.write_record(&format_row(s))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn format_row(s: &GazeSample) -> [String; 13] {
    [
        format!("{}", s.t),
        opt_fixed(s.x, 2),
        opt_fixed(s.y, 2),
        format!("{:.2}", s.gx),
        format!("{:.2}", s.gy),
        format!("{:.4}", s.vx),
        format!("{:.4}", s.vy),
        s.kind.as_str().to_string(),
        if s.is_return_sweep { "TRUE".to_string() } else { String::new() },
        opt_display(s.line_index),
        opt_display(s.char_index),
        opt_display(s.detected_line),
        s.extremum.map(|e| e.as_str().to_string()).unwrap_or_default(),
    ]
}

fn opt_fixed(v: Option<f64>, decimals: usize) -> String {
    match v {
        Some(v) if v.is_finite() => format!("{:.*}", decimals, v),
        _ => String::new(),
    }
}

fn opt_display(v: Option<u32>) -> String {
    v.map(|v| v.to_string()).unwrap_or_default()
}

pub fn export_csv(path: &Path, samples: &[GazeSample]) -> Result<()> {
    let file = File::create(path)?;
    write_csv(BufWriter::new(file), samples)?;
    log::info!("Exported {} samples to {}", samples.len(), path.display());
    Ok(())
}

/// Tab when the first line has more tabs than commas.
pub fn detect_delimiter(first_line: &str) -> u8 {
    let tabs = first_line.matches('\t').count();
    let commas = first_line.matches(',').count();
    if tabs > commas {
        b'\t'
    } else {
        b','
    }
}

/// A header is present when the first field is not a number.
pub fn has_header(first: &StringRecord) -> bool {
    first.get(0).unwrap_or("").parse::<f64>().is_err()
}

/// Column positions of the fields the pipeline reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Columns {
    pub time: usize,
    pub x: usize,
    pub y: usize,
    pub line: Option<usize>,
    pub char: Option<usize>,
}

impl Default for Columns {
    fn default() -> Self {
        Self {
            time: 0,
            x: 1,
            y: 2,
            line: None,
            char: None,
        }
    }
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

// Exact match on each pattern first; substring match only for patterns
// longer than one character.
fn find_column(headers: &[String], patterns: &[&str]) -> Option<usize> {
    for pattern in patterns {
        if let Some(i) = headers.iter().position(|h| h == pattern) {
            return Some(i);
        }
        if pattern.len() > 1 {
            if let Some(i) = headers.iter().position(|h| h.contains(pattern)) {
                return Some(i);
            }
        }
    }
    None
}

pub fn resolve_columns(header: &[&str]) -> Columns {
    let headers: Vec<String> = header.iter().map(|h| normalize(h)).collect();
    let fallback = Columns::default();
    Columns {
        time: find_column(&headers, &["time", "t"]).unwrap_or(fallback.time),
        x: find_column(&headers, &["rawx", "x"]).unwrap_or(fallback.x),
        y: find_column(&headers, &["rawy", "y"]).unwrap_or(fallback.y),
        line: find_column(&headers, &["lineindex", "line", "answer"]),
        char: find_column(&headers, &["charindex", "char"]),
    }
}

/// Parse a recorded session. Rows that cannot be used are skipped.
pub fn parse_csv(text: &str) -> Vec<RawFrame> {
    let Some(first) = text.lines().find(|l| !l.trim().is_empty()) else {
        return Vec::new();
    };
    let delimiter = detect_delimiter(first);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut layout: Option<Columns> = None;
    let mut frames = Vec::new();
    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                log::warn!("Skipping unreadable CSV row: {}", e);
                continue;
            }
        };
        let line = record.position().map_or(0, |p| p.line());

        let columns = match layout {
            Some(c) => c,
            None => {
                let header = has_header(&record);
                let resolved = if header {
                    resolve_columns(&record.iter().collect::<Vec<_>>())
                } else {
                    Columns::default()
                };
                log::debug!("CSV columns: {:?} (delimiter {:?})", resolved, delimiter as char);
                layout = Some(resolved);
                if header {
                    continue;
                }
                resolved
            }
        };

        if record.len() < 3 {
            log::warn!("Skipping line {}: expected at least 3 fields, got {}", line, record.len());
            continue;
        }
        let Some(timestamp) = field(&record, columns.time).and_then(|v| v.parse::<f64>().ok()) else {
            log::warn!("Skipping line {}: unparseable timestamp", line);
            continue;
        };

        let coord = |i: usize| field(&record, i).and_then(|v| v.parse::<f64>().ok()).unwrap_or(f64::NAN);
        let mut frame = RawFrame::new(timestamp, coord(columns.x), coord(columns.y));
        frame.line_index = columns.line.and_then(|i| parse_index(field(&record, i)));
        frame.char_index = columns.char.and_then(|i| parse_index(field(&record, i)));
        frames.push(frame);
    }
    frames
}

fn field(record: &StringRecord, i: usize) -> Option<&str> {
    record.get(i).filter(|v| !v.is_empty())
}

fn parse_index(v: Option<&str>) -> Option<u32> {
    let v = v?.parse::<f64>().ok()?.round();
    if v.is_finite() && v >= 0.0 && v <= u32::MAX as f64 {
        Some(v as u32)
    } else {
        None
    }
}

pub fn read_csv(path: &Path) -> Result<Vec<RawFrame>> {
    let text = std::fs::read_to_string(path)?;
    let frames = parse_csv(&text);
    if frames.is_empty() {
        return Err(GazeError::EmptyInput(path.to_path_buf()));
    }
    log::info!("Read {} frames from {}", frames.len(), path.display());
    Ok(frames)
}
