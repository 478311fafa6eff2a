//! Export recovery results to CSV and JSON.
//!
//! The CSV is meant for spreadsheets (one row per market); the JSON carries the
//! whole report including diagnostics.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::{RecoveryReport, RecoverySummary};
use crate::error::AppError;

const CSV_HEADER: [&str; 10] = [
    "market",
    "baseline_period",
    "baseline_value",
    "trough_period",
    "trough_value",
    "current_period",
    "current_value",
    "trough_ratio",
    "current_ratio",
    "rebound",
];

/// Write per-market summaries to a CSV file.
pub fn write_recovery_csv(path: &Path, summaries: &[RecoverySummary]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_recovery_csv_to(file, summaries)
}

/// Write per-market summaries as CSV to any writer.
pub fn write_recovery_csv_to<W: Write>(writer: W, summaries: &[RecoverySummary]) -> Result<(), AppError> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(CSV_HEADER)?;

    for s in summaries {
        out.write_record([
            s.entity.clone(),
            s.baseline_period.to_string(),
            format!("{:.6}", s.baseline_value),
            s.trough_period.to_string(),
            format!("{:.6}", s.trough_value),
            s.current_period.to_string(),
            format!("{:.6}", s.current_value),
            fmt_ratio(s.trough_ratio),
            fmt_ratio(s.current_ratio),
            fmt_ratio(s.rebound()),
        ])?;
    }

    out.flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}

/// Write the full report (summaries + diagnostics) as pretty JSON.
///
/// Undefined ratios are written as `null`.
pub fn write_report_json(path: &Path, report: &RecoveryReport) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create report JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, report)
        .map_err(|e| AppError::new(2, format!("Failed to write report JSON: {e}")))?;
    Ok(())
}

fn fmt_ratio(v: f64) -> String {
    if v.is_nan() { "NaN".to_string() } else { format!("{v:.4}") }
}
