//! Sweep records for later analysis.
//!
//! One CSV row per sweep run, appended to a shared file.

use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use tracing::info;

use crate::error::BridgeResult;
use crate::sweep::SweepResult;

pub const DEFAULT_RECORD_FILE: &str = "arduinoTesting.csv";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SweepRecord {
    pub magnitude: f64,
    pub wait_seconds: f64,
    pub angle_step_degrees: f64,
    pub iteration_count: usize,
    pub expected_runtime: f64,
    pub actual_runtime: f64,
    pub average_measured_magnitude: f64,
    pub cancelled: bool,
}

impl From<&SweepResult> for SweepRecord {
    fn from(result: &SweepResult) -> Self {
        Self {
            magnitude: result.config.magnitude,
            wait_seconds: result.config.wait_seconds,
            angle_step_degrees: result.config.angle_step_degrees,
            iteration_count: result.summary.iteration_count,
            expected_runtime: result.summary.expected_runtime,
            actual_runtime: result.summary.actual_runtime,
            average_measured_magnitude: result.summary.average_measured_magnitude,
            cancelled: result.cancelled,
        }
    }
}

impl SweepRecord {
    pub fn csv_header() -> &'static str {
        "magnitude,wait_s,angle_step_deg,iterations,expected_runtime_s,actual_runtime_s,avg_magnitude,cancelled"
    }

    pub fn to_csv_row(&self) -> String {
        format!(
            "{},{},{},{},{},{:.6},{},{}",
            self.magnitude,
            self.wait_seconds,
            self.angle_step_degrees,
            self.iteration_count,
            self.expected_runtime,
            self.actual_runtime,
            self.average_measured_magnitude,
            self.cancelled,
        )
    }
}

/// Append a row, writing the header first if the file is new or empty.
pub fn append_record(path: &Path, record: &SweepRecord) -> BridgeResult<()> {
    let needs_header = std::fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    if needs_header {
        writeln!(file, "{}", SweepRecord::csv_header())?;
    }
    writeln!(file, "{}", record.to_csv_row())?;
    info!(path = %path.display(), "sweep record written");
    Ok(())
}

/// Pretty JSON followed by a newline.
pub fn write_json<W: Write, T: Serialize + ?Sized>(mut writer: W, value: &T) -> BridgeResult<()> {
    serde_json::to_writer_pretty(&mut writer, value)?;
    writeln!(writer)?;
    Ok(())
}
