//! JSON export of the analysis summary.
//!
//! The file carries run metadata plus the per-spread results (statistics,
//! correlation, latest rolling correlation, trend line, regimes). Bulky
//! per-date vectors are left to the CSV export.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;

use crate::app::pipeline::{AnalysisOutput, SpreadAnalysis, Stage};
use crate::domain::{CreditClass, EstimationMethod};
use crate::error::AppError;

/// Serialized shape of `--export-json`.
#[derive(Debug, Serialize)]
pub struct SummaryFile<'a> {
    pub tool: &'static str,
    pub method: EstimationMethod,
    pub stress_index: &'a str,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub aligned_rows: usize,
    pub observations: usize,
    pub spreads: &'a [SpreadAnalysis],
    pub skipped: &'a [(CreditClass, String)],
    pub stages: &'a [Stage],
}

impl<'a> SummaryFile<'a> {
    pub fn from_output(output: &'a AnalysisOutput) -> Self {
        Self {
            tool: "spread",
            method: output.method,
            stress_index: &output.stress_key,
            first_date: output.frame.first_date(),
            last_date: output.frame.last_date(),
            aligned_rows: output.aligned_rows,
            observations: output.frame.len(),
            spreads: &output.spreads,
            skipped: &output.skipped,
            stages: &output.stages,
        }
    }
}

/// Write the summary JSON file.
pub fn write_summary_json(path: &Path, output: &AnalysisOutput) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create summary JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &SummaryFile::from_output(output))
        .map_err(|e| AppError::new(2, format!("Failed to write summary JSON: {e}")))
}
