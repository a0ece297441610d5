//! Run summary JSON.
//!
//! A machine-readable record of one run: effective configuration, per-status
//! counts and each well's status with the failure reason, if any.

use std::fs::File;
use std::path::Path;

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::app::pipeline::AnalysisOutput;
use crate::domain::{AnalysisConfig, RawFormat, WellStatus};
use crate::error::{AppError, Stage};

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub tool: String,
    pub version: String,
    pub generated_at: DateTime<Local>,
    pub input: String,
    pub format: RawFormat,
    pub analysis: AnalysisConfig,
    pub n_readings: usize,
    pub n_bins: usize,
    pub dropped_readings: usize,
    pub counts: StatusCounts,
    pub wells: Vec<WellSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusCounts {
    pub ok: usize,
    pub degenerate: usize,
    pub no_convergence: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct WellSummary {
    /// Well as written in the raw header.
    pub well: String,
    pub status: WellStatus,
    pub outliers_removed: usize,
    pub tmax: Option<f64>,
    pub t50: Option<f64>,
    pub tcrit: Option<f64>,
    pub tcrit_se: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RunSummary {
    pub fn new(input: &Path, format: &RawFormat, analysis: &AnalysisConfig, output: &AnalysisOutput) -> Self {
        let wells = output
            .outcomes
            .iter()
            .map(|o| WellSummary {
                well: output.label(o.well),
                status: o.status(),
                outliers_removed: o.outliers_removed,
                tmax: o.landmarks.map(|l| l.tmax),
                t50: o.landmarks.map(|l| l.t50),
                tcrit: o.tcrit.map(|t| t.tcrit),
                tcrit_se: o.tcrit.map(|t| t.tcrit_se),
                stage: o.failure.as_ref().map(|f| f.stage()),
                message: o.failure.as_ref().map(|f| f.to_string()),
            })
            .collect();

        RunSummary {
            tool: "tcrit".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            generated_at: Local::now(),
            input: input.display().to_string(),
            format: format.clone(),
            analysis: analysis.clone(),
            n_readings: output.n_readings,
            n_bins: output.n_bins,
            dropped_readings: output.dropped_readings,
            counts: StatusCounts {
                ok: output.count(WellStatus::Ok),
                degenerate: output.count(WellStatus::Degenerate),
                no_convergence: output.count(WellStatus::NoConvergence),
            },
            wells,
        }
    }
}

pub fn write_summary_json(path: &Path, summary: &RunSummary) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::output(format!("Failed to create summary JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, summary)
        .map_err(|e| AppError::output(format!("Failed to write summary JSON: {e}")))?;
    Ok(())
}
