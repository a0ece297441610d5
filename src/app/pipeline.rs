//! Shared analysis pipeline.
//!
//! raw table -> bins -> per well: outliers -> rescale -> landmarks -> Tcrit
//!
//! Each well is a pure function of its own series, so wells are mapped in
//! parallel and collected back in plate order. Per-well failures are recorded
//! in the outcome; only malformed input aborts the run.

use std::collections::HashMap;

use rayon::prelude::*;
use tracing::{info, warn};

use crate::domain::{AnalysisConfig, RawTable, WellId, WellOutcome, WellSeries, WellStatus};
use crate::error::{AppError, Stage, WellFailure};
use crate::fit::estimate_tcrit;
use crate::signal::{bin_readings, detect_landmarks, filter_outliers, rescale};

/// All computed outputs of a single analysis.
#[derive(Debug, Clone)]
pub struct AnalysisOutput {
    pub n_readings: usize,
    pub n_bins: usize,
    pub dropped_readings: usize,
    pub outcomes: Vec<WellOutcome>,
    /// Raw header text per well.
    pub well_labels: HashMap<WellId, String>,
}

impl AnalysisOutput {
    pub fn count(&self, status: WellStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status() == status).count()
    }

    /// The well as written in the raw header, or its canonical id.
    pub fn label(&self, well: WellId) -> String {
        self.well_labels.get(&well).cloned().unwrap_or_else(|| well.to_string())
    }
}

/// Bin the raw table and run every well through the pipeline.
pub fn analyze_plate(table: &RawTable, config: &AnalysisConfig) -> Result<AnalysisOutput, AppError> {
    config.validate()?;
    let binned = bin_readings(table, config.bin_size, config.remainder)?;

    let mut outcomes: Vec<WellOutcome> = binned
        .series
        .par_iter()
        .map(|series| analyze_well(series, config))
        .collect();
    outcomes.sort_by(|a, b| a.well.cmp(&b.well));

    for outcome in &outcomes {
        if let Some(failure) = &outcome.failure {
            warn!(well = %outcome.well, stage = %failure.stage(), "{failure}");
        }
    }

    let output = AnalysisOutput {
        n_readings: table.readings.len(),
        n_bins: binned.bins.len(),
        dropped_readings: binned.dropped_readings,
        outcomes,
        well_labels: table.label_map(),
    };
    info!(
        wells = output.outcomes.len(),
        bins = output.n_bins,
        ok = output.count(WellStatus::Ok),
        degenerate = output.count(WellStatus::Degenerate),
        no_convergence = output.count(WellStatus::NoConvergence),
        "plate analyzed"
    );
    Ok(output)
}

/// Run one well's binned series through outlier rejection, rescaling,
/// landmark detection and the breakpoint fit.
pub fn analyze_well(series: &WellSeries, config: &AnalysisConfig) -> WellOutcome {
    let report = filter_outliers(series, config.iqr_multiplier);
    let mut outcome = WellOutcome {
        well: series.well,
        outliers_removed: report.removed(),
        scaled: None,
        landmarks: None,
        tcrit: None,
        fit_curve: None,
        failure: None,
    };

    let scaled = match rescale(&report.filtered) {
        Ok(s) => s,
        Err(failure) => {
            outcome.failure = Some(failure);
            return outcome;
        }
    };

    let landmarks = match detect_landmarks(&scaled) {
        Ok(l) => l,
        Err(failure) => {
            outcome.failure = Some(failure);
            outcome.scaled = Some(scaled);
            return outcome;
        }
    };
    outcome.landmarks = Some(landmarks);

    if !scaled.check() {
        outcome.failure = Some(WellFailure::degenerate(
            Stage::Rescale,
            format!(
                "peak at {:.2} does not follow baseline at {:.2}",
                scaled.t_max, scaled.t_min
            ),
        ));
        outcome.scaled = Some(scaled);
        return outcome;
    }

    match estimate_tcrit(&scaled, &landmarks, config) {
        Ok((tcrit, curve)) => {
            outcome.tcrit = Some(tcrit);
            outcome.fit_curve = Some(curve);
        }
        Err(failure) => outcome.failure = Some(failure),
    }
    outcome.scaled = Some(scaled);
    outcome
}
