//! Shared domain types.
//!
//! Everything here is derived from one raw file and immutable once built:
//! raw readings -> per-well series -> scaled series -> landmarks -> Tcrit.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::domain::plate::{PlateLayout, WellId};
use crate::error::{AppError, WellFailure};

/// One instrument sample: time stamp, block temperature, and one fluorescence
/// value per well (aligned with `RawTable::wells`).
#[derive(Debug, Clone, PartialEq)]
pub struct RawReading {
    /// Time stamp as written by the instrument. Carried through, never parsed.
    pub time: String,
    pub temperature: f64,
    pub fluorescence: Vec<f64>,
}

/// A parsed raw file.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub wells: Vec<WellId>,
    /// Header text of each well column exactly as written (`A01`, `a1`, ...),
    /// aligned with `wells`. Label joins and output rows use this text.
    pub labels: Vec<String>,
    pub readings: Vec<RawReading>,
}

impl RawTable {
    /// Table whose well labels are the canonical ids (`A1`).
    pub fn new(wells: Vec<WellId>, readings: Vec<RawReading>) -> Self {
        let labels = wells.iter().map(WellId::to_string).collect();
        Self {
            wells,
            labels,
            readings,
        }
    }

    /// Well id -> header text.
    pub fn label_map(&self) -> HashMap<WellId, String> {
        self.wells.iter().copied().zip(self.labels.iter().cloned()).collect()
    }
}

/// A positional group of consecutive raw readings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TemperatureBin {
    pub index: usize,
    pub temperature: f64,
}

/// One binned observation of a well.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    pub bin_index: usize,
    pub temperature: f64,
    pub fluorescence: f64,
}

/// Per-well binned trace, ordered by bin index.
#[derive(Debug, Clone, PartialEq)]
pub struct WellSeries {
    pub well: WellId,
    pub points: Vec<SeriesPoint>,
}

impl WellSeries {
    pub fn fluorescence(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.fluorescence).collect()
    }
}

/// A filtered point with its min/max-rescaled value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaledPoint {
    pub bin_index: usize,
    pub temperature: f64,
    pub fluorescence: f64,
    pub scaled: f64,
}

/// Outlier-filtered, rescaled trace of one well.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaledSeries {
    pub well: WellId,
    pub points: Vec<ScaledPoint>,
    pub fluor_min: f64,
    pub fluor_max: f64,
    /// Temperature of the (causally constrained) minimum.
    pub t_min: f64,
    /// Temperature of the global maximum.
    pub t_max: f64,
    pub min_index: usize,
    pub max_index: usize,
}

impl ScaledSeries {
    /// `Tmax > Tmin`: the peak comes after the baseline. When false the trace
    /// is flat or inverted and a breakpoint fit is not meaningful.
    pub fn check(&self) -> bool {
        self.t_max > self.t_min
    }
}

/// T50 / Tmax for one well.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Landmarks {
    pub t50: f64,
    pub tmax: f64,
    pub t50_index: usize,
    pub tmax_index: usize,
}

/// Breakpoint temperature and its standard error (both rounded to 0.01).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TcritResult {
    pub tcrit: f64,
    pub tcrit_se: f64,
}

/// Final per-well status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WellStatus {
    Ok,
    Degenerate,
    NoConvergence,
}

impl WellStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            WellStatus::Ok => "ok",
            WellStatus::Degenerate => "degenerate",
            WellStatus::NoConvergence => "no_convergence",
        }
    }
}

impl fmt::Display for WellStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Observed vs fitted scaled fluorescence over the fit window (for plots).
#[derive(Debug, Clone, PartialEq)]
pub struct FitCurve {
    pub temperatures: Vec<f64>,
    pub observed: Vec<f64>,
    pub fitted: Vec<f64>,
    /// Unrounded breakpoint.
    pub breakpoint: f64,
}

/// Everything the pipeline produced for one well.
#[derive(Debug, Clone)]
pub struct WellOutcome {
    pub well: WellId,
    pub outliers_removed: usize,
    pub scaled: Option<ScaledSeries>,
    pub landmarks: Option<Landmarks>,
    pub tcrit: Option<TcritResult>,
    pub fit_curve: Option<FitCurve>,
    pub failure: Option<WellFailure>,
}

impl WellOutcome {
    pub fn status(&self) -> WellStatus {
        match &self.failure {
            None => WellStatus::Ok,
            Some(f) if f.is_degenerate() => WellStatus::Degenerate,
            Some(_) => WellStatus::NoConvergence,
        }
    }
}

/// One output row: metrics joined with optional label columns.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalRecord {
    pub well: WellId,
    /// Well text as written in the raw header.
    pub label: String,
    pub tmax: Option<f64>,
    pub t50: Option<f64>,
    pub tcrit: Option<f64>,
    pub tcrit_se: Option<f64>,
    pub status: WellStatus,
    /// Aligned with the label table's column names; `None` when unmatched.
    pub labels: Vec<Option<String>>,
}

/// What to do when the reading count is not a multiple of the bin size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RemainderPolicy {
    /// Abort the run.
    Fail,
    /// Drop the trailing partial bin.
    Truncate,
}

/// Tunables of the per-well pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisConfig {
    /// Consecutive raw readings per temperature bin.
    pub bin_size: usize,
    pub remainder: RemainderPolicy,
    /// Outlier threshold is `median + iqr_multiplier * IQR`.
    pub iqr_multiplier: f64,
    /// Fit window is `[T50 - prebuffer, T50 + postbuffer]` (°C).
    pub prebuffer: f64,
    pub postbuffer: f64,
    /// Fewer window points than this is reported as a convergence failure.
    pub min_window_points: usize,
    pub max_iterations: usize,
    /// Relative to the fit window: converged when `|Δψ| <= tolerance * span`.
    pub tolerance: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            bin_size: 5,
            remainder: RemainderPolicy::Fail,
            iqr_multiplier: 3.0,
            prebuffer: 12.0,
            postbuffer: 1.0,
            min_window_points: 4,
            max_iterations: 30,
            tolerance: 1e-6,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.bin_size == 0 {
            return Err(AppError::input("Bin size must be >= 1."));
        }
        if !(self.iqr_multiplier.is_finite() && self.iqr_multiplier >= 0.0) {
            return Err(AppError::input("IQR multiplier must be finite and >= 0."));
        }
        if !(self.prebuffer.is_finite() && self.postbuffer.is_finite())
            || self.prebuffer < 0.0
            || self.postbuffer < 0.0
        {
            return Err(AppError::input("Fit window buffers must be finite and >= 0."));
        }
        if self.max_iterations == 0 {
            return Err(AppError::input("Max iterations must be >= 1."));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(AppError::input("Tolerance must be finite and > 0."));
        }
        Ok(())
    }
}

/// Input conventions for the raw instrument file.
#[derive(Debug, Clone, Serialize)]
pub struct RawFormat {
    /// Preamble lines before the header row.
    pub skip_lines: usize,
    pub time_column: String,
    pub temperature_column: String,
    /// `None`: comma for `.csv`, tab otherwise.
    pub delimiter: Option<char>,
    pub layout: PlateLayout,
}

impl Default for RawFormat {
    fn default() -> Self {
        Self {
            skip_lines: 2,
            time_column: "Time".to_string(),
            temperature_column: "Temp".to_string(),
            delimiter: None,
            layout: PlateLayout::default(),
        }
    }
}

/// A full `tcrit run` as understood by the pipeline.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub input: PathBuf,
    pub labels: Option<PathBuf>,
    pub out_dir: PathBuf,
    pub plots: bool,
    pub format: RawFormat,
    pub analysis: AnalysisConfig,
}
