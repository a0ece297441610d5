//! Command-line parsing for the `tcrit` analyzer.
//!
//! Argument parsing stays here; `app` turns parsed arguments into a
//! [`RunConfig`](crate::domain::RunConfig) and dispatches.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "tcrit", version, about = "PAM thermal tolerance analyzer (Tcrit / T50 / Tmax)")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Analyze one raw instrument file and write results, summary and plots.
    Run(RunArgs),
    /// List raw files that have no result table yet.
    Pending(PendingArgs),
    /// Write a synthetic raw file with known per-well breakpoints.
    Simulate(SimulateArgs),
}

#[derive(Debug, Args, Clone)]
#[command(group(clap::ArgGroup::new("source").required(true).args(["input", "raw_dir"])))]
pub struct RunArgs {
    /// Raw instrument file to analyze.
    #[arg(short = 'i', long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Directory of raw files; the first pending one is analyzed.
    #[arg(long, value_name = "DIR")]
    pub raw_dir: Option<PathBuf>,

    /// Label CSV keyed by a `well` column, left-joined onto the results.
    #[arg(short = 'l', long, value_name = "CSV")]
    pub labels: Option<PathBuf>,

    /// Output directory for result tables, summaries and plots.
    #[arg(short = 'o', long, default_value = "results")]
    pub out_dir: PathBuf,

    /// Skip per-well PNG plots.
    #[arg(long)]
    pub no_plots: bool,

    /// Number of plate columns (wells A1..H<N>).
    #[arg(long, default_value_t = 12)]
    pub plate_columns: u16,

    /// Preamble lines before the header row.
    #[arg(long, default_value_t = 2)]
    pub skip_lines: usize,

    /// Header name of the time column.
    #[arg(long, default_value = "Time")]
    pub time_column: String,

    /// Header name of the temperature column.
    #[arg(long, default_value = "Temp")]
    pub temp_column: String,

    /// Field delimiter: a single ASCII character or `tab`. Defaults to comma
    /// for `.csv` inputs and tab otherwise.
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<char>,

    /// Consecutive readings averaged into one temperature bin.
    #[arg(long, default_value_t = 5)]
    pub bin_size: usize,

    /// Drop a trailing partial bin instead of failing.
    #[arg(long)]
    pub truncate_partial_bin: bool,

    /// Outlier threshold multiplier (median + k * IQR).
    #[arg(long, default_value_t = 3.0)]
    pub iqr_multiplier: f64,

    /// Fit window start, °C below T50.
    #[arg(long, default_value_t = 12.0)]
    pub prebuffer: f64,

    /// Fit window end, °C above T50.
    #[arg(long, default_value_t = 1.0)]
    pub postbuffer: f64,

    /// Minimum points inside the fit window.
    #[arg(long, default_value_t = 4)]
    pub min_window_points: usize,

    /// Maximum breakpoint iterations per start.
    #[arg(long, default_value_t = 30)]
    pub max_iterations: usize,

    /// Breakpoint convergence tolerance, as a fraction of the fit-window
    /// temperature span (iteration stops when the step is below it).
    #[arg(long, default_value_t = 1e-6)]
    pub tolerance: f64,
}

#[derive(Debug, Args, Clone)]
pub struct PendingArgs {
    /// Directory of raw files.
    #[arg(long, value_name = "DIR")]
    pub raw_dir: PathBuf,

    /// Output directory checked for existing result tables.
    #[arg(short = 'o', long, default_value = "results")]
    pub out_dir: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct SimulateArgs {
    /// Raw file to write (tab-delimited unless the name ends in `.csv`).
    #[arg(long, value_name = "FILE")]
    pub out: PathBuf,

    /// Also write the injected breakpoints (`well,tcrit`).
    #[arg(long, value_name = "CSV")]
    pub truth: Option<PathBuf>,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Plate rows used, starting at A.
    #[arg(long, default_value_t = 8)]
    pub rows: usize,

    /// Plate columns used.
    #[arg(long, default_value_t = 5)]
    pub cols: u16,

    /// Raw readings per well.
    #[arg(long, default_value_t = 1750)]
    pub readings: usize,

    /// Standard deviation of additive reading noise.
    #[arg(long, default_value_t = 2.0)]
    pub noise: f64,

    /// Do not inject a spike reading per well.
    #[arg(long)]
    pub no_spikes: bool,
}

/// Parse `--delimiter`: `tab`, `\t`, or any single ASCII character.
pub fn parse_delimiter(raw: &str) -> Result<char, String> {
    match raw {
        "tab" | "\\t" | "\t" => Ok('\t'),
        _ => {
            let mut chars = raw.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii() => Ok(c),
                _ => Err(format!("expected a single ASCII character or 'tab', got '{raw}'")),
            }
        }
    }
}
