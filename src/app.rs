//! Top-level application orchestration.
//!
//! `src/main.rs` stays tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - picks the raw file to analyze
//! - runs the per-well pipeline
//! - writes plots, the run summary and (last) the result table
//! - prints the terminal report

use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::{info, warn};

use crate::cli::{Command, PendingArgs, RunArgs, SimulateArgs};
use crate::data::{SyntheticConfig, generate_plate};
use crate::domain::{AnalysisConfig, FinalRecord, PlateLayout, RawFormat, RemainderPolicy, RunConfig, WellStatus};
use crate::error::{AppError, EXIT_NO_DATA};
use crate::io::{
    LabelTable, OutputPaths, RunSummary, ensure_dir, load_labels, load_raw_table, pending_raw_files,
    write_raw_table, write_results_csv, write_summary_json, write_truth_csv,
};

pub mod pipeline;

use pipeline::{AnalysisOutput, analyze_plate};

/// Entry point for the `tcrit` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Run(args) => handle_run(args),
        Command::Pending(args) => handle_pending(args),
        Command::Simulate(args) => handle_simulate(args),
    }
}

/// Everything one `run` produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub paths: OutputPaths,
    pub output: AnalysisOutput,
    pub records: Vec<FinalRecord>,
    pub plots_written: usize,
}

fn handle_run(args: RunArgs) -> Result<(), AppError> {
    let input = resolve_input(&args)?;
    let config = run_config_from_args(&args, input);
    let report = execute_run(&config)?;

    println!(
        "{}",
        crate::report::format_run_summary(&config.input.display().to_string(), &report.output)
    );
    println!("{}", crate::report::format_results(&report.records));
    println!("Results: {}", report.paths.table.display());
    println!("Summary: {}", report.paths.summary.display());
    if config.plots {
        println!("Plots:   {} ({} wells)", report.paths.plot_dir.display(), report.plots_written);
    }
    Ok(())
}

/// Analyze `config.input` and write every artifact under `config.out_dir`.
///
/// Malformed input, label or output problems abort the run; individual wells
/// that cannot be analyzed are reported in the table with a non-ok status.
/// A plot that fails to render is logged and skipped.
pub fn execute_run(config: &RunConfig) -> Result<RunReport, AppError> {
    config.analysis.validate()?;
    let paths = OutputPaths::for_input(&config.input, &config.out_dir)?;

    // Labels are loaded up front so a bad label file fails before any work.
    let labels: Option<LabelTable> = config.labels.as_deref().map(load_labels).transpose()?;
    if let Some(labels) = &labels {
        if labels.is_empty() {
            warn!("label file has no rows; label columns will be empty");
        } else {
            info!(rows = labels.len(), columns = labels.columns.len(), "labels loaded");
        }
    }

    let table = load_raw_table(&config.input, &config.format)?;
    info!(
        input = %config.input.display(),
        wells = table.wells.len(),
        readings = table.readings.len(),
        "raw table loaded"
    );

    let output = analyze_plate(&table, &config.analysis)?;
    let records = crate::report::assemble_records(&output, labels.as_ref());
    if let Some(labels) = &labels {
        let unmatched = records.iter().filter(|r| labels.get(&r.label).is_none()).count();
        if unmatched > 0 {
            warn!(unmatched, "wells without a label row");
        }
    }

    ensure_dir(&config.out_dir)?;
    let plots_written = if config.plots { write_plots(&paths.plot_dir, &output)? } else { 0 };

    let summary = RunSummary::new(&config.input, &config.format, &config.analysis, &output);
    write_summary_json(&paths.summary, &summary)?;

    // The table marks the input as processed, so it goes last.
    let label_columns = labels.as_ref().map(|l| l.columns.clone()).unwrap_or_default();
    write_results_csv(&paths.table, &records, &label_columns)?;

    Ok(RunReport {
        paths,
        output,
        records,
        plots_written,
    })
}

fn write_plots(plot_dir: &Path, output: &AnalysisOutput) -> Result<usize, AppError> {
    ensure_dir(plot_dir)?;
    let mut written = 0;
    for outcome in output.outcomes.iter().filter(|o| o.status() == WellStatus::Ok) {
        let (Some(series), Some(landmarks), Some(curve)) = (&outcome.scaled, &outcome.landmarks, &outcome.fit_curve)
        else {
            continue;
        };
        let path = plot_dir.join(format!("{}.png", output.label(outcome.well)));
        match crate::plot::render_well_png(&path, series, landmarks, curve) {
            Ok(()) => written += 1,
            Err(err) => warn!(well = %outcome.well, "{err}"),
        }
    }
    Ok(written)
}

/// Pick the raw file: `--input` as given, or the first pending file in
/// `--raw-dir`.
fn resolve_input(args: &RunArgs) -> Result<PathBuf, AppError> {
    if let Some(input) = &args.input {
        return Ok(input.clone());
    }
    let Some(raw_dir) = &args.raw_dir else {
        return Err(AppError::input("Either --input or --raw-dir is required."));
    };
    let pending = pending_raw_files(raw_dir, &args.out_dir)?;
    let Some(first) = pending.first() else {
        return Err(AppError::new(
            EXIT_NO_DATA,
            format!("No unprocessed raw files in '{}'.", raw_dir.display()),
        ));
    };
    if pending.len() > 1 {
        info!(still_pending = pending.len() - 1, "more raw files waiting after this one");
    }
    Ok(first.clone())
}

fn handle_pending(args: PendingArgs) -> Result<(), AppError> {
    let pending = pending_raw_files(&args.raw_dir, &args.out_dir)?;
    if pending.is_empty() {
        println!("No pending raw files in {}.", args.raw_dir.display());
        return Ok(());
    }
    for path in &pending {
        println!("{}", path.display());
    }
    Ok(())
}

fn handle_simulate(args: SimulateArgs) -> Result<(), AppError> {
    let synth = SyntheticConfig {
        seed: args.seed,
        rows: args.rows,
        columns: args.cols,
        readings: args.readings,
        noise_sd: args.noise,
        spikes: !args.no_spikes,
        ..SyntheticConfig::default()
    };
    let plate = generate_plate(&synth)?;

    let format = RawFormat::default();
    let preamble = vec!["Synthetic PAM export".to_string(), format!("seed={}", args.seed)];
    write_raw_table(&args.out, &plate.table, &format, &preamble)?;
    info!(
        out = %args.out.display(),
        wells = plate.table.wells.len(),
        readings = plate.table.readings.len(),
        "synthetic plate written"
    );

    if let Some(truth) = &args.truth {
        write_truth_csv(truth, &plate.tcrit)?;
    }
    println!("Wrote {}", args.out.display());
    Ok(())
}

pub fn run_config_from_args(args: &RunArgs, input: PathBuf) -> RunConfig {
    RunConfig {
        input,
        labels: args.labels.clone(),
        out_dir: args.out_dir.clone(),
        plots: !args.no_plots,
        format: RawFormat {
            skip_lines: args.skip_lines,
            time_column: args.time_column.clone(),
            temperature_column: args.temp_column.clone(),
            delimiter: args.delimiter,
            layout: PlateLayout::new(args.plate_columns),
        },
        analysis: AnalysisConfig {
            bin_size: args.bin_size,
            remainder: if args.truncate_partial_bin {
                RemainderPolicy::Truncate
            } else {
                RemainderPolicy::Fail
            },
            iqr_multiplier: args.iqr_multiplier,
            prebuffer: args.prebuffer,
            postbuffer: args.postbuffer,
            min_window_points: args.min_window_points,
            max_iterations: args.max_iterations,
            tolerance: args.tolerance,
        },
    }
}
