//! Export the per-well result table to CSV.
//!
//! Columns: `well,Tmax,T50,Tcrit,Tcrit_se,status`, then every label column.
//! Missing metrics are written as `NA`, unmatched labels as empty fields.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use crate::domain::{FinalRecord, WellId};
use crate::error::AppError;
use crate::report::fmt_opt;

pub const RESULT_COLUMNS: [&str; 6] = ["well", "Tmax", "T50", "Tcrit", "Tcrit_se", "status"];

/// Write the table to `path` through a sibling temp file and a rename, so a
/// failed write never leaves a partial table that marks the input processed.
pub fn write_results_csv(path: &Path, records: &[FinalRecord], label_columns: &[String]) -> Result<(), AppError> {
    let tmp = partial_path(path);
    let result = File::create(&tmp)
        .map_err(|e| AppError::output(format!("Failed to create results CSV '{}': {e}", tmp.display())))
        .and_then(|file| write_results(file, records, label_columns))
        .and_then(|()| {
            fs::rename(&tmp, path)
                .map_err(|e| AppError::output(format!("Failed to move results CSV to '{}': {e}", path.display())))
        });
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

fn partial_path(path: &Path) -> PathBuf {
    let name = path.file_name().and_then(|s| s.to_str()).unwrap_or("results.csv");
    path.with_file_name(format!(".{name}.partial"))
}

pub fn write_results<W: std::io::Write>(
    writer: W,
    records: &[FinalRecord],
    label_columns: &[String],
) -> Result<(), AppError> {
    let mut csv = csv::Writer::from_writer(writer);

    let mut header: Vec<&str> = RESULT_COLUMNS.to_vec();
    header.extend(label_columns.iter().map(String::as_str));
    csv.write_record(&header)
        .map_err(|e| AppError::output(format!("Failed to write results header: {e}")))?;

    for r in records {
        let mut row = vec![
            r.label.clone(),
            fmt_opt(r.tmax),
            fmt_opt(r.t50),
            fmt_opt(r.tcrit),
            fmt_opt(r.tcrit_se),
            r.status.to_string(),
        ];
        row.extend(r.labels.iter().map(|v| v.clone().unwrap_or_default()));
        csv.write_record(&row)
            .map_err(|e| AppError::output(format!("Failed to write results row for {}: {e}", r.label)))?;
    }

    csv.flush()
        .map_err(|e| AppError::output(format!("Failed to flush results CSV: {e}")))?;
    Ok(())
}

/// Injected breakpoints of a synthetic plate (`well,tcrit`).
pub fn write_truth_csv(path: &Path, truth: &[(WellId, f64)]) -> Result<(), AppError> {
    let mut csv = csv::Writer::from_path(path)
        .map_err(|e| AppError::output(format!("Failed to create truth CSV '{}': {e}", path.display())))?;
    csv.write_record(["well", "tcrit"])
        .map_err(|e| AppError::output(format!("Failed to write truth header: {e}")))?;
    for (well, tcrit) in truth {
        csv.write_record([well.to_string(), format!("{tcrit:.4}")])
            .map_err(|e| AppError::output(format!("Failed to write truth row for {well}: {e}")))?;
    }
    csv.flush()
        .map_err(|e| AppError::output(format!("Failed to flush truth CSV: {e}")))?;
    Ok(())
}
