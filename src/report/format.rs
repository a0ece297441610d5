//! Formatted terminal output.
//!
//! Formatting stays here so the pipeline code stays free of presentation
//! concerns and output changes are localized.

use crate::app::pipeline::AnalysisOutput;
use crate::domain::{FinalRecord, WellStatus};

/// Missing-value marker shared by the terminal table and the CSV export.
pub const NA: &str = "NA";

/// Format an optional metric with two decimals, `NA` when absent.
pub fn fmt_opt(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.2}")).unwrap_or_else(|| NA.to_string())
}

/// Header block: input, binning and per-status counts.
pub fn format_run_summary(input: &str, output: &AnalysisOutput) -> String {
    let mut out = String::new();

    out.push_str("=== tcrit - PAM thermal tolerance ===\n");
    out.push_str(&format!("Input: {input}\n"));
    out.push_str(&format!(
        "Readings: {} | bins: {} | dropped: {}\n",
        output.n_readings, output.n_bins, output.dropped_readings
    ));
    out.push_str(&format!(
        "Wells: {} | ok: {} | degenerate: {} | no convergence: {}\n",
        output.outcomes.len(),
        output.count(WellStatus::Ok),
        output.count(WellStatus::Degenerate),
        output.count(WellStatus::NoConvergence),
    ));
    out
}

/// Per-well metrics table.
pub fn format_results(records: &[FinalRecord]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<5} {:>8} {:>8} {:>8} {:>9}  {}\n",
        "well", "Tmax", "T50", "Tcrit", "Tcrit_se", "status"
    ));
    for r in records {
        out.push_str(&format!(
            "{:<5} {:>8} {:>8} {:>8} {:>9}  {}\n",
            r.label,
            fmt_opt(r.tmax),
            fmt_opt(r.t50),
            fmt_opt(r.tcrit),
            fmt_opt(r.tcrit_se),
            r.status
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_metrics_print_as_na() {
        let record = FinalRecord {
            well: "H5".parse().unwrap(),
            label: "H05".to_string(),
            tmax: Some(52.456),
            t50: Some(47.0),
            tcrit: None,
            tcrit_se: None,
            status: WellStatus::NoConvergence,
            labels: vec![],
        };
        let table = format_results(&[record]);
        let row = table.lines().nth(1).unwrap();
        assert!(row.starts_with("H05"));
        assert!(row.contains("52.46"));
        assert!(row.contains("NA"));
        assert!(row.ends_with("no_convergence"));
    }
}
