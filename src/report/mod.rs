//! Reporting utilities: result assembly and formatted terminal output.

pub mod format;

pub use format::*;

use crate::app::pipeline::AnalysisOutput;
use crate::domain::FinalRecord;
use crate::io::labels::LabelTable;

/// Merge per-well outcomes into output rows, left-joining labels on the well
/// text exactly as the raw header wrote it.
///
/// Every outcome yields exactly one row; wells without a label row keep their
/// metrics and get `None` label fields.
pub fn assemble_records(output: &AnalysisOutput, labels: Option<&LabelTable>) -> Vec<FinalRecord> {
    let n_label_cols = labels.map_or(0, |l| l.columns.len());
    let mut records: Vec<FinalRecord> = output
        .outcomes
        .iter()
        .map(|o| {
            let label = output.label(o.well);
            let matched = labels.and_then(|l| l.get(&label));
            let label_values = match matched {
                Some(values) => values.iter().cloned().map(Some).collect(),
                None => vec![None; n_label_cols],
            };
            FinalRecord {
                well: o.well,
                label,
                tmax: o.landmarks.map(|l| l.tmax),
                t50: o.landmarks.map(|l| l.t50),
                tcrit: o.tcrit.map(|t| t.tcrit),
                tcrit_se: o.tcrit.map(|t| t.tcrit_se),
                status: o.status(),
                labels: label_values,
            }
        })
        .collect();
    records.sort_by(|a, b| a.well.cmp(&b.well));
    records
}
