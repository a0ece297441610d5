//! Optional sample label table (`well` + arbitrary identifier columns).

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use crate::error::AppError;

/// Label columns keyed by the literal `well` value.
#[derive(Debug, Clone, Default)]
pub struct LabelTable {
    /// Label column names, excluding `well`, in file order.
    pub columns: Vec<String>,
    rows: HashMap<String, Vec<String>>,
}

impl LabelTable {
    /// Labels for `well` (exact string match), aligned with `columns`.
    pub fn get(&self, well: &str) -> Option<&[String]> {
        self.rows.get(well).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub fn load_labels(path: &Path) -> Result<LabelTable, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::input(format!("Failed to open label file '{}': {e}", path.display())))?;
    read_labels(file).map_err(|e| AppError::new(e.exit_code(), format!("{}: {e}", path.display())))
}

pub fn read_labels<R: std::io::Read>(reader: R) -> Result<LabelTable, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(false)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::input(format!("Failed to read label headers: {e}")))?
        .clone();

    let well_idx = headers
        .iter()
        .position(|h| h.trim_start_matches('\u{feff}').eq_ignore_ascii_case("well"))
        .ok_or_else(|| AppError::input("Missing required label column: `well`"))?;

    let columns: Vec<String> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != well_idx)
        .map(|(_, h)| h.to_string())
        .collect();

    let mut rows = HashMap::new();
    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2;
        let record = result.map_err(|e| AppError::input(format!("label line {line}: {e}")))?;
        let well = record.get(well_idx).unwrap_or("").to_string();
        if well.is_empty() {
            return Err(AppError::input(format!("label line {line}: empty `well` value")));
        }
        let values: Vec<String> = record
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != well_idx)
            .map(|(_, v)| v.to_string())
            .collect();
        if rows.insert(well.clone(), values).is_some() {
            return Err(AppError::input(format!("label line {line}: duplicate well `{well}`")));
        }
    }

    Ok(LabelTable { columns, rows })
}
