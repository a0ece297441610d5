//! Raw instrument file ingest.
//!
//! Layout of a raw file:
//!
//! ```text
//! <preamble line 1>          (skip_lines lines, ignored)
//! <preamble line 2>
//! Time<TAB>Temp<TAB>A1<TAB>A2 ...   (header row)
//! 0<TAB>25.01<TAB>412.3<TAB>398.0 ...
//! ```
//!
//! Design goals:
//! - **Named columns**: time and temperature are located by header name, never
//!   by position; every other column must be a well on the plate.
//! - **Fail fast**: a missing column, an unknown column, a short row or a
//!   non-numeric cell aborts the run with the offending line and column.
//! - **No analysis here**: this module only produces a `RawTable`.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use csv::StringRecord;

use crate::domain::{RawFormat, RawReading, RawTable, WellId};
use crate::error::{AppError, EXIT_NO_DATA};

/// Resolve the field delimiter for `path`.
pub fn resolve_delimiter(path: &Path, format: &RawFormat) -> u8 {
    if let Some(c) = format.delimiter {
        return c as u8;
    }
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        == Some(true);
    if is_csv { b',' } else { b'\t' }
}

/// Load a raw instrument file.
pub fn load_raw_table(path: &Path, format: &RawFormat) -> Result<RawTable, AppError> {
    let text = fs::read_to_string(path)
        .map_err(|e| AppError::input(format!("Failed to read raw file '{}': {e}", path.display())))?;
    parse_raw_table(&text, format, resolve_delimiter(path, format))
        .map_err(|e| AppError::new(e.exit_code(), format!("{}: {e}", path.display())))
}

/// Parse raw file contents.
pub fn parse_raw_table(text: &str, format: &RawFormat, delimiter: u8) -> Result<RawTable, AppError> {
    let body = strip_preamble(text, format.skip_lines)?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(false)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| AppError::input(format!("Failed to read header row: {e}")))?
        .clone();
    let columns = resolve_columns(&headers, format)?;

    // Header is the first line after the preamble (1-based).
    let header_line = format.skip_lines + 1;
    let mut readings = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let line = header_line + idx + 1;
        let record = result.map_err(|e| AppError::input(format!("line {line}: {e}")))?;
        readings.push(parse_reading(&record, &columns, &headers, line)?);
    }

    if readings.is_empty() {
        return Err(AppError::new(EXIT_NO_DATA, "Raw file has a header but no readings."));
    }

    Ok(RawTable {
        wells: columns.wells.iter().map(|c| c.well).collect(),
        labels: columns.wells.into_iter().map(|c| c.label).collect(),
        readings,
    })
}

/// Column positions resolved from the header row.
#[derive(Debug)]
struct ColumnMap {
    time: usize,
    temperature: usize,
    /// Wells in file order.
    wells: Vec<WellColumn>,
}

#[derive(Debug)]
struct WellColumn {
    well: WellId,
    /// Header cell as written, trimmed.
    label: String,
    idx: usize,
}

fn resolve_columns(headers: &StringRecord, format: &RawFormat) -> Result<ColumnMap, AppError> {
    let header_map = build_header_map(headers);
    let time_key = normalize_header_name(&format.time_column);
    let temp_key = normalize_header_name(&format.temperature_column);

    let time = *header_map
        .get(&time_key)
        .ok_or_else(|| AppError::input(format!("Missing required column: `{}`", format.time_column)))?;
    let temperature = *header_map.get(&temp_key).ok_or_else(|| {
        AppError::input(format!("Missing required column: `{}`", format.temperature_column))
    })?;

    let mut wells: Vec<WellColumn> = Vec::new();
    for (idx, name) in headers.iter().enumerate() {
        if idx == time || idx == temperature {
            continue;
        }
        let name = name.trim().trim_start_matches('\u{feff}');
        // Trailing delimiters produce empty header cells.
        if name.is_empty() {
            continue;
        }
        let well = format
            .layout
            .parse_well(name)
            .map_err(|e| AppError::input(format!("Unexpected column `{name}`: {e}")))?;
        if let Some(prev) = wells.iter().find(|c| c.well == well) {
            return Err(AppError::input(format!(
                "Duplicate well column: `{name}` and `{}` are both {well}",
                prev.label
            )));
        }
        wells.push(WellColumn {
            well,
            label: name.to_string(),
            idx,
        });
    }

    if wells.is_empty() {
        return Err(AppError::new(EXIT_NO_DATA, "Raw file has no well columns."));
    }

    Ok(ColumnMap {
        time,
        temperature,
        wells,
    })
}

fn parse_reading(
    record: &StringRecord,
    columns: &ColumnMap,
    headers: &StringRecord,
    line: usize,
) -> Result<RawReading, AppError> {
    let time = record.get(columns.time).unwrap_or("").to_string();
    let temperature = parse_cell(record, headers, columns.temperature, line)?;
    let fluorescence = columns
        .wells
        .iter()
        .map(|c| parse_cell(record, headers, c.idx, line))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(RawReading {
        time,
        temperature,
        fluorescence,
    })
}

fn parse_cell(record: &StringRecord, headers: &StringRecord, idx: usize, line: usize) -> Result<f64, AppError> {
    let raw = record.get(idx).unwrap_or("");
    let column = headers.get(idx).unwrap_or("?");
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(AppError::input(format!(
            "line {line}, column `{column}`: expected a number, got `{raw}`"
        ))),
    }
}

fn strip_preamble(text: &str, skip_lines: usize) -> Result<&str, AppError> {
    let mut rest = text;
    for n in 0..skip_lines {
        match rest.find('\n') {
            Some(pos) => rest = &rest[pos + 1..],
            None => {
                return Err(AppError::input(format!(
                    "Raw file ends after {n} of {skip_lines} preamble lines (no header row)."
                )));
            }
        }
    }
    Ok(rest)
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

/// Write a raw table in the same layout `load_raw_table` reads.
pub fn write_raw_table(path: &Path, table: &RawTable, format: &RawFormat, preamble: &[String]) -> Result<(), AppError> {
    let mut out = String::new();
    for i in 0..format.skip_lines {
        let line = preamble.get(i).map(String::as_str).unwrap_or("");
        out.push_str(line);
        out.push('\n');
    }

    let mut writer = csv::WriterBuilder::new()
        .delimiter(resolve_delimiter(path, format))
        .from_writer(Vec::new());

    let mut header = vec![format.time_column.clone(), format.temperature_column.clone()];
    header.extend(table.labels.iter().cloned());
    writer
        .write_record(&header)
        .map_err(|e| AppError::output(format!("Failed to encode raw header: {e}")))?;

    for reading in &table.readings {
        let mut row = vec![reading.time.clone(), format!("{:.3}", reading.temperature)];
        row.extend(reading.fluorescence.iter().map(|v| format!("{v:.3}")));
        writer
            .write_record(&row)
            .map_err(|e| AppError::output(format!("Failed to encode raw row: {e}")))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::output(format!("Failed to flush raw table: {e}")))?;
    out.push_str(&String::from_utf8_lossy(&bytes));

    fs::write(path, out).map_err(|e| AppError::output(format!("Failed to write '{}': {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PlateLayout;

    const SAMPLE: &str = "Instrument export\nRun 7\nTime\tTemp\tA1\tB2\n0\t25.0\t10\t20\n5\t25.5\t11\t21\n";

    #[test]
    fn parses_named_columns_after_preamble() {
        let table = parse_raw_table(SAMPLE, &RawFormat::default(), b'\t').unwrap();
        assert_eq!(table.wells.len(), 2);
        assert_eq!(table.wells[1].to_string(), "B2");
        assert_eq!(table.readings.len(), 2);
        assert_eq!(table.readings[1].time, "5");
        assert_eq!(table.readings[1].temperature, 25.5);
        let b2: Vec<f64> = table.readings.iter().map(|r| r.fluorescence[1]).collect();
        assert_eq!(b2, vec![20.0, 21.0]);
    }

    #[test]
    fn keeps_well_header_text_as_written() {
        let text = "x\ny\nTime\tTemp\tA01\tb2\n0\t25.0\t10\t20\n";
        let table = parse_raw_table(text, &RawFormat::default(), b'\t').unwrap();
        assert_eq!(table.wells[0].to_string(), "A1");
        assert_eq!(table.labels, ["A01", "b2"]);
    }

    #[test]
    fn same_well_written_twice_is_fatal() {
        let text = "x\ny\nTime,Temp,A1,A01\n0,25,10,11\n";
        let err = parse_raw_table(text, &RawFormat::default(), b',').unwrap_err();
        assert!(err.message().contains("Duplicate well column"), "{}", err.message());
    }

    #[test]
    fn column_order_does_not_matter() {
        let text = "x\ny\nA1,temp,TIME\n10,25.0,0\n";
        let table = parse_raw_table(text, &RawFormat::default(), b',').unwrap();
        assert_eq!(table.readings[0].temperature, 25.0);
        assert_eq!(table.readings[0].fluorescence, vec![10.0]);
    }

    #[test]
    fn missing_temperature_column_is_fatal() {
        let text = "x\ny\nTime,A1\n0,10\n";
        let err = parse_raw_table(text, &RawFormat::default(), b',').unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_INPUT);
        assert!(err.message().contains("Temp"));
    }

    #[test]
    fn unknown_column_is_fatal() {
        let text = "x\ny\nTime,Temp,A1,Z9\n0,25,10,11\n";
        let err = parse_raw_table(text, &RawFormat::default(), b',').unwrap_err();
        assert!(err.message().contains("Z9"));
    }

    #[test]
    fn well_outside_layout_is_fatal() {
        let format = RawFormat {
            layout: PlateLayout::new(5),
            ..RawFormat::default()
        };
        let text = "x\ny\nTime,Temp,A6\n0,25,10\n";
        assert!(parse_raw_table(text, &format, b',').is_err());
    }

    #[test]
    fn non_numeric_cell_reports_line_and_column() {
        let text = "x\ny\nTime,Temp,A1\n0,25,10\n5,25.5,oops\n";
        let err = parse_raw_table(text, &RawFormat::default(), b',').unwrap_err();
        assert!(err.message().contains("line 5"), "{}", err.message());
        assert!(err.message().contains("A1"));
    }

    #[test]
    fn short_row_is_fatal() {
        let text = "x\ny\nTime,Temp,A1\n0,25\n";
        assert!(parse_raw_table(text, &RawFormat::default(), b',').is_err());
    }

    #[test]
    fn missing_header_row_is_fatal() {
        assert!(parse_raw_table("only one line", &RawFormat::default(), b',').is_err());
    }

    #[test]
    fn delimiter_follows_extension() {
        let format = RawFormat::default();
        assert_eq!(resolve_delimiter(Path::new("run.csv"), &format), b',');
        assert_eq!(resolve_delimiter(Path::new("run.txt"), &format), b'\t');
        let forced = RawFormat {
            delimiter: Some(';'),
            ..RawFormat::default()
        };
        assert_eq!(resolve_delimiter(Path::new("run.csv"), &forced), b';');
    }
}
