//! Plate geometry and well identifiers.
//!
//! Wells are labelled by row letter (`A`–`H`) and 1-based column number
//! (`1..=columns`). The column count varies between instrument setups, the
//! row set does not.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

/// Row letters available on the plate.
pub const PLATE_ROWS: &[char] = &['A', 'B', 'C', 'D', 'E', 'F', 'G', 'H'];

/// Default number of columns (a 96-well plate).
pub const DEFAULT_PLATE_COLUMNS: u16 = 12;

/// A well position such as `A1` or `H12`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WellId {
    row: char,
    column: u16,
}

impl WellId {
    pub fn new(row: char, column: u16) -> Option<Self> {
        let row = row.to_ascii_uppercase();
        if PLATE_ROWS.contains(&row) && column >= 1 {
            Some(Self { row, column })
        } else {
            None
        }
    }

    pub fn row(&self) -> char {
        self.row
    }

    pub fn column(&self) -> u16 {
        self.column
    }

    fn row_index(&self) -> usize {
        PLATE_ROWS.iter().position(|&r| r == self.row).unwrap_or(PLATE_ROWS.len())
    }
}

impl FromStr for WellId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let mut chars = s.chars();
        let Some(row) = chars.next() else {
            return Err("empty well label".to_string());
        };
        let digits = chars.as_str();
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(format!("invalid well label `{s}` (expected e.g. `A1`)"));
        }
        let column: u16 = digits
            .parse()
            .map_err(|_| format!("invalid well column in `{s}`"))?;
        WellId::new(row, column).ok_or_else(|| format!("invalid well label `{s}` (rows A-H, columns from 1)"))
    }
}

impl fmt::Display for WellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.row, self.column)
    }
}

impl Serialize for WellId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Plate order: row letter first, then numeric column (`A2` before `A10`).
impl Ord for WellId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.row_index()
            .cmp(&other.row_index())
            .then(self.column.cmp(&other.column))
    }
}

impl PartialOrd for WellId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Fixed plate geometry used to validate well columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlateLayout {
    pub columns: u16,
}

impl Default for PlateLayout {
    fn default() -> Self {
        Self {
            columns: DEFAULT_PLATE_COLUMNS,
        }
    }
}

impl PlateLayout {
    pub fn new(columns: u16) -> Self {
        Self { columns }
    }

    pub fn contains(&self, well: &WellId) -> bool {
        well.column <= self.columns
    }

    /// Parse a header label and check it lies on this plate.
    pub fn parse_well(&self, label: &str) -> Result<WellId, String> {
        let well: WellId = label.parse()?;
        if !self.contains(&well) {
            return Err(format!(
                "well `{well}` is outside the plate layout ({} rows x {} columns)",
                PLATE_ROWS.len(),
                self.columns
            ));
        }
        Ok(well)
    }
}
