//! Raw-file discovery and output naming.
//!
//! A raw file counts as processed once `<out_dir>/<stem>.csv` exists. Pending
//! files are the set difference, in deterministic (name) order. Nothing here
//! locks: two concurrent runs may pick the same file.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::AppError;

/// Every artifact of one run shares the raw file's stem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub table: PathBuf,
    pub plot_dir: PathBuf,
    pub summary: PathBuf,
}

impl OutputPaths {
    pub fn for_input(input: &Path, out_dir: &Path) -> Result<Self, AppError> {
        let stem = input
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::input(format!("Cannot derive a base name from '{}'.", input.display())))?;
        let paths = OutputPaths {
            table: out_dir.join(format!("{stem}.csv")),
            plot_dir: out_dir.join(stem),
            summary: out_dir.join(format!("{stem}_summary.json")),
        };
        if same_file(&paths.table, input) {
            return Err(AppError::input(format!(
                "Result table would overwrite the input '{}'; use a different --out-dir.",
                input.display()
            )));
        }
        Ok(paths)
    }
}

/// Path equality after resolving each parent directory, so `./d/x.csv`,
/// `d/x.csv` and `d/../d/x.csv` compare equal. The file itself need not exist.
fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    let resolve = |p: &Path| -> Option<PathBuf> {
        let parent = p.parent().filter(|d| !d.as_os_str().is_empty()).unwrap_or(Path::new("."));
        Some(fs::canonicalize(parent).ok()?.join(p.file_name()?))
    };
    matches!((resolve(a), resolve(b)), (Some(x), Some(y)) if x == y)
}

/// Create `dir` (and parents) if missing.
pub fn ensure_dir(dir: &Path) -> Result<(), AppError> {
    fs::create_dir_all(dir)
        .map_err(|e| AppError::output(format!("Failed to create directory '{}': {e}", dir.display())))
}

/// Raw files in `raw_dir` without a result table in `out_dir`.
pub fn pending_raw_files(raw_dir: &Path, out_dir: &Path) -> Result<Vec<PathBuf>, AppError> {
    let entries = fs::read_dir(raw_dir)
        .map_err(|e| AppError::input(format!("Failed to read raw directory '{}': {e}", raw_dir.display())))?;

    let mut out = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        let is_file = entry.file_type().map(|ft| ft.is_file()).unwrap_or(false);
        if !is_file || is_hidden(&path) {
            continue;
        }
        let processed = OutputPaths::for_input(&path, out_dir)
            .map(|p| p.table.exists())
            .unwrap_or(true);
        if !processed {
            out.push(path);
        }
    }
    out.sort();
    Ok(out)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|s| s.starts_with('.'))
        .unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outputs_share_the_input_stem() {
        let paths = OutputPaths::for_input(Path::new("raw/plate_07.txt"), Path::new("results")).unwrap();
        assert_eq!(paths.table, PathBuf::from("results/plate_07.csv"));
        assert_eq!(paths.plot_dir, PathBuf::from("results/plate_07"));
        assert_eq!(paths.summary, PathBuf::from("results/plate_07_summary.json"));
    }

    #[test]
    fn refuses_to_overwrite_input() {
        assert!(OutputPaths::for_input(Path::new("data/run.csv"), Path::new("data")).is_err());
    }

    #[test]
    fn refuses_to_overwrite_input_spelled_differently() {
        let tmp = tempfile::TempDir::new().unwrap();
        let data = tmp.path().join("data");
        fs::create_dir_all(tmp.path().join("other")).unwrap();
        fs::create_dir_all(&data).unwrap();
        fs::write(data.join("run.csv"), "x").unwrap();

        let roundabout = tmp.path().join("other").join("..").join("data").join("run.csv");
        assert!(OutputPaths::for_input(&roundabout, &data).is_err());
        assert!(OutputPaths::for_input(&roundabout, &tmp.path().join("results")).is_ok());
    }
}
