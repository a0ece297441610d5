//! Error types.
//!
//! Two layers:
//!
//! - `AppError`: fatal for the run (bad input file, bad config, output I/O).
//!   Carries the process exit code.
//! - `WellFailure`: recoverable, scoped to one well. The pipeline records it in
//!   that well's outcome and keeps going with the remaining wells.

use std::fmt;

use serde::Serialize;

/// Exit code for malformed input files and invalid configuration.
pub const EXIT_INPUT: u8 = 2;
/// Exit code when the input parses but yields nothing to analyze.
pub const EXIT_NO_DATA: u8 = 3;
/// Exit code for output/internal failures.
pub const EXIT_OUTPUT: u8 = 4;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn input(message: impl Into<String>) -> Self {
        Self::new(EXIT_INPUT, message)
    }

    pub fn output(message: impl Into<String>) -> Self {
        Self::new(EXIT_OUTPUT, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Debug for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Pipeline stage a per-well failure originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Rescale,
    Landmarks,
    Breakpoint,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Rescale => "rescale",
            Stage::Landmarks => "landmarks",
            Stage::Breakpoint => "breakpoint",
        };
        f.write_str(name)
    }
}

/// Recoverable, per-well failure.
#[derive(Debug, Clone, PartialEq)]
pub enum WellFailure {
    /// The trace cannot be rescaled meaningfully (flat, empty, or peak not
    /// after the baseline).
    DegenerateScale { stage: Stage, reason: String },
    /// The segmented regression did not produce a usable breakpoint.
    Convergence { reason: String },
}

impl WellFailure {
    pub fn degenerate(stage: Stage, reason: impl Into<String>) -> Self {
        WellFailure::DegenerateScale {
            stage,
            reason: reason.into(),
        }
    }

    pub fn convergence(reason: impl Into<String>) -> Self {
        WellFailure::Convergence {
            reason: reason.into(),
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            WellFailure::DegenerateScale { stage, .. } => *stage,
            WellFailure::Convergence { .. } => Stage::Breakpoint,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        matches!(self, WellFailure::DegenerateScale { .. })
    }
}

impl fmt::Display for WellFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WellFailure::DegenerateScale { stage, reason } => {
                write!(f, "degenerate scale at {stage}: {reason}")
            }
            WellFailure::Convergence { reason } => {
                write!(f, "breakpoint fit did not converge: {reason}")
            }
        }
    }
}

impl std::error::Error for WellFailure {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_failure_reports_stage() {
        let f = WellFailure::convergence("too few points");
        assert_eq!(f.stage(), Stage::Breakpoint);
        assert!(!f.is_degenerate());
        assert!(f.to_string().contains("too few points"));

        let d = WellFailure::degenerate(Stage::Rescale, "flat trace");
        assert_eq!(d.stage(), Stage::Rescale);
        assert!(d.is_degenerate());
        assert_eq!(d.to_string(), "degenerate scale at rescale: flat trace");
    }
}
