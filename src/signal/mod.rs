//! Per-well signal processing ahead of the breakpoint fit.
//!
//! - positional temperature binning (`binning`)
//! - median + k·IQR outlier rejection (`outliers`)
//! - causal min/max rescaling (`rescale`)
//! - Tmax / T50 lookup (`landmarks`)

pub mod binning;
pub mod landmarks;
pub mod outliers;
pub mod rescale;

pub use binning::*;
pub use landmarks::*;
pub use outliers::*;
pub use rescale::*;
