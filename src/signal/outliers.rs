//! Per-well outlier rejection.
//!
//! A bin is flagged when its fluorescence exceeds `median + k * IQR`, with the
//! median and IQR taken over the whole well series (flagged points included).
//! Flagged points are dropped, not interpolated. Only the upper tail is
//! screened: spikes, not dips, are what corrupt the max-based rescaling.

use crate::domain::WellSeries;
use crate::math::{iqr, median};

/// Outcome of screening one well.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlierReport {
    pub median: f64,
    pub iqr: f64,
    pub threshold: f64,
    /// One flag per input point.
    pub flags: Vec<bool>,
    /// Input series minus flagged points.
    pub filtered: WellSeries,
}

impl OutlierReport {
    pub fn removed(&self) -> usize {
        self.flags.iter().filter(|&&f| f).count()
    }
}

pub fn filter_outliers(series: &WellSeries, iqr_multiplier: f64) -> OutlierReport {
    let values = series.fluorescence();
    let (med, spread) = match (median(&values), iqr(&values)) {
        (Some(m), Some(s)) => (m, s),
        // Empty series: nothing to flag.
        _ => (f64::NAN, f64::NAN),
    };
    let threshold = med + iqr_multiplier * spread;

    let flags: Vec<bool> = values.iter().map(|&v| threshold.is_finite() && v > threshold).collect();
    let points = series
        .points
        .iter()
        .zip(&flags)
        .filter(|(_, flagged)| !**flagged)
        .map(|(p, _)| *p)
        .collect();

    OutlierReport {
        median: med,
        iqr: spread,
        threshold,
        flags,
        filtered: WellSeries {
            well: series.well,
            points,
        },
    }
}
