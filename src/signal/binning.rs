//! Positional temperature binning.
//!
//! Readings are grouped by row order into chunks of `bin_size`; temperature
//! and each well's fluorescence are averaged independently per chunk. Binning
//! never looks at temperature values, so a non-monotonic ramp still bins by
//! position.

use tracing::warn;

use crate::domain::{RawTable, RemainderPolicy, SeriesPoint, TemperatureBin, WellSeries};
use crate::error::{AppError, EXIT_NO_DATA};
use crate::math::mean;

/// Binned view of a raw table.
#[derive(Debug, Clone)]
pub struct BinnedPlate {
    pub bins: Vec<TemperatureBin>,
    pub series: Vec<WellSeries>,
    /// Trailing readings dropped under `RemainderPolicy::Truncate`.
    pub dropped_readings: usize,
}

pub fn bin_readings(
    table: &RawTable,
    bin_size: usize,
    policy: RemainderPolicy,
) -> Result<BinnedPlate, AppError> {
    if bin_size == 0 {
        return Err(AppError::input("Bin size must be >= 1."));
    }
    let n = table.readings.len();
    if n == 0 {
        return Err(AppError::new(EXIT_NO_DATA, "Raw file contains no readings."));
    }

    let remainder = n % bin_size;
    if remainder != 0 {
        match policy {
            RemainderPolicy::Fail => {
                return Err(AppError::input(format!(
                    "Reading count {n} is not a multiple of the bin size {bin_size} \
                     ({remainder} trailing readings). Use --truncate-partial-bin to drop them."
                )));
            }
            RemainderPolicy::Truncate => {
                warn!(readings = n, bin_size, dropped = remainder, "dropping trailing partial bin");
            }
        }
    }

    let n_bins = n / bin_size;
    if n_bins == 0 {
        return Err(AppError::new(
            EXIT_NO_DATA,
            format!("Fewer readings ({n}) than one bin ({bin_size})."),
        ));
    }

    let mut bins = Vec::with_capacity(n_bins);
    let mut series: Vec<WellSeries> = table
        .wells
        .iter()
        .map(|&well| WellSeries {
            well,
            points: Vec::with_capacity(n_bins),
        })
        .collect();

    for (index, chunk) in table.readings.chunks_exact(bin_size).enumerate() {
        let temps: Vec<f64> = chunk.iter().map(|r| r.temperature).collect();
        let temperature = mean(&temps).unwrap_or(f64::NAN);
        bins.push(TemperatureBin { index, temperature });

        for (w, well_series) in series.iter_mut().enumerate() {
            let values: Vec<f64> = chunk.iter().map(|r| r.fluorescence[w]).collect();
            well_series.points.push(SeriesPoint {
                bin_index: index,
                temperature,
                fluorescence: mean(&values).unwrap_or(f64::NAN),
            });
        }
    }

    Ok(BinnedPlate {
        bins,
        series,
        dropped_readings: remainder,
    })
}
