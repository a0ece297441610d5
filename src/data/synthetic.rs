//! Synthetic plate generation.
//!
//! Each well follows a hinge-shaped fluorescence trace over a linear
//! temperature ramp:
//!
//! - slow baseline drift below the well's breakpoint (Tcrit)
//! - a steep rise from Tcrit up to the peak
//! - decay after the peak
//!
//! plus optional Gaussian noise and one saturated spike reading per well. The generator
//! is seeded, so the same config always produces the same table.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{PLATE_ROWS, RawReading, RawTable, WellId};
use crate::error::AppError;

/// Baseline fluorescence level.
const BASELINE: f64 = 200.0;
/// Pre-breakpoint drift (units / °C).
const DRIFT: f64 = 0.8;
/// Rise rate between Tcrit and the peak (units / °C).
const RISE: f64 = 60.0;
/// Post-peak decay rate (units / °C).
const DECAY: f64 = 45.0;
/// A spike is one saturated reading; after averaging into a bin it still
/// clears `median + 3 * IQR` for every trace this generator produces.
const SPIKE_LEVEL: f64 = 12_000.0;

#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    pub seed: u64,
    /// Number of plate rows used (from `A`).
    pub rows: usize,
    pub columns: u16,
    pub readings: usize,
    pub start_temp: f64,
    pub end_temp: f64,
    /// Breakpoints are drawn uniformly from this range.
    pub tcrit_min: f64,
    pub tcrit_max: f64,
    /// Standard deviation of additive reading noise.
    pub noise_sd: f64,
    pub spikes: bool,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            rows: 8,
            columns: 5,
            readings: 1750,
            start_temp: 25.0,
            end_temp: 60.0,
            tcrit_min: 38.0,
            tcrit_max: 46.0,
            noise_sd: 2.0,
            spikes: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SyntheticPlate {
    pub table: RawTable,
    /// Injected breakpoint per well (same order as `table.wells`).
    pub tcrit: Vec<(WellId, f64)>,
}

/// Noise-free trace value for a well with breakpoint `tcrit` and peak `tpeak`.
pub fn trace_value(t: f64, tcrit: f64, tpeak: f64) -> f64 {
    let rise_end = t.min(tpeak);
    BASELINE + DRIFT * t + RISE * (rise_end - tcrit).max(0.0) - DECAY * (t - tpeak).max(0.0)
}

pub fn generate_plate(config: &SyntheticConfig) -> Result<SyntheticPlate, AppError> {
    if config.rows == 0 || config.rows > PLATE_ROWS.len() {
        return Err(AppError::input(format!("Rows must be within 1..={}.", PLATE_ROWS.len())));
    }
    if config.columns == 0 {
        return Err(AppError::input("Columns must be >= 1."));
    }
    if config.readings < 2 {
        return Err(AppError::input("Readings must be >= 2."));
    }
    if !(config.start_temp.is_finite() && config.end_temp.is_finite() && config.end_temp > config.start_temp) {
        return Err(AppError::input("Invalid temperature ramp."));
    }
    if !(config.tcrit_min.is_finite() && config.tcrit_max.is_finite() && config.tcrit_max >= config.tcrit_min) {
        return Err(AppError::input("Invalid Tcrit range."));
    }
    if !(config.noise_sd.is_finite() && config.noise_sd >= 0.0) {
        return Err(AppError::input("Noise standard deviation must be finite and >= 0."));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let noise = Normal::new(0.0, config.noise_sd)
        .map_err(|e| AppError::input(format!("Noise distribution error: {e}")))?;

    let wells: Vec<WellId> = PLATE_ROWS[..config.rows]
        .iter()
        .flat_map(|&row| (1..=config.columns).filter_map(move |col| WellId::new(row, col)))
        .collect();

    // Per-well shape parameters, drawn up front so they do not depend on
    // the number of readings.
    let shapes: Vec<(f64, f64, Option<usize>)> = wells
        .iter()
        .map(|_| {
            let tcrit = rng.gen_range(config.tcrit_min..=config.tcrit_max);
            let tpeak = tcrit + rng.gen_range(6.0..=10.0);
            let spike = config.spikes.then(|| rng.gen_range(0..config.readings));
            (tcrit, tpeak, spike)
        })
        .collect();

    let step = (config.end_temp - config.start_temp) / (config.readings - 1) as f64;
    let readings = (0..config.readings)
        .map(|i| {
            let t = config.start_temp + step * i as f64;
            let fluorescence = shapes
                .iter()
                .map(|&(tcrit, tpeak, spike)| {
                    let v = if spike == Some(i) {
                        SPIKE_LEVEL
                    } else {
                        trace_value(t, tcrit, tpeak)
                    };
                    v + noise.sample(&mut rng)
                })
                .collect();
            RawReading {
                time: format!("{}", i * 2),
                temperature: t,
                fluorescence,
            }
        })
        .collect();

    let tcrit = wells.iter().zip(&shapes).map(|(&w, &(t, _, _))| (w, t)).collect();
    Ok(SyntheticPlate {
        table: RawTable::new(wells, readings),
        tcrit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_plate() {
        let cfg = SyntheticConfig {
            rows: 2,
            columns: 3,
            readings: 50,
            ..SyntheticConfig::default()
        };
        let a = generate_plate(&cfg).unwrap();
        let b = generate_plate(&cfg).unwrap();
        assert_eq!(a.table.readings, b.table.readings);
        assert_eq!(a.tcrit, b.tcrit);
        assert_eq!(a.table.wells.len(), 6);
        assert_eq!(a.table.wells[5].to_string(), "B3");
    }

    #[test]
    fn trace_is_flat_then_rises_then_decays() {
        let (tcrit, tpeak) = (40.0, 48.0);
        let before = trace_value(39.0, tcrit, tpeak) - trace_value(38.0, tcrit, tpeak);
        let rising = trace_value(42.0, tcrit, tpeak) - trace_value(41.0, tcrit, tpeak);
        let after = trace_value(50.0, tcrit, tpeak) - trace_value(49.0, tcrit, tpeak);
        assert!((before - DRIFT).abs() < 1e-9);
        assert!((rising - (DRIFT + RISE)).abs() < 1e-9);
        assert!(after < 0.0);
    }

    #[test]
    fn rejects_too_many_rows() {
        let cfg = SyntheticConfig {
            rows: 9,
            ..SyntheticConfig::default()
        };
        assert!(generate_plate(&cfg).is_err());
    }
}
