//! Causally constrained min/max rescaling.
//!
//! `fluor_max` is the global maximum of the filtered series. `fluor_min` is
//! searched only among points at or below the peak temperature: a low value
//! after the peak is post-damage decay, not baseline.

use crate::domain::{ScaledPoint, ScaledSeries, WellSeries};
use crate::error::{Stage, WellFailure};
use crate::math::{argmax, argmin};

pub fn rescale(series: &WellSeries) -> Result<ScaledSeries, WellFailure> {
    let values = series.fluorescence();
    let Some(max_index) = argmax(&values) else {
        return Err(WellFailure::degenerate(
            Stage::Rescale,
            "no points left after outlier filtering",
        ));
    };
    if values.iter().any(|v| !v.is_finite()) {
        return Err(WellFailure::degenerate(Stage::Rescale, "non-finite fluorescence value"));
    }

    let fluor_max = values[max_index];
    let t_max = series.points[max_index].temperature;

    // Candidates for the baseline: everything not hotter than the peak.
    let causal: Vec<usize> = series
        .points
        .iter()
        .enumerate()
        .filter(|(_, p)| p.temperature <= t_max)
        .map(|(i, _)| i)
        .collect();
    let causal_values: Vec<f64> = causal.iter().map(|&i| values[i]).collect();
    let min_index = argmin(&causal_values)
        .map(|k| causal[k])
        .unwrap_or(max_index);

    let fluor_min = values[min_index];
    let t_min = series.points[min_index].temperature;

    let range = fluor_max - fluor_min;
    if !(range > 0.0) {
        return Err(WellFailure::degenerate(
            Stage::Rescale,
            format!("fluor_max == fluor_min ({fluor_max})"),
        ));
    }

    let points = series
        .points
        .iter()
        .map(|p| ScaledPoint {
            bin_index: p.bin_index,
            temperature: p.temperature,
            fluorescence: p.fluorescence,
            scaled: (p.fluorescence - fluor_min) / range,
        })
        .collect();

    Ok(ScaledSeries {
        well: series.well,
        points,
        fluor_min,
        fluor_max,
        t_min,
        t_max,
        min_index,
        max_index,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SeriesPoint;

    fn series(temps: &[f64], values: &[f64]) -> WellSeries {
        WellSeries {
            well: "A1".parse().unwrap(),
            points: temps
                .iter()
                .zip(values)
                .enumerate()
                .map(|(i, (&t, &v))| SeriesPoint {
                    bin_index: i,
                    temperature: t,
                    fluorescence: v,
                })
                .collect(),
        }
    }

    #[test]
    fn extremes_map_to_zero_and_one() {
        let s = series(&[30.0, 32.0, 34.0, 36.0], &[20.0, 10.0, 50.0, 110.0]);
        let scaled = rescale(&s).unwrap();
        assert_eq!(scaled.fluor_min, 10.0);
        assert_eq!(scaled.fluor_max, 110.0);
        assert_eq!(scaled.points[scaled.max_index].scaled, 1.0);
        assert_eq!(scaled.points[scaled.min_index].scaled, 0.0);
        assert_eq!(scaled.t_min, 32.0);
        assert_eq!(scaled.t_max, 36.0);
        assert!(scaled.check());
        for p in &scaled.points {
            assert!((0.0..=1.0).contains(&p.scaled));
        }
    }

    #[test]
    fn post_peak_decay_is_not_baseline() {
        let s = series(&[30.0, 32.0, 34.0, 36.0, 38.0], &[20.0, 40.0, 100.0, 30.0, 5.0]);
        let scaled = rescale(&s).unwrap();
        assert_eq!(scaled.fluor_min, 20.0);
        assert_eq!(scaled.t_min, 30.0);
        // The decayed point falls below the baseline and keeps its negative value.
        assert!(scaled.points[4].scaled < 0.0);
    }

    #[test]
    fn flat_trace_is_degenerate() {
        let s = series(&[30.0, 32.0, 34.0], &[7.0, 7.0, 7.0]);
        let err = rescale(&s).unwrap_err();
        assert!(err.is_degenerate());
        assert_eq!(err.stage(), Stage::Rescale);
    }

    #[test]
    fn peak_first_fails_the_check() {
        let s = series(&[30.0, 32.0, 34.0], &[90.0, 50.0, 10.0]);
        let scaled = rescale(&s);
        // Only the peak itself is a baseline candidate, so the range collapses.
        assert!(scaled.unwrap_err().is_degenerate());
    }

    #[test]
    fn repeated_peak_temperature_fails_the_check() {
        // Stalled ramp: the baseline shares the peak's temperature.
        let s = series(&[30.0, 30.0, 32.0], &[50.0, 10.0, 40.0]);
        let scaled = rescale(&s).unwrap();
        assert_eq!(scaled.t_max, 30.0);
        assert_eq!(scaled.t_min, 30.0);
        assert!(!scaled.check());
    }

    #[test]
    fn empty_series_is_degenerate() {
        let s = series(&[], &[]);
        assert!(rescale(&s).unwrap_err().is_degenerate());
    }
}
