//! Tmax / T50 detection.
//!
//! Both are index lookups on the scaled series, never float equality tests:
//! Tmax sits at the rescaler's argmax, T50 at the rising-phase point whose
//! scaled value is nearest 0.5.

use crate::domain::{Landmarks, ScaledSeries};
use crate::error::{Stage, WellFailure};

const HALF: f64 = 0.5;

pub fn detect_landmarks(series: &ScaledSeries) -> Result<Landmarks, WellFailure> {
    let tmax_index = series.max_index;
    let Some(peak) = series.points.get(tmax_index) else {
        return Err(WellFailure::degenerate(Stage::Landmarks, "peak index out of range"));
    };

    // Rising phase only: indices 0..=argmax. Strict `<` keeps the first of
    // equally close candidates.
    let mut t50_index = 0;
    let mut best = f64::INFINITY;
    for (i, p) in series.points[..=tmax_index].iter().enumerate() {
        let dist = (p.scaled - HALF).abs();
        if dist < best {
            best = dist;
            t50_index = i;
        }
    }

    Ok(Landmarks {
        t50: series.points[t50_index].temperature,
        tmax: peak.temperature,
        t50_index,
        tmax_index,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{SeriesPoint, WellSeries};
    use crate::signal::rescale::rescale;

    fn scaled(temps: &[f64], values: &[f64]) -> ScaledSeries {
        let s = WellSeries {
            well: "D4".parse().unwrap(),
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
        };
        rescale(&s).unwrap()
    }

    #[test]
    fn monotone_rise_then_plateau() {
        // 16 points, 30..60 step 2; rises linearly to 100 at 50 then stays flat.
        let temps: Vec<f64> = (0..16).map(|i| 30.0 + 2.0 * i as f64).collect();
        let values: Vec<f64> = temps.iter().map(|&t| ((t - 30.0) * 5.0).min(100.0)).collect();
        let lm = detect_landmarks(&scaled(&temps, &values)).unwrap();
        assert_eq!(lm.tmax, 50.0);
        assert_eq!(lm.t50, 40.0);
        assert!(lm.t50 <= lm.tmax);
    }

    #[test]
    fn ignores_half_crossing_after_peak() {
        // Decay passes exactly 0.5 after the peak; rising phase only has 0.4.
        let temps = [30.0, 32.0, 34.0, 36.0, 38.0];
        let values = [0.0, 40.0, 100.0, 50.0, 10.0];
        let lm = detect_landmarks(&scaled(&temps, &values)).unwrap();
        assert_eq!(lm.tmax, 34.0);
        assert_eq!(lm.t50, 32.0);
    }

    #[test]
    fn tie_goes_to_first_point() {
        let temps = [30.0, 32.0, 34.0, 36.0];
        let values = [0.0, 25.0, 75.0, 100.0];
        let lm = detect_landmarks(&scaled(&temps, &values)).unwrap();
        assert_eq!(lm.t50_index, 1);
        assert_eq!(lm.t50, 32.0);
    }
}
