//! Descriptive statistics on small `f64` slices.
//!
//! None of these reorder the caller's data; sorting happens on a copy.

use std::cmp::Ordering;

/// Arithmetic mean. `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample quantile by linear interpolation between order statistics.
///
/// For sorted `x[0..n]` and `p ∈ [0, 1]`: `h = (n - 1) p`,
/// `q = x[⌊h⌋] + (h - ⌊h⌋)(x[⌊h⌋ + 1] - x[⌊h⌋])`.
pub fn quantile(values: &[f64], p: f64) -> Option<f64> {
    if values.is_empty() || !(0.0..=1.0).contains(&p) {
        return None;
    }
    let sorted = sorted_copy(values);
    Some(quantile_sorted(&sorted, p))
}

fn quantile_sorted(sorted: &[f64], p: f64) -> f64 {
    let h = (sorted.len() - 1) as f64 * p;
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
}

pub fn median(values: &[f64]) -> Option<f64> {
    quantile(values, 0.5)
}

/// Interquartile range `Q3 - Q1`.
pub fn iqr(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let sorted = sorted_copy(values);
    Some(quantile_sorted(&sorted, 0.75) - quantile_sorted(&sorted, 0.25))
}

/// Index of the largest value; first occurrence on ties.
pub fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some(b) if v <= values[b] => {}
            _ => best = Some(i),
        }
    }
    best
}

/// Index of the smallest value; first occurrence on ties.
pub fn argmin(values: &[f64]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some(b) if v >= values[b] => {}
            _ => best = Some(i),
        }
    }
    best
}

/// Round to `decimals` places (half away from zero).
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantiles_interpolate_between_order_statistics() {
        let v = [7.0, 1.0, 3.0, 5.0];
        assert_eq!(median(&v), Some(4.0));
        // h = 3 * 0.25 = 0.75 -> 1 + 0.75 * 2
        assert_eq!(quantile(&v, 0.25), Some(2.5));
        assert_eq!(quantile(&v, 0.75), Some(5.5));
        assert_eq!(iqr(&v), Some(3.0));
        assert_eq!(quantile(&v, 0.0), Some(1.0));
        assert_eq!(quantile(&v, 1.0), Some(7.0));
    }

    #[test]
    fn empty_input_has_no_statistics() {
        assert_eq!(mean(&[]), None);
        assert_eq!(median(&[]), None);
        assert_eq!(iqr(&[]), None);
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn arg_extrema_take_first_occurrence() {
        let v = [1.0, 4.0, 0.5, 4.0, 0.5];
        assert_eq!(argmax(&v), Some(1));
        assert_eq!(argmin(&v), Some(2));
    }

    #[test]
    fn round_to_two_decimals() {
        assert_eq!(round_to(41.23456, 2), 41.23);
        assert_eq!(round_to(-0.005001, 2), -0.01);
    }
}
