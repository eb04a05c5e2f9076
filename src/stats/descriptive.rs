//! Summary statistics over plain `f64` slices. Callers strip absent values
//! before getting here.

use statrs::statistics::Statistics;
use std::cmp::Ordering;

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.mean())
}

pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Quantile of ascending `sorted` values, interpolating linearly between the
/// two nearest order statistics (`h = (n - 1) * q`).
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    let h = (sorted.len() - 1) as f64 * q;
    let lower = h.floor() as usize;
    let upper = h.ceil() as usize;
    let fraction = h - lower as f64;
    Some(sorted[lower] + fraction * (sorted[upper] - sorted[lower]))
}

pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    quantile_sorted(&sorted(values), q)
}

/// Sizes of the groups of equal values (only groups larger than one).
pub fn tie_groups(values: &[f64]) -> Vec<usize> {
    let sorted = sorted(values);
    let mut groups = Vec::new();
    let mut run = 1;
    for pair in sorted.windows(2) {
        if pair[0].total_cmp(&pair[1]) == Ordering::Equal {
            run += 1;
        } else {
            if run > 1 {
                groups.push(run);
            }
            run = 1;
        }
    }
    if run > 1 {
        groups.push(run);
    }
    groups
}

/// True when every value equals the first one. Empty input counts as tied.
pub fn all_tied(values: &[f64]) -> bool {
    match values.first() {
        Some(first) => values.iter().all(|v| v.total_cmp(first) == Ordering::Equal),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[2.0, 4.0]), Some(3.0));
        assert!((mean(&[1.0, 2.0, 3.0, 4.0]).unwrap() - 2.5).abs() < 1e-12);
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_quartiles_interpolate() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 100.0];
        assert!((quantile(&values, 0.25).unwrap() - 2.25).abs() < 1e-12);
        assert!((quantile(&values, 0.75).unwrap() - 4.75).abs() < 1e-12);
        assert_eq!(quantile(&values, 0.0), Some(1.0));
        assert_eq!(quantile(&values, 1.0), Some(100.0));
        assert_eq!(quantile(&[], 0.5), None);
        assert_eq!(quantile(&[7.0], 0.5), Some(7.0));
    }

    #[test]
    fn test_tie_groups() {
        assert_eq!(tie_groups(&[1.0, 2.0, 2.0, 3.0, 3.0, 3.0]), vec![2, 3]);
        assert!(tie_groups(&[1.0, 2.0]).is_empty());
    }

    #[test]
    fn test_all_tied() {
        assert!(all_tied(&[0.0, 0.0, 0.0]));
        assert!(!all_tied(&[0.0, 0.0, 0.1]));
    }
}
