//! Shapiro–Wilk normality test, backed by the `normality` crate.

use crate::error::{MeteoError, Result};
use crate::stats::descriptive::all_tied;
use crate::stats::NormalityResult;
use crate::utils::constants::{MAX_NORMALITY_SAMPLES, MIN_NORMALITY_SAMPLES};

/// Shapiro–Wilk W statistic and p-value for 3 to 5000 observations.
pub fn shapiro_wilk(values: &[f64]) -> Result<NormalityResult> {
    let n = values.len();
    if n < MIN_NORMALITY_SAMPLES {
        return Err(MeteoError::insufficient(
            "Shapiro-Wilk test",
            MIN_NORMALITY_SAMPLES,
            n,
        ));
    }
    if n > MAX_NORMALITY_SAMPLES {
        return Err(MeteoError::Statistics(format!(
            "Shapiro-Wilk test supports at most {} values, got {}",
            MAX_NORMALITY_SAMPLES, n
        )));
    }
    if all_tied(values) {
        return Err(MeteoError::Statistics(
            "Shapiro-Wilk test is undefined for a sample with zero range".to_string(),
        ));
    }

    let computation = normality::shapiro_wilk(values.to_vec()).map_err(MeteoError::statistics)?;
    if !computation.p_value.is_finite() {
        return Err(MeteoError::Statistics(format!(
            "Shapiro-Wilk test produced no p-value for {} values",
            n
        )));
    }

    Ok(NormalityResult {
        statistic: computation.statistic,
        p_value: computation.p_value,
        n,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use statrs::distribution::{ContinuousCDF, Normal};

    fn normal_scores(n: usize) -> Vec<f64> {
        let normal = Normal::new(15.0, 2.0).unwrap();
        (1..=n)
            .map(|i| normal.inverse_cdf((i as f64 - 0.5) / n as f64))
            .collect()
    }

    #[test]
    fn test_normal_sample_passes() {
        for n in [8, 20, 31, 365] {
            let result = shapiro_wilk(&normal_scores(n)).unwrap();
            assert!(result.statistic > 0.95, "n = {n}: W = {}", result.statistic);
            assert!(result.is_normal(0.05), "n = {n}: p = {}", result.p_value);
            assert_eq!(result.n, n);
        }
    }

    #[test]
    fn test_skewed_sample_fails() {
        let mut values = vec![1.0; 9];
        values.push(50.0);
        let result = shapiro_wilk(&values).unwrap();
        assert!(result.p_value < 0.001);
        assert!(!result.is_normal(0.05));

        let exponential: Vec<f64> = (1..=40).map(|i| (i as f64 / 4.0).exp()).collect();
        assert!(shapiro_wilk(&exponential).unwrap().p_value < 0.05);
    }

    #[test]
    fn test_matches_reference_values() {
        // R: shapiro.test(c(148, 154, 158, 160, 161, 162, 166, 170, 182, 195, 236))
        let values = [
            148.0, 154.0, 158.0, 160.0, 161.0, 162.0, 166.0, 170.0, 182.0, 195.0, 236.0,
        ];
        let result = shapiro_wilk(&values).unwrap();
        assert!((result.statistic - 0.78881).abs() < 1e-3, "{}", result.statistic);
        assert!((result.p_value - 0.006704).abs() < 1e-3, "{}", result.p_value);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert!(matches!(
            shapiro_wilk(&[1.0, 2.0]),
            Err(MeteoError::InsufficientData { required: 3, found: 2, .. })
        ));
        assert!(matches!(
            shapiro_wilk(&[4.0, 4.0, 4.0, 4.0]),
            Err(MeteoError::Statistics(_))
        ));
        assert!(matches!(
            shapiro_wilk(&vec![1.0; MAX_NORMALITY_SAMPLES + 1]),
            Err(MeteoError::Statistics(_))
        ));
    }
}
