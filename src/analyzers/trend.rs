use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::fmt;
use tracing::debug;

use crate::config::AnalysisConfig;
use crate::error::{MeteoError, Result};
use crate::models::{Series, Variable};
use crate::stats::descriptive::all_tied;
use crate::stats::kendall_tau;
use crate::utils::constants::DEFAULT_SIGNIFICANCE_LEVEL;

/// Days from 0001-01-01 to 1970-01-01 in the proleptic Gregorian calendar.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

const MIN_TREND_POINTS: usize = 3;

pub fn days_since_epoch(date: NaiveDate) -> i64 {
    i64::from(date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    NoSignificantTrend,
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendDirection::Increasing => write!(f, "increasing"),
            TrendDirection::Decreasing => write!(f, "decreasing"),
            TrendDirection::NoSignificantTrend => write!(f, "no significant trend"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendResult {
    pub variable: Variable,
    pub tau: f64,
    pub p_value: f64,
    pub n: usize,
    pub direction: TrendDirection,
}

impl TrendResult {
    pub fn summary(&self) -> String {
        format!(
            "{}: Kendall's tau = {:.4}, p = {:.4} over {} days ({})",
            self.variable.label(),
            self.tau,
            self.p_value,
            self.n,
            self.direction
        )
    }
}

/// Monotonic trend of a variable against time.
#[derive(Debug, Clone)]
pub struct TrendTester {
    significance_level: f64,
}

impl TrendTester {
    pub fn new() -> Self {
        Self {
            significance_level: DEFAULT_SIGNIFICANCE_LEVEL,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            significance_level: config.significance_level,
        }
    }

    pub fn with_significance_level(mut self, significance_level: f64) -> Self {
        self.significance_level = significance_level;
        self
    }

    /// Kendall's tau-b between the day number and the non-absent values of
    /// `variable`.
    pub fn test(&self, series: &Series, variable: Variable) -> Result<TrendResult> {
        let points = series.points(variable);
        if points.len() < MIN_TREND_POINTS {
            return Err(MeteoError::insufficient(
                format!("{} trend", variable),
                MIN_TREND_POINTS,
                points.len(),
            ));
        }

        let (days, values): (Vec<f64>, Vec<f64>) = points
            .iter()
            .map(|&(date, value)| (days_since_epoch(date) as f64, value))
            .unzip();

        if all_tied(&values) {
            return Err(MeteoError::insufficient(
                format!("{} trend (distinct values)", variable),
                2,
                1,
            ));
        }

        let kendall = kendall_tau(&days, &values)?;
        let direction = if kendall.p_value >= self.significance_level {
            TrendDirection::NoSignificantTrend
        } else if kendall.tau > 0.0 {
            TrendDirection::Increasing
        } else if kendall.tau < 0.0 {
            TrendDirection::Decreasing
        } else {
            TrendDirection::NoSignificantTrend
        };
        debug!(
            "{} trend: tau {:.4}, p {:.4}, {}",
            variable, kendall.tau, kendall.p_value, direction
        );

        Ok(TrendResult {
            variable,
            tau: kendall.tau,
            p_value: kendall.p_value,
            n: kendall.n,
            direction,
        })
    }
}

impl Default for TrendTester {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Observation;
    use chrono::Duration;

    fn series_from(values: &[Option<f64>]) -> Series {
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                Observation::new(start + Duration::days(i as i64))
                    .with_value(Variable::Temperature, v)
            })
            .collect()
    }

    #[test]
    fn test_days_since_epoch() {
        assert_eq!(days_since_epoch(NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()), 0);
        assert_eq!(days_since_epoch(NaiveDate::from_ymd_opt(1970, 1, 2).unwrap()), 1);
        assert_eq!(
            days_since_epoch(NaiveDate::from_ymd_opt(2000, 1, 1).unwrap()),
            10_957
        );
        assert_eq!(days_since_epoch(NaiveDate::from_ymd_opt(1969, 12, 31).unwrap()), -1);
    }

    #[test]
    fn test_strictly_increasing_series() {
        let values: Vec<Option<f64>> = (0..30).map(|i| Some(i as f64 * 0.5)).collect();
        let result = TrendTester::new().test(&series_from(&values), Variable::Temperature).unwrap();

        assert!((result.tau - 1.0).abs() < 1e-12);
        assert!(result.p_value < 0.001);
        assert_eq!(result.direction, TrendDirection::Increasing);
    }

    #[test]
    fn test_decreasing_series() {
        let values: Vec<Option<f64>> = (0..20).map(|i| Some(100.0 - i as f64)).collect();
        let result = TrendTester::new().test(&series_from(&values), Variable::Temperature).unwrap();

        assert!((result.tau + 1.0).abs() < 1e-12);
        assert_eq!(result.direction, TrendDirection::Decreasing);
    }

    #[test]
    fn test_alternating_series_has_no_trend() {
        let values: Vec<Option<f64>> = (0..40)
            .map(|i| Some(if i % 2 == 0 { 1.0 } else { 2.0 }))
            .collect();
        let result = TrendTester::new().test(&series_from(&values), Variable::Temperature).unwrap();

        assert_eq!(result.direction, TrendDirection::NoSignificantTrend);
    }

    #[test]
    fn test_absent_values_are_skipped() {
        let values = vec![Some(1.0), None, Some(2.0), None, Some(3.0), Some(4.0)];
        let result = TrendTester::new().test(&series_from(&values), Variable::Temperature).unwrap();

        assert_eq!(result.n, 4);
        assert!((result.tau - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_too_few_points() {
        let values = vec![Some(1.0), None, Some(2.0)];
        let err = TrendTester::new()
            .test(&series_from(&values), Variable::Temperature)
            .unwrap_err();
        assert!(matches!(
            err,
            MeteoError::InsufficientData {
                required: 3,
                found: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_constant_series_reports_distinct_values() {
        let values = vec![Some(7.0); 10];
        let err = TrendTester::new()
            .test(&series_from(&values), Variable::Temperature)
            .unwrap_err();
        match err {
            MeteoError::InsufficientData {
                context,
                required,
                found,
            } => {
                assert!(context.contains("distinct values"), "{}", context);
                assert_eq!((required, found), (2, 1));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }
}
