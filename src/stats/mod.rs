//! Numeric layer behind the analyzers. Hypothesis tests come from
//! `anofox-statistics` and `normality`; this module adapts their results and
//! errors to the crate's own types.

pub mod contingency;
pub mod descriptive;
pub mod nonparametric;
pub mod parametric;
pub mod shapiro;

use crate::error::{MeteoError, Result};
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};

pub use contingency::{chi_square_independence, ChiSquareResult};
pub use nonparametric::{kendall_tau, kruskal_wallis, mann_whitney_u, KendallResult};
pub use parametric::{one_way_anova, student_t_test};
pub use shapiro::shapiro_wilk;

/// Statistic and p-value of a hypothesis test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TestResult {
    pub statistic: f64,
    pub p_value: f64,
}

impl TestResult {
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }

    /// Rejects results the underlying test could not evaluate.
    pub(crate) fn checked(test: &str, statistic: f64, p_value: f64) -> Result<Self> {
        if statistic.is_nan() || !p_value.is_finite() {
            return Err(MeteoError::Statistics(format!(
                "{} produced no usable result",
                test
            )));
        }
        Ok(Self {
            statistic,
            p_value: p_value.clamp(0.0, 1.0),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NormalityResult {
    pub statistic: f64,
    pub p_value: f64,
    pub n: usize,
}

impl NormalityResult {
    /// Consistent with a normal distribution at level `alpha`.
    pub fn is_normal(&self, alpha: f64) -> bool {
        self.p_value > alpha
    }
}

/// Two-sided p-value of a standard normal score.
pub(crate) fn two_sided_normal_p(z: f64) -> Result<f64> {
    let normal = Normal::new(0.0, 1.0).map_err(MeteoError::statistics)?;
    Ok((2.0 * normal.sf(z.abs())).min(1.0))
}
