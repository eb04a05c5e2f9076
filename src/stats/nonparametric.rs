//! Rank-based tests. Mann–Whitney and Kruskal–Wallis come from
//! `anofox-statistics`; Kendall's tau-b is computed here with the
//! large-sample p-value and tie corrections.

use crate::error::{MeteoError, Result};
use crate::stats::descriptive::{all_tied, tie_groups};
use crate::stats::{two_sided_normal_p, TestResult};
use anofox_statistics::nonparametric::{kruskal, wilcoxon};
use anofox_statistics::parametric::ttest::Alternative;
use serde::Serialize;

/// Mann–Whitney U test, two-sided, normal approximation with continuity
/// correction. The statistic is U for the first sample.
pub fn mann_whitney_u(a: &[f64], b: &[f64]) -> Result<TestResult> {
    let (n1, n2) = (a.len(), b.len());
    if n1 == 0 || n2 == 0 {
        return Err(MeteoError::insufficient("Mann-Whitney U test", 1, 0));
    }
    let pooled: Vec<f64> = a.iter().chain(b).copied().collect();
    if all_tied(&pooled) {
        return Err(MeteoError::insufficient(
            "Mann-Whitney U test (distinct values)",
            2,
            1,
        ));
    }

    let result = wilcoxon::mann_whitney_u(a, b, Alternative::TwoSided, true, false, None, None)
        .map_err(MeteoError::statistics)?;
    TestResult::checked("Mann-Whitney U test", result.statistic, result.p_value)
}

/// Kruskal–Wallis H test with tie correction; chi-square reference with
/// `k - 1` degrees of freedom.
pub fn kruskal_wallis(groups: &[&[f64]]) -> Result<TestResult> {
    let k = groups.len();
    if k < 2 {
        return Err(MeteoError::insufficient("Kruskal-Wallis groups", 2, k));
    }
    if let Some(empty) = groups.iter().find(|g| g.is_empty()) {
        return Err(MeteoError::insufficient("Kruskal-Wallis group", 1, empty.len()));
    }
    let pooled: Vec<f64> = groups.iter().flat_map(|g| g.iter()).copied().collect();
    if all_tied(&pooled) {
        return Err(MeteoError::insufficient(
            "Kruskal-Wallis test (distinct values)",
            2,
            1,
        ));
    }

    let result = kruskal::kruskal_wallis(groups).map_err(MeteoError::statistics)?;
    TestResult::checked("Kruskal-Wallis test", result.statistic, result.p_value)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KendallResult {
    pub tau: f64,
    pub p_value: f64,
    pub n: usize,
}

/// Kendall's tau-b between paired samples with the asymptotic two-sided
/// p-value.
pub fn kendall_tau(x: &[f64], y: &[f64]) -> Result<KendallResult> {
    if x.len() != y.len() {
        return Err(MeteoError::Statistics(format!(
            "Kendall's tau needs paired samples, got {} and {} values",
            x.len(),
            y.len()
        )));
    }
    let n = x.len();
    if n < 3 {
        return Err(MeteoError::insufficient("Kendall's tau", 3, n));
    }

    let mut score = 0i64;
    for i in 0..n {
        for j in (i + 1)..n {
            let dx = sign(x[j] - x[i]);
            let dy = sign(y[j] - y[i]);
            score += dx * dy;
        }
    }

    let (x_ties, x_t2, x_t5) = tie_sums(x);
    let (y_ties, y_t2, y_t5) = tie_sums(y);
    let nf = n as f64;
    let pairs = nf * (nf - 1.0) / 2.0;

    let denominator = ((pairs - x_ties) * (pairs - y_ties)).sqrt();
    if !(denominator > 0.0) {
        return Err(MeteoError::Statistics(
            "Kendall's tau is undefined for a constant sample".to_string(),
        ));
    }
    let tau = score as f64 / denominator;

    let m = nf * (nf - 1.0);
    let var = (m * (2.0 * nf + 5.0) - x_t5 - y_t5) / 18.0
        + (2.0 * x_ties * y_ties) / m
        + x_t2 * y_t2 / (9.0 * m * (nf - 2.0));
    let p_value = two_sided_normal_p(score as f64 / var.sqrt())?;

    Ok(KendallResult {
        tau: tau.clamp(-1.0, 1.0),
        p_value,
        n,
    })
}

fn sign(v: f64) -> i64 {
    if v > 0.0 {
        1
    } else if v < 0.0 {
        -1
    } else {
        0
    }
}

/// Tie sums over groups of size `t`: `Σ t(t-1)/2`, `Σ t(t-1)(t-2)` and
/// `Σ t(t-1)(2t+5)`.
fn tie_sums(values: &[f64]) -> (f64, f64, f64) {
    tie_groups(values)
        .into_iter()
        .map(|t| t as f64)
        .fold((0.0, 0.0, 0.0), |(pairs, t2, t5), t| {
            (
                pairs + t * (t - 1.0) / 2.0,
                t2 + t * (t - 1.0) * (t - 2.0),
                t5 + t * (t - 1.0) * (2.0 * t + 5.0),
            )
        })
}
