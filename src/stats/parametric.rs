//! Parametric group comparisons, delegated to `anofox-statistics`.

use crate::error::{MeteoError, Result};
use crate::stats::descriptive::all_tied;
use crate::stats::TestResult;
use anofox_statistics::parametric::anova::{self, AnovaKind};
use anofox_statistics::parametric::ttest::{t_test, Alternative, TTestKind};

/// Independent two-sample Student t-test assuming equal variances,
/// two-sided. The statistic is signed `mean(a) - mean(b)`.
pub fn student_t_test(a: &[f64], b: &[f64]) -> Result<TestResult> {
    let (n1, n2) = (a.len(), b.len());
    if n1 < 2 || n2 < 2 {
        return Err(MeteoError::insufficient(
            "two-sample t-test",
            2,
            n1.min(n2),
        ));
    }
    if all_tied(a) && all_tied(b) {
        return Err(MeteoError::Statistics(
            "t-test is undefined when both samples are constant".to_string(),
        ));
    }

    let result = t_test(a, b, TTestKind::Student, Alternative::TwoSided, 0.0, None)
        .map_err(MeteoError::statistics)?;
    TestResult::checked("two-sample t-test", result.statistic, result.p_value)
}

/// Classic (equal-variance) one-way analysis of variance across `groups`.
pub fn one_way_anova(groups: &[&[f64]]) -> Result<TestResult> {
    let k = groups.len();
    if k < 2 {
        return Err(MeteoError::insufficient("one-way ANOVA groups", 2, k));
    }
    if let Some(empty) = groups.iter().find(|g| g.is_empty()) {
        return Err(MeteoError::insufficient("one-way ANOVA group", 1, empty.len()));
    }
    let n: usize = groups.iter().map(|g| g.len()).sum();
    if n <= k {
        return Err(MeteoError::insufficient("one-way ANOVA", k + 1, n));
    }
    if groups.iter().all(|g| all_tied(g)) {
        return Err(MeteoError::Statistics(
            "ANOVA is undefined when every group is constant".to_string(),
        ));
    }

    let result = anova::one_way_anova(groups, AnovaKind::Fisher).map_err(MeteoError::statistics)?;
    TestResult::checked("one-way ANOVA", result.statistic, result.p_value)
}
