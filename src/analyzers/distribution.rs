use serde::Serialize;
use std::fmt;
use tracing::debug;

use crate::config::AnalysisConfig;
use crate::error::{MeteoError, Result};
use crate::models::Notice;
use crate::stats::descriptive::mean;
use crate::stats::{
    kruskal_wallis, mann_whitney_u, one_way_anova, shapiro_wilk, student_t_test, NormalityResult,
    TestResult,
};
use crate::utils::constants::{DEFAULT_SIGNIFICANCE_LEVEL, MIN_NORMALITY_SAMPLES};

/// Labelled sample taking part in a comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Group {
    pub label: String,
    pub values: Vec<f64>,
}

impl Group {
    pub fn new(label: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            label: label.into(),
            values,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonTest {
    StudentT,
    MannWhitneyU,
    Anova,
    KruskalWallis,
}

impl ComparisonTest {
    /// Parametric tests only when every group looks normal.
    pub fn select(groups: usize, all_normal: bool) -> Self {
        match (groups, all_normal) {
            (2, true) => ComparisonTest::StudentT,
            (2, false) => ComparisonTest::MannWhitneyU,
            (_, true) => ComparisonTest::Anova,
            (_, false) => ComparisonTest::KruskalWallis,
        }
    }

    pub fn is_parametric(&self) -> bool {
        matches!(self, ComparisonTest::StudentT | ComparisonTest::Anova)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ComparisonTest::StudentT => "Student's t-test",
            ComparisonTest::MannWhitneyU => "Mann-Whitney U",
            ComparisonTest::Anova => "one-way ANOVA",
            ComparisonTest::KruskalWallis => "Kruskal-Wallis H",
        }
    }

    fn run(&self, groups: &[&[f64]]) -> Result<TestResult> {
        match self {
            ComparisonTest::StudentT => student_t_test(groups[0], groups[1]),
            ComparisonTest::MannWhitneyU => mann_whitney_u(groups[0], groups[1]),
            ComparisonTest::Anova => one_way_anova(groups),
            ComparisonTest::KruskalWallis => kruskal_wallis(groups),
        }
    }
}

impl fmt::Display for ComparisonTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupNormality {
    pub label: String,
    pub n: usize,
    pub mean: Option<f64>,
    /// `None` when the test could not be evaluated (zero range, too many
    /// values); such a group counts as non-normal.
    pub shapiro_wilk: Option<NormalityResult>,
    pub is_normal: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonOutcome {
    pub test: ComparisonTest,
    pub statistic: f64,
    pub p_value: f64,
    pub significant: bool,
    pub all_normal: bool,
    pub normality: Vec<GroupNormality>,
    /// Groups left out for having too few values.
    pub excluded: Vec<Notice>,
}

impl ComparisonOutcome {
    pub fn summary(&self) -> String {
        let verdict = if self.significant {
            "groups differ significantly"
        } else {
            "no significant difference"
        };
        format!(
            "{}: statistic {:.4}, p = {:.4} ({})",
            self.test, self.statistic, self.p_value, verdict
        )
    }
}

/// Chooses and runs a group comparison based on per-group normality.
#[derive(Debug, Clone)]
pub struct DistributionTester {
    significance_level: f64,
    min_group_size: usize,
}

impl DistributionTester {
    pub fn new() -> Self {
        Self {
            significance_level: DEFAULT_SIGNIFICANCE_LEVEL,
            min_group_size: MIN_NORMALITY_SAMPLES,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            significance_level: config.significance_level,
            min_group_size: config.min_group_size.max(MIN_NORMALITY_SAMPLES),
        }
    }

    pub fn with_significance_level(mut self, significance_level: f64) -> Self {
        self.significance_level = significance_level;
        self
    }

    pub fn with_min_group_size(mut self, min_group_size: usize) -> Self {
        self.min_group_size = min_group_size.max(MIN_NORMALITY_SAMPLES);
        self
    }

    pub fn normality(&self, group: &Group) -> GroupNormality {
        let shapiro = match shapiro_wilk(&group.values) {
            Ok(result) => Some(result),
            Err(e) => {
                debug!("Normality of '{}' not evaluated: {}", group.label, e);
                None
            }
        };
        GroupNormality {
            label: group.label.clone(),
            n: group.values.len(),
            mean: mean(&group.values),
            is_normal: shapiro.map_or(false, |r| r.is_normal(self.significance_level)),
            shapiro_wilk: shapiro,
        }
    }

    pub fn compare(&self, groups: &[Group]) -> Result<ComparisonOutcome> {
        if groups.len() < 2 {
            return Err(MeteoError::insufficient("group comparison", 2, groups.len()));
        }

        let (kept, excluded): (Vec<&Group>, Vec<&Group>) = groups
            .iter()
            .partition(|g| g.values.len() >= self.min_group_size);
        let excluded: Vec<Notice> = excluded
            .into_iter()
            .map(|g| Notice::InsufficientData {
                group: g.label.clone(),
                required: self.min_group_size,
                found: g.values.len(),
            })
            .collect();
        for notice in &excluded {
            debug!("{}", notice);
        }

        if kept.len() < 2 {
            return Err(MeteoError::insufficient(
                format!("group comparison (groups with {}+ values)", self.min_group_size),
                2,
                kept.len(),
            ));
        }

        let normality: Vec<GroupNormality> = kept.iter().map(|g| self.normality(g)).collect();
        let all_normal = normality.iter().all(|g| g.is_normal);
        let test = ComparisonTest::select(kept.len(), all_normal);

        let samples: Vec<&[f64]> = kept.iter().map(|g| g.values.as_slice()).collect();
        let result = test.run(&samples)?;
        debug!(
            "{} over {} groups: statistic {:.4}, p = {:.4}",
            test,
            kept.len(),
            result.statistic,
            result.p_value
        );

        Ok(ComparisonOutcome {
            test,
            statistic: result.statistic,
            p_value: result.p_value,
            significant: result.is_significant(self.significance_level),
            all_normal,
            normality,
            excluded,
        })
    }
}

impl Default for DistributionTester {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg64;
    use statrs::distribution::{ContinuousCDF, Normal};

    /// Deterministic normal sample through inverse-CDF of evenly spaced
    /// probabilities.
    fn normal_sample(mu: f64, sigma: f64, n: usize) -> Vec<f64> {
        let dist = Normal::new(mu, sigma).unwrap();
        (1..=n)
            .map(|i| dist.inverse_cdf((i as f64 - 0.5) / n as f64))
            .collect()
    }

    fn skewed_sample(n: usize, seed: u64) -> Vec<f64> {
        let mut rng = Pcg64::seed_from_u64(seed);
        (0..n)
            .map(|_| {
                let u: f64 = rng.random_range(0.0001..1.0);
                u.ln().powi(2)
            })
            .collect()
    }

    #[test]
    fn test_selection_matrix() {
        assert_eq!(ComparisonTest::select(2, true), ComparisonTest::StudentT);
        assert_eq!(ComparisonTest::select(2, false), ComparisonTest::MannWhitneyU);
        assert_eq!(ComparisonTest::select(3, true), ComparisonTest::Anova);
        assert_eq!(ComparisonTest::select(5, false), ComparisonTest::KruskalWallis);
    }

    #[test]
    fn test_two_normal_groups_use_t_test() {
        let groups = vec![
            Group::new("a", normal_sample(10.0, 1.0, 30)),
            Group::new("b", normal_sample(12.0, 1.0, 30)),
        ];
        let outcome = DistributionTester::new().compare(&groups).unwrap();

        assert!(outcome.all_normal);
        assert_eq!(outcome.test, ComparisonTest::StudentT);
        assert!(outcome.significant);
        assert!(outcome.statistic < 0.0);
    }

    #[test]
    fn test_three_normal_groups_use_anova() {
        let groups = vec![
            Group::new("a", normal_sample(10.0, 1.0, 20)),
            Group::new("b", normal_sample(10.0, 1.0, 20)),
            Group::new("c", normal_sample(10.0, 1.0, 20)),
        ];
        let outcome = DistributionTester::new().compare(&groups).unwrap();

        assert_eq!(outcome.test, ComparisonTest::Anova);
        assert!(!outcome.significant);
        assert!(outcome.p_value > 0.99);
    }

    #[test]
    fn test_skewed_group_routes_to_rank_test() {
        let groups = vec![
            Group::new("normal", normal_sample(1.0, 0.5, 40)),
            Group::new("skewed", skewed_sample(200, 7)),
        ];
        let outcome = DistributionTester::new().compare(&groups).unwrap();

        assert!(!outcome.all_normal);
        assert_eq!(outcome.test, ComparisonTest::MannWhitneyU);
        assert!(outcome.normality[0].is_normal);
        assert!(!outcome.normality[1].is_normal);
    }

    #[test]
    fn test_constant_group_counts_as_non_normal() {
        let groups = vec![
            Group::new("flat", vec![5.0; 10]),
            Group::new("b", normal_sample(5.0, 1.0, 10)),
            Group::new("c", normal_sample(6.0, 1.0, 10)),
        ];
        let outcome = DistributionTester::new().compare(&groups).unwrap();

        assert!(outcome.normality[0].shapiro_wilk.is_none());
        assert_eq!(outcome.test, ComparisonTest::KruskalWallis);
    }

    #[test]
    fn test_all_tied_groups_cannot_be_ranked() {
        let groups = vec![Group::new("july", vec![0.0; 31]), Group::new("august", vec![0.0; 31])];
        let err = DistributionTester::new().compare(&groups).unwrap_err();
        assert!(matches!(err, MeteoError::InsufficientData { found: 1, .. }));
    }

    #[test]
    fn test_small_groups_are_excluded_with_notice() {
        let groups = vec![
            Group::new("tiny", vec![1.0, 2.0]),
            Group::new("a", normal_sample(10.0, 1.0, 15)),
            Group::new("b", normal_sample(11.0, 1.0, 15)),
        ];
        let outcome = DistributionTester::new().compare(&groups).unwrap();

        assert_eq!(outcome.normality.len(), 2);
        assert_eq!(
            outcome.excluded,
            vec![Notice::InsufficientData {
                group: "tiny".to_string(),
                required: 3,
                found: 2
            }]
        );
    }

    #[test]
    fn test_too_few_usable_groups_is_an_error() {
        let groups = vec![
            Group::new("a", vec![1.0]),
            Group::new("b", normal_sample(11.0, 1.0, 15)),
        ];
        let err = DistributionTester::new().compare(&groups).unwrap_err();
        assert!(matches!(
            err,
            MeteoError::InsufficientData {
                required: 2,
                found: 1,
                ..
            }
        ));

        let err = DistributionTester::new()
            .compare(&groups[1..])
            .unwrap_err();
        assert!(matches!(err, MeteoError::InsufficientData { .. }));
    }

    #[test]
    fn test_significance_level_is_configurable() {
        let groups = vec![
            Group::new("a", normal_sample(10.0, 1.0, 12)),
            Group::new("b", normal_sample(10.6, 1.0, 12)),
        ];
        let loose = DistributionTester::new()
            .with_significance_level(0.5)
            .compare(&groups)
            .unwrap();
        let strict = DistributionTester::new()
            .with_significance_level(0.001)
            .compare(&groups)
            .unwrap();

        assert_eq!(loose.p_value, strict.p_value);
        assert!(loose.significant);
        assert!(!strict.significant);
    }
}
