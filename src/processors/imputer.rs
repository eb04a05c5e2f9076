use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::config::{AnalysisConfig, ImputationFallback};
use crate::models::{Notice, Observation, Series, Variable};

/// ISO week: (ISO year, week number). Weeks start on Monday.
type WeekKey = (i32, u32);

fn week_of(date: NaiveDate) -> WeekKey {
    let week = date.iso_week();
    (week.year(), week.week())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImputationReport {
    pub filled_weekly: BTreeMap<Variable, usize>,
    pub filled_fallback: BTreeMap<Variable, usize>,
    pub notices: Vec<Notice>,
}

impl ImputationReport {
    pub fn total_filled(&self) -> usize {
        self.filled_weekly.values().sum::<usize>() + self.filled_fallback.values().sum::<usize>()
    }
}

#[derive(Debug)]
pub struct ImputationOutcome {
    pub series: Series,
    pub report: ImputationReport,
}

/// Fills absent measurements with the mean of the same variable over the
/// same ISO week.
pub struct WeeklyImputer {
    fallback: ImputationFallback,
}

impl WeeklyImputer {
    pub fn new() -> Self {
        Self {
            fallback: ImputationFallback::None,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            fallback: config.imputation_fallback,
        }
    }

    pub fn with_fallback(mut self, fallback: ImputationFallback) -> Self {
        self.fallback = fallback;
        self
    }

    /// Impute every variable of `series`. Weeks in which a variable was never
    /// measured stay absent unless a fallback is configured, and are reported
    /// as [`Notice::EmptyGroup`].
    pub fn impute(&self, series: Series) -> ImputationOutcome {
        let mut observations = series.into_observations();
        let mut report = ImputationReport::default();

        // Indices per week, in date order
        let mut weeks: BTreeMap<WeekKey, Vec<usize>> = BTreeMap::new();
        for (idx, obs) in observations.iter().enumerate() {
            weeks.entry(week_of(obs.date)).or_default().push(idx);
        }

        for variable in Variable::ALL {
            let fallback = FallbackMeans::compute(self.fallback, &observations, variable);
            let mut weekly = 0;
            let mut from_fallback = 0;

            for (&(year, week), indices) in &weeks {
                match mean_of(&observations, indices, variable) {
                    Some(mean) => {
                        weekly += fill(&mut observations, indices, variable, |_| Some(mean));
                    }
                    None => {
                        report.notices.push(Notice::EmptyGroup {
                            variable,
                            group: format!("ISO week {}-W{:02}", year, week),
                        });
                        from_fallback +=
                            fill(&mut observations, indices, variable, |date| fallback.get(date));
                    }
                }
            }

            debug!(
                "{}: {} values filled from weekly means, {} from fallback",
                variable, weekly, from_fallback
            );
            report.filled_weekly.insert(variable, weekly);
            report.filled_fallback.insert(variable, from_fallback);
        }

        let empty_groups = report.notices.len();
        if empty_groups > 0 {
            warn!(
                "{} week/variable groups had no measurements to impute from",
                empty_groups
            );
        }
        info!("Imputed {} missing values", report.total_filled());

        ImputationOutcome {
            series: Series::from_observations(observations),
            report,
        }
    }
}

impl Default for WeeklyImputer {
    fn default() -> Self {
        Self::new()
    }
}

/// Mean of the present values at `indices`, summed in date order.
fn mean_of(observations: &[Observation], indices: &[usize], variable: Variable) -> Option<f64> {
    let (sum, count) = indices
        .iter()
        .filter_map(|&idx| observations[idx].value(variable))
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Replace absent values at `indices` with `value_for(date)`; returns how many
/// were filled.
fn fill<F>(
    observations: &mut [Observation],
    indices: &[usize],
    variable: Variable,
    value_for: F,
) -> usize
where
    F: Fn(NaiveDate) -> Option<f64>,
{
    let mut filled = 0;
    for &idx in indices {
        let obs = &mut observations[idx];
        if obs.value(variable).is_none() {
            if let Some(value) = value_for(obs.date) {
                obs.set_value(variable, Some(value));
                filled += 1;
            }
        }
    }
    filled
}

/// Means used for weeks that have no measurement, computed from the values
/// present before imputation.
enum FallbackMeans {
    None,
    Monthly(BTreeMap<(i32, u32), f64>),
    Global(Option<f64>),
}

impl FallbackMeans {
    fn compute(policy: ImputationFallback, observations: &[Observation], variable: Variable) -> Self {
        match policy {
            ImputationFallback::None => FallbackMeans::None,
            ImputationFallback::Monthly => {
                let mut sums: BTreeMap<(i32, u32), (f64, usize)> = BTreeMap::new();
                for obs in observations {
                    if let Some(v) = obs.value(variable) {
                        let entry = sums.entry((obs.date.year(), obs.date.month())).or_default();
                        entry.0 += v;
                        entry.1 += 1;
                    }
                }
                FallbackMeans::Monthly(
                    sums.into_iter()
                        .map(|(key, (sum, count))| (key, sum / count as f64))
                        .collect(),
                )
            }
            ImputationFallback::Global => {
                let indices: Vec<usize> = (0..observations.len()).collect();
                FallbackMeans::Global(mean_of(observations, &indices, variable))
            }
        }
    }

    fn get(&self, date: NaiveDate) -> Option<f64> {
        match self {
            FallbackMeans::None => None,
            FallbackMeans::Monthly(means) => means.get(&(date.year(), date.month())).copied(),
            FallbackMeans::Global(mean) => *mean,
        }
    }
}
