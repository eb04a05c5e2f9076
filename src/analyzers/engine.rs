//! Single entry point for analyses: one request in, one serializable
//! outcome out. Every mode reads the series and never modifies it.

use rayon::prelude::*;
use serde::Serialize;
use std::borrow::Cow;
use std::collections::HashSet;
use tracing::{debug, info};

use crate::analyzers::association::{AssociationReport, AssociationTester};
use crate::analyzers::distribution::{ComparisonOutcome, DistributionTester, Group};
use crate::analyzers::outliers::{OutlierDetector, OutlierReport};
use crate::analyzers::trend::{TrendResult, TrendTester};
use crate::analyzers::weather_analyzer::{WeatherAnalyzer, WeatherStatistics};
use crate::config::AnalysisConfig;
use crate::error::{MeteoError, Result};
use crate::models::{Notice, Series, Variable};
use crate::processors::aggregator::empty_groups;
use crate::processors::{aggregate, AggregateRow, DateRange, Partition, PartitionSelection};

#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisMode {
    Trend,
    Compare(PartitionSelection),
    Anomalies,
    Association { other: Variable },
    Summary,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    pub variable: Variable,
    pub range: Option<DateRange>,
    pub mode: AnalysisMode,
}

impl AnalysisRequest {
    pub fn new(variable: Variable, mode: AnalysisMode) -> Self {
        Self {
            variable,
            range: None,
            mode,
        }
    }

    pub fn with_range(mut self, range: DateRange) -> Self {
        self.range = Some(range);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendReport {
    pub variable: Variable,
    pub range: Option<DateRange>,
    /// The observations the trend was computed over.
    pub series: Series,
    pub trend: TrendResult,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonReport {
    pub variable: Variable,
    pub rows: Vec<AggregateRow>,
    /// Absent when fewer than two groups had enough values to test.
    pub comparison: Option<ComparisonOutcome>,
    pub notices: Vec<Notice>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    Trend(TrendReport),
    Comparison(ComparisonReport),
    Anomalies(OutlierReport),
    Association(AssociationReport),
    Summary(WeatherStatistics),
}

impl AnalysisOutcome {
    /// Human readable rendering for terminal output.
    pub fn summary(&self) -> String {
        match self {
            AnalysisOutcome::Trend(report) => {
                let scope = report
                    .range
                    .map_or_else(|| "full series".to_string(), |r| r.to_string());
                format!("{} [{}]", report.trend.summary(), scope)
            }
            AnalysisOutcome::Comparison(report) => {
                let mut out = format!("{} by period:", report.variable.label());
                for row in &report.rows {
                    let mean = row
                        .mean(report.variable)
                        .map_or_else(|| "no data".to_string(), |m| format!("{:.2}", m));
                    out.push_str(&format!(
                        "\n  {:<8} {:>10}  ({} days)",
                        row.partition.label(),
                        mean,
                        row.observations
                    ));
                }
                if let Some(comparison) = &report.comparison {
                    out.push_str(&format!("\n{}", comparison.summary()));
                }
                for notice in &report.notices {
                    out.push_str(&format!("\nnote: {}", notice));
                }
                out
            }
            AnalysisOutcome::Anomalies(report) => report.summary(),
            AnalysisOutcome::Association(report) => {
                format!("{}\n{}", report.summary(), report.table.render())
            }
            AnalysisOutcome::Summary(stats) => stats.detailed_summary(),
        }
    }
}

/// Run one analysis over `series`.
pub fn analyze(
    series: &Series,
    config: &AnalysisConfig,
    request: &AnalysisRequest,
) -> Result<AnalysisOutcome> {
    let variable = request.variable;
    debug!("Running {:?} for {}", request.mode, variable);

    match &request.mode {
        AnalysisMode::Trend => {
            let data = restrict(series, request.range.as_ref());
            let trend = TrendTester::from_config(config).test(&data, variable)?;
            Ok(AnalysisOutcome::Trend(TrendReport {
                variable,
                range: request.range,
                series: data.into_owned(),
                trend,
            }))
        }
        AnalysisMode::Compare(selection) => {
            let data = restrict(series, request.range.as_ref());
            compare(&data, config, variable, selection).map(AnalysisOutcome::Comparison)
        }
        AnalysisMode::Anomalies => {
            let detector = OutlierDetector::from_config(config);
            let report = match &request.range {
                Some(view) => detector.detect_in(series, variable, view)?,
                None => detector.detect(series, variable)?,
            };
            Ok(AnalysisOutcome::Anomalies(report))
        }
        AnalysisMode::Association { other } => {
            let data = restrict(series, request.range.as_ref());
            AssociationTester::from_config(config)
                .test(&data, variable, *other)
                .map(AnalysisOutcome::Association)
        }
        AnalysisMode::Summary => {
            let data = restrict(series, request.range.as_ref());
            WeatherAnalyzer::new()
                .analyze(&data)
                .map(AnalysisOutcome::Summary)
        }
    }
}

/// Run independent requests in parallel over one shared series. Results
/// come back in request order.
pub fn analyze_all(
    series: &Series,
    config: &AnalysisConfig,
    requests: &[AnalysisRequest],
) -> Vec<Result<AnalysisOutcome>> {
    info!("Running {} analyses", requests.len());
    requests
        .par_iter()
        .map(|request| analyze(series, config, request))
        .collect()
}

fn restrict<'a>(series: &'a Series, range: Option<&DateRange>) -> Cow<'a, Series> {
    match range {
        Some(range) => Cow::Owned(range.filter(series)),
        None => Cow::Borrowed(series),
    }
}

fn compare(
    series: &Series,
    config: &AnalysisConfig,
    variable: Variable,
    selection: &PartitionSelection,
) -> Result<ComparisonReport> {
    if let PartitionSelection::Explicit(partitions) = selection {
        validate_explicit(partitions)?;
    }

    let partitions = selection.resolve(series);
    let rows = aggregate(series, &partitions);
    let mut notices = empty_groups(&rows, variable);

    let groups: Vec<Group> = partitions
        .iter()
        .map(|p| Group::new(p.label(), p.values(series, variable)))
        .collect();

    let comparison = match DistributionTester::from_config(config).compare(&groups) {
        Ok(outcome) => Some(outcome),
        Err(MeteoError::InsufficientData {
            context,
            required,
            found,
        }) => {
            notices.push(Notice::InsufficientData {
                group: context,
                required,
                found,
            });
            None
        }
        Err(MeteoError::Statistics(reason)) => {
            notices.push(Notice::TestSkipped {
                test: "group comparison".to_string(),
                reason,
            });
            None
        }
        Err(e) => return Err(e),
    };

    Ok(ComparisonReport {
        variable,
        rows,
        comparison,
        notices,
    })
}

fn validate_explicit(partitions: &[Partition]) -> Result<()> {
    let mut seen = HashSet::with_capacity(partitions.len());
    for partition in partitions {
        if let Partition::Month { month, .. } = partition {
            if !(1..=12).contains(month) {
                return Err(MeteoError::InvalidSelection(format!(
                    "month {} is outside 1..=12",
                    month
                )));
            }
        }
        if !seen.insert(*partition) {
            return Err(MeteoError::InvalidSelection(format!(
                "{} selected more than once",
                partition
            )));
        }
    }

    if partitions.len() < 2 {
        return Err(MeteoError::InvalidSelection(format!(
            "at least two periods are needed for a comparison, got {}",
            partitions.len()
        )));
    }

    let months = partitions
        .iter()
        .filter(|p| matches!(p, Partition::Month { .. }))
        .count();
    if months != 0 && months != partitions.len() {
        return Err(MeteoError::InvalidSelection(
            "cannot mix months and years in one comparison".to_string(),
        ));
    }
    Ok(())
}
