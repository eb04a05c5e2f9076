use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::error::{MeteoError, Result};
use crate::models::{Notice, Series, Variable};
use crate::stats::descriptive::mean;

/// Calendar partition used to group observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Partition {
    Month { year: i32, month: u32 },
    Year { year: i32 },
}

impl Partition {
    pub fn month(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(MeteoError::InvalidSelection(format!(
                "month {} is outside 1..=12",
                month
            )));
        }
        Ok(Partition::Month { year, month })
    }

    pub fn year(year: i32) -> Self {
        Partition::Year { year }
    }

    pub fn month_of(date: NaiveDate) -> Self {
        Partition::Month {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year_of(date: NaiveDate) -> Self {
        Partition::Year { year: date.year() }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        match *self {
            Partition::Month { year, month } => date.year() == year && date.month() == month,
            Partition::Year { year } => date.year() == year,
        }
    }

    pub fn label(&self) -> String {
        self.to_string()
    }

    /// Observations of `series` falling in this partition.
    pub fn subset(&self, series: &Series) -> Series {
        series.subset(|obs| self.contains(obs.date))
    }

    /// Non-absent values of `variable` within this partition.
    pub fn values(&self, series: &Series, variable: Variable) -> Vec<f64> {
        series
            .iter()
            .filter(|obs| self.contains(obs.date))
            .filter_map(|obs| obs.value(variable))
            .collect()
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Partition::Month { year, month } => write!(f, "{:04}-{:02}", year, month),
            Partition::Year { year } => write!(f, "{:04}", year),
        }
    }
}

impl FromStr for Partition {
    type Err = MeteoError;

    /// `2023` selects a year, `2023-01` a month.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || MeteoError::InvalidSelection(format!("cannot parse period '{}'", s));
        let s = s.trim();
        match s.split_once('-') {
            Some((year, month)) => {
                let year = year.parse::<i32>().map_err(|_| invalid())?;
                let month = month.parse::<u32>().map_err(|_| invalid())?;
                Partition::month(year, month)
            }
            None => s.parse::<i32>().map(Partition::year).map_err(|_| invalid()),
        }
    }
}

/// Which partitions to compare.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionSelection {
    /// Every calendar month present, chronologically.
    Monthly,
    /// Every calendar year present, chronologically.
    Yearly,
    /// Exactly these partitions, in this order.
    Explicit(Vec<Partition>),
}

impl PartitionSelection {
    pub fn resolve(&self, series: &Series) -> Vec<Partition> {
        match self {
            PartitionSelection::Monthly => present(series, Partition::month_of),
            PartitionSelection::Yearly => present(series, Partition::year_of),
            PartitionSelection::Explicit(partitions) => partitions.clone(),
        }
    }
}

fn present(series: &Series, key: fn(NaiveDate) -> Partition) -> Vec<Partition> {
    series
        .iter()
        .map(|obs| key(obs.date))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Means of every variable over one partition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow {
    pub partition: Partition,
    pub observations: usize,
    pub means: BTreeMap<Variable, Option<f64>>,
}

impl AggregateRow {
    pub fn mean(&self, variable: Variable) -> Option<f64> {
        self.means.get(&variable).copied().flatten()
    }
}

/// Per-partition means over non-absent values, one row per partition in
/// the order given. A variable with no value in a partition has an absent
/// mean.
pub fn aggregate(series: &Series, partitions: &[Partition]) -> Vec<AggregateRow> {
    partitions
        .iter()
        .map(|partition| {
            let subset = partition.subset(series);
            let means = Variable::ALL
                .into_iter()
                .map(|v| (v, mean(&subset.values(v))))
                .collect();
            AggregateRow {
                partition: *partition,
                observations: subset.len(),
                means,
            }
        })
        .collect()
}

/// Empty-group notices for `variable` across `rows`.
pub fn empty_groups(rows: &[AggregateRow], variable: Variable) -> Vec<Notice> {
    rows.iter()
        .filter(|row| row.mean(variable).is_none())
        .map(|row| Notice::EmptyGroup {
            variable,
            group: row.partition.label(),
        })
        .collect()
}
