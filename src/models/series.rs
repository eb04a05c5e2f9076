use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashSet;
use tracing::warn;

use crate::models::{Observation, Variable};

/// Daily observations ordered by date, one per day.
///
/// Every derivation (filtering, subsets) builds a new `Series`; a series is
/// never modified in place once it has been handed to an analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Series {
    observations: Vec<Observation>,
}

impl Series {
    pub fn from_observations(observations: Vec<Observation>) -> Self {
        Self::with_duplicates_removed(observations).0
    }

    /// Sort by date and keep the first observation seen for each date.
    /// Returns the series and the number of dropped duplicates.
    pub fn with_duplicates_removed(observations: Vec<Observation>) -> (Self, usize) {
        let total = observations.len();
        let mut seen = HashSet::with_capacity(total);
        let mut unique: Vec<Observation> = observations
            .into_iter()
            .filter(|obs| seen.insert(obs.date))
            .collect();
        let duplicates = total - unique.len();
        if duplicates > 0 {
            warn!("Dropped {} observations with duplicate dates", duplicates);
        }

        unique.sort_by_key(|obs| obs.date);
        (
            Self {
                observations: unique,
            },
            duplicates,
        )
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Observation> {
        self.observations.iter()
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn into_observations(self) -> Vec<Observation> {
        self.observations
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.observations.first().map(|obs| obs.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.observations.last().map(|obs| obs.date)
    }

    pub fn get(&self, date: NaiveDate) -> Option<&Observation> {
        self.observations
            .binary_search_by_key(&date, |obs| obs.date)
            .ok()
            .map(|idx| &self.observations[idx])
    }

    /// Non-absent values of `variable`, in date order.
    pub fn values(&self, variable: Variable) -> Vec<f64> {
        self.observations
            .iter()
            .filter_map(|obs| obs.value(variable))
            .collect()
    }

    /// Non-absent `(date, value)` pairs of `variable`, in date order.
    pub fn points(&self, variable: Variable) -> Vec<(NaiveDate, f64)> {
        self.observations
            .iter()
            .filter_map(|obs| obs.value(variable).map(|v| (obs.date, v)))
            .collect()
    }

    pub fn missing(&self, variable: Variable) -> usize {
        self.observations
            .iter()
            .filter(|obs| obs.value(variable).is_none())
            .count()
    }

    /// Subset keeping the observations matching `predicate`.
    pub fn subset<F>(&self, predicate: F) -> Series
    where
        F: Fn(&Observation) -> bool,
    {
        Series {
            observations: self
                .observations
                .iter()
                .filter(|obs| predicate(obs))
                .cloned()
                .collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Series {
    type Item = &'a Observation;
    type IntoIter = std::slice::Iter<'a, Observation>;

    fn into_iter(self) -> Self::IntoIter {
        self.observations.iter()
    }
}

impl FromIterator<Observation> for Series {
    fn from_iter<I: IntoIterator<Item = Observation>>(iter: I) -> Self {
        Series::from_observations(iter.into_iter().collect())
    }
}
