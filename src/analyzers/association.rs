use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::config::AnalysisConfig;
use crate::error::{MeteoError, Result};
use crate::models::{Category, Series, Variable};
use crate::stats::chi_square_independence;
use crate::utils::constants::DEFAULT_SIGNIFICANCE_LEVEL;

/// Category of `variable` for every observation; absent values stay absent.
pub fn categorize_series(series: &Series, variable: Variable) -> Vec<(NaiveDate, Option<Category>)> {
    series
        .iter()
        .map(|obs| (obs.date, obs.value(variable).map(|v| variable.categorize(v))))
        .collect()
}

/// Cross-tabulation of two categorized variables. Rows follow `first`,
/// columns follow `second`, both in category order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContingencyTable {
    pub first: Variable,
    pub second: Variable,
    pub counts: [[u64; 5]; 5],
    /// Observations where either variable was absent.
    pub excluded: usize,
}

impl ContingencyTable {
    pub fn build(series: &Series, first: Variable, second: Variable) -> Self {
        let mut counts = [[0u64; 5]; 5];
        let mut excluded = 0;
        for obs in series {
            match (obs.value(first), obs.value(second)) {
                (Some(a), Some(b)) => {
                    counts[first.categorize(a).index()][second.categorize(b).index()] += 1;
                }
                _ => excluded += 1,
            }
        }
        Self {
            first,
            second,
            counts,
            excluded,
        }
    }

    pub fn count(&self, row: Category, column: Category) -> u64 {
        self.counts[row.index()][column.index()]
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().flatten().sum()
    }

    pub fn rows(&self) -> Vec<Vec<u64>> {
        self.counts.iter().map(|row| row.to_vec()).collect()
    }

    /// Plain-text grid, one line per row category.
    pub fn render(&self) -> String {
        let mut out = format!("{:>12} |", format!("{} \\ {}", self.first, self.second));
        for c in Category::ALL {
            out.push_str(&format!(" {:>9}", c.label()));
        }
        out.push('\n');
        for r in Category::ALL {
            out.push_str(&format!("{:>12} |", r.label()));
            for c in Category::ALL {
                out.push_str(&format!(" {:>9}", self.count(r, c)));
            }
            out.push('\n');
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssociationReport {
    pub first: Variable,
    pub second: Variable,
    pub table: ContingencyTable,
    pub chi2: f64,
    pub p_value: f64,
    pub degrees_of_freedom: usize,
    pub significant: bool,
}

impl AssociationReport {
    pub fn summary(&self) -> String {
        let verdict = if self.significant {
            "associated"
        } else {
            "no significant association"
        };
        format!(
            "{} vs {}: chi2 = {:.4}, dof = {}, p = {:.4} ({})",
            self.first.label(),
            self.second.label(),
            self.chi2,
            self.degrees_of_freedom,
            self.p_value,
            verdict
        )
    }
}

/// Chi-square test of independence between binned variables.
#[derive(Debug, Clone)]
pub struct AssociationTester {
    significance_level: f64,
}

impl AssociationTester {
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

    pub fn test(&self, series: &Series, first: Variable, second: Variable) -> Result<AssociationReport> {
        if first == second {
            return Err(MeteoError::InvalidSelection(format!(
                "cannot test {} against itself",
                first
            )));
        }

        let table = ContingencyTable::build(series, first, second);
        debug!(
            "{} x {} table: {} paired observations, {} excluded",
            first,
            second,
            table.total(),
            table.excluded
        );
        let result = chi_square_independence(&table.rows())?;

        Ok(AssociationReport {
            first,
            second,
            chi2: result.statistic,
            p_value: result.p_value,
            degrees_of_freedom: result.degrees_of_freedom,
            significant: result.p_value < self.significance_level,
            table,
        })
    }
}

impl Default for AssociationTester {
    fn default() -> Self {
        Self::new()
    }
}
