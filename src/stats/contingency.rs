use crate::error::{MeteoError, Result};
use anofox_statistics::categorical::chisq_test;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChiSquareResult {
    pub statistic: f64,
    pub p_value: f64,
    pub degrees_of_freedom: usize,
}

/// Pearson chi-square test of independence.
///
/// Rows and columns without any count are dropped first. A remaining 2x2
/// table gets Yates' continuity correction.
pub fn chi_square_independence(observed: &[Vec<u64>]) -> Result<ChiSquareResult> {
    let columns = observed.iter().map(Vec::len).max().unwrap_or(0);
    let cell = |r: usize, c: usize| observed[r].get(c).copied().unwrap_or(0);

    let rows: Vec<usize> = (0..observed.len())
        .filter(|&r| observed[r].iter().any(|&v| v > 0))
        .collect();
    let cols: Vec<usize> = (0..columns)
        .filter(|&c| rows.iter().any(|&r| cell(r, c) > 0))
        .collect();

    if rows.len() < 2 || cols.len() < 2 {
        return Err(MeteoError::insufficient(
            "chi-square test (non-empty rows and columns)",
            2,
            rows.len().min(cols.len()),
        ));
    }

    let table: Vec<Vec<usize>> = rows
        .iter()
        .map(|&r| cols.iter().map(|&c| cell(r, c) as usize).collect())
        .collect();
    let degrees_of_freedom = (rows.len() - 1) * (cols.len() - 1);

    let result = chisq_test(&table, degrees_of_freedom == 1).map_err(MeteoError::statistics)?;
    if !result.p_value.is_finite() {
        return Err(MeteoError::Statistics(
            "chi-square test produced no p-value".to_string(),
        ));
    }

    Ok(ChiSquareResult {
        statistic: result.statistic,
        p_value: result.p_value,
        degrees_of_freedom,
    })
}
