use crate::error::{MeteoError, Result};
use crate::models::{Series, Variable};
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherStatistics {
    pub total_records: usize,
    pub complete_records: usize,
    pub date_range: (NaiveDate, NaiveDate),
    pub variables: Vec<VariableStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableStats {
    pub variable: Variable,
    pub count: usize,
    pub missing: usize,
    pub min: Option<Extreme>,
    pub max: Option<Extreme>,
    pub mean: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Extreme {
    pub value: f64,
    pub date: NaiveDate,
}

impl VariableStats {
    pub fn missing_percentage(&self) -> f64 {
        let total = self.count + self.missing;
        if total == 0 {
            return 0.0;
        }
        (self.missing as f64 / total as f64) * 100.0
    }
}

pub struct WeatherAnalyzer;

impl WeatherAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, series: &Series) -> Result<WeatherStatistics> {
        let (first, last) = match (series.first_date(), series.last_date()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(MeteoError::EmptyDataset),
        };

        let variables = Variable::ALL
            .into_iter()
            .map(|variable| self.variable_stats(series, variable))
            .collect();

        Ok(WeatherStatistics {
            total_records: series.len(),
            complete_records: series.iter().filter(|obs| obs.is_complete()).count(),
            date_range: (first, last),
            variables,
        })
    }

    fn variable_stats(&self, series: &Series, variable: Variable) -> VariableStats {
        let mut min: Option<Extreme> = None;
        let mut max: Option<Extreme> = None;
        let mut sum = 0.0f64;
        let mut count = 0;

        for (date, value) in series.points(variable) {
            // Earliest date wins on ties
            if min.map_or(true, |m| value < m.value) {
                min = Some(Extreme { value, date });
            }
            if max.map_or(true, |m| value > m.value) {
                max = Some(Extreme { value, date });
            }
            sum += value;
            count += 1;
        }

        VariableStats {
            variable,
            count,
            missing: series.len() - count,
            min,
            max,
            mean: (count > 0).then(|| sum / count as f64),
        }
    }
}

impl WeatherStatistics {
    pub fn get(&self, variable: Variable) -> Option<&VariableStats> {
        self.variables.iter().find(|s| s.variable == variable)
    }

    pub fn summary(&self) -> String {
        format!(
            "Date Range: {} to {} ({} days)\n\
            Records: {} total, {} complete ({:.1}%)",
            self.date_range.0,
            self.date_range.1,
            self.date_range
                .1
                .signed_duration_since(self.date_range.0)
                .num_days()
                + 1,
            self.total_records,
            self.complete_records,
            (self.complete_records as f64 / self.total_records as f64) * 100.0
        )
    }

    pub fn detailed_summary(&self) -> String {
        let mut out = self.summary();
        out.push_str("\n\nVariables:");

        for stats in &self.variables {
            let unit = stats.variable.unit();
            let extreme = |e: Option<Extreme>| match e {
                Some(e) => format!("{:.2} {} on {}", e.value, unit, e.date),
                None => "No valid measurements".to_string(),
            };
            let mean = match stats.mean {
                Some(m) => format!("{:.2} {}", m, unit),
                None => "No valid measurements".to_string(),
            };

            out.push_str(&format!(
                "\n- {}: {} values, {} missing ({:.1}%)\n    \
                Min: {}\n    \
                Max: {}\n    \
                Mean: {}",
                stats.variable.label(),
                stats.count,
                stats.missing,
                stats.missing_percentage(),
                extreme(stats.min),
                extreme(stats.max),
                mean
            ));
        }
        out
    }
}

impl Default for WeatherAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Observation;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 3, d).unwrap()
    }

    fn sample() -> Series {
        Series::from_observations(vec![
            Observation::new(day(1))
                .with_value(Variable::Temperature, Some(4.0))
                .with_value(Variable::Humidity, Some(80.0)),
            Observation::new(day(2)).with_value(Variable::Temperature, Some(-2.0)),
            Observation::new(day(3)).with_value(Variable::Temperature, Some(10.0)),
            Observation::new(day(4)).with_value(Variable::Temperature, Some(-2.0)),
        ])
    }

    #[test]
    fn test_variable_stats() {
        let stats = WeatherAnalyzer::new().analyze(&sample()).unwrap();
        let temperature = stats.get(Variable::Temperature).unwrap();

        assert_eq!(stats.total_records, 4);
        assert_eq!(stats.date_range, (day(1), day(4)));
        assert_eq!(temperature.count, 4);
        assert_eq!(temperature.mean, Some(2.5));
        assert_eq!(temperature.min, Some(Extreme { value: -2.0, date: day(2) }));
        assert_eq!(temperature.max, Some(Extreme { value: 10.0, date: day(3) }));

        let humidity = stats.get(Variable::Humidity).unwrap();
        assert_eq!(humidity.count, 1);
        assert_eq!(humidity.missing, 3);
        assert_eq!(humidity.missing_percentage(), 75.0);
    }

    #[test]
    fn test_unmeasured_variable_has_no_extremes() {
        let stats = WeatherAnalyzer::new().analyze(&sample()).unwrap();
        let wind = stats.get(Variable::WindSpeed).unwrap();

        assert_eq!(wind.min, None);
        assert_eq!(wind.mean, None);
        assert!(stats.detailed_summary().contains("No valid measurements"));
    }

    #[test]
    fn test_empty_series() {
        let err = WeatherAnalyzer::new().analyze(&Series::default()).unwrap_err();
        assert!(matches!(err, MeteoError::EmptyDataset));
    }
}
