use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::Variable;

/// One day of measurements. Each field is independent: a missing humidity
/// reading says nothing about the temperature of the same day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Observation {
    pub date: NaiveDate,

    #[validate(range(min = -60.0, max = 60.0))]
    pub temperature: Option<f64>,

    #[validate(range(min = 0.0, max = 100.0))]
    pub humidity: Option<f64>,

    #[validate(range(min = 0.0, max = 1000.0))]
    pub precipitation: Option<f64>,

    #[validate(range(min = 0.0, max = 100.0))]
    pub wind_speed: Option<f64>,

    #[validate(range(min = 0.0, max = 15.0))]
    pub solar_radiation: Option<f64>,
}

impl Observation {
    /// An observation with every measurement absent.
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            temperature: None,
            humidity: None,
            precipitation: None,
            wind_speed: None,
            solar_radiation: None,
        }
    }

    pub fn with_value(mut self, variable: Variable, value: Option<f64>) -> Self {
        self.set_value(variable, value);
        self
    }

    pub fn value(&self, variable: Variable) -> Option<f64> {
        match variable {
            Variable::Temperature => self.temperature,
            Variable::Humidity => self.humidity,
            Variable::Precipitation => self.precipitation,
            Variable::WindSpeed => self.wind_speed,
            Variable::SolarRadiation => self.solar_radiation,
        }
    }

    pub fn set_value(&mut self, variable: Variable, value: Option<f64>) {
        let slot = match variable {
            Variable::Temperature => &mut self.temperature,
            Variable::Humidity => &mut self.humidity,
            Variable::Precipitation => &mut self.precipitation,
            Variable::WindSpeed => &mut self.wind_speed,
            Variable::SolarRadiation => &mut self.solar_radiation,
        };
        *slot = value;
    }

    pub fn missing_count(&self) -> usize {
        Variable::ALL
            .iter()
            .filter(|v| self.value(**v).is_none())
            .count()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[test]
    fn test_value_access() {
        let mut obs = Observation::new(date()).with_value(Variable::Humidity, Some(81.5));
        assert_eq!(obs.value(Variable::Humidity), Some(81.5));
        assert_eq!(obs.value(Variable::Temperature), None);
        assert_eq!(obs.missing_count(), 4);

        obs.set_value(Variable::Humidity, None);
        assert_eq!(obs.missing_count(), 5);
        assert!(!obs.is_complete());
    }

    #[test]
    fn test_physical_validation() {
        let obs = Observation::new(date())
            .with_value(Variable::Temperature, Some(14.2))
            .with_value(Variable::Humidity, Some(78.0));
        assert!(obs.validate().is_ok());

        let obs = obs.with_value(Variable::Humidity, Some(130.0));
        assert!(obs.validate().is_err());
    }
}
