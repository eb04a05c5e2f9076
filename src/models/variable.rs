use crate::error::MeteoError;
use crate::models::Category;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The five daily measurements carried by a POWER point export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variable {
    Temperature,
    Humidity,
    Precipitation,
    WindSpeed,
    SolarRadiation,
}

impl Variable {
    pub const ALL: [Variable; 5] = [
        Variable::Temperature,
        Variable::Humidity,
        Variable::Precipitation,
        Variable::WindSpeed,
        Variable::SolarRadiation,
    ];

    /// Column name in the POWER export.
    pub fn source_column(&self) -> &'static str {
        match self {
            Variable::Temperature => "T2M",
            Variable::Humidity => "RH2M",
            Variable::Precipitation => "PRECTOTCORR",
            Variable::WindSpeed => "WS2M",
            Variable::SolarRadiation => "ALLSKY_SFC_SW_DWN",
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Variable::Temperature => "temperature",
            Variable::Humidity => "humidity",
            Variable::Precipitation => "precipitation",
            Variable::WindSpeed => "wind_speed",
            Variable::SolarRadiation => "solar_radiation",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Variable::Temperature => "Temperature (°C)",
            Variable::Humidity => "Relative humidity (%)",
            Variable::Precipitation => "Precipitation (mm/day)",
            Variable::WindSpeed => "Wind speed (m/s)",
            Variable::SolarRadiation => "Solar radiation (kWh/m²/day)",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Variable::Temperature => "°C",
            Variable::Humidity => "%",
            Variable::Precipitation => "mm/day",
            Variable::WindSpeed => "m/s",
            Variable::SolarRadiation => "kWh/m²/day",
        }
    }

    /// Upper edges of the first four category bins.
    pub fn breakpoints(&self) -> [f64; 4] {
        match self {
            Variable::Temperature => [8.0, 11.0, 14.0, 17.0],
            Variable::Humidity => [60.0, 70.0, 80.0, 90.0],
            Variable::Precipitation => [1.0, 5.0, 10.0, 20.0],
            Variable::WindSpeed => [1.0, 2.0, 3.0, 4.0],
            Variable::SolarRadiation => [3.0, 4.0, 5.0, 6.0],
        }
    }

    pub fn categorize(&self, value: f64) -> Category {
        Category::from_breakpoints(value, &self.breakpoints())
    }

    fn aliases(&self) -> &'static [&'static str] {
        match self {
            Variable::Temperature => &["temp", "t"],
            Variable::Humidity => &["rh", "relative_humidity"],
            Variable::Precipitation => &["precip", "rain"],
            Variable::WindSpeed => &["wind", "ws"],
            Variable::SolarRadiation => &["solar", "radiation"],
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Variable {
    type Err = MeteoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase().replace('-', "_");
        Variable::ALL
            .into_iter()
            .find(|v| {
                v.key() == needle
                    || v.source_column().eq_ignore_ascii_case(&needle)
                    || v.aliases().contains(&needle.as_str())
            })
            .ok_or_else(|| MeteoError::UnknownVariable(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_variable_names() {
        assert_eq!("temperature".parse::<Variable>().unwrap(), Variable::Temperature);
        assert_eq!("T2M".parse::<Variable>().unwrap(), Variable::Temperature);
        assert_eq!("wind-speed".parse::<Variable>().unwrap(), Variable::WindSpeed);
        assert_eq!("Solar".parse::<Variable>().unwrap(), Variable::SolarRadiation);
        assert_eq!(
            "prectotcorr".parse::<Variable>().unwrap(),
            Variable::Precipitation
        );
        assert!("pressure".parse::<Variable>().is_err());
    }

    #[test]
    fn test_breakpoints_ascending() {
        for variable in Variable::ALL {
            let b = variable.breakpoints();
            assert!(b.windows(2).all(|w| w[0] < w[1]), "{variable}");
        }
    }

    #[test]
    fn test_categorize() {
        assert_eq!(Variable::Humidity.categorize(55.0), Category::VeryLow);
        assert_eq!(Variable::Humidity.categorize(85.0), Category::High);
        assert_eq!(Variable::Precipitation.categorize(0.0), Category::VeryLow);
        assert_eq!(Variable::Temperature.categorize(25.0), Category::VeryHigh);
    }
}
