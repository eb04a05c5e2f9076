use serde::Serialize;
use tracing::{debug, info};

use crate::config::AnalysisConfig;
use crate::error::{MeteoError, Result};
use crate::models::{Series, Variable};
use crate::processors::DateRange;
use crate::stats::descriptive::{quantile_sorted, sorted};
use crate::stats::{shapiro_wilk, NormalityResult};
use crate::utils::constants::DEFAULT_IQR_MULTIPLIER;

const MIN_OUTLIER_SAMPLES: usize = 4;

/// Tukey fences around the interquartile range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OutlierBounds {
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub lower: f64,
    pub upper: f64,
}

impl OutlierBounds {
    pub fn from_values(values: &[f64], multiplier: f64) -> Option<Self> {
        let x = sorted(values);
        let q1 = quantile_sorted(&x, 0.25)?;
        let q3 = quantile_sorted(&x, 0.75)?;
        let iqr = q3 - q1;
        Some(Self {
            q1,
            q3,
            iqr,
            lower: q1 - multiplier * iqr,
            upper: q3 + multiplier * iqr,
        })
    }

    /// Strictly outside the fences; values on a fence are normal.
    pub fn is_anomalous(&self, value: f64) -> bool {
        value < self.lower || value > self.upper
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlierReport {
    pub variable: Variable,
    #[serde(flatten)]
    pub bounds: OutlierBounds,
    pub anomalies: Series,
    pub normal: Series,
    /// Shapiro-Wilk over the normal values, when there are 3 to 5000 of
    /// them and they are not all equal.
    pub normal_shape: Option<NormalityResult>,
}

impl OutlierReport {
    pub fn summary(&self) -> String {
        format!(
            "{}: {} anomalies, {} normal (Q1 {:.2}, Q3 {:.2}, IQR {:.2}, bounds [{:.2}, {:.2}])",
            self.variable.label(),
            self.anomalies.len(),
            self.normal.len(),
            self.bounds.q1,
            self.bounds.q3,
            self.bounds.iqr,
            self.bounds.lower,
            self.bounds.upper
        )
    }
}

/// IQR-based anomaly detection.
#[derive(Debug, Clone)]
pub struct OutlierDetector {
    multiplier: f64,
}

impl OutlierDetector {
    pub fn new() -> Self {
        Self {
            multiplier: DEFAULT_IQR_MULTIPLIER,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            multiplier: config.iqr_multiplier,
        }
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    pub fn bounds(&self, series: &Series, variable: Variable) -> Result<OutlierBounds> {
        let values = series.values(variable);
        if values.len() < MIN_OUTLIER_SAMPLES {
            return Err(MeteoError::insufficient(
                format!("{} quartiles", variable),
                MIN_OUTLIER_SAMPLES,
                values.len(),
            ));
        }
        OutlierBounds::from_values(&values, self.multiplier)
            .ok_or_else(|| MeteoError::insufficient(format!("{} quartiles", variable), 1, 0))
    }

    /// Classify every observation of `series` that has a value for
    /// `variable`.
    pub fn detect(&self, series: &Series, variable: Variable) -> Result<OutlierReport> {
        let bounds = self.bounds(series, variable)?;
        Ok(self.classify(series, variable, bounds))
    }

    /// Bounds come from the whole series; only observations inside `view`
    /// are classified.
    pub fn detect_in(
        &self,
        series: &Series,
        variable: Variable,
        view: &DateRange,
    ) -> Result<OutlierReport> {
        let bounds = self.bounds(series, variable)?;
        debug!("Classifying {} within {}", variable, view);
        Ok(self.classify(&view.filter(series), variable, bounds))
    }

    fn classify(&self, series: &Series, variable: Variable, bounds: OutlierBounds) -> OutlierReport {
        let anomalies = series.subset(|obs| {
            obs.value(variable)
                .map_or(false, |v| bounds.is_anomalous(v))
        });
        let normal = series.subset(|obs| {
            obs.value(variable)
                .map_or(false, |v| !bounds.is_anomalous(v))
        });

        let normal_shape = shapiro_wilk(&normal.values(variable)).ok();
        info!(
            "{}: {} anomalies outside [{:.2}, {:.2}]",
            variable,
            anomalies.len(),
            bounds.lower,
            bounds.upper
        );

        OutlierReport {
            variable,
            bounds,
            anomalies,
            normal,
            normal_shape,
        }
    }
}

impl Default for OutlierDetector {
    fn default() -> Self {
        Self::new()
    }
}
