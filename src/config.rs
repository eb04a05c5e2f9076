//! Analysis settings.
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! `METEO_*` environment variables (for example `METEO_HEADER_OFFSET=14`).

use crate::error::Result;
use crate::utils::constants::{
    DEFAULT_HEADER_OFFSET, DEFAULT_IQR_MULTIPLIER, DEFAULT_SIGNIFICANCE_LEVEL, ENV_PREFIX,
    MIN_NORMALITY_SAMPLES, MISSING_SENTINEL,
};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;
use validator::Validate;

/// What to do with a week in which a variable was never measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImputationFallback {
    /// Leave the week absent.
    #[default]
    None,
    /// Use the mean of the calendar month the day falls in.
    Monthly,
    /// Use the mean of the whole series.
    Global,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct AnalysisConfig {
    /// Metadata lines preceding the column header.
    pub header_offset: usize,

    /// Numeric code standing in for "no measurement".
    pub sentinel: f64,

    #[validate(range(exclusive_min = 0.0, exclusive_max = 1.0))]
    pub significance_level: f64,

    #[validate(range(exclusive_min = 0.0))]
    pub iqr_multiplier: f64,

    /// Smallest group accepted by the normality test.
    #[validate(range(min = 3))]
    pub min_group_size: usize,

    pub imputation_fallback: ImputationFallback,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            header_offset: DEFAULT_HEADER_OFFSET,
            sentinel: MISSING_SENTINEL,
            significance_level: DEFAULT_SIGNIFICANCE_LEVEL,
            iqr_multiplier: DEFAULT_IQR_MULTIPLIER,
            min_group_size: MIN_NORMALITY_SAMPLES,
            imputation_fallback: ImputationFallback::None,
        }
    }
}

impl AnalysisConfig {
    /// Build the configuration from defaults, `path` (if any) and the
    /// environment, then validate it.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let defaults = Self::default();
        let mut builder = Config::builder()
            .set_default("header_offset", defaults.header_offset as i64)?
            .set_default("sentinel", defaults.sentinel)?
            .set_default("significance_level", defaults.significance_level)?
            .set_default("iqr_multiplier", defaults.iqr_multiplier)?
            .set_default("min_group_size", defaults.min_group_size as i64)?
            .set_default("imputation_fallback", "none")?;

        if let Some(path) = path {
            debug!("Reading configuration from {}", path.display());
            builder = builder.add_source(File::from(path).required(true));
        }

        let config: AnalysisConfig = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub fn with_header_offset(mut self, header_offset: usize) -> Self {
        self.header_offset = header_offset;
        self
    }

    pub fn with_significance_level(mut self, significance_level: f64) -> Self {
        self.significance_level = significance_level;
        self
    }

    pub fn with_imputation_fallback(mut self, fallback: ImputationFallback) -> Self {
        self.imputation_fallback = fallback;
        self
    }
}
