/// NASA POWER source column names
pub const DATE_COLUMN: &str = "DATE";
pub const YEAR_COLUMN: &str = "YEAR";
pub const MONTH_COLUMN: &str = "MO";
pub const DAY_COLUMN: &str = "DY";
pub const DAY_OF_YEAR_COLUMN: &str = "DOY";

/// Number of metadata lines preceding the column header in POWER exports
pub const DEFAULT_HEADER_OFFSET: usize = 13;

/// Value POWER writes when a measurement is unavailable
pub const MISSING_SENTINEL: f64 = -999.0;

/// Accepted DATE column formats
pub const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y%m%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Statistical defaults
pub const DEFAULT_SIGNIFICANCE_LEVEL: f64 = 0.05;
pub const DEFAULT_IQR_MULTIPLIER: f64 = 1.5;
pub const MIN_NORMALITY_SAMPLES: usize = 3;
pub const MAX_NORMALITY_SAMPLES: usize = 5000;

/// Processing defaults
pub const DEFAULT_BUFFER_SIZE: usize = 8192 * 16; // 128KB

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "METEO";
