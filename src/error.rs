use thiserror::Error;

pub type Result<T> = std::result::Result<T, MeteoError>;

#[derive(Error, Debug)]
pub enum MeteoError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Could not decode input as text: {0}")]
    Encoding(String),

    #[error("No column header found after {offset} metadata lines")]
    MissingHeader { offset: usize },

    #[error("No observations remain after parsing")]
    EmptyDataset,

    #[error("Insufficient data for {context}: need at least {required} values, found {found}")]
    InsufficientData {
        context: String,
        required: usize,
        found: usize,
    },

    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    #[error("Unknown variable: '{0}'")]
    UnknownVariable(String),

    #[error("Statistics error: {0}")]
    Statistics(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MeteoError {
    pub fn insufficient(context: impl Into<String>, required: usize, found: usize) -> Self {
        MeteoError::InsufficientData {
            context: context.into(),
            required,
            found,
        }
    }

    pub fn statistics(err: impl std::fmt::Display) -> Self {
        MeteoError::Statistics(err.to_string())
    }

    /// Errors raised while building the series. These end the session: there
    /// is no data to analyse.
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            MeteoError::Io(_)
                | MeteoError::Csv(_)
                | MeteoError::Encoding(_)
                | MeteoError::MissingHeader { .. }
                | MeteoError::EmptyDataset
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_error_classification() {
        assert!(MeteoError::EmptyDataset.is_load_error());
        assert!(MeteoError::MissingHeader { offset: 13 }.is_load_error());
        assert!(!MeteoError::insufficient("January 2024", 3, 1).is_load_error());
        assert!(!MeteoError::InvalidSelection("one month".to_string()).is_load_error());
    }

    #[test]
    fn test_insufficient_data_message() {
        let err = MeteoError::insufficient("group 2023-02", 3, 2);
        assert_eq!(
            err.to_string(),
            "Insufficient data for group 2023-02: need at least 3 values, found 2"
        );
    }
}
