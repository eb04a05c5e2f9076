pub mod analyzers;
pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod processors;
pub mod readers;
pub mod stats;
pub mod utils;

pub use config::AnalysisConfig;
pub use error::{MeteoError, Result};
