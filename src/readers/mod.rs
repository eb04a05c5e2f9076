pub mod power_reader;

pub use power_reader::{LoadOutcome, LoadReport, PowerReader};
