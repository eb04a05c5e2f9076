pub mod aggregator;
pub mod imputer;
pub mod range_filter;

pub use aggregator::{aggregate, AggregateRow, Partition, PartitionSelection};
pub use imputer::{ImputationOutcome, ImputationReport, WeeklyImputer};
pub use range_filter::DateRange;
