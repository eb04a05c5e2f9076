pub mod association;
pub mod distribution;
pub mod engine;
pub mod outliers;
pub mod trend;
pub mod weather_analyzer;

pub use association::{AssociationReport, AssociationTester, ContingencyTable};
pub use distribution::{ComparisonOutcome, ComparisonTest, DistributionTester, Group};
pub use engine::{analyze, analyze_all, AnalysisMode, AnalysisOutcome, AnalysisRequest};
pub use outliers::{OutlierDetector, OutlierReport};
pub use trend::{TrendDirection, TrendResult, TrendTester};
pub use weather_analyzer::{WeatherAnalyzer, WeatherStatistics};
