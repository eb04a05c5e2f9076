use crate::models::Variable;
use crate::processors::Partition;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "meteo-explorer")]
#[command(about = "Statistical exploration of NASA POWER daily weather exports")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,

    #[arg(long, global = true, help = "TOML file with analysis settings")]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    #[arg(short, long, help = "NASA POWER daily point CSV export")]
    pub input: PathBuf,

    #[arg(long, help = "Metadata lines before the column header [default: 13]")]
    pub header_offset: Option<usize>,

    #[arg(long, default_value = "false", help = "Memory-map the input file")]
    pub mmap: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct RangeArgs {
    #[arg(long, help = "First day of the analysis window (YYYY-MM-DD)")]
    pub start: Option<NaiveDate>,

    #[arg(long, help = "Last day of the analysis window (YYYY-MM-DD)")]
    pub end: Option<NaiveDate>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodKind {
    Month,
    Year,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Describe the loaded series
    Info {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        range: RangeArgs,

        #[arg(long, help = "Print JSON instead of text")]
        json: bool,
    },

    /// Kendall's tau trend test of a variable against time
    Trend {
        #[command(flatten)]
        input: InputArgs,

        #[arg(short, long, default_value = "temperature")]
        variable: Variable,

        #[command(flatten)]
        range: RangeArgs,

        #[arg(long, help = "Print JSON instead of text")]
        json: bool,
    },

    /// Compare a variable across months or years
    Compare {
        #[command(flatten)]
        input: InputArgs,

        #[arg(short, long, default_value = "temperature")]
        variable: Variable,

        #[command(flatten)]
        range: RangeArgs,

        #[arg(
            long,
            value_enum,
            conflicts_with_all = ["months", "years"],
            help = "Compare every month or every year present"
        )]
        by: Option<PeriodKind>,

        #[arg(
            long,
            value_delimiter = ',',
            conflicts_with = "years",
            help = "Months to compare, e.g. 2023-01,2024-01"
        )]
        months: Vec<Partition>,

        #[arg(long, value_delimiter = ',', help = "Years to compare, e.g. 2021,2022")]
        years: Vec<i32>,

        #[arg(long, help = "Print JSON instead of text")]
        json: bool,
    },

    /// Flag values outside the interquartile fences
    Anomalies {
        #[command(flatten)]
        input: InputArgs,

        #[arg(short, long, default_value = "precipitation")]
        variable: Variable,

        #[command(flatten)]
        range: RangeArgs,

        #[arg(long, default_value = "false", help = "List every anomalous day")]
        list: bool,

        #[arg(long, help = "Print JSON instead of text")]
        json: bool,
    },

    /// Chi-square test of independence between two binned variables
    Associate {
        #[command(flatten)]
        input: InputArgs,

        #[arg(short, long, default_value = "temperature")]
        variable: Variable,

        #[arg(long = "with", default_value = "humidity")]
        other: Variable,

        #[command(flatten)]
        range: RangeArgs,

        #[arg(long, help = "Print JSON instead of text")]
        json: bool,
    },

    /// Trend, anomaly and year-on-year analyses for every variable
    Report {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        range: RangeArgs,

        #[arg(long, default_value_t = num_cpus::get())]
        max_workers: usize,

        #[arg(long, help = "Print JSON instead of text")]
        json: bool,
    },
}
