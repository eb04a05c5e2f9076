use crate::analyzers::{analyze, analyze_all, AnalysisMode, AnalysisOutcome, AnalysisRequest};
use crate::cli::args::{Cli, Commands, InputArgs, PeriodKind, RangeArgs};
use crate::config::AnalysisConfig;
use crate::models::{Series, Variable};
use crate::processors::{DateRange, Partition, PartitionSelection, WeeklyImputer};
use crate::readers::PowerReader;
use crate::utils::progress::ProgressReporter;
use anyhow::{anyhow, bail, Context, Result};
use serde_json::json;
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

pub fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose, cli.log_file.as_deref())?;

    let config = AnalysisConfig::load(cli.config.as_deref())
        .context("Failed to load analysis settings")?;

    match cli.command {
        Commands::Info { input, range, json } => {
            let series = prepare(&input, &config, json)?;
            let request = request_for(&series, &range, Variable::Temperature, AnalysisMode::Summary);
            emit(&analyze(&series, &config, &request)?, json)?;
        }

        Commands::Trend {
            input,
            variable,
            range,
            json,
        } => {
            let series = prepare(&input, &config, json)?;
            let request = request_for(&series, &range, variable, AnalysisMode::Trend);
            emit(&analyze(&series, &config, &request)?, json)?;
        }

        Commands::Compare {
            input,
            variable,
            range,
            by,
            months,
            years,
            json,
        } => {
            let selection = selection_from(by, months, years)?;
            let series = prepare(&input, &config, json)?;
            let request = request_for(&series, &range, variable, AnalysisMode::Compare(selection));
            emit(&analyze(&series, &config, &request)?, json)?;
        }

        Commands::Anomalies {
            input,
            variable,
            range,
            list,
            json,
        } => {
            let series = prepare(&input, &config, json)?;
            let request = request_for(&series, &range, variable, AnalysisMode::Anomalies);
            let outcome = analyze(&series, &config, &request)?;
            emit(&outcome, json)?;

            if let (AnalysisOutcome::Anomalies(report), true, false) = (&outcome, list, json) {
                println!("\nAnomalous days:");
                for (date, value) in report.anomalies.points(variable) {
                    println!("  {}  {:.2} {}", date, value, variable.unit());
                }
            }
        }

        Commands::Associate {
            input,
            variable,
            other,
            range,
            json,
        } => {
            let series = prepare(&input, &config, json)?;
            let request = request_for(&series, &range, variable, AnalysisMode::Association { other });
            emit(&analyze(&series, &config, &request)?, json)?;
        }

        Commands::Report {
            input,
            range,
            max_workers,
            json,
        } => {
            let series = prepare(&input, &config, json)?;
            report(&series, &config, &range, max_workers, json)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    // RUST_LOG takes precedence over --verbose
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let installed = match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Cannot create log file {}", path.display()))?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };
    installed.map_err(|e| anyhow!("Failed to initialise logging: {}", e))
}

/// Load, normalize and impute the input file.
fn prepare(input: &InputArgs, config: &AnalysisConfig, quiet: bool) -> Result<Series> {
    let progress = ProgressReporter::new_spinner(
        &format!("Loading {}...", input.input.display()),
        quiet,
    );

    let mut reader = PowerReader::from_config(config).with_mmap(input.mmap);
    if let Some(offset) = input.header_offset {
        reader = reader.with_header_offset(offset);
    }

    let loaded = reader
        .read_series(&input.input)
        .map_err(|e| anyhow!("no data available: {}", e))?;
    info!("{}", loaded.report.summary());

    progress.set_message("Imputing missing values...");
    let imputed = WeeklyImputer::from_config(config).impute(loaded.series);
    for notice in &imputed.report.notices {
        warn!("{}", notice);
    }

    progress.finish_with_message(&format!(
        "Loaded {} days, imputed {} values",
        imputed.series.len(),
        imputed.report.total_filled()
    ));
    Ok(imputed.series)
}

/// A missing bound defaults to the matching end of the series.
fn resolve_range(series: &Series, range: &RangeArgs) -> Option<DateRange> {
    if range.start.is_none() && range.end.is_none() {
        return None;
    }
    let start = range.start.or_else(|| series.first_date())?;
    let end = range.end.or_else(|| series.last_date())?;
    Some(DateRange::new(start, end))
}

fn request_for(
    series: &Series,
    range: &RangeArgs,
    variable: Variable,
    mode: AnalysisMode,
) -> AnalysisRequest {
    let request = AnalysisRequest::new(variable, mode);
    match resolve_range(series, range) {
        Some(range) => request.with_range(range),
        None => request,
    }
}

fn selection_from(
    by: Option<PeriodKind>,
    months: Vec<Partition>,
    years: Vec<i32>,
) -> Result<PartitionSelection> {
    if !months.is_empty() {
        if let Some(year) = months.iter().find(|p| matches!(p, Partition::Year { .. })) {
            bail!("--months expects YYYY-MM periods, got '{}'", year);
        }
        return Ok(PartitionSelection::Explicit(months));
    }
    if !years.is_empty() {
        return Ok(PartitionSelection::Explicit(
            years.into_iter().map(Partition::year).collect(),
        ));
    }
    Ok(match by {
        Some(PeriodKind::Month) => PartitionSelection::Monthly,
        Some(PeriodKind::Year) | None => PartitionSelection::Yearly,
    })
}

fn emit(outcome: &AnalysisOutcome, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
    } else {
        println!("\n{}", outcome.summary());
    }
    Ok(())
}

fn report(
    series: &Series,
    config: &AnalysisConfig,
    range: &RangeArgs,
    max_workers: usize,
    json: bool,
) -> Result<()> {
    let requests: Vec<AnalysisRequest> = Variable::ALL
        .into_iter()
        .flat_map(|variable| {
            [
                AnalysisMode::Trend,
                AnalysisMode::Anomalies,
                AnalysisMode::Compare(PartitionSelection::Yearly),
            ]
            .into_iter()
            .map(move |mode| request_for(series, range, variable, mode))
        })
        .collect();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(max_workers)
        .build()
        .context("Failed to build worker pool")?;
    let results = pool.install(|| analyze_all(series, config, &requests));

    if json {
        let entries: Vec<serde_json::Value> = requests
            .iter()
            .zip(&results)
            .map(|(request, result)| match result {
                Ok(outcome) => json!({ "variable": request.variable, "outcome": outcome }),
                Err(e) => json!({ "variable": request.variable, "error": e.to_string() }),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    let mut current = None;
    for (request, result) in requests.iter().zip(&results) {
        if current != Some(request.variable) {
            current = Some(request.variable);
            println!("\n=== {} ===", request.variable.label());
        }
        match result {
            Ok(outcome) => println!("{}", outcome.summary()),
            Err(e) => println!("skipped: {}", e),
        }
    }
    Ok(())
}
