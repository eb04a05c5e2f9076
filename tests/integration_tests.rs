use chrono::{Duration, NaiveDate};
use meteo_explorer::analyzers::{
    analyze, AnalysisMode, AnalysisOutcome, AnalysisRequest, ComparisonTest, TrendDirection,
};
use meteo_explorer::config::ImputationFallback;
use meteo_explorer::models::{Notice, Series, Variable};
use meteo_explorer::processors::{DateRange, Partition, PartitionSelection, WeeklyImputer};
use meteo_explorer::readers::PowerReader;
use meteo_explorer::{AnalysisConfig, MeteoError, Result};
use pretty_assertions::assert_eq;
use std::io::Write;
use tempfile::NamedTempFile;

const DAYS: i64 = 730;
// 2022-03-07 (Monday) through 2022-03-13 (Sunday)
const MISSING_WEEK: std::ops::RangeInclusive<i64> = 65..=71;
const SPIKE_DAY: i64 = 100;

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2022, 1, 1).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Two years of daily POWER data: warming temperature with sentinels every
/// seventeenth day and one fully missing week, a single precipitation spike.
fn power_export(metadata_lines: usize) -> String {
    let mut out = String::new();
    out.push_str("-BEGIN HEADER-\n");
    for i in 0..metadata_lines.saturating_sub(2) {
        out.push_str(&format!("metadata {}\n", i));
    }
    out.push_str("-END HEADER-\n");
    out.push_str("YEAR,MO,DY,T2M,RH2M,PRECTOTCORR,WS2M,ALLSKY_SFC_SW_DWN\n");

    for i in 0..DAYS {
        let day = start() + Duration::days(i);
        let season = (i as f64 / 365.0 * std::f64::consts::TAU).sin();
        let temperature = 10.0 + 0.01 * i as f64 + 4.0 * season;
        let t2m = if i % 17 == 0 || MISSING_WEEK.contains(&i) {
            "-999".to_string()
        } else {
            format!("{:.2}", temperature)
        };
        let precipitation = if i == SPIKE_DAY {
            150.0
        } else {
            (i % 5) as f64
        };
        out.push_str(&format!(
            "{},{},{},{},{:.2},{:.2},{:.2},{:.2}\n",
            day.format("%Y"),
            day.format("%-m"),
            day.format("%-d"),
            t2m,
            95.0 - 2.0 * temperature,
            precipitation,
            2.5 + (i % 4) as f64 * 0.5,
            5.0 + season
        ));
    }
    out
}

fn write_export(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn prepared(config: &AnalysisConfig) -> Result<Series> {
    let file = write_export(&power_export(13));
    let loaded = PowerReader::from_config(config).read_series(file.path())?;
    Ok(WeeklyImputer::from_config(config).impute(loaded.series).series)
}

#[test]
fn test_load_normalizes_sentinels() -> Result<()> {
    let file = write_export(&power_export(13));
    let loaded = PowerReader::new().read_series(file.path())?;

    assert_eq!(loaded.series.len(), DAYS as usize);
    assert_eq!(loaded.report.rows_read, DAYS as usize);
    // 43 multiples of 17 below 730, one of which (68) falls in the missing week
    assert_eq!(loaded.report.sentinel_values, 43 + 7 - 1);
    assert!(loaded
        .series
        .values(Variable::Temperature)
        .iter()
        .all(|&v| v > -100.0));
    Ok(())
}

#[test]
fn test_imputation_fills_gaps_but_not_empty_week() -> Result<()> {
    let file = write_export(&power_export(13));
    let loaded = PowerReader::new().read_series(file.path())?;
    let outcome = WeeklyImputer::new().impute(loaded.series);
    let series = &outcome.series;

    // sentinel day 2022-01-18 (index 17) sits in a week with measurements
    assert!(series.get(date(2022, 1, 18)).unwrap().temperature.is_some());
    for d in 7..=13 {
        assert_eq!(series.get(date(2022, 3, d)).unwrap().temperature, None);
    }
    assert!(outcome.report.notices.contains(&Notice::EmptyGroup {
        variable: Variable::Temperature,
        group: "ISO week 2022-W10".to_string(),
    }));
    assert_eq!(series.missing(Variable::Temperature), 7);
    assert_eq!(series.missing(Variable::Humidity), 0);
    Ok(())
}

#[test]
fn test_monthly_fallback_closes_empty_week() -> Result<()> {
    let config = AnalysisConfig::default().with_imputation_fallback(ImputationFallback::Monthly);
    let series = prepared(&config)?;

    assert_eq!(series.missing(Variable::Temperature), 0);
    Ok(())
}

#[test]
fn test_trend_over_full_series_and_window() -> Result<()> {
    let config = AnalysisConfig::default();
    let series = prepared(&config)?;

    let full = analyze(
        &series,
        &config,
        &AnalysisRequest::new(Variable::Temperature, AnalysisMode::Trend),
    )?;
    match full {
        AnalysisOutcome::Trend(report) => {
            assert_eq!(report.trend.direction, TrendDirection::Increasing);
            assert_eq!(report.trend.n, DAYS as usize - 7);
        }
        other => panic!("unexpected outcome {:?}", other),
    }

    // inverted bounds select the same window
    let window = DateRange::new(date(2023, 2, 28), date(2023, 2, 1));
    let windowed = analyze(
        &series,
        &config,
        &AnalysisRequest::new(Variable::Temperature, AnalysisMode::Trend).with_range(window),
    )?;
    match windowed {
        AnalysisOutcome::Trend(report) => {
            assert_eq!(report.series.first_date(), Some(date(2023, 2, 1)));
            assert_eq!(report.series.last_date(), Some(date(2023, 2, 28)));
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    Ok(())
}

#[test]
fn test_compare_explicit_months_keeps_order() -> Result<()> {
    let config = AnalysisConfig::default();
    let series = prepared(&config)?;

    let selection = PartitionSelection::Explicit(vec![
        Partition::month(2023, 7)?,
        Partition::month(2022, 7)?,
    ]);
    let outcome = analyze(
        &series,
        &config,
        &AnalysisRequest::new(Variable::Humidity, AnalysisMode::Compare(selection)),
    )?;

    match outcome {
        AnalysisOutcome::Comparison(report) => {
            let labels: Vec<String> = report.rows.iter().map(|r| r.partition.label()).collect();
            assert_eq!(labels, vec!["2023-07", "2022-07"]);
            assert_eq!(report.rows[0].observations, 31);
            let comparison = report.comparison.expect("two full months are comparable");
            assert!(matches!(
                comparison.test,
                ComparisonTest::StudentT | ComparisonTest::MannWhitneyU
            ));
            assert!(comparison.significant);
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    Ok(())
}

#[test]
fn test_duplicate_selection_is_rejected() -> Result<()> {
    let config = AnalysisConfig::default();
    let series = prepared(&config)?;
    let selection = PartitionSelection::Explicit(vec![Partition::year(2022), Partition::year(2022)]);

    let err = analyze(
        &series,
        &config,
        &AnalysisRequest::new(Variable::Temperature, AnalysisMode::Compare(selection)),
    )
    .unwrap_err();
    assert!(matches!(err, MeteoError::InvalidSelection(_)));
    Ok(())
}

#[test]
fn test_precipitation_spike_is_the_only_anomaly() -> Result<()> {
    let config = AnalysisConfig::default();
    let series = prepared(&config)?;

    let outcome = analyze(
        &series,
        &config,
        &AnalysisRequest::new(Variable::Precipitation, AnalysisMode::Anomalies),
    )?;
    match outcome {
        AnalysisOutcome::Anomalies(report) => {
            let spike = start() + Duration::days(SPIKE_DAY);
            assert_eq!(
                report.anomalies.points(Variable::Precipitation),
                vec![(spike, 150.0)]
            );
            assert_eq!(report.normal.len(), DAYS as usize - 1);
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    Ok(())
}

#[test]
fn test_association_and_json_output() -> Result<()> {
    let config = AnalysisConfig::default();
    let series = prepared(&config)?;

    let outcome = analyze(
        &series,
        &config,
        &AnalysisRequest::new(
            Variable::Temperature,
            AnalysisMode::Association {
                other: Variable::Humidity,
            },
        ),
    )?;
    let json = serde_json::to_value(&outcome)?;

    assert_eq!(json["mode"], "association");
    assert_eq!(json["first"], "temperature");
    assert_eq!(json["second"], "humidity");
    assert_eq!(json["significant"], true);
    Ok(())
}

#[test]
fn test_config_file_sets_header_offset() -> Result<()> {
    let mut config_file = tempfile::Builder::new().suffix(".toml").tempfile()?;
    writeln!(config_file, "header_offset = 4")?;
    writeln!(config_file, "significance_level = 0.01")?;
    config_file.flush()?;

    let config = AnalysisConfig::load(Some(config_file.path()))?;
    assert_eq!(config.header_offset, 4);

    let file = write_export(&power_export(4));
    let loaded = PowerReader::from_config(&config).read_series(file.path())?;
    assert_eq!(loaded.series.len(), DAYS as usize);
    Ok(())
}

#[test]
fn test_missing_file_is_a_load_error() {
    let err = PowerReader::new()
        .read_series(std::path::Path::new("/definitely/not/here.csv"))
        .unwrap_err();
    assert!(err.is_load_error());
}
