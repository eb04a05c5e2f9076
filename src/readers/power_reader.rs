use crate::config::AnalysisConfig;
use crate::error::{MeteoError, Result};
use crate::models::{Observation, Series, Variable};
use crate::utils::constants::{
    DATE_COLUMN, DATE_FORMATS, DAY_COLUMN, DAY_OF_YEAR_COLUMN, DEFAULT_BUFFER_SIZE,
    DEFAULT_HEADER_OFFSET, MISSING_SENTINEL, MONTH_COLUMN, YEAR_COLUMN,
};
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use memmap2::Mmap;
use serde::Serialize;
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, info, warn};
use validator::Validate;

/// Counters collected while normalizing a POWER export.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadReport {
    pub rows_read: usize,
    pub rows_skipped: usize,
    pub sentinel_values: usize,
    pub malformed_values: usize,
    pub duplicate_dates: usize,
    pub implausible_records: usize,
    pub missing_columns: Vec<Variable>,
}

impl LoadReport {
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "Rows read: {}, skipped: {}, duplicate dates: {}\n\
             Sentinel values: {}, malformed values: {}, implausible records: {}",
            self.rows_read,
            self.rows_skipped,
            self.duplicate_dates,
            self.sentinel_values,
            self.malformed_values,
            self.implausible_records,
        );
        if !self.missing_columns.is_empty() {
            let names: Vec<&str> = self.missing_columns.iter().map(|v| v.source_column()).collect();
            summary.push_str(&format!("\nMissing columns: {}", names.join(", ")));
        }
        summary
    }
}

#[derive(Debug)]
pub struct LoadOutcome {
    pub series: Series,
    pub report: LoadReport,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum DateColumns {
    Date(usize),
    YearMonthDay(usize, usize, usize),
    YearDayOfYear(usize, usize),
}

#[derive(Debug)]
struct ColumnLayout {
    date: DateColumns,
    values: Vec<(Variable, usize)>,
}

enum ParsedValue {
    Value(f64),
    Absent,
    Sentinel,
    Malformed,
}

/// Reader for NASA POWER "Point Daily" CSV exports.
pub struct PowerReader {
    header_offset: usize,
    sentinel: f64,
    use_mmap: bool,
}

impl PowerReader {
    pub fn new() -> Self {
        Self {
            header_offset: DEFAULT_HEADER_OFFSET,
            sentinel: MISSING_SENTINEL,
            use_mmap: false,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            header_offset: config.header_offset,
            sentinel: config.sentinel,
            use_mmap: false,
        }
    }

    pub fn with_header_offset(mut self, header_offset: usize) -> Self {
        self.header_offset = header_offset;
        self
    }

    pub fn with_sentinel(mut self, sentinel: f64) -> Self {
        self.sentinel = sentinel;
        self
    }

    pub fn with_mmap(mut self, use_mmap: bool) -> Self {
        self.use_mmap = use_mmap;
        self
    }

    /// Read and normalize an export. Either the whole series is returned or
    /// an error; never a partial series.
    pub fn read_series(&self, path: &Path) -> Result<LoadOutcome> {
        debug!("Reading POWER export {}", path.display());
        let outcome = if self.use_mmap {
            self.read_mmap(path)?
        } else {
            self.read_buffered(path)?
        };

        info!(
            "Loaded {} observations from {}",
            outcome.series.len(),
            path.display()
        );
        Ok(outcome)
    }

    /// Normalize an export already held in memory.
    pub fn read_str(&self, content: &str) -> Result<LoadOutcome> {
        let body = skip_lines(content, self.header_offset)
            .filter(|rest| !rest.trim().is_empty())
            .ok_or(MeteoError::MissingHeader {
                offset: self.header_offset,
            })?;

        let mut reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(body.as_bytes());

        let layout = self.resolve_layout(reader.headers()?)?;
        let mut report = LoadReport {
            missing_columns: Variable::ALL
                .into_iter()
                .filter(|v| !layout.values.iter().any(|(found, _)| found == v))
                .collect(),
            ..LoadReport::default()
        };
        for variable in &report.missing_columns {
            warn!(
                "Column {} not present, {} will be absent throughout",
                variable.source_column(),
                variable
            );
        }

        let mut observations = Vec::new();
        for record in reader.records() {
            let record = record?;
            report.rows_read += 1;

            match self.parse_record(&record, &layout, &mut report) {
                Some(observation) => observations.push(observation),
                None => report.rows_skipped += 1,
            }
        }

        let (series, duplicates) = Series::with_duplicates_removed(observations);
        report.duplicate_dates = duplicates;

        if series.is_empty() {
            return Err(MeteoError::EmptyDataset);
        }

        Ok(LoadOutcome { series, report })
    }

    fn read_buffered(&self, path: &Path) -> Result<LoadOutcome> {
        let file = File::open(path)?;
        let mut reader = BufReader::with_capacity(DEFAULT_BUFFER_SIZE, file);
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;

        self.read_str(&decode(&bytes)?)
    }

    /// Memory-mapped variant for large exports
    fn read_mmap(&self, path: &Path) -> Result<LoadOutcome> {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };

        self.read_str(&decode(&mmap)?)
    }

    fn resolve_layout(&self, headers: &StringRecord) -> Result<ColumnLayout> {
        let position = |name: &str| {
            headers
                .iter()
                .position(|header| header.eq_ignore_ascii_case(name))
        };

        let date = if let Some(idx) = position(DATE_COLUMN) {
            DateColumns::Date(idx)
        } else {
            match (
                position(YEAR_COLUMN),
                position(MONTH_COLUMN),
                position(DAY_COLUMN),
                position(DAY_OF_YEAR_COLUMN),
            ) {
                (Some(y), Some(m), Some(d), _) => DateColumns::YearMonthDay(y, m, d),
                (Some(y), _, _, Some(doy)) => DateColumns::YearDayOfYear(y, doy),
                _ => {
                    return Err(MeteoError::MissingHeader {
                        offset: self.header_offset,
                    })
                }
            }
        };

        let values = Variable::ALL
            .into_iter()
            .filter_map(|v| position(v.source_column()).map(|idx| (v, idx)))
            .collect();

        Ok(ColumnLayout { date, values })
    }

    fn parse_record(
        &self,
        record: &StringRecord,
        layout: &ColumnLayout,
        report: &mut LoadReport,
    ) -> Option<Observation> {
        let Some(date) = parse_date(record, layout.date) else {
            debug!("Skipping row without a valid date: {:?}", record);
            return None;
        };

        let mut observation = Observation::new(date);
        for &(variable, idx) in &layout.values {
            let value = match self.parse_value(record.get(idx).unwrap_or("")) {
                ParsedValue::Value(v) => Some(v),
                ParsedValue::Absent => None,
                ParsedValue::Sentinel => {
                    report.sentinel_values += 1;
                    None
                }
                ParsedValue::Malformed => {
                    report.malformed_values += 1;
                    None
                }
            };
            observation.set_value(variable, value);
        }

        if let Err(e) = observation.validate() {
            report.implausible_records += 1;
            debug!("Implausible values on {}: {}", date, e);
        }

        Some(observation)
    }

    fn parse_value(&self, raw: &str) -> ParsedValue {
        if raw.is_empty() {
            return ParsedValue::Absent;
        }
        match raw.parse::<f64>() {
            Ok(v) if v == self.sentinel => ParsedValue::Sentinel,
            Ok(v) if v.is_finite() => ParsedValue::Value(v),
            _ => ParsedValue::Malformed,
        }
    }
}

impl Default for PowerReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Drop the first `n` lines; `None` when the text has fewer than `n` lines.
fn skip_lines(content: &str, n: usize) -> Option<&str> {
    let mut rest = content;
    for _ in 0..n {
        let end = rest.find('\n')?;
        rest = &rest[end + 1..];
    }
    Some(rest)
}

fn decode(bytes: &[u8]) -> Result<Cow<'_, str>> {
    let (text, _, had_errors) = encoding_rs::UTF_8.decode(bytes);
    if !had_errors {
        return Ok(text);
    }

    debug!("Input is not valid UTF-8, decoding as Windows-1252");
    let (text, _, had_errors) = encoding_rs::WINDOWS_1252.decode(bytes);
    if had_errors {
        return Err(MeteoError::Encoding(
            "input is neither UTF-8 nor Windows-1252".to_string(),
        ));
    }
    Ok(text)
}

fn parse_date(record: &StringRecord, columns: DateColumns) -> Option<NaiveDate> {
    let int = |idx: usize| record.get(idx).and_then(|s| s.parse::<i64>().ok());

    match columns {
        DateColumns::Date(idx) => {
            let raw = record.get(idx)?;
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        }
        DateColumns::YearMonthDay(y, m, d) => NaiveDate::from_ymd_opt(
            i32::try_from(int(y)?).ok()?,
            u32::try_from(int(m)?).ok()?,
            u32::try_from(int(d)?).ok()?,
        ),
        DateColumns::YearDayOfYear(y, doy) => NaiveDate::from_yo_opt(
            i32::try_from(int(y)?).ok()?,
            u32::try_from(int(doy)?).ok()?,
        ),
    }
}
