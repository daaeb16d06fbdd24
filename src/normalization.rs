use std::fmt;
use std::fmt::Formatter;
use chrono::{NaiveDate, NaiveDateTime};
use log::{info, warn};
use crate::errors::{ExtractError, NormalizeError};
use crate::models::forecast::{ForecastRecord, RawRow};

/// Date formats tried in order, the lenient defaults first and the explicit
/// day-month-name-year format last. All-numeric dates are read month first.
const DATE_FORMATS: [&str; 7] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%B %d, %Y",
    "%b %d %Y",
    "%d %B %Y",
];

/// Columns the pipeline knows about
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    Date,
    UvIndex,
    OzoneColumn,
}

/// Implementation of the Display Trait for pretty print
impl fmt::Display for Field {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Field::Date => write!(f, "date"),
            Field::UvIndex => write!(f, "uv_index"),
            Field::OzoneColumn => write!(f, "ozone_column"),
        }
    }
}

impl Field {
    /// Maps a normalized header key to a field
    ///
    /// # Arguments
    ///
    /// * 'key' - header label already passed through normalize_header
    fn from_key(key: &str) -> Option<Field> {
        match key {
            "date" => Some(Field::Date),
            "uv_index" => Some(Field::UvIndex),
            "ozone_column" => Some(Field::OzoneColumn),
            _ => None,
        }
    }
}

/// Column positions of the known fields within a table row
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeaderMap {
    pub date: usize,
    pub uv_index: usize,
    pub ozone_column: Option<usize>,
}

impl HeaderMap {
    /// Resolves column positions from header labels.
    /// Unknown columns are ignored, a missing date or uv index column is an error while
    /// a missing ozone column only degrades the output.
    ///
    /// # Arguments
    ///
    /// * 'headers' - header labels in column order as found in the table
    pub fn resolve(headers: &[String]) -> Result<HeaderMap, ExtractError> {
        let mut date: Option<usize> = None;
        let mut uv_index: Option<usize> = None;
        let mut ozone_column: Option<usize> = None;

        for (i, h) in headers.iter().enumerate() {
            match Field::from_key(&normalize_header(h)) {
                Some(Field::Date) => { date.get_or_insert(i); },
                Some(Field::UvIndex) => { uv_index.get_or_insert(i); },
                Some(Field::OzoneColumn) => { ozone_column.get_or_insert(i); },
                None => {},
            }
        }

        let date = date.ok_or(ExtractError::FieldMissing(Field::Date))?;
        let uv_index = uv_index.ok_or(ExtractError::FieldMissing(Field::UvIndex))?;
        if ozone_column.is_none() {
            warn!("no ozone column in table header, ozone values will be omitted");
        }

        Ok(HeaderMap { date, uv_index, ozone_column })
    }
}

/// Why a row was dropped
#[derive(Clone, Debug, PartialEq)]
pub enum RowRejection {
    UvUnparseable(String),
    OzoneMalformed(String),
    DateUnparseable(String),
}

/// Implementation of the Display Trait for pretty print
impl fmt::Display for RowRejection {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            RowRejection::UvUnparseable(v) => write!(f, "uv index '{}' is not a non-negative number", v),
            RowRejection::OzoneMalformed(v) => write!(f, "ozone column '{}' is malformed", v),
            RowRejection::DateUnparseable(v) => write!(f, "date '{}' matches no known format", v),
        }
    }
}

/// Case folds a header label, trims it and joins its words with a single underscore
///
/// # Arguments
///
/// * 'header' - the raw header label
pub fn normalize_header(header: &str) -> String {
    header
        .split_whitespace()
        .map(|w| w.to_lowercase())
        .collect::<Vec<String>>()
        .join("_")
}

/// Converts raw rows to forecast records, dropping the rows that can't be converted.
/// Row order is kept and duplicate dates are left for the history merge to resolve.
///
/// # Arguments
///
/// * 'rows' - raw rows as extracted from the forecast table
pub fn normalize(rows: &[RawRow]) -> Result<Vec<ForecastRecord>, NormalizeError> {
    let mut records: Vec<ForecastRecord> = Vec::with_capacity(rows.len());

    for row in rows {
        match normalize_row(row) {
            Ok(record) => records.push(record),
            Err(rejection) => warn!("dropping forecast row: {}", rejection),
        }
    }

    if records.is_empty() {
        return Err(NormalizeError::EmptyFrame(rows.len()));
    }
    info!("normalized {} of {} forecast rows", records.len(), rows.len());

    Ok(records)
}

/// Converts one raw row
///
/// # Arguments
///
/// * 'row' - the row to convert
pub fn normalize_row(row: &RawRow) -> Result<ForecastRecord, RowRejection> {
    let uv_index = parse_uv_index(&row.uv_index)
        .ok_or_else(|| RowRejection::UvUnparseable(row.uv_index.clone()))?;

    let ozone_column = match &row.ozone_column {
        Some(o) => Some(parse_ozone(o).ok_or_else(|| RowRejection::OzoneMalformed(o.clone()))?),
        None => None,
    };

    let date = parse_date(&row.date)?;

    Ok(ForecastRecord { date, uv_index, ozone_column })
}

/// Parses a date trying each known format in turn
///
/// # Arguments
///
/// * 'value' - date text from the table
pub fn parse_date(value: &str) -> Result<NaiveDate, RowRejection> {
    let value = value.split_whitespace().collect::<Vec<&str>>().join(" ");

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&value, fmt).ok())
        .or_else(|| NaiveDateTime::parse_from_str(&value, "%Y-%m-%dT%H:%M:%S").ok().map(|dt| dt.date()))
        .ok_or(RowRejection::DateUnparseable(value))
}

fn parse_uv_index(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite() && *v >= 0.0)
}

fn parse_ozone(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    let split = trimmed.len().saturating_sub(2);
    let number = match trimmed.get(split..) {
        Some(unit) if unit.eq_ignore_ascii_case("du") => &trimmed[..split],
        _ => trimmed,
    };

    number.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
