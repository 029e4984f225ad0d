/// Readings table normalizer.
///
/// Turns the loosely typed table handed over by the spreadsheet reader into a
/// `ReadingsTable` with a parsed date per row and one numeric-or-absent value
/// per station column. This is the only schema check of the pipeline: once a
/// `ReadingsTable` exists, every downstream component can assume the date
/// column is present and fully parsed.
///
/// Rows are never dropped, reordered, or imputed.

use crate::logging::{self, Component};
use crate::model::{AnalysisError, Reading, StationSeries};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};

// ---------------------------------------------------------------------------
// Raw input
// ---------------------------------------------------------------------------

/// One cell as delivered by the spreadsheet reader.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    Empty,
    Number(f64),
    Text(String),
}

impl From<&str> for RawCell {
    fn from(s: &str) -> Self {
        if s.trim().is_empty() {
            RawCell::Empty
        } else {
            RawCell::Text(s.to_string())
        }
    }
}

impl From<f64> for RawCell {
    fn from(n: f64) -> Self {
        RawCell::Number(n)
    }
}

impl From<Option<f64>> for RawCell {
    fn from(n: Option<f64>) -> Self {
        n.map(RawCell::Number).unwrap_or(RawCell::Empty)
    }
}

/// Header row plus data rows, in sheet order. Rows shorter than the header
/// are padded with `RawCell::Empty`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<RawCell>>,
}

// ---------------------------------------------------------------------------
// Normalized table
// ---------------------------------------------------------------------------

/// A table whose date column has been validated and parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingsTable {
    dates: Vec<NaiveDate>,
    columns: Vec<(String, Vec<Option<f64>>)>,
}

impl ReadingsTable {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Names of all value columns, trimmed, in sheet order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|(n, _)| n == name)
    }

    /// Rows whose date lies within `from..=to`; an open bound does not
    /// restrict. Row order is kept.
    pub fn between(&self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> ReadingsTable {
        let keep: Vec<bool> = self
            .dates
            .iter()
            .map(|d| from.is_none_or(|f| *d >= f) && to.is_none_or(|t| *d <= t))
            .collect();
        ReadingsTable {
            dates: keep_rows(&self.dates, &keep),
            columns: self
                .columns
                .iter()
                .map(|(name, values)| (name.clone(), keep_rows(values, &keep)))
                .collect(),
        }
    }

    /// First and last date in the table.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((*self.dates.iter().min()?, *self.dates.iter().max()?))
    }

    /// Pairs each row's date with the station's value. `None` when the
    /// station has no column in this table.
    pub fn station_series(&self, station_id: &str) -> Option<StationSeries> {
        let (_, values) = self.columns.iter().find(|(n, _)| n == station_id)?;
        let readings = self
            .dates
            .iter()
            .zip(values.iter())
            .map(|(date, value)| Reading { date: *date, value: *value })
            .collect();
        Some(StationSeries {
            station_id: station_id.to_string(),
            readings,
        })
    }
}

fn keep_rows<T: Copy>(values: &[T], keep: &[bool]) -> Vec<T> {
    values
        .iter()
        .zip(keep)
        .filter(|&(_, &k)| k)
        .map(|(v, _)| *v)
        .collect()
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Validates `raw` and parses its date column.
///
/// Fails with `MalformedInput` when the date column is absent, when it holds
/// no parseable date at all, or when any single date cell cannot be parsed.
/// A header-only table is valid and normalizes to an empty table.
pub fn normalize(raw: &RawTable, date_column: &str) -> Result<ReadingsTable, AnalysisError> {
    let headers: Vec<String> = raw.headers.iter().map(|h| h.trim().to_string()).collect();
    let wanted = date_column.trim();

    let date_idx = headers.iter().position(|h| h == wanted).ok_or_else(|| {
        AnalysisError::MalformedInput(format!("missing date column '{}'", wanted))
    })?;

    let date_cells: Vec<&RawCell> = raw
        .rows
        .iter()
        .map(|row| row.get(date_idx).unwrap_or(&RawCell::Empty))
        .collect();
    let parsed: Vec<Option<NaiveDate>> = date_cells.iter().map(|c| parse_date_cell(c)).collect();

    if !parsed.is_empty() && parsed.iter().all(Option::is_none) {
        return Err(AnalysisError::MalformedInput(format!(
            "date column '{}' has no parseable dates",
            wanted
        )));
    }

    let mut dates = Vec::with_capacity(parsed.len());
    for (i, (date, cell)) in parsed.iter().zip(date_cells.iter()).enumerate() {
        match date {
            Some(d) => dates.push(*d),
            None => {
                return Err(AnalysisError::MalformedInput(format!(
                    "unparseable date {:?} in column '{}' at row {}",
                    cell,
                    wanted,
                    i + 1
                )));
            }
        }
    }

    let mut columns: Vec<(String, Vec<Option<f64>>)> = Vec::new();
    for (idx, name) in headers.iter().enumerate() {
        if idx == date_idx || name.is_empty() {
            continue;
        }
        if columns.iter().any(|(n, _)| n == name) {
            logging::warn(
                Component::Normalizer,
                Some(name),
                "duplicate column header, keeping the first occurrence",
            );
            continue;
        }

        let mut non_numeric = 0usize;
        let values: Vec<Option<f64>> = raw
            .rows
            .iter()
            .map(|row| {
                let cell = row.get(idx).unwrap_or(&RawCell::Empty);
                let value = parse_value_cell(cell);
                if value.is_none() && matches!(cell, RawCell::Text(t) if !is_missing_marker(t)) {
                    non_numeric += 1;
                }
                value
            })
            .collect();

        if non_numeric > 0 {
            logging::warn(
                Component::Normalizer,
                Some(name),
                &format!("{} non-numeric cells treated as missing", non_numeric),
            );
        }
        columns.push((name.clone(), values));
    }

    logging::debug(
        Component::Normalizer,
        None,
        &format!("normalized {} rows, {} value columns", dates.len(), columns.len()),
    );

    Ok(ReadingsTable { dates, columns })
}

// ---------------------------------------------------------------------------
// Cell parsing
// ---------------------------------------------------------------------------

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

/// Spreadsheet day zero; serial 1 is 1899-12-31 in the 1900 date system
/// once the phantom 1900-02-29 is accounted for.
const SERIAL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

/// Largest serial a spreadsheet can hold (9999-12-31).
const MAX_SERIAL: f64 = 2_958_465.0;

/// Parses a date cell. Text is tried as ISO date, day-first date, datetime,
/// then RFC 3339; numbers are spreadsheet serial days.
pub fn parse_date_cell(cell: &RawCell) -> Option<NaiveDate> {
    match cell {
        RawCell::Empty => None,
        RawCell::Number(n) => serial_to_date(*n),
        RawCell::Text(text) => parse_date_text(text.trim()),
    }
}

fn parse_date_text(s: &str) -> Option<NaiveDate> {
    if s.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
}

fn serial_to_date(n: f64) -> Option<NaiveDate> {
    if !n.is_finite() || n < 1.0 || n > MAX_SERIAL {
        return None;
    }
    let (y, m, d) = SERIAL_EPOCH;
    let epoch = NaiveDate::from_ymd_opt(y, m, d)?;
    epoch.checked_add_signed(Duration::days(n.floor() as i64))
}

fn is_missing_marker(s: &str) -> bool {
    matches!(
        s.trim().to_ascii_lowercase().as_str(),
        "" | "nan" | "null" | "na" | "n/a" | "-" | "none"
    )
}

/// Parses a value cell. Missing markers and non-numeric text are absent;
/// a lone decimal comma (`"12,5"`) is accepted.
pub fn parse_value_cell(cell: &RawCell) -> Option<f64> {
    match cell {
        RawCell::Empty => None,
        RawCell::Number(n) => Some(*n).filter(|v| v.is_finite()),
        RawCell::Text(text) => {
            let s = text.trim();
            if is_missing_marker(s) {
                return None;
            }
            let normalized = if !s.contains('.') && s.matches(',').count() == 1 {
                s.replace(',', ".")
            } else {
                s.to_string()
            };
            normalized.parse::<f64>().ok().filter(|v| v.is_finite())
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
