/// Per-station completeness: how many rows are missing, what share of the
/// column that is, and on which dates.

use crate::model::{AnalysisError, StationSeries};
use chrono::NaiveDate;

/// Missing-data metrics for one station column.
#[derive(Debug, Clone, PartialEq)]
pub struct Completeness {
    pub total: usize,
    pub missing_count: usize,
    pub missing_pct: f64,
    /// Dates of missing rows, ascending. A date repeated in the sheet is
    /// listed once per missing row.
    pub missing_dates: Vec<NaiveDate>,
}

/// `100 * missing / total`.
///
/// Undefined for an empty column: returns `EmptyStation` instead of
/// dividing by zero.
pub fn missing_pct(station_id: &str, missing: usize, total: usize) -> Result<f64, AnalysisError> {
    if total == 0 {
        return Err(AnalysisError::EmptyStation(station_id.to_string()));
    }
    Ok(100.0 * missing as f64 / total as f64)
}

/// Computes completeness metrics for a station column.
pub fn analyze_completeness(series: &StationSeries) -> Result<Completeness, AnalysisError> {
    let total = series.total();
    let mut missing_dates: Vec<NaiveDate> = series
        .readings
        .iter()
        .filter(|r| r.value.is_none())
        .map(|r| r.date)
        .collect();
    missing_dates.sort();

    let missing_count = missing_dates.len();
    let missing_pct = missing_pct(&series.station_id, missing_count, total)?;

    Ok(Completeness {
        total,
        missing_count,
        missing_pct,
        missing_dates,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
