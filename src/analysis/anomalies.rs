/// Percent-change anomaly detection.
///
/// Compares each valid reading with the previous valid reading of the same
/// station, in chronological order. Missing rows are removed first, so a gap
/// in the sheet never breaks adjacency: the comparison simply spans it.
///
/// # Zero baseline
/// A change from a previous value of exactly zero has no finite percentage:
///   0 -> 0  →  no change, never anomalous
///   0 -> x  →  infinite change with the sign of x, always anomalous
/// The infinite value is kept in the record (it serializes as `null`).

use crate::model::{AnomalyRecord, StationSeries};
use chrono::NaiveDate;

/// Percent change from `previous` to `current`, or `None` when both are zero.
pub fn percent_change(previous: f64, current: f64) -> Option<f64> {
    if previous == 0.0 {
        if current == 0.0 {
            None
        } else {
            Some(f64::INFINITY.copysign(current))
        }
    } else {
        Some((current - previous) / previous * 100.0)
    }
}

/// Returns every valid reading whose absolute percent change from the prior
/// valid reading is strictly greater than `threshold_pct`.
///
/// Readings are ordered by date, then by value for rows sharing a date, so
/// the result depends only on the data and not on sheet row order. Fewer than
/// two valid readings yield an empty list.
pub fn detect_anomalies(series: &StationSeries, threshold_pct: f64) -> Vec<AnomalyRecord> {
    let mut valid: Vec<(NaiveDate, f64)> = series
        .readings
        .iter()
        .filter_map(|r| r.value.map(|v| (r.date, v)))
        .collect();

    if valid.len() < 2 {
        return Vec::new();
    }

    valid.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.total_cmp(&b.1)));

    valid
        .windows(2)
        .filter_map(|pair| {
            let (_, previous) = pair[0];
            let (date, current) = pair[1];
            percent_change(previous, current)
                .filter(|pct| pct.abs() > threshold_pct)
                .map(|percent_change| AnomalyRecord { date, percent_change })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
