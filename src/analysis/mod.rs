/// Statistical transforms over one station's readings.
///
/// Submodules:
/// - `completeness`: missing counts, percentage, and missing dates.
/// - `gap_series`  : monthly missing-ratio series fed to the forecaster.
/// - `forecast`    : seasonal trend model and gap-risk dates.
/// - `anomalies`   : percent-change outliers between valid readings.
/// - `monthly`     : per-month count/mean/missing-rate rollup.
/// - `stats`       : sum, mean, extremes, month-of-year means, 2σ outliers.

pub mod anomalies;
pub mod completeness;
pub mod forecast;
pub mod gap_series;
pub mod monthly;
pub mod stats;

use chrono::{Datelike, Duration, Months, NaiveDate};

/// First day of the date's calendar month.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Last day of the date's calendar month.
pub fn month_end(date: NaiveDate) -> NaiveDate {
    let start = month_start(date);
    start
        .checked_add_months(Months::new(1))
        .map(|next| next - Duration::days(1))
        .unwrap_or(start)
}

/// First day of the month `months` after the date's month.
pub fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    let start = month_start(date);
    start.checked_add_months(Months::new(months)).unwrap_or(start)
}
