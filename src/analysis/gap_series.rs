/// Monthly gap-ratio series builder.
///
/// Resamples one station's missingness to calendar months. The series only
/// contains months with at least one row; empty months are skipped, never
/// zero-filled, so every ratio has a non-zero denominator.

use crate::analysis::month_start;
use crate::model::{GapRatioPoint, StationSeries};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Builds the chronologically ordered `(month_start, ratio)` series.
/// An empty column yields an empty series.
pub fn build_gap_series(series: &StationSeries) -> Vec<GapRatioPoint> {
    let mut months: BTreeMap<NaiveDate, (usize, usize)> = BTreeMap::new();
    for reading in &series.readings {
        let entry = months.entry(month_start(reading.date)).or_insert((0, 0));
        if reading.value.is_none() {
            entry.0 += 1;
        }
        entry.1 += 1;
    }

    months
        .into_iter()
        .map(|(month_start, (missing, total))| GapRatioPoint {
            month_start,
            missing,
            total,
            ratio: missing as f64 / total as f64,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Reading;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn series(rows: &[(NaiveDate, Option<f64>)]) -> StationSeries {
        StationSeries {
            station_id: "P43".to_string(),
            readings: rows.iter().map(|&(date, value)| Reading { date, value }).collect(),
        }
    }

    #[test]
    fn test_groups_by_calendar_month_in_order() {
        let s = series(&[
            (day(2024, 3, 10), Some(1.0)),
            (day(2024, 1, 5), None),
            (day(2024, 1, 20), Some(2.0)),
            (day(2024, 3, 11), None),
            (day(2024, 3, 12), None),
        ]);
        let points = build_gap_series(&s);
        assert_eq!(points.len(), 2, "February has no rows and must be skipped");
        assert_eq!(points[0].month_start, day(2024, 1, 1));
        assert_eq!(points[0].ratio, 0.5);
        assert_eq!(points[1].month_start, day(2024, 3, 1));
        assert_eq!(points[1].missing, 2);
        assert_eq!(points[1].total, 3);
    }

    #[test]
    fn test_months_across_years_do_not_merge() {
        let s = series(&[(day(2023, 6, 1), None), (day(2024, 6, 1), Some(3.0))]);
        let points = build_gap_series(&s);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].ratio, 1.0);
        assert_eq!(points[1].ratio, 0.0);
    }

    #[test]
    fn test_empty_column_gives_empty_series() {
        assert!(build_gap_series(&series(&[])).is_empty());
    }

    #[test]
    fn test_ratios_bounded_and_missing_counts_add_up() {
        let mut rows = Vec::new();
        for i in 0..90u32 {
            let date = day(2023, 1, 1) + chrono::Duration::days(i as i64 * 4);
            let value = if i % 3 == 0 || i % 7 == 0 { None } else { Some(i as f64) };
            rows.push((date, value));
        }
        let s = series(&rows);
        let points = build_gap_series(&s);

        for p in &points {
            assert!((0.0..=1.0).contains(&p.ratio), "ratio {} out of range", p.ratio);
        }
        let summed: usize = points.iter().map(|p| p.missing).sum();
        assert_eq!(summed, s.missing_count());
        let rows_total: usize = points.iter().map(|p| p.total).sum();
        assert_eq!(rows_total, s.total());
    }
}
