/// Monthly aggregate reporter: per-month row count, missing count, mean of
/// the present values and missing percentage for one station.

use crate::analysis::month_start;
use crate::model::{MonthlyAggregate, StationSeries};
use chrono::NaiveDate;
use std::collections::BTreeMap;

#[derive(Default)]
struct MonthAcc {
    total: usize,
    missing: usize,
    sum: f64,
}

/// One row per calendar month present in the column, ascending.
pub fn monthly_report(series: &StationSeries) -> Vec<MonthlyAggregate> {
    let mut months: BTreeMap<NaiveDate, MonthAcc> = BTreeMap::new();
    for reading in &series.readings {
        let acc = months.entry(month_start(reading.date)).or_default();
        acc.total += 1;
        match reading.value {
            Some(v) => acc.sum += v,
            None => acc.missing += 1,
        }
    }

    months
        .into_iter()
        .map(|(month, acc)| {
            let present = acc.total - acc.missing;
            // Mean of an empty set is "no data", not 0.
            let mean_value = (present > 0).then(|| acc.sum / present as f64);
            MonthlyAggregate {
                month_start: month,
                total: acc.total,
                missing: acc.missing,
                mean_value,
                missing_pct: 100.0 * acc.missing as f64 / acc.total as f64,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
