/// Descriptive statistics of one station's valid readings.
///
/// These feed the dashboard views and the chat summary: the total and mean
/// of the channel, its extremes with the month they fell in, the
/// month-of-year profile, and readings more than two standard deviations
/// from the mean.
///
/// Missing readings never participate. Every statistic that is undefined on
/// an empty set is `None` rather than 0.

use crate::analysis::month_start;
use crate::model::{Reading, StationSeries};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

/// Readings further than this many standard deviations from the mean are
/// outliers.
pub const OUTLIER_SIGMAS: f64 = 2.0;

/// A maximum or minimum and the month in which it was first recorded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Extreme {
    #[serde(rename = "valor")]
    pub value: f64,
    #[serde(rename = "mes")]
    pub month_start: NaiveDate,
}

/// Mean of all valid readings falling in one calendar month, across years.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeasonalMean {
    /// 1 = January.
    #[serde(rename = "mes")]
    pub month: u32,
    #[serde(rename = "promedio")]
    pub mean_value: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct StationStats {
    #[serde(rename = "suma")]
    pub sum: f64,
    #[serde(rename = "promedio")]
    pub mean: Option<f64>,
    /// Sample standard deviation; needs two valid readings.
    #[serde(rename = "desviacion")]
    pub std_dev: Option<f64>,
    #[serde(rename = "maximo")]
    pub max: Option<Extreme>,
    #[serde(rename = "minimo")]
    pub min: Option<Extreme>,
    #[serde(rename = "estacionalidad")]
    pub seasonal_means: Vec<SeasonalMean>,
    #[serde(rename = "atipicos")]
    pub outliers: Vec<Outlier>,
}

/// A valid reading outside `mean ± 2σ`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Outlier {
    #[serde(rename = "Fecha")]
    pub date: NaiveDate,
    #[serde(rename = "valor")]
    pub value: f64,
}

fn valid(series: &StationSeries) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
    series
        .readings
        .iter()
        .filter_map(|&Reading { date, value }| value.map(|v| (date, v)))
}

/// First reading (in sheet order) that wins `better` against every other.
fn extreme(series: &StationSeries, better: impl Fn(f64, f64) -> bool) -> Option<Extreme> {
    valid(series)
        .fold(None, |best: Option<(NaiveDate, f64)>, (date, v)| match best {
            Some((_, b)) if !better(v, b) => best,
            _ => Some((date, v)),
        })
        .map(|(date, value)| Extreme {
            value,
            month_start: month_start(date),
        })
}

/// Means per calendar month, January first; months with no valid reading
/// are omitted.
pub fn seasonal_means(series: &StationSeries) -> Vec<SeasonalMean> {
    let mut months: BTreeMap<u32, (f64, usize)> = BTreeMap::new();
    for (date, v) in valid(series) {
        let acc = months.entry(date.month()).or_insert((0.0, 0));
        acc.0 += v;
        acc.1 += 1;
    }
    months
        .into_iter()
        .map(|(month, (sum, n))| SeasonalMean {
            month,
            mean_value: sum / n as f64,
        })
        .collect()
}

/// Valid readings strictly outside `mean ± OUTLIER_SIGMAS · σ`, in sheet
/// order. Empty when σ is undefined.
pub fn sigma_outliers(series: &StationSeries, mean: f64, std_dev: f64) -> Vec<Outlier> {
    let band = OUTLIER_SIGMAS * std_dev;
    valid(series)
        .filter(|&(_, v)| v > mean + band || v < mean - band)
        .map(|(date, value)| Outlier { date, value })
        .collect()
}

pub fn station_stats(series: &StationSeries) -> StationStats {
    let values: Vec<f64> = valid(series).map(|(_, v)| v).collect();
    let n = values.len();
    let sum: f64 = values.iter().sum();
    let mean = (n > 0).then(|| sum / n as f64);
    let std_dev = mean.filter(|_| n > 1).map(|m| {
        let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
        (ss / (n - 1) as f64).sqrt()
    });

    let outliers = match (mean, std_dev) {
        (Some(m), Some(sd)) => sigma_outliers(series, m, sd),
        _ => Vec::new(),
    };

    StationStats {
        sum,
        mean,
        std_dev,
        max: extreme(series, |v, best| v > best),
        min: extreme(series, |v, best| v < best),
        seasonal_means: seasonal_means(series),
        outliers,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
