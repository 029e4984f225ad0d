/// Reading, GapRatioPoint, AnomalyRecord, MonthlyAggregate, StationAnalysis,
/// AnalysisError: the shared domain model imported by all other modules.
///
/// This module contains no analysis logic and no I/O, only types. The
/// serialized field names of `StationAnalysis` are the contract with the
/// reporting layer and the chat summarizer; renaming a Rust field must
/// never change its `serde` name.

use crate::analysis::stats::StationStats;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Column and date conventions
// ---------------------------------------------------------------------------

/// Name of the date column in the uploaded sheet.
pub const DATE_COLUMN: &str = "Fecha";

/// Output format for every date handed to the reporting layer.
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

// ---------------------------------------------------------------------------
// Reading types
// ---------------------------------------------------------------------------

/// A single row of one station's channel.
///
/// `value` is `None` when the sheet cell was empty or not numeric. Rows keep
/// upload order; duplicate dates are legal and are processed as separate rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

/// All rows of one station column, in upload order.
#[derive(Debug, Clone, PartialEq)]
pub struct StationSeries {
    pub station_id: String,
    pub readings: Vec<Reading>,
}

impl StationSeries {
    pub fn total(&self) -> usize {
        self.readings.len()
    }

    pub fn missing_count(&self) -> usize {
        self.readings.iter().filter(|r| r.value.is_none()).count()
    }
}

// ---------------------------------------------------------------------------
// Derived series
// ---------------------------------------------------------------------------

/// Share of missing rows within one calendar month.
///
/// Only built for months that have at least one row, so `total > 0` and
/// `ratio` is always within [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct GapRatioPoint {
    pub month_start: NaiveDate,
    pub missing: usize,
    pub total: usize,
    pub ratio: f64,
}

/// A jump between two consecutive valid readings of one station.
///
/// `percent_change` is infinite when the previous valid value was zero and
/// the current one is not; `serde_json` writes that as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyRecord {
    #[serde(rename = "Fecha_str")]
    pub date: NaiveDate,
    #[serde(rename = "variacion")]
    pub percent_change: f64,
}

/// Per-month rollup of one station.
///
/// `mean_value` is `None` when every row of the month is missing: the mean
/// of an empty set is reported as "no data", never as 0.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyAggregate {
    #[serde(rename = "mes")]
    pub month_start: NaiveDate,
    pub total: usize,
    #[serde(rename = "faltantes")]
    pub missing: usize,
    #[serde(rename = "promedio")]
    pub mean_value: Option<f64>,
    #[serde(rename = "porcentaje_faltantes")]
    pub missing_pct: f64,
}

// ---------------------------------------------------------------------------
// Health tiers and results
// ---------------------------------------------------------------------------

/// Operational health tier, in ascending order of severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthTier {
    Ok,
    Riesgo,
    Critico,
}

impl HealthTier {
    /// `true` for every tier that should raise an alert.
    pub fn is_alert(self) -> bool {
        matches!(self, HealthTier::Riesgo | HealthTier::Critico)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HealthTier::Ok => "ok",
            HealthTier::Riesgo => "riesgo",
            HealthTier::Critico => "critico",
        }
    }
}

impl std::fmt::Display for HealthTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full health analysis of one station for one upload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationAnalysis {
    pub total: usize,
    #[serde(rename = "faltantes")]
    pub missing_count: usize,
    #[serde(rename = "porcentaje")]
    pub missing_pct: f64,
    #[serde(rename = "fechas_faltantes")]
    pub missing_dates: Vec<NaiveDate>,
    #[serde(rename = "fechas_mantenimiento")]
    pub forecasted_risk_dates: Vec<NaiveDate>,
    #[serde(rename = "fechas_anomalias")]
    pub anomalies: Vec<AnomalyRecord>,
    #[serde(rename = "estado")]
    pub health_tier: HealthTier,
    #[serde(rename = "alerta")]
    pub alert: bool,
    #[serde(rename = "reporte_mensual")]
    pub monthly_aggregates: Vec<MonthlyAggregate>,
    #[serde(rename = "estadisticas")]
    pub stats: StationStats,
    #[serde(rename = "recomendaciones")]
    pub recommendations: Vec<String>,
}

/// Result of one analysis run over an uploaded table.
///
/// `stations` only holds stations whose column was present; every requested
/// station that was absent produces one entry in `warnings` instead.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct AnalysisReport {
    #[serde(rename = "resultados")]
    pub stations: BTreeMap<String, StationAnalysis>,
    #[serde(rename = "advertencias")]
    pub warnings: Vec<String>,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors and contained degeneracies of an analysis run.
///
/// Only `MalformedInput` aborts a run. The other variants are produced per
/// station or per series and are folded into that station's result.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// The date column is missing or a date cell could not be parsed.
    MalformedInput(String),
    /// A requested station has no column in the uploaded table.
    StationNotPresent(String),
    /// A station column exists but the table has no rows, so its
    /// percentages are undefined.
    EmptyStation(String),
    /// The gap-risk model could not be fit (too few points, numerical
    /// failure, or timeout).
    ForecastUnavailable(String),
}

impl std::fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisError::MalformedInput(msg) => write!(f, "Malformed input: {}", msg),
            AnalysisError::StationNotPresent(station) => {
                write!(f, "Station not present in table: {}", station)
            }
            AnalysisError::EmptyStation(station) => {
                write!(f, "Station has no rows: {}", station)
            }
            AnalysisError::ForecastUnavailable(reason) => {
                write!(f, "Forecast unavailable: {}", reason)
            }
        }
    }
}

impl std::error::Error for AnalysisError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_health_tier_ordering_and_alert_flag() {
        assert!(HealthTier::Ok < HealthTier::Riesgo);
        assert!(HealthTier::Riesgo < HealthTier::Critico);
        assert!(!HealthTier::Ok.is_alert());
        assert!(HealthTier::Riesgo.is_alert());
        assert!(HealthTier::Critico.is_alert());
    }

    #[test]
    fn test_station_series_counts_missing_rows() {
        let series = StationSeries {
            station_id: "P42".to_string(),
            readings: vec![
                Reading { date: day(2024, 1, 1), value: Some(1.0) },
                Reading { date: day(2024, 1, 2), value: None },
                Reading { date: day(2024, 1, 2), value: None },
            ],
        };
        assert_eq!(series.total(), 3);
        assert_eq!(series.missing_count(), 2);
    }

    #[test]
    fn test_anomaly_record_serializes_with_report_keys() {
        let record = AnomalyRecord { date: day(2024, 3, 5), percent_change: 60.0 };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["Fecha_str"], "2024-03-05");
        assert_eq!(json["variacion"], 60.0);
    }

    #[test]
    fn test_infinite_percent_change_serializes_as_null() {
        let record = AnomalyRecord { date: day(2024, 3, 5), percent_change: f64::INFINITY };
        let json = serde_json::to_value(&record).unwrap();
        assert!(json["variacion"].is_null());
    }

    #[test]
    fn test_monthly_aggregate_without_data_serializes_null_mean() {
        let row = MonthlyAggregate {
            month_start: day(2024, 2, 1),
            total: 2,
            missing: 2,
            mean_value: None,
            missing_pct: 100.0,
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["mes"], "2024-02-01");
        assert!(json["promedio"].is_null());
        assert_eq!(json["porcentaje_faltantes"], 100.0);
    }

    #[test]
    fn test_station_analysis_uses_stable_field_names() {
        let analysis = StationAnalysis {
            total: 1,
            missing_count: 0,
            missing_pct: 0.0,
            missing_dates: vec![],
            forecasted_risk_dates: vec![day(2025, 1, 31)],
            anomalies: vec![],
            health_tier: HealthTier::Ok,
            alert: false,
            monthly_aggregates: vec![],
            stats: StationStats::default(),
            recommendations: vec!["x".to_string()],
        };
        let json = serde_json::to_value(&analysis).unwrap();
        for key in [
            "total",
            "faltantes",
            "porcentaje",
            "fechas_faltantes",
            "fechas_mantenimiento",
            "fechas_anomalias",
            "estado",
            "alerta",
            "reporte_mensual",
            "estadisticas",
            "recomendaciones",
        ] {
            assert!(json.get(key).is_some(), "missing key '{}'", key);
        }
        assert_eq!(json["estado"], "ok");
        assert_eq!(json["fechas_mantenimiento"][0], "2025-01-31");
    }

    #[test]
    fn test_error_display_messages() {
        assert_eq!(
            AnalysisError::StationNotPresent("P55".to_string()).to_string(),
            "Station not present in table: P55"
        );
        assert!(AnalysisError::MalformedInput("no Fecha".to_string())
            .to_string()
            .contains("no Fecha"));
    }
}
