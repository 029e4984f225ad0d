/// End-to-end scenarios over the full analysis pipeline.
///
/// Every test builds a sheet in memory (or from CSV text), runs the whole
/// pipeline with a fixed `today`, and checks the serialized station result.
///
/// Run with: cargo test --test pipeline_scenarios

use chrono::NaiveDate;
use sensor_health::analysis::forecast::{FittedModel, Forecaster};
use sensor_health::config::AnalysisConfig;
use sensor_health::ingest::csv_table::read_raw_table;
use sensor_health::ingest::table::{RawCell, RawTable};
use sensor_health::model::{AnalysisError, GapRatioPoint, HealthTier};
use sensor_health::pipeline::Pipeline;
use sensor_health::store::{ResultStore, SessionId};
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
}

fn p42_only() -> AnalysisConfig {
    AnalysisConfig {
        stations: vec!["P42".to_string()],
        ..AnalysisConfig::default()
    }
}

/// Daily rows for P42 starting 2024-01-01.
fn daily_sheet(values: &[Option<f64>]) -> RawTable {
    RawTable {
        headers: vec!["Fecha".to_string(), "P42".to_string()],
        rows: values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let date = format!("2024-01-{:02}", i + 1);
                vec![RawCell::from(date.as_str()), RawCell::from(*v)]
            })
            .collect(),
    }
}

/// Ten daily readings of 5.0 with the given 0-based rows missing.
fn ten_days_missing(missing: &[usize]) -> RawTable {
    let values: Vec<Option<f64>> = (0..10)
        .map(|i| (!missing.contains(&i)).then_some(5.0))
        .collect();
    daily_sheet(&values)
}

/// Four readings a month through 2025: one missing per month until
/// August, three missing per month from September on.
fn worsening_year() -> RawTable {
    let mut rows = Vec::new();
    for month in 1..=12u32 {
        let missing = if month <= 8 { 1 } else { 3 };
        for (slot, day) in [1u32, 8, 15, 22].into_iter().enumerate() {
            let value = if slot >= 4 - missing {
                RawCell::Empty
            } else {
                RawCell::Number(5.0)
            };
            let date = format!("2025-{:02}-{:02}", month, day);
            rows.push(vec![RawCell::from(date.as_str()), value]);
        }
    }
    RawTable {
        headers: vec!["Fecha".to_string(), "P42".to_string()],
        rows,
    }
}

struct FailingForecaster;

impl Forecaster for FailingForecaster {
    fn fit(&self, _series: &[GapRatioPoint]) -> Result<Box<dyn FittedModel>, AnalysisError> {
        Err(AnalysisError::ForecastUnavailable("ETS fit error: disabled".to_string()))
    }
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn test_forty_percent_missing_is_critical() {
    let sheet = ten_days_missing(&[1, 3, 5, 7]);
    let report = Pipeline::new(p42_only()).analyze_raw(&sheet, today()).unwrap();
    let p42 = &report.stations["P42"];

    assert_eq!(p42.total, 10);
    assert_eq!(p42.missing_count, 4);
    assert_eq!(p42.missing_pct, 40.0);
    assert_eq!(p42.health_tier, HealthTier::Critico);
    assert!(p42.alert);
    assert!(p42.recommendations[0].starts_with("CRITICAL"));
    assert!(p42.recommendations.iter().any(|l| l.contains("more than 30%")));
    assert_eq!(
        p42.recommendations.last().map(String::as_str),
        Some("Log all actions taken in the station maintenance record.")
    );
}

#[test]
fn test_sixty_percent_jump_is_risk_via_anomaly() {
    let mut values = vec![Some(16.0); 10];
    values[0] = Some(10.0);
    let sheet = daily_sheet(&values);
    let report = Pipeline::new(p42_only()).analyze_raw(&sheet, today()).unwrap();
    let p42 = &report.stations["P42"];

    assert_eq!(p42.missing_count, 0);
    assert_eq!(p42.anomalies.len(), 1);
    assert!((p42.anomalies[0].percent_change - 60.0).abs() < 1e-9);
    assert_eq!(p42.health_tier, HealthTier::Riesgo);
    assert!(p42.alert);
}

#[test]
fn test_absent_station_is_omitted_without_affecting_others() {
    let sheet = RawTable {
        headers: vec!["Fecha".to_string(), "P42".to_string(), "P55".to_string()],
        rows: vec![
            vec!["2024-01-01".into(), 1.0.into(), 2.0.into()],
            vec!["2024-01-02".into(), 1.0.into(), 2.0.into()],
        ],
    };
    let report = Pipeline::new(AnalysisConfig::default())
        .analyze_raw(&sheet, today())
        .unwrap();

    assert!(!report.stations.contains_key("P43"));
    assert_eq!(report.stations.len(), 2);
    assert_eq!(report.stations["P55"].health_tier, HealthTier::Ok);
    assert_eq!(report.warnings, vec!["Station not present in table: P43".to_string()]);
}

#[test]
fn test_serialized_result_uses_report_keys() {
    let sheet = ten_days_missing(&[1, 3, 5, 7]);
    let report = Pipeline::new(p42_only()).analyze_raw(&sheet, today()).unwrap();
    let json = serde_json::to_value(&report).unwrap();
    let p42 = &json["resultados"]["P42"];

    assert_eq!(p42["total"], 10);
    assert_eq!(p42["faltantes"], 4);
    assert_eq!(p42["porcentaje"], 40.0);
    assert_eq!(p42["estado"], "critico");
    assert_eq!(p42["alerta"], true);
    assert_eq!(p42["fechas_faltantes"][0], "2024-01-02");
    assert!(p42["fechas_mantenimiento"].as_array().unwrap().is_empty());
    assert_eq!(p42["reporte_mensual"][0]["faltantes"], 4);
    assert!(p42["recomendaciones"].is_array());
}

#[test]
fn test_recent_gaps_schedule_maintenance_without_changing_the_tier() {
    let sheet = worsening_year();
    let today = NaiveDate::from_ymd_opt(2025, 12, 10).unwrap();

    let with_forecast = Pipeline::new(p42_only()).analyze_raw(&sheet, today).unwrap();
    let without_forecast = Pipeline::with_forecaster(p42_only(), Arc::new(FailingForecaster))
        .analyze_raw(&sheet, today)
        .unwrap();
    let forecast = &with_forecast.stations["P42"];
    let baseline = &without_forecast.stations["P42"];

    assert!(!forecast.forecasted_risk_dates.is_empty());
    assert!(forecast.forecasted_risk_dates.iter().all(|d| *d > today));
    assert!(forecast.recommendations.iter().any(|l| l.starts_with("Forecast gap risk")));
    assert!(baseline.forecasted_risk_dates.is_empty());
    assert!(!baseline.recommendations.iter().any(|l| l.starts_with("Forecast gap risk")));
    assert_eq!(forecast.health_tier, baseline.health_tier);
    assert_eq!(forecast.alert, baseline.alert);

    let json = serde_json::to_value(&with_forecast).unwrap();
    assert!(!json["resultados"]["P42"]["fechas_mantenimiento"].as_array().unwrap().is_empty());
}

#[test]
fn test_station_statistics_are_reported() {
    let sheet = daily_sheet(&[Some(2.0), None, Some(8.0), Some(5.0)]);
    let report = Pipeline::new(p42_only()).analyze_raw(&sheet, today()).unwrap();
    let stats = &report.stations["P42"].stats;
    assert_eq!(stats.sum, 15.0);
    assert_eq!(stats.mean, Some(5.0));
    assert_eq!(stats.max.map(|e| e.value), Some(8.0));
    assert_eq!(stats.min.map(|e| e.value), Some(2.0));

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["resultados"]["P42"]["estadisticas"]["suma"], 15.0);
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

#[test]
fn test_two_runs_over_the_same_sheet_are_identical() {
    let mut rows = Vec::new();
    for month in 1..=12u32 {
        for day in [1u32, 10, 20] {
            let value = if (month + day) % 4 == 0 {
                RawCell::Empty
            } else {
                RawCell::Number(f64::from(day))
            };
            rows.push(vec![format!("2023-{:02}-{:02}", month, day).as_str().into(), value]);
        }
    }
    let sheet = RawTable {
        headers: vec!["Fecha".to_string(), "P42".to_string()],
        rows,
    };
    let pipeline = Pipeline::new(p42_only());
    let first = serde_json::to_string(&pipeline.analyze_raw(&sheet, today()).unwrap()).unwrap();
    let second = serde_json::to_string(&pipeline.analyze_raw(&sheet, today()).unwrap()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_row_order_does_not_change_anomalies() {
    let ordered = daily_sheet(&[
        Some(10.0),
        Some(30.0),
        None,
        Some(12.0),
        Some(12.5),
        Some(0.0),
        Some(4.0),
        None,
        Some(4.1),
        Some(9.0),
    ]);
    let mut shuffled = ordered.clone();
    shuffled.rows.reverse();
    shuffled.rows.swap(2, 7);
    shuffled.rows.swap(0, 4);

    let pipeline = Pipeline::new(p42_only());
    let a = pipeline.analyze_raw(&ordered, today()).unwrap();
    let b = pipeline.analyze_raw(&shuffled, today()).unwrap();
    assert_eq!(a.stations["P42"].anomalies, b.stations["P42"].anomalies);
    assert!(!a.stations["P42"].anomalies.is_empty());
}

#[test]
fn test_invariants_hold_for_every_station() {
    let sheet = RawTable {
        headers: ["Fecha", "P42", "P43", "P55"].map(String::from).to_vec(),
        rows: (1..=28u32)
            .map(|d| {
                let date = format!("2024-02-{:02}", d);
                vec![
                    date.as_str().into(),
                    if d % 3 == 0 { RawCell::Empty } else { 1.0.into() },
                    if d % 7 == 0 { RawCell::Empty } else { 2.0.into() },
                    RawCell::Empty,
                ]
            })
            .collect(),
    };
    let report = Pipeline::new(AnalysisConfig::default())
        .analyze_raw(&sheet, today())
        .unwrap();

    for analysis in report.stations.values() {
        assert_eq!(analysis.missing_dates.len(), analysis.missing_count);
        assert!((0.0..=100.0).contains(&analysis.missing_pct));
        let monthly_missing: usize = analysis.monthly_aggregates.iter().map(|m| m.missing).sum();
        assert_eq!(monthly_missing, analysis.missing_count);
    }
    assert_eq!(report.stations["P55"].missing_pct, 100.0);
}

// ---------------------------------------------------------------------------
// CSV input and session store
// ---------------------------------------------------------------------------

#[test]
fn test_csv_export_runs_through_the_pipeline() {
    let csv = " Fecha ,P42,P43\n\
               01/03/2024,\"1,5\",2\n\
               02/03/2024,,2\n\
               03/03/2024,1.5,NaN\n";
    let raw = read_raw_table(csv.as_bytes()).unwrap();
    let report = Pipeline::new(AnalysisConfig::default())
        .analyze_raw(&raw, today())
        .unwrap();

    assert_eq!(report.stations["P42"].missing_count, 1);
    assert_eq!(
        report.stations["P42"].missing_dates,
        vec![NaiveDate::from_ymd_opt(2024, 3, 2).unwrap()]
    );
    assert_eq!(report.stations["P43"].missing_count, 1);
}

#[test]
fn test_follow_up_context_comes_from_the_callers_session() {
    let pipeline = Pipeline::new(p42_only());
    let store = ResultStore::from_config(pipeline.config());

    let critical = ten_days_missing(&[1, 3, 5, 7]);
    let healthy = ten_days_missing(&[]);

    let alice = SessionId::from("alice");
    let bob = SessionId::from("bob");
    store.put(&alice, pipeline.analyze_raw(&critical, today()).unwrap());
    store.put(&bob, pipeline.analyze_raw(&healthy, today()).unwrap());

    assert_eq!(store.get(&alice).unwrap().stations["P42"].health_tier, HealthTier::Critico);
    assert_eq!(store.get(&bob).unwrap().stations["P42"].health_tier, HealthTier::Ok);
}
