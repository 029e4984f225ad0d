/// Sensor health analysis pipeline.
///
/// Runs the normalizer once, then for every configured station present in
/// the table: completeness → gap-ratio series → gap-risk forecast,
/// anomaly detection, monthly rollup, and finally tier classification and
/// recommendations.
///
/// Error containment:
/// - a malformed table aborts the whole run;
/// - an absent station column is a warning and the station is omitted;
/// - an empty station column yields an explicit zero result;
/// - a failed or timed-out forecast yields no risk dates.
///
/// # Clock injection
/// `today` is a parameter rather than `Local::now()`, so a run over the same
/// table on the same day is reproducible bit for bit.

use crate::alert::health::{self, HealthSignals};
use crate::alert::recommendations::build_recommendations;
use crate::analysis::anomalies::detect_anomalies;
use crate::analysis::completeness::{Completeness, analyze_completeness};
use crate::analysis::forecast::{
    Forecaster, RiskForecastParams, SeasonalTrendForecaster, forecast_risk_dates,
};
use crate::analysis::gap_series::build_gap_series;
use crate::analysis::monthly::monthly_report;
use crate::analysis::stats::station_stats;
use crate::config::AnalysisConfig;
use crate::ingest::table::{RawTable, ReadingsTable, normalize};
use crate::logging::{self, Component};
use crate::model::{AnalysisError, AnalysisReport, StationAnalysis, StationSeries};
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;

pub struct Pipeline {
    config: AnalysisConfig,
    forecaster: Arc<dyn Forecaster>,
}

impl Pipeline {
    /// Pipeline with the default seasonal trend forecaster.
    pub fn new(config: AnalysisConfig) -> Self {
        Self::with_forecaster(config, Arc::new(SeasonalTrendForecaster::default()))
    }

    pub fn with_forecaster(config: AnalysisConfig, forecaster: Arc<dyn Forecaster>) -> Self {
        Self { config, forecaster }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Normalizes `raw` and analyzes it. Only a malformed table is an error.
    pub fn analyze_raw(
        &self,
        raw: &RawTable,
        today: NaiveDate,
    ) -> Result<AnalysisReport, AnalysisError> {
        let table = normalize(raw, &self.config.date_column).inspect_err(|e| {
            logging::error(Component::Normalizer, None, &e.to_string());
        })?;
        Ok(self.analyze_table(&table, today))
    }

    /// Analyzes every configured station that has a column in `table`.
    pub fn analyze_table(&self, table: &ReadingsTable, today: NaiveDate) -> AnalysisReport {
        let mut report = AnalysisReport::default();

        for station_id in &self.config.stations {
            let Some(series) = table.station_series(station_id) else {
                let issue = AnalysisError::StationNotPresent(station_id.clone());
                logging::log_station_issue(
                    Component::Pipeline,
                    station_id,
                    "column lookup",
                    &issue,
                );
                report.warnings.push(issue.to_string());
                continue;
            };

            if series.total() == 0 {
                report
                    .warnings
                    .push(AnalysisError::EmptyStation(station_id.clone()).to_string());
            }

            let analysis = self.analyze_station(&series, today);
            report.stations.insert(station_id.clone(), analysis);
        }

        let alerts = report.stations.values().filter(|a| a.alert).count();
        logging::log_run_summary(self.config.stations.len(), report.stations.len(), alerts);
        report
    }

    /// Runs every analysis step over one station column.
    pub fn analyze_station(&self, series: &StationSeries, today: NaiveDate) -> StationAnalysis {
        let station_id = series.station_id.as_str();

        let completeness = analyze_completeness(series).unwrap_or_else(|e| {
            logging::log_station_issue(
                Component::Completeness,
                station_id,
                "missing percentage",
                &e,
            );
            Completeness {
                total: 0,
                missing_count: 0,
                missing_pct: 0.0,
                missing_dates: Vec::new(),
            }
        });

        let gap_series = build_gap_series(series);
        let params = RiskForecastParams {
            risk_threshold: self.config.risk_threshold,
            horizon_months: self.config.forecast_horizon_months,
            timeout: Duration::from_millis(self.config.forecast_timeout_ms),
        };
        let risk_dates =
            forecast_risk_dates(Arc::clone(&self.forecaster), &gap_series, params, today)
                .unwrap_or_else(|e| {
                    logging::log_station_issue(
                        Component::Forecast,
                        station_id,
                        "gap-risk forecast",
                        &e,
                    );
                    Vec::new()
                });

        let anomalies = detect_anomalies(series, self.config.anomaly_threshold_pct);
        if !anomalies.is_empty() {
            logging::debug(
                Component::Anomaly,
                Some(station_id),
                &format!("{} anomalous readings", anomalies.len()),
            );
        }

        let monthly_aggregates = monthly_report(series);
        let stats = station_stats(series);

        let signals = HealthSignals {
            missing_pct: completeness.missing_pct,
            missing_count: completeness.missing_count,
            anomaly_count: anomalies.len(),
            forecast_risk_count: risk_dates.len(),
        };
        let health_tier = health::classify(&signals);
        let recommendations = build_recommendations(
            health_tier,
            completeness.missing_pct,
            &completeness.missing_dates,
            &risk_dates,
            &anomalies,
        );

        StationAnalysis {
            total: completeness.total,
            missing_count: completeness.missing_count,
            missing_pct: completeness.missing_pct,
            missing_dates: completeness.missing_dates,
            forecasted_risk_dates: risk_dates,
            anomalies,
            health_tier,
            alert: health_tier.is_alert(),
            monthly_aggregates,
            stats,
            recommendations,
        }
    }
}

/// Convenience wrapper: analyzes `table` with the default forecaster.
pub fn analyze_table(
    table: &ReadingsTable,
    config: &AnalysisConfig,
    today: NaiveDate,
) -> AnalysisReport {
    Pipeline::new(config.clone()).analyze_table(table, today)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
