/// Maintenance recommendations.
///
/// The list is assembled in a fixed order from the station's tier, missing
/// percentage, missing dates, forecast risk dates and anomalies. Nothing
/// else feeds it: the same inputs always give the same lines.
///
///   1. tier header
///   2. missing-data warning (> 30 % with a follow-up action, else > 10 %)
///   3. first missing dates
///   4. nearest forecast risk date
///   5. anomaly count, examples, and a calibration check
///   6. closing line

use crate::model::{AnomalyRecord, HealthTier, ISO_DATE_FORMAT};
use chrono::NaiveDate;

/// Missing percentage above which the strong warning is issued.
pub const HIGH_MISSING_PCT: f64 = 30.0;

/// Missing percentage above which a transmission review is advised.
pub const ELEVATED_MISSING_PCT: f64 = 10.0;

/// Maximum number of dates or anomalies quoted in a line.
pub const MAX_EXAMPLES: usize = 3;

pub const HEADER_CRITICAL: &str =
    "CRITICAL: station requires immediate maintenance.";
pub const HEADER_RISK: &str =
    "RISK: station shows signs of degradation; schedule a preventive inspection.";
pub const HEADER_OK: &str = "OK: station is operating normally; keep the routine maintenance plan.";

pub const HIGH_MISSING_ACTION: &str =
    "Inspect power supply, datalogger and communication link before the next reporting period.";

pub const CALIBRATION_CHECK: &str =
    "Check sensor calibration against a reference instrument.";

pub const CLOSING_LINE: &str = "Log all actions taken in the station maintenance record.";

fn iso(date: &NaiveDate) -> String {
    date.format(ISO_DATE_FORMAT).to_string()
}

fn format_change(pct: f64) -> String {
    if pct.is_infinite() {
        let sign = if pct > 0.0 { "+" } else { "-" };
        format!("{}inf% from a zero reading", sign)
    } else {
        format!("{:+.2}%", pct)
    }
}

/// Header line for a tier.
pub fn tier_header(tier: HealthTier) -> &'static str {
    match tier {
        HealthTier::Critico => HEADER_CRITICAL,
        HealthTier::Riesgo => HEADER_RISK,
        HealthTier::Ok => HEADER_OK,
    }
}

/// Builds the ordered advisory list for one station.
pub fn build_recommendations(
    tier: HealthTier,
    missing_pct: f64,
    missing_dates: &[NaiveDate],
    risk_dates: &[NaiveDate],
    anomalies: &[AnomalyRecord],
) -> Vec<String> {
    let mut lines = vec![tier_header(tier).to_string()];

    if missing_pct > HIGH_MISSING_PCT {
        lines.push(format!(
            "Missing data at {:.2}%: more than 30% of readings are absent.",
            missing_pct
        ));
        lines.push(HIGH_MISSING_ACTION.to_string());
    } else if missing_pct > ELEVATED_MISSING_PCT {
        lines.push(format!(
            "Missing data at {:.2}%: above 10%, review data transmission and storage.",
            missing_pct
        ));
    }

    if !missing_dates.is_empty() {
        let first: Vec<String> = missing_dates.iter().take(MAX_EXAMPLES).map(iso).collect();
        lines.push(format!("First missing dates: {}.", first.join(", ")));
    }

    if let Some(nearest) = risk_dates.iter().min() {
        lines.push(format!(
            "Forecast gap risk: schedule preventive maintenance before {}.",
            iso(nearest)
        ));
    }

    if !anomalies.is_empty() {
        lines.push(format!(
            "{} anomalous jumps detected between consecutive readings.",
            anomalies.len()
        ));
        for anomaly in anomalies.iter().take(MAX_EXAMPLES) {
            lines.push(format!(
                "Anomaly on {}: {}.",
                iso(&anomaly.date),
                format_change(anomaly.percent_change)
            ));
        }
        lines.push(CALIBRATION_CHECK.to_string());
    }

    lines.push(CLOSING_LINE.to_string());
    lines
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
