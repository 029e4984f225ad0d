/// Plain-text summaries of analysis results for the chat collaborator.
///
/// The summarizer reads only the public fields of `StationAnalysis` that
/// are part of the serialized contract, so the question-answering layer stays
/// decoupled from how the pipeline computes them.

use crate::analysis::stats::Extreme;
use crate::model::{AnalysisReport, ISO_DATE_FORMAT, StationAnalysis};
use crate::stations;
use chrono::NaiveDate;
use std::fmt::{self, Write};

/// Dates quoted per list before the remainder is elided.
const MAX_LISTED_DATES: usize = 5;

fn date_list(dates: &[NaiveDate]) -> String {
    if dates.is_empty() {
        return "none".to_string();
    }
    let shown: Vec<String> = dates
        .iter()
        .take(MAX_LISTED_DATES)
        .map(|d| d.format(ISO_DATE_FORMAT).to_string())
        .collect();
    let rest = dates.len().saturating_sub(MAX_LISTED_DATES);
    if rest > 0 {
        format!("{} (+{} more)", shown.join(", "), rest)
    } else {
        shown.join(", ")
    }
}

fn month_name(month: u32) -> &'static str {
    const NAMES: [&str; 12] = [
        "January", "February", "March", "April", "May", "June", "July", "August", "September",
        "October", "November", "December",
    ];
    NAMES.get(month.saturating_sub(1) as usize).copied().unwrap_or("?")
}

fn number(value: Option<f64>) -> String {
    value.map_or_else(|| "no data".to_string(), |v| format!("{:.2}", v))
}

fn extreme(value: Option<Extreme>) -> String {
    value.map_or_else(
        || "no data".to_string(),
        |e| format!("{:.2} in {}", e.value, e.month_start.format("%Y-%m")),
    )
}

fn write_station(out: &mut String, station_id: &str, analysis: &StationAnalysis) -> fmt::Result {
    match stations::find_station(station_id) {
        Some(s) => writeln!(
            out,
            "Station {} ({}, {} in {})",
            station_id, s.name, s.variable, s.unit
        )?,
        None => writeln!(out, "Station {}", station_id)?,
    }
    writeln!(out, "- Total readings: {}", analysis.total)?;
    writeln!(
        out,
        "- Missing readings: {} ({:.2}%)",
        analysis.missing_count, analysis.missing_pct
    )?;
    writeln!(
        out,
        "- Health tier: {}{}",
        analysis.health_tier,
        if analysis.alert { " (ALERT)" } else { "" }
    )?;
    writeln!(out, "- Missing dates: {}", date_list(&analysis.missing_dates))?;
    writeln!(
        out,
        "- Forecast gap-risk dates: {}",
        date_list(&analysis.forecasted_risk_dates)
    )?;
    writeln!(out, "- Anomalies: {}", analysis.anomalies.len())?;
    writeln!(out, "- Months covered: {}", analysis.monthly_aggregates.len())?;

    let stats = &analysis.stats;
    writeln!(out, "- Sum: {:.2}", stats.sum)?;
    writeln!(out, "- Mean: {}", number(stats.mean))?;
    writeln!(out, "- Maximum: {}", extreme(stats.max))?;
    writeln!(out, "- Minimum: {}", extreme(stats.min))?;
    let wettest = stats
        .seasonal_means
        .iter()
        .max_by(|a, b| a.mean_value.total_cmp(&b.mean_value));
    if let Some(peak) = wettest {
        writeln!(
            out,
            "- Highest monthly mean: {} ({:.2})",
            month_name(peak.month),
            peak.mean_value
        )?;
    }
    writeln!(out, "- Readings beyond 2 standard deviations: {}", stats.outliers.len())?;

    writeln!(out, "- Recommendations:")?;
    for line in &analysis.recommendations {
        writeln!(out, "  * {}", line)?;
    }
    Ok(())
}

/// One text block describing a station's analysis.
pub fn summarize_station(station_id: &str, analysis: &StationAnalysis) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_station(&mut out, station_id, analysis);
    out
}

/// Text blocks for every analyzed station, followed by the run warnings.
pub fn summarize_report(report: &AnalysisReport) -> String {
    if report.stations.is_empty() && report.warnings.is_empty() {
        return "No stations were analyzed.\n".to_string();
    }

    let mut blocks: Vec<String> = report
        .stations
        .iter()
        .map(|(id, analysis)| summarize_station(id, analysis))
        .collect();

    if !report.warnings.is_empty() {
        let mut warnings = String::from("Warnings:\n");
        for w in &report.warnings {
            warnings.push_str(&format!("- {}\n", w));
        }
        blocks.push(warnings);
    }
    blocks.join("\n")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
