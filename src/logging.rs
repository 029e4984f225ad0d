/// Structured logging for the sensor health service
///
/// Provides context-rich logging with component and station identifiers,
/// timestamps, and severity levels. Supports both console output
/// and file-based logging for long-running hosts.

use crate::model::AnalysisError;
use chrono::Utc;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Mutex;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline Components
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Normalizer,
    Completeness,
    Forecast,
    Anomaly,
    Pipeline,
    Store,
    Weather,
    System,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Normalizer => write!(f, "NORM"),
            Component::Completeness => write!(f, "GAPS"),
            Component::Forecast => write!(f, "FCST"),
            Component::Anomaly => write!(f, "ANOM"),
            Component::Pipeline => write!(f, "PIPE"),
            Component::Store => write!(f, "STORE"),
            Component::Weather => write!(f, "WX"),
            Component::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Issue Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueKind {
    /// Expected degeneracy - short history, absent column, empty sheet
    Expected,
    /// Unexpected - numerical failure or timeout, worth investigating
    Unexpected,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueKind::Expected => write!(f, "EXPECTED"),
            IssueKind::Unexpected => write!(f, "UNEXPECTED"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// Global logger instance
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file path for logging
    log_file: Option<String>,
    /// Whether to include timestamps in console output
    console_timestamps: bool,
}

impl Logger {
    /// Initialize the global logger
    pub fn init(min_level: LogLevel, log_file: Option<String>, console_timestamps: bool) {
        let logger = Logger {
            min_level,
            log_file,
            console_timestamps,
        };

        if let Ok(mut slot) = LOGGER.lock() {
            *slot = Some(logger);
        }
    }

    fn log(&self, level: LogLevel, component: Component, station_id: Option<&str>, message: &str) {
        if level < self.min_level {
            return;
        }

        let log_entry = format_entry(level, component, station_id, message);
        let station_part = station_id.map(|s| format!(" [{}]", s)).unwrap_or_default();

        // Console output
        if self.console_timestamps {
            match level {
                LogLevel::Error | LogLevel::Warning => eprintln!("{}", log_entry),
                LogLevel::Info | LogLevel::Debug => println!("{}", log_entry),
            }
        } else {
            match level {
                LogLevel::Error => eprintln!("   ✗ {}{}: {}", component, station_part, message),
                LogLevel::Warning => eprintln!("   ⚠ {}{}: {}", component, station_part, message),
                LogLevel::Info => println!("   {}", message),
                LogLevel::Debug => {} // Skip debug in non-timestamp mode
            }
        }

        // File output
        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &log_entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

/// Renders one log line: `<utc timestamp> <LEVEL> <COMPONENT>[ [station]]: message`.
fn format_entry(
    level: LogLevel,
    component: Component,
    station_id: Option<&str>,
    message: &str,
) -> String {
    let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
    let station_part = station_id.map(|s| format!(" [{}]", s)).unwrap_or_default();
    format!("{} {} {}{}: {}", timestamp, level, component, station_part, message)
}

fn emit(level: LogLevel, component: Component, station_id: Option<&str>, message: &str) {
    if let Ok(guard) = LOGGER.lock() {
        if let Some(logger) = guard.as_ref() {
            logger.log(level, component, station_id, message);
        }
    }
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize the global logger
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>, console_timestamps: bool) {
    Logger::init(min_level, log_file.map(String::from), console_timestamps);
}

/// Log a general informational message
pub fn info(component: Component, station_id: Option<&str>, message: &str) {
    emit(LogLevel::Info, component, station_id, message);
}

/// Log a warning message
pub fn warn(component: Component, station_id: Option<&str>, message: &str) {
    emit(LogLevel::Warning, component, station_id, message);
}

/// Log an error message
pub fn error(component: Component, station_id: Option<&str>, message: &str) {
    emit(LogLevel::Error, component, station_id, message);
}

/// Log a debug message
pub fn debug(component: Component, station_id: Option<&str>, message: &str) {
    emit(LogLevel::Debug, component, station_id, message);
}

// ---------------------------------------------------------------------------
// Station Issue Logging
// ---------------------------------------------------------------------------

/// Classify a contained per-station issue.
pub fn classify_issue(err: &AnalysisError) -> IssueKind {
    match err {
        AnalysisError::StationNotPresent(_) | AnalysisError::EmptyStation(_) => IssueKind::Expected,
        AnalysisError::ForecastUnavailable(reason) => {
            let failed = ["timed out", "fit error", "predict error", "non-finite"]
                .iter()
                .any(|marker| reason.contains(marker));
            if failed {
                IssueKind::Unexpected
            } else {
                IssueKind::Expected
            }
        }
        AnalysisError::MalformedInput(_) => IssueKind::Unexpected,
    }
}

/// Log a contained station issue with automatic classification
pub fn log_station_issue(
    component: Component,
    station_id: &str,
    operation: &str,
    err: &AnalysisError,
) {
    let kind = classify_issue(err);
    let message = format!("{} [{}]: {}", operation, kind, err);

    match kind {
        IssueKind::Expected => warn(component, Some(station_id), &message),
        IssueKind::Unexpected => error(component, Some(station_id), &message),
    }
}

// ---------------------------------------------------------------------------
// Run Summary Logging
// ---------------------------------------------------------------------------

/// Log a summary of an analysis run
pub fn log_run_summary(requested: usize, analyzed: usize, alerts: usize) {
    let message = format!(
        "Analysis complete: {}/{} stations analyzed, {} in alert",
        analyzed, requested, alerts
    );

    if analyzed == requested {
        info(Component::Pipeline, None, &message);
    } else if analyzed == 0 {
        error(Component::Pipeline, None, &message);
    } else {
        warn(Component::Pipeline, None, &message);
    }
}

/// Log a summary of weather backfill lookups
pub fn log_backfill_summary(total: usize, successful: usize, failed: usize) {
    let message = format!(
        "Backfill complete: {}/{} successful, {} failed",
        successful, total, failed
    );

    if failed == 0 {
        info(Component::Weather, None, &message);
    } else if successful == 0 {
        error(Component::Weather, None, &message);
    } else {
        warn(Component::Weather, None, &message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warning);
        assert!(LogLevel::Warning < LogLevel::Error);
    }

    #[test]
    fn test_issue_classification() {
        let absent = AnalysisError::StationNotPresent("P55".to_string());
        assert_eq!(classify_issue(&absent), IssueKind::Expected);

        let short =
            AnalysisError::ForecastUnavailable("need at least 3 monthly points, got 2".to_string());
        assert_eq!(classify_issue(&short), IssueKind::Expected);

        let timeout =
            AnalysisError::ForecastUnavailable("model fit timed out after 5000 ms".to_string());
        assert_eq!(classify_issue(&timeout), IssueKind::Unexpected);

        let diverged =
            AnalysisError::ForecastUnavailable("MSTL fit error: no model found".to_string());
        assert_eq!(classify_issue(&diverged), IssueKind::Unexpected);
    }

    #[test]
    fn test_entry_carries_component_and_station() {
        let entry =
            format_entry(LogLevel::Warning, Component::Forecast, Some("P42"), "no forecast");
        assert!(entry.contains("WARN FCST [P42]: no forecast"), "got '{}'", entry);

        let entry = format_entry(LogLevel::Info, Component::Pipeline, None, "done");
        assert!(entry.ends_with("INFO PIPE: done"), "got '{}'", entry);
    }
}
