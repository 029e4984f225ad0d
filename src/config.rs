//! Analysis configuration.
//!
//! Every threshold of the pipeline lives here with its default, so a host can
//! override them from a TOML file without touching code:
//!
//! ```toml
//! stations = ["P42", "P43"]
//! risk_threshold = 0.02
//! anomaly_threshold_pct = 40.0
//!
//! [weather]
//! latitude = -0.481
//! longitude = -78.141
//! timezone = "America/Guayaquil"
//! ```

use crate::model::DATE_COLUMN;
use crate::stations;
use serde::Deserialize;
use std::fmt;
use std::path::Path;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV_VAR: &str = "SENSOR_HEALTH_CONFIG";

// ---------------------------------------------------------------------------
// Configuration types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Stations to analyze, by registry id.
    pub stations: Vec<String>,
    /// Header of the date column in the uploaded sheet.
    pub date_column: String,
    /// Projected monthly gap ratio above which a month is a risk date.
    pub risk_threshold: f64,
    /// Number of months projected past the last observed month.
    pub forecast_horizon_months: u32,
    /// Absolute percent change above which a reading is anomalous.
    pub anomaly_threshold_pct: f64,
    /// Wall-clock budget for one model fit.
    pub forecast_timeout_ms: u64,
    /// How long a session's last report stays available to follow-up queries.
    pub cache_ttl_minutes: i64,
    /// Upper bound on cached sessions; the oldest is evicted first.
    pub cache_max_sessions: usize,
    pub weather: WeatherConfig,
}

/// Location used for the weather backfill lookups.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            stations: stations::all_station_ids().into_iter().map(String::from).collect(),
            date_column: DATE_COLUMN.to_string(),
            risk_threshold: 0.01,
            forecast_horizon_months: 12,
            anomaly_threshold_pct: 50.0,
            forecast_timeout_ms: 5_000,
            cache_ttl_minutes: 60,
            cache_max_sessions: 32,
            weather: WeatherConfig::default(),
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            latitude: -0.481,
            longitude: -78.141,
            timezone: "America/Guayaquil".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    Io(String),
    /// The file is not valid TOML or has fields of the wrong type.
    Parse(String),
    /// The values parsed but are not usable.
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "Config I/O error: {}", msg),
            ConfigError::Parse(msg) => write!(f, "Config parse error: {}", msg),
            ConfigError::Invalid(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Parses and validates a configuration from TOML text. Missing keys take
/// their defaults.
pub fn parse_config(text: &str) -> Result<AnalysisConfig, ConfigError> {
    let config: AnalysisConfig =
        toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
    config.validate()?;
    Ok(config)
}

/// Loads a configuration file.
pub fn load_config(path: impl AsRef<Path>) -> Result<AnalysisConfig, ConfigError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
    parse_config(&text)
}

/// Loads `.env` (if present) and then the file named by
/// `SENSOR_HEALTH_CONFIG`. Falls back to defaults when the variable is unset.
pub fn load_config_from_env() -> Result<AnalysisConfig, ConfigError> {
    dotenv::dotenv().ok();
    match std::env::var(CONFIG_ENV_VAR) {
        Ok(path) if !path.trim().is_empty() => load_config(path.trim()),
        _ => Ok(AnalysisConfig::default()),
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stations.is_empty() {
            return Err(ConfigError::Invalid("station list is empty".to_string()));
        }
        if let Some(unknown) = self.stations.iter().find(|s| !stations::is_known_station(s)) {
            return Err(ConfigError::Invalid(format!("unknown station '{}'", unknown)));
        }
        if self.date_column.trim().is_empty() {
            return Err(ConfigError::Invalid("date_column is empty".to_string()));
        }
        if !self.risk_threshold.is_finite() || self.risk_threshold < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "risk_threshold must be a non-negative number, got {}",
                self.risk_threshold
            )));
        }
        if self.forecast_horizon_months == 0 {
            return Err(ConfigError::Invalid("forecast_horizon_months must be > 0".to_string()));
        }
        if !self.anomaly_threshold_pct.is_finite() || self.anomaly_threshold_pct <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "anomaly_threshold_pct must be > 0, got {}",
                self.anomaly_threshold_pct
            )));
        }
        if self.forecast_timeout_ms == 0 {
            return Err(ConfigError::Invalid("forecast_timeout_ms must be > 0".to_string()));
        }
        if self.cache_ttl_minutes <= 0 || self.cache_max_sessions == 0 {
            return Err(ConfigError::Invalid(
                "cache_ttl_minutes and cache_max_sessions must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
