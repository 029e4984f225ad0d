/// Open-Meteo Historical Weather API client
///
/// Backfills weather context for every date on which a station reading is
/// missing, so a maintenance crew can tell a storm-related outage from a
/// silent sensor failure.
///
/// API Documentation: https://open-meteo.com/en/docs/historical-weather-api
/// Archive endpoint: https://archive-api.open-meteo.com/v1/archive

use crate::config::WeatherConfig;
use crate::ingest::table::ReadingsTable;
use crate::logging::{self, Component};
use crate::model::ISO_DATE_FORMAT;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

const OPEN_METEO_ARCHIVE_URL: &str = "https://archive-api.open-meteo.com/v1/archive";

const DAILY_VARIABLES: &str = "precipitation_sum,windspeed_10m_max,temperature_2m_max";

const REQUEST_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// Archive API Response Structures
// ============================================================================

#[derive(Debug, Deserialize)]
struct ArchiveResponse {
    daily: Option<ArchiveDaily>,
}

#[derive(Debug, Deserialize)]
struct ArchiveDaily {
    #[serde(default)]
    time: Vec<String>,
    #[serde(default)]
    precipitation_sum: Vec<Option<f64>>,
    #[serde(default)]
    windspeed_10m_max: Vec<Option<f64>>,
    #[serde(default)]
    temperature_2m_max: Vec<Option<f64>>,
}

/// Daily weather at the configured location. Every field is absent when the
/// lookup failed.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DailyWeather {
    #[serde(rename = "precipitacion_mm")]
    pub precipitation_mm: Option<f64>,
    #[serde(rename = "viento_max_kmh")]
    pub wind_max_kmh: Option<f64>,
    #[serde(rename = "temperatura_max")]
    pub temperature_max_c: Option<f64>,
}

/// One missing reading paired with the weather of its date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackfillRow {
    #[serde(rename = "Fecha")]
    pub date: NaiveDate,
    #[serde(rename = "Sensor")]
    pub station_id: String,
    #[serde(flatten)]
    pub weather: DailyWeather,
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, PartialEq)]
pub enum WeatherError {
    /// Transport failure or non-2xx response.
    Http(String),
    /// The body could not be deserialized.
    Parse(String),
    /// The response had no daily values.
    NoData(String),
}

impl fmt::Display for WeatherError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeatherError::Http(msg) => write!(f, "HTTP error: {}", msg),
            WeatherError::Parse(msg) => write!(f, "Parse error: {}", msg),
            WeatherError::NoData(date) => write!(f, "No data available for {}", date),
        }
    }
}

impl std::error::Error for WeatherError {}

// ============================================================================
// API Client
// ============================================================================

/// A source of daily weather by date.
pub trait WeatherSource {
    fn daily(&self, date: NaiveDate) -> Result<DailyWeather, WeatherError>;
}

/// Blocking client for the Open-Meteo archive at one location.
pub struct OpenMeteoClient {
    client: reqwest::blocking::Client,
    location: WeatherConfig,
}

impl OpenMeteoClient {
    pub fn new(location: WeatherConfig) -> Result<Self, WeatherError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| WeatherError::Http(e.to_string()))?;
        Ok(Self { client, location })
    }
}

impl WeatherSource for OpenMeteoClient {
    fn daily(&self, date: NaiveDate) -> Result<DailyWeather, WeatherError> {
        let url = build_archive_url(date, &self.location);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .map_err(|e| WeatherError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(WeatherError::Http(response.status().as_u16().to_string()));
        }

        let body = response.text().map_err(|e| WeatherError::Http(e.to_string()))?;
        parse_archive_response(&body, date)
    }
}

/// Builds the archive URL for a single day at `location`.
pub fn build_archive_url(date: NaiveDate, location: &WeatherConfig) -> String {
    let day = date.format(ISO_DATE_FORMAT);
    format!(
        "{}?latitude={}&longitude={}&start_date={}&end_date={}&daily={}&timezone={}",
        OPEN_METEO_ARCHIVE_URL,
        location.latitude,
        location.longitude,
        day,
        day,
        DAILY_VARIABLES,
        location.timezone.replace('/', "%2F"),
    )
}

/// Extracts the first day's values from an archive response body.
pub fn parse_archive_response(body: &str, date: NaiveDate) -> Result<DailyWeather, WeatherError> {
    let response: ArchiveResponse =
        serde_json::from_str(body).map_err(|e| WeatherError::Parse(e.to_string()))?;

    let daily = response
        .daily
        .filter(|d| !d.time.is_empty())
        .ok_or_else(|| WeatherError::NoData(date.format(ISO_DATE_FORMAT).to_string()))?;

    fn first(values: &[Option<f64>]) -> Option<f64> {
        values.first().copied().flatten()
    }
    Ok(DailyWeather {
        precipitation_mm: first(&daily.precipitation_sum),
        wind_max_kmh: first(&daily.windspeed_10m_max),
        temperature_max_c: first(&daily.temperature_2m_max),
    })
}

// ============================================================================
// Backfill
// ============================================================================

/// `(date, station)` for every missing reading, station by station in the
/// order given, rows in sheet order.
pub fn missing_readings(table: &ReadingsTable, stations: &[String]) -> Vec<(NaiveDate, String)> {
    stations
        .iter()
        .filter_map(|id| table.station_series(id))
        .flat_map(|series| {
            let id = series.station_id;
            series
                .readings
                .into_iter()
                .filter(|r| r.value.is_none())
                .map(move |r| (r.date, id.clone()))
        })
        .collect()
}

/// Looks up the weather for every missing reading. A failed lookup yields an
/// all-absent `DailyWeather` for that row; each date is queried once.
pub fn weather_backfill(
    source: &dyn WeatherSource,
    table: &ReadingsTable,
    stations: &[String],
) -> Vec<BackfillRow> {
    let gaps = missing_readings(table, stations);
    let mut by_date: HashMap<NaiveDate, DailyWeather> = HashMap::new();
    let mut failed = 0usize;

    for (date, _) in &gaps {
        if by_date.contains_key(date) {
            continue;
        }
        let weather = match source.daily(*date) {
            Ok(w) => w,
            Err(e) => {
                failed += 1;
                logging::warn(
                    Component::Weather,
                    None,
                    &format!("lookup for {} failed: {}", date.format(ISO_DATE_FORMAT), e),
                );
                DailyWeather::default()
            }
        };
        by_date.insert(*date, weather);
    }

    logging::log_backfill_summary(by_date.len(), by_date.len() - failed, failed);

    gaps.into_iter()
        .map(|(date, station_id)| BackfillRow {
            date,
            station_id,
            weather: by_date.get(&date).cloned().unwrap_or_default(),
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
