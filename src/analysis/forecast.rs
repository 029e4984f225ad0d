//! Gap-risk forecasting.
//!
//! Fits a seasonal trend model to the monthly gap-ratio series and projects
//! it forward to find months whose expected share of missing readings exceeds
//! a threshold.
//!
//! # Model
//!
//! - Two full years of points or more: MSTL decomposition with a yearly
//!   period (12 months) and AutoETS for the trend.
//! - Fewer points: non-seasonal AutoETS.
//!
//! Weekly and daily seasonality are not modeled: the input is monthly. Both
//! fits are deterministic, so the same series always yields the same
//! projection.
//!
//! # Projection dates
//!
//! `horizon` points at month ends, starting with the end of the last
//! observed month. Projected values are not clipped to [0, 1].

use crate::analysis::{add_months, month_end};
use crate::model::{AnalysisError, GapRatioPoint};
use augurs::ets::AutoETS;
use augurs::mstl::MSTLModel;
use chrono::NaiveDate;
use std::sync::Arc;
use std::sync::mpsc;
use std::time::Duration;

/// Minimum number of monthly points required to fit a model.
pub const MIN_FORECAST_POINTS: usize = 3;

/// Yearly seasonality period, in months.
pub const YEARLY_PERIOD: usize = 12;

/// Minimum points for the seasonal (MSTL) fit: two full years.
pub const MIN_SEASONAL_POINTS: usize = 2 * YEARLY_PERIOD;

/// Interval level passed to the forecaster; only point forecasts are used.
const PREDICTION_LEVEL: f64 = 0.95;

// ---------------------------------------------------------------------------
// Model interface
// ---------------------------------------------------------------------------

/// One projected value of the gap ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Something that can learn from a gap-ratio series.
pub trait Forecaster: Send + Sync {
    fn fit(&self, series: &[GapRatioPoint]) -> Result<Box<dyn FittedModel>, AnalysisError>;
}

/// A fitted model that can extend its series forward.
pub trait FittedModel {
    /// `horizon_months` future points, in chronological order.
    fn project(&mut self, horizon_months: u32) -> Result<Vec<ForecastPoint>, AnalysisError>;
}

// ---------------------------------------------------------------------------
// Seasonal trend model
// ---------------------------------------------------------------------------

type Predictor = Box<dyn FnMut(usize) -> Result<Vec<f64>, String>>;

/// MSTL + AutoETS on long series, AutoETS alone on short ones.
#[derive(Debug, Clone)]
pub struct SeasonalTrendForecaster {
    pub seasonal_period: usize,
    pub min_seasonal_points: usize,
}

impl Default for SeasonalTrendForecaster {
    fn default() -> Self {
        Self {
            seasonal_period: YEARLY_PERIOD,
            min_seasonal_points: MIN_SEASONAL_POINTS,
        }
    }
}

pub struct SeasonalTrendModel {
    last_month: NaiveDate,
    seasonal: bool,
    predictor: Predictor,
}

impl SeasonalTrendModel {
    /// `true` when the yearly component was decomposed out.
    pub fn is_seasonal(&self) -> bool {
        self.seasonal
    }
}

impl FittedModel for SeasonalTrendModel {
    fn project(&mut self, horizon_months: u32) -> Result<Vec<ForecastPoint>, AnalysisError> {
        let values = (self.predictor)(horizon_months as usize)
            .map_err(AnalysisError::ForecastUnavailable)?;
        if values.iter().any(|v| !v.is_finite()) {
            return Err(AnalysisError::ForecastUnavailable(
                "non-finite projected value".to_string(),
            ));
        }

        Ok(values
            .into_iter()
            .enumerate()
            .map(|(i, value)| ForecastPoint {
                date: month_end(add_months(self.last_month, i as u32)),
                value,
            })
            .collect())
    }
}

impl SeasonalTrendForecaster {
    /// Fits the concrete model; `fit` wraps this for the trait object.
    pub fn fit_model(&self, series: &[GapRatioPoint]) -> Result<SeasonalTrendModel, AnalysisError> {
        let Some(last) = series.last() else {
            return Err(insufficient_points(0));
        };
        if series.len() < MIN_FORECAST_POINTS {
            return Err(insufficient_points(series.len()));
        }

        let values: Vec<f64> = series.iter().map(|p| p.ratio).collect();
        let seasonal = values.len() >= self.min_seasonal_points;
        let fitted = if seasonal {
            fit_mstl(&values, self.seasonal_period)
        } else {
            fit_ets(&values)
        };
        let predictor = fitted.map_err(AnalysisError::ForecastUnavailable)?;

        Ok(SeasonalTrendModel {
            last_month: last.month_start,
            seasonal,
            predictor,
        })
    }
}

impl Forecaster for SeasonalTrendForecaster {
    fn fit(&self, series: &[GapRatioPoint]) -> Result<Box<dyn FittedModel>, AnalysisError> {
        Ok(Box::new(self.fit_model(series)?))
    }
}

fn insufficient_points(got: usize) -> AnalysisError {
    AnalysisError::ForecastUnavailable(format!(
        "need at least {} monthly points, got {}",
        MIN_FORECAST_POINTS, got
    ))
}

/// MSTL with one seasonal period and an AutoETS trend.
fn fit_mstl(values: &[f64], period: usize) -> Result<Predictor, String> {
    let ets = AutoETS::non_seasonal().into_trend_model();
    let mstl = MSTLModel::new(vec![period], ets);
    let mut forecaster = augurs::forecaster::Forecaster::new(mstl);

    forecaster
        .fit(values)
        .map_err(|e| format!("MSTL fit error: {e}"))?;

    Ok(Box::new(move |horizon| {
        forecaster
            .predict(horizon, PREDICTION_LEVEL)
            .map(|forecast| forecast.point)
            .map_err(|e| format!("MSTL predict error: {e}"))
    }))
}

/// Non-seasonal AutoETS.
fn fit_ets(values: &[f64]) -> Result<Predictor, String> {
    let ets = AutoETS::non_seasonal();
    let mut forecaster = augurs::forecaster::Forecaster::new(ets);

    forecaster
        .fit(values)
        .map_err(|e| format!("ETS fit error: {e}"))?;

    Ok(Box::new(move |horizon| {
        forecaster
            .predict(horizon, PREDICTION_LEVEL)
            .map(|forecast| forecast.point)
            .map_err(|e| format!("ETS predict error: {e}"))
    }))
}

// ---------------------------------------------------------------------------
// Risk dates
// ---------------------------------------------------------------------------

/// Parameters of one gap-risk forecast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskForecastParams {
    pub risk_threshold: f64,
    pub horizon_months: u32,
    pub timeout: Duration,
}

/// Fits `forecaster` on `series` and returns the projected dates strictly
/// after `today` whose value exceeds `risk_threshold`, ascending.
///
/// Fewer than three points is `ForecastUnavailable`. The fit and projection
/// run on a worker thread bounded by `params.timeout`. On timeout the result
/// is `ForecastUnavailable` and the worker is detached: it cannot be
/// interrupted, so it keeps its CPU until the fit returns and its result is
/// dropped. Callers treat every error as "no risk dates".
pub fn forecast_risk_dates(
    forecaster: Arc<dyn Forecaster>,
    series: &[GapRatioPoint],
    params: RiskForecastParams,
    today: NaiveDate,
) -> Result<Vec<NaiveDate>, AnalysisError> {
    if series.len() < MIN_FORECAST_POINTS {
        return Err(insufficient_points(series.len()));
    }

    let owned = series.to_vec();
    let horizon = params.horizon_months;
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let result = forecaster
            .fit(&owned)
            .and_then(|mut model| model.project(horizon));
        // The receiver is gone if we already timed out.
        let _ = tx.send(result);
    });

    let projection = match rx.recv_timeout(params.timeout) {
        Ok(result) => result?,
        Err(mpsc::RecvTimeoutError::Timeout) => {
            return Err(AnalysisError::ForecastUnavailable(format!(
                "model fit timed out after {} ms",
                params.timeout.as_millis()
            )));
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            return Err(AnalysisError::ForecastUnavailable(
                "model fit worker panicked".to_string(),
            ));
        }
    };

    Ok(projection
        .into_iter()
        .filter(|p| p.date > today && p.value > params.risk_threshold)
        .map(|p| p.date)
        .collect())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
