//! Health tier classification.
//!
//! The tier is a fixed decision table evaluated in priority order:
//!
//! | tier      | condition                                   |
//! |-----------|---------------------------------------------|
//! | `critico` | `missing_pct > 30` and `missing_count > 0`  |
//! | `riesgo`  | `missing_pct > 20` or any anomaly           |
//! | `ok`      | otherwise                                   |
//!
//! All comparisons are strict: exactly 30 % missing is not critical and
//! exactly 20 % is not a risk on its own.
//!
//! Forecasted gap-risk dates do not enter the table. They only add a line to
//! the recommendations. An earlier revision of this service also escalated
//! any forecast risk date to `critico`; that rule was dropped because the
//! forecast is an early-warning signal that tolerates false positives.

use crate::model::HealthTier;

/// Missing percentage above which a station with gaps is critical.
pub const CRITICAL_MISSING_PCT: f64 = 30.0;

/// Missing percentage above which a station is at risk.
pub const RISK_MISSING_PCT: f64 = 20.0;

/// The analysis outputs the classifier and the recommendation engine read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HealthSignals {
    pub missing_pct: f64,
    pub missing_count: usize,
    pub anomaly_count: usize,
    pub forecast_risk_count: usize,
}

/// Classifies a station. Deterministic and independent of `forecast_risk_count`.
pub fn classify(signals: &HealthSignals) -> HealthTier {
    if signals.missing_pct > CRITICAL_MISSING_PCT && signals.missing_count > 0 {
        HealthTier::Critico
    } else if signals.missing_pct > RISK_MISSING_PCT || signals.anomaly_count > 0 {
        HealthTier::Riesgo
    } else {
        HealthTier::Ok
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
