//! Sensor health analysis for the Antisana monitoring stations.
//!
//! Ingests a table of periodic readings, measures completeness per station,
//! forecasts future data-gap risk, flags anomalous jumps, rolls readings up by
//! month, and classifies each station into a health tier with maintenance
//! recommendations.
//!
//! Modules:
//! - `model`         : shared domain types and errors.
//! - `stations`      : the fixed station registry.
//! - `config`        : thresholds and settings, loaded from TOML.
//! - `logging`       : component-tagged structured logging.
//! - `ingest`        : table normalizer, CSV loader, weather backfill client.
//! - `analysis`      : completeness, gap series, forecast, anomalies, monthly rollup.
//! - `alert`         : health tiers and recommendations.
//! - `pipeline`      : end-to-end analysis of one uploaded table.
//! - `store`         : session-scoped cache of the latest report.
//! - `summary`       : text rendering for the chat collaborator.

pub mod alert;
pub mod analysis;
pub mod config;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod stations;
pub mod store;
pub mod summary;
