//! Input adapters around the analysis core.
//!
//! - `table`     : raw table type and the readings normalizer.
//! - `csv_table` : loads a CSV export of the readings sheet into a raw table.
//! - `open_meteo`: historical weather lookups for missing readings.

pub mod csv_table;
pub mod open_meteo;
pub mod table;
