// Command-line entry point.
//
// Analyzes a CSV export of the readings sheet and prints the station report
// as JSON (or as text blocks with `--summary`). With `--backfill`, also looks
// up the weather for every missing reading and prints those rows.
//
//   sensor_health <readings.csv> [--config <file.toml>] [--from <date>] [--to <date>]
//                 [--summary] [--backfill]
use chrono::{Local, NaiveDate};
use clap::Parser;
use sensor_health::config::{self, AnalysisConfig};
use sensor_health::ingest::csv_table;
use sensor_health::ingest::open_meteo::{OpenMeteoClient, weather_backfill};
use sensor_health::ingest::table::normalize;
use sensor_health::logging::{self, Component, LogLevel};
use sensor_health::pipeline::Pipeline;
use sensor_health::summary;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(
    name = "sensor_health",
    about = "Analyze station readings for data gaps, anomalies and gap risk"
)]
struct CliArgs {
    /// CSV export of the readings sheet (`Fecha` plus one column per station).
    input: String,

    /// TOML configuration file. Defaults to $SENSOR_HEALTH_CONFIG, then built-in defaults.
    #[arg(long)]
    config: Option<String>,

    /// Only analyze rows dated on or after this day (YYYY-MM-DD).
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Only analyze rows dated on or before this day (YYYY-MM-DD).
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Print plain-text station summaries instead of JSON.
    #[arg(long)]
    summary: bool,

    /// Also look up the weather for every missing reading.
    #[arg(long)]
    backfill: bool,
}

fn load_config(path: Option<&str>) -> Result<AnalysisConfig, config::ConfigError> {
    match path {
        Some(p) => config::load_config(p),
        None => config::load_config_from_env(),
    }
}

fn run(args: CliArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(args.config.as_deref())?;
    let raw = csv_table::load_raw_table(&args.input)?;
    let today = Local::now().date_naive();

    let table = normalize(&raw, &config.date_column)?.between(args.from, args.to);
    let range = match table.date_range() {
        Some((first, last)) => format!("{} to {}", first, last),
        None => "no rows".to_string(),
    };
    logging::info(Component::System, None, &format!("analyzing {} ({})", args.input, range));

    let pipeline = Pipeline::new(config.clone());
    let report = pipeline.analyze_table(&table, today);

    if args.summary {
        print!("{}", summary::summarize_report(&report));
    } else {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    if args.backfill {
        let client = OpenMeteoClient::new(config.weather.clone())?;
        let rows = weather_backfill(&client, &table, &config.stations);
        println!("{}", serde_json::to_string_pretty(&rows)?);
    }
    Ok(())
}

fn main() -> ExitCode {
    logging::init_logger(LogLevel::Info, None, false);

    let args = CliArgs::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            logging::error(Component::System, None, &e.to_string());
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_accepts_input_and_options() {
        let args = CliArgs::try_parse_from([
            "sensor_health",
            "data.csv",
            "--config",
            "c.toml",
            "--summary",
            "--from",
            "2024-01-01",
        ])
        .unwrap();
        assert_eq!(args.from, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(args.to, None);
        assert_eq!(args.input, "data.csv");
        assert_eq!(args.config.as_deref(), Some("c.toml"));
        assert!(args.summary);
        assert!(!args.backfill);
    }

    #[test]
    fn test_cli_rejects_missing_input_and_unknown_flags() {
        assert!(CliArgs::try_parse_from(["sensor_health"]).is_err());
        assert!(CliArgs::try_parse_from(["sensor_health", "data.csv", "--verbose"]).is_err());
        assert!(CliArgs::try_parse_from(["sensor_health", "a.csv", "b.csv"]).is_err());
        assert!(CliArgs::try_parse_from(["sensor_health", "a.csv", "--config"]).is_err());
        assert!(CliArgs::try_parse_from(["sensor_health", "a.csv", "--to", "31/12/2024"]).is_err());
    }
}
