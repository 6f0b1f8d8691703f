//! Operator entry point.
//!
//! Commands:
//!   ingest            fetch all configured cities and upsert into the store (default)
//!   dashboard [PATH]  render the dashboard page (default: dashboard.html)
//!   init-db           apply sql/001_weather_schema.sql
//!   verify            probe every configured city against the live API

use std::env;
use std::error::Error;
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use wxdash_service::logging::{self, DataSource, LogLevel};
use wxdash_service::{cities, dashboard, db, pipeline, verify};

fn main() -> ExitCode {
    let log_file = env::var("WXDASH_LOG_FILE").ok();
    logging::init_logger(LogLevel::Info, log_file.as_deref(), true);

    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("ingest");

    let result = match command {
        "ingest" => run_ingest(),
        "dashboard" => run_dashboard(args.get(2).map(String::as_str)),
        "init-db" => run_init_db(),
        "verify" => run_verify(),
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {}", other);
            print_usage();
            return ExitCode::FAILURE;
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            logging::error(DataSource::System, None, &e.to_string());
            ExitCode::FAILURE
        }
    }
}

fn print_usage() {
    println!("Usage: wxdash_service [COMMAND]");
    println!();
    println!("Commands:");
    println!("  ingest            Fetch all configured cities and upsert into the store (default)");
    println!("  dashboard [PATH]  Render the dashboard page (default: dashboard.html)");
    println!("  init-db           Apply sql/001_weather_schema.sql");
    println!("  verify            Probe every configured city against the live API");
    println!();
    println!("Store credentials come from DB_HOST, DB_PORT, DB_USER, DB_PASSWORD,");
    println!("DB_NAME (a .env file is honored). Cities come from cities.toml.");
}

fn run_ingest() -> Result<(), Box<dyn Error>> {
    // Configuration and credentials are resolved before any network or
    // store activity; either failing aborts the run here.
    let cities = cities::load_cities(Path::new(cities::DEFAULT_CONFIG_PATH))?;
    let config = db::DbConfig::from_env()?;
    let mut client = db::connect_and_verify(&config)?;

    let http = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()?;

    let batch = pipeline::run_ingestion(&cities, &http);
    let written = db::upsert_weather(&mut client, &batch)?;

    logging::info(
        DataSource::Database,
        None,
        &format!("Wrote {} records ({} cities configured)", written, cities.len()),
    );
    Ok(())
}

fn run_dashboard(out: Option<&str>) -> Result<(), Box<dyn Error>> {
    let config = db::DbConfig::from_env()?;
    let mut client = db::connect_and_verify(&config)?;

    let today = chrono::Local::now().date_naive();
    dashboard::generate(&mut client, today, Path::new(out.unwrap_or("dashboard.html")))
}

fn run_init_db() -> Result<(), Box<dyn Error>> {
    let config = db::DbConfig::from_env()?;
    let mut client = db::connect(&config)?;
    db::init_schema(&mut client)?;
    logging::info(DataSource::Database, None, "Weather schema applied");
    Ok(())
}

fn run_verify() -> Result<(), Box<dyn Error>> {
    let cities = cities::load_cities(Path::new(cities::DEFAULT_CONFIG_PATH))?;
    let results = verify::run_verification(&cities)?;
    let failed = verify::print_summary(&results);
    if failed > 0 {
        return Err(format!("{} of {} cities failed verification", failed, results.len()).into());
    }
    Ok(())
}
