//! PostgreSQL connectivity and the weather upsert writer.
//!
//! Connection parameters come from the process environment (`.env` is
//! honored). The schema lives in `sql/001_weather_schema.sql`;
//! `connect_and_verify` refuses to hand out a connection until the
//! `weather` table exists, so operator mistakes surface before any
//! network fetch.

use postgres::{Client, NoTls};
use std::error::Error;

use crate::model::WeatherRecord;

/// Schema applied by the `init-db` command.
const SCHEMA_SQL: &str = include_str!("../sql/001_weather_schema.sql");

// ---------------------------------------------------------------------------
// Connection configuration
// ---------------------------------------------------------------------------

/// Store connection parameters, read once at startup and passed
/// explicitly into whatever needs a connection.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub dbname: String,
}

impl DbConfig {
    /// Reads connection parameters from the environment, loading `.env`
    /// first if present. Every variable is required; a missing one is a
    /// fatal startup error naming the variable.
    pub fn from_env() -> Result<Self, Box<dyn Error>> {
        dotenv::dotenv().ok();

        let port_raw = require_var("DB_PORT")?;
        let port: u16 = port_raw
            .parse()
            .map_err(|_| format!("DB_PORT must be a port number, got '{}'", port_raw))?;

        Ok(DbConfig {
            host: require_var("DB_HOST")?,
            port,
            user: require_var("DB_USER")?,
            password: require_var("DB_PASSWORD")?,
            dbname: require_var("DB_NAME")?,
        })
    }
}

fn require_var(name: &str) -> Result<String, Box<dyn Error>> {
    std::env::var(name)
        .map_err(|_| format!("Missing required environment variable {}", name).into())
}

/// Opens a connection to the configured database.
pub fn connect(config: &DbConfig) -> Result<Client, postgres::Error> {
    postgres::Config::new()
        .host(&config.host)
        .port(config.port)
        .user(&config.user)
        .password(&config.password)
        .dbname(&config.dbname)
        .connect(NoTls)
}

/// Connects and verifies that the weather schema has been applied,
/// with operator guidance when it has not.
pub fn connect_and_verify(config: &DbConfig) -> Result<Client, Box<dyn Error>> {
    let mut client = connect(config)?;

    let row = client.query_one(
        "SELECT EXISTS (
            SELECT FROM information_schema.tables
            WHERE table_name = 'weather'
        )",
        &[],
    )?;
    let table_exists: bool = row.get(0);
    if !table_exists {
        return Err("Table 'weather' does not exist.\n\
             Apply the schema first:\n\
               wxdash_service init-db\n\
             or: psql -d $DB_NAME -f sql/001_weather_schema.sql"
            .into());
    }

    Ok(client)
}

/// Applies `sql/001_weather_schema.sql`. Idempotent.
pub fn init_schema(client: &mut Client) -> Result<(), postgres::Error> {
    client.batch_execute(SCHEMA_SQL)
}

// ---------------------------------------------------------------------------
// Upsert writer
// ---------------------------------------------------------------------------

/// Executed once per record. All parameters bound; a conflict on the
/// (date, city) key overwrites every non-key column.
const UPSERT_SQL: &str = "\
    INSERT INTO weather (
        date, city, max_temp_c, min_temp_c, temp_range_c,
        rain_sum, max_wind_speed_kmh, rain_status, wind_status
    )
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
    ON CONFLICT (date, city)
    DO UPDATE SET
        max_temp_c = EXCLUDED.max_temp_c,
        min_temp_c = EXCLUDED.min_temp_c,
        temp_range_c = EXCLUDED.temp_range_c,
        rain_sum = EXCLUDED.rain_sum,
        max_wind_speed_kmh = EXCLUDED.max_wind_speed_kmh,
        rain_status = EXCLUDED.rain_status,
        wind_status = EXCLUDED.wind_status";

/// Upserts a batch of records keyed on (date, city). Last write wins.
///
/// The whole batch runs inside one transaction: a mid-batch failure rolls
/// back every row, leaving the store in its pre-call state. An empty
/// batch is a defined no-op and never opens a transaction.
pub fn upsert_weather(
    client: &mut Client,
    records: &[WeatherRecord],
) -> Result<u64, postgres::Error> {
    if records.is_empty() {
        return Ok(0);
    }

    let mut tx = client.transaction()?;
    let stmt = tx.prepare(UPSERT_SQL)?;

    let mut written = 0u64;
    for record in records {
        written += tx.execute(
            &stmt,
            &[
                &record.date,
                &record.city,
                &record.max_temp_c,
                &record.min_temp_c,
                &record.temp_range_c,
                &record.rain_sum,
                &record.max_wind_speed_kmh,
                &record.rain_status,
                &record.wind_status,
            ],
        )?;
    }

    tx.commit()?;
    Ok(written)
}
