//! Dashboard read path and page rendering.
//!
//! The read side of the system: parameterized queries against the
//! `weather` table, the latest-record-with-fallback policy, alert icon
//! lookup, and rendering of the single-page dashboard. Runs as its own
//! process invocation — it shares nothing with ingestion but the store.
//!
//! # Clock injection
//! `resolve_latest` and `build_city_view` accept a `today: NaiveDate`
//! parameter rather than reading the wall clock internally, so the
//! fallback policy is deterministic in tests. The production caller
//! passes the process-local date.

use chrono::NaiveDate;
use postgres::Client;
use serde::Serialize;
use std::error::Error;
use std::path::Path;

use crate::logging::{self, DataSource};
use crate::model::WeatherRecord;

/// Number of trailing records loaded per city for the trend charts.
pub const TREND_LIMIT: i64 = 100;

/// Embedded page template, rendered with tera.
const DASHBOARD_TEMPLATE: &str = include_str!("../templates/dashboard.html");

// ---------------------------------------------------------------------------
// Store queries
// ---------------------------------------------------------------------------

/// Cities that have at least one persisted record, sorted by name.
pub fn list_cities(client: &mut Client) -> Result<Vec<String>, postgres::Error> {
    let rows = client.query("SELECT DISTINCT city FROM weather ORDER BY city", &[])?;
    Ok(rows.iter().map(|row| row.get(0)).collect())
}

/// The most recent `limit` records for one city, newest first.
pub fn recent_for_city(
    client: &mut Client,
    city: &str,
    limit: i64,
) -> Result<Vec<WeatherRecord>, postgres::Error> {
    let rows = client.query(
        "SELECT date, city, max_temp_c, min_temp_c, temp_range_c,
                rain_sum, max_wind_speed_kmh, rain_status, wind_status
         FROM weather
         WHERE city = $1
         ORDER BY date DESC
         LIMIT $2",
        &[&city, &limit],
    )?;
    Ok(rows.iter().map(row_to_record).collect())
}

fn row_to_record(row: &postgres::Row) -> WeatherRecord {
    WeatherRecord {
        date: row.get(0),
        city: row.get(1),
        max_temp_c: row.get(2),
        min_temp_c: row.get(3),
        temp_range_c: row.get(4),
        rain_sum: row.get(5),
        max_wind_speed_kmh: row.get(6),
        rain_status: row.get(7),
        wind_status: row.get(8),
    }
}

// ---------------------------------------------------------------------------
// Latest-record resolution
// ---------------------------------------------------------------------------

/// Resolves the record to headline for a city.
///
/// Prefers the record dated `today`; otherwise falls back to the newest
/// available record with the fallback flag set, so the page can show a
/// warning instead of an empty view. Returns `None` only when the city
/// has no records at all. `records_desc` must be ordered by date
/// descending, as returned by [`recent_for_city`].
pub fn resolve_latest<'a>(
    records_desc: &'a [WeatherRecord],
    today: NaiveDate,
) -> Option<(&'a WeatherRecord, bool)> {
    if let Some(todays) = records_desc.iter().find(|r| r.date == today) {
        return Some((todays, false));
    }
    records_desc.first().map(|newest| (newest, true))
}

// ---------------------------------------------------------------------------
// Alert display tables
// ---------------------------------------------------------------------------

/// Alert icon for a wind status label. Unrecognized labels (the
/// classifier's "Unknown" sentinel included) get no icon.
pub fn wind_icon(status: &str) -> &'static str {
    match status {
        "Calm" | "Light Air" => "✅",
        "Moderate Breeze" | "Strong Breeze" => "⚠️",
        "Gale" => "❌",
        "Hurricane" => "🔥 EXTREME WARNING",
        _ => "",
    }
}

/// Alert icon for a rain status label.
pub fn rain_icon(status: &str) -> &'static str {
    match status {
        "No Rain" => "✅",
        "Light Rain" => "🌧️",
        "Heavy Rain" => "⚠️",
        "Torrential Rain" => "❌ FLOOD RISK",
        _ => "",
    }
}

// ---------------------------------------------------------------------------
// Page payload
// ---------------------------------------------------------------------------

/// One city's complete dashboard payload, embedded into the page as JSON.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CityView {
    pub city: String,
    pub latest_date: String,
    /// True when the headlined record is not from `today`.
    pub fallback: bool,
    pub max_temp_c: f64,
    pub min_temp_c: f64,
    pub rain_sum: f64,
    pub max_wind_speed_kmh: f64,
    pub rain_status: String,
    pub wind_status: String,
    pub rain_icon: &'static str,
    pub wind_icon: &'static str,
    pub trend: TrendSeries,
}

/// Chart series for one city, in chronological order.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TrendSeries {
    pub dates: Vec<String>,
    pub max_temp_c: Vec<f64>,
    pub min_temp_c: Vec<f64>,
    pub rain_sum: Vec<f64>,
    pub max_wind_speed_kmh: Vec<f64>,
    pub rain_status: Vec<String>,
    pub wind_status: Vec<String>,
}

/// Shapes one city's records into its page payload.
///
/// `records_desc` is newest-first as queried; the trend series are
/// reversed here so the charts read chronologically. Returns `None` for
/// a city with no records.
pub fn build_city_view(records_desc: &[WeatherRecord], today: NaiveDate) -> Option<CityView> {
    let (latest, fallback) = resolve_latest(records_desc, today)?;

    let chronological: Vec<&WeatherRecord> = records_desc.iter().rev().collect();
    let trend = TrendSeries {
        dates: chronological.iter().map(|r| r.date.to_string()).collect(),
        max_temp_c: chronological.iter().map(|r| r.max_temp_c).collect(),
        min_temp_c: chronological.iter().map(|r| r.min_temp_c).collect(),
        rain_sum: chronological.iter().map(|r| r.rain_sum).collect(),
        max_wind_speed_kmh: chronological
            .iter()
            .map(|r| r.max_wind_speed_kmh)
            .collect(),
        rain_status: chronological.iter().map(|r| r.rain_status.clone()).collect(),
        wind_status: chronological.iter().map(|r| r.wind_status.clone()).collect(),
    };

    Some(CityView {
        city: latest.city.clone(),
        latest_date: latest.date.to_string(),
        fallback,
        max_temp_c: latest.max_temp_c,
        min_temp_c: latest.min_temp_c,
        rain_sum: latest.rain_sum,
        max_wind_speed_kmh: latest.max_wind_speed_kmh,
        rain_status: latest.rain_status.clone(),
        wind_status: latest.wind_status.clone(),
        rain_icon: rain_icon(&latest.rain_status),
        wind_icon: wind_icon(&latest.wind_status),
        trend,
    })
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Renders the dashboard page from the per-city payloads.
pub fn render_dashboard(views: &[CityView], generated_on: &str) -> Result<String, Box<dyn Error>> {
    let mut tera = tera::Tera::default();
    tera.add_raw_template("dashboard.html", DASHBOARD_TEMPLATE)?;

    let mut context = tera::Context::new();
    context.insert("views_json", &serde_json::to_string(views)?);
    context.insert("generated_on", generated_on);

    Ok(tera.render("dashboard.html", &context)?)
}

/// Read-and-render entry point: queries every city and writes one
/// self-contained page to `out_path`.
///
/// A city with zero rows is logged as a warning and omitted from the
/// page. A store with no rows at all is an error — there is nothing to
/// render before the first ingestion run.
pub fn generate(client: &mut Client, today: NaiveDate, out_path: &Path) -> Result<(), Box<dyn Error>> {
    let cities = list_cities(client)?;
    if cities.is_empty() {
        return Err("No weather records in the store yet; run `wxdash_service ingest` first".into());
    }

    let mut views = Vec::new();
    for city in &cities {
        let records = recent_for_city(client, city, TREND_LIMIT)?;
        match build_city_view(&records, today) {
            Some(view) => {
                if view.fallback {
                    logging::warn(
                        DataSource::Database,
                        Some(city.as_str()),
                        &format!("No record for today; dashboard falls back to {}", view.latest_date),
                    );
                }
                views.push(view);
            }
            None => logging::warn(
                DataSource::Database,
                Some(city.as_str()),
                "No records available; city omitted from dashboard",
            ),
        }
    }

    let html = render_dashboard(&views, &today.to_string())?;
    std::fs::write(out_path, html)?;
    logging::info(
        DataSource::System,
        None,
        &format!("Dashboard written to {} ({} cities)", out_path.display(), views.len()),
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
