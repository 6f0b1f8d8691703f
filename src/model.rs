/// Core data types for the city weather ETL service.
///
/// This module defines the shared domain model imported by all other
/// modules. It contains no I/O and no collaborator dependencies — only
/// types and their error formatting.

use chrono::NaiveDate;

// ---------------------------------------------------------------------------
// Record types
// ---------------------------------------------------------------------------

/// One persisted observation for one city on one calendar date.
///
/// (`date`, `city`) is the unique identity of a record; re-ingesting the
/// same key overwrites every non-key field. `temp_range_c` is derived
/// (`max_temp_c - min_temp_c`) and stored without validation, so
/// inconsistent inputs can make it negative. `rain_status` and
/// `wind_status` are denormalized classifier outputs — always derivable
/// from `rain_sum` / `max_wind_speed_kmh`, never independent facts.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherRecord {
    pub date: NaiveDate,
    pub city: String,
    pub max_temp_c: f64,
    pub min_temp_c: f64,
    pub temp_range_c: f64,
    pub rain_sum: f64,
    pub max_wind_speed_kmh: f64,
    pub rain_status: String,
    pub wind_status: String,
}

/// One city's raw daily series as returned by the forecast collaborator.
///
/// All vectors are index-aligned: entry `i` of every field describes the
/// same calendar day. Alignment is enforced at parse time
/// (`ingest::open_meteo::parse_forecast_response`); a misaligned response
/// never reaches the record builder.
#[derive(Debug, Clone, PartialEq)]
pub struct DailySeries {
    pub dates: Vec<NaiveDate>,
    pub max_temp_c: Vec<f64>,
    pub min_temp_c: Vec<f64>,
    pub rain_sum: Vec<f64>,
    pub max_wind_speed_kmh: Vec<f64>,
}

impl DailySeries {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise when fetching or parsing a city's forecast.
///
/// Every variant is a per-city failure: the ingestion loop logs it with
/// the city name and continues with the remaining cities.
#[derive(Debug, PartialEq)]
pub enum FetchError {
    /// Non-2xx HTTP response from the forecast API.
    Http(u16),
    /// The request itself failed (connect, timeout, TLS).
    Request(String),
    /// The response body could not be deserialized.
    Parse(String),
    /// The daily arrays in the response had differing lengths.
    MisalignedSeries {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    /// The response parsed but contained no daily entries.
    EmptySeries,
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Http(code) => write!(f, "HTTP error: {}", code),
            FetchError::Request(msg) => write!(f, "Request failed: {}", msg),
            FetchError::Parse(msg) => write!(f, "Parse error: {}", msg),
            FetchError::MisalignedSeries {
                field,
                expected,
                actual,
            } => write!(
                f,
                "Misaligned series: {} has {} entries, expected {}",
                field, actual, expected
            ),
            FetchError::EmptySeries => write!(f, "Response contained no daily entries"),
        }
    }
}

impl std::error::Error for FetchError {}
