/// Open-Meteo Forecast API client.
///
/// Retrieves the daily forecast series (temperature extremes, rain sum,
/// max wind speed) for one set of coordinates at a time. No API key is
/// required.
///
/// API documentation: https://open-meteo.com/en/docs

use std::thread;
use std::time::Duration;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::cities::CityConfig;
use crate::model::{DailySeries, FetchError};

const OPEN_METEO_BASE_URL: &str = "https://api.open-meteo.com";

/// Daily variables requested for every city, in response-array order.
pub const DAILY_VARIABLES: &[&str] = &[
    "temperature_2m_max",
    "temperature_2m_min",
    "rain_sum",
    "wind_speed_10m_max",
];

/// Retry policy: five attempts with exponential backoff from 200 ms.
/// Only transport failures and 5xx responses are retried.
const MAX_ATTEMPTS: u32 = 5;
const BACKOFF_BASE_MS: u64 = 200;

// ============================================================================
// API response structures
// ============================================================================

/// Top-level forecast response. Only the daily block is requested.
#[derive(Debug, Deserialize)]
pub struct ForecastResponse {
    pub daily: DailyBlock,
}

/// Aligned daily arrays: entry `i` of every field describes the same day.
#[derive(Debug, Deserialize)]
pub struct DailyBlock {
    pub time: Vec<NaiveDate>,
    pub temperature_2m_max: Vec<f64>,
    pub temperature_2m_min: Vec<f64>,
    pub rain_sum: Vec<f64>,
    pub wind_speed_10m_max: Vec<f64>,
}

// ============================================================================
// API client functions
// ============================================================================

/// Builds the forecast URL for one set of coordinates.
///
/// `timezone=auto` makes the API bucket days in the city's local
/// timezone, so "today" in the response matches the city's calendar.
pub fn build_forecast_url(latitude: f64, longitude: f64) -> String {
    format!(
        "{}/v1/forecast?latitude={}&longitude={}&daily={}&timezone=auto",
        OPEN_METEO_BASE_URL,
        latitude,
        longitude,
        DAILY_VARIABLES.join(","),
    )
}

/// Fetches the daily forecast series for one configured city.
///
/// Transport failures and server-side (5xx) responses are retried with
/// exponential backoff; client errors and parse failures are not. Any
/// error returned here is a per-city failure — the caller logs it and
/// continues with the remaining cities.
pub fn fetch_daily(
    client: &reqwest::blocking::Client,
    city: &CityConfig,
) -> Result<DailySeries, FetchError> {
    let url = build_forecast_url(city.latitude, city.longitude);

    let mut last_err = FetchError::Request("no attempts made".to_string());
    for attempt in 0..MAX_ATTEMPTS {
        if attempt > 0 {
            thread::sleep(Duration::from_millis(BACKOFF_BASE_MS << (attempt - 1)));
        }

        match client.get(&url).send() {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    let body = response
                        .text()
                        .map_err(|e| FetchError::Request(e.to_string()))?;
                    return parse_forecast_response(&body);
                }
                last_err = FetchError::Http(status.as_u16());
                if !status.is_server_error() {
                    return Err(last_err);
                }
            }
            Err(e) => {
                last_err = FetchError::Request(e.to_string());
            }
        }
    }

    Err(last_err)
}

/// Parses a forecast response body into an alignment-checked series.
///
/// Separate from [`fetch_daily`] so response handling is testable without
/// a network.
pub fn parse_forecast_response(body: &str) -> Result<DailySeries, FetchError> {
    let response: ForecastResponse =
        serde_json::from_str(body).map_err(|e| FetchError::Parse(e.to_string()))?;
    let daily = response.daily;

    let expected = daily.time.len();
    if expected == 0 {
        return Err(FetchError::EmptySeries);
    }
    check_len("temperature_2m_max", daily.temperature_2m_max.len(), expected)?;
    check_len("temperature_2m_min", daily.temperature_2m_min.len(), expected)?;
    check_len("rain_sum", daily.rain_sum.len(), expected)?;
    check_len("wind_speed_10m_max", daily.wind_speed_10m_max.len(), expected)?;

    Ok(DailySeries {
        dates: daily.time,
        max_temp_c: daily.temperature_2m_max,
        min_temp_c: daily.temperature_2m_min,
        rain_sum: daily.rain_sum,
        max_wind_speed_kmh: daily.wind_speed_10m_max,
    })
}

fn check_len(field: &'static str, actual: usize, expected: usize) -> Result<(), FetchError> {
    if actual != expected {
        return Err(FetchError::MisalignedSeries {
            field,
            expected,
            actual,
        });
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_BODY: &str = r#"{
        "latitude": 51.5,
        "longitude": -0.12,
        "timezone": "Europe/London",
        "daily_units": {
            "time": "iso8601",
            "temperature_2m_max": "°C",
            "temperature_2m_min": "°C",
            "rain_sum": "mm",
            "wind_speed_10m_max": "km/h"
        },
        "daily": {
            "time": ["2026-08-05", "2026-08-06", "2026-08-07"],
            "temperature_2m_max": [21.4, 19.8, 23.1],
            "temperature_2m_min": [12.0, 11.3, 13.9],
            "rain_sum": [0.0, 4.2, 0.3],
            "wind_speed_10m_max": [18.7, 31.0, 9.4]
        }
    }"#;

    #[test]
    fn test_parse_valid_response() {
        let series = parse_forecast_response(SAMPLE_BODY).expect("sample body should parse");
        assert_eq!(series.len(), 3);
        assert_eq!(
            series.dates[0],
            NaiveDate::from_ymd_opt(2026, 8, 5).unwrap()
        );
        assert_eq!(series.max_temp_c, vec![21.4, 19.8, 23.1]);
        assert_eq!(series.rain_sum[1], 4.2);
        assert_eq!(series.max_wind_speed_kmh[2], 9.4);
    }

    #[test]
    fn test_parse_rejects_misaligned_arrays() {
        let body = r#"{
            "daily": {
                "time": ["2026-08-05", "2026-08-06"],
                "temperature_2m_max": [21.4, 19.8],
                "temperature_2m_min": [12.0],
                "rain_sum": [0.0, 4.2],
                "wind_speed_10m_max": [18.7, 31.0]
            }
        }"#;
        let err = parse_forecast_response(body).expect_err("short array must fail");
        assert_eq!(
            err,
            FetchError::MisalignedSeries {
                field: "temperature_2m_min",
                expected: 2,
                actual: 1,
            }
        );
    }

    #[test]
    fn test_parse_rejects_empty_series() {
        let body = r#"{
            "daily": {
                "time": [],
                "temperature_2m_max": [],
                "temperature_2m_min": [],
                "rain_sum": [],
                "wind_speed_10m_max": []
            }
        }"#;
        assert_eq!(
            parse_forecast_response(body),
            Err(FetchError::EmptySeries)
        );
    }

    #[test]
    fn test_parse_rejects_malformed_json() {
        let result = parse_forecast_response("{ not json");
        assert!(matches!(result, Err(FetchError::Parse(_))));
    }

    #[test]
    fn test_parse_rejects_null_measurement() {
        // A null in any measurement array is a malformed response for this
        // pipeline, handled as a per-city parse failure.
        let body = r#"{
            "daily": {
                "time": ["2026-08-05"],
                "temperature_2m_max": [null],
                "temperature_2m_min": [12.0],
                "rain_sum": [0.0],
                "wind_speed_10m_max": [18.7]
            }
        }"#;
        assert!(matches!(
            parse_forecast_response(body),
            Err(FetchError::Parse(_))
        ));
    }

    #[test]
    fn test_forecast_url_carries_all_daily_variables() {
        let url = build_forecast_url(51.5072, -0.1276);
        assert!(url.starts_with("https://api.open-meteo.com/v1/forecast?"));
        assert!(url.contains("latitude=51.5072"));
        assert!(url.contains("longitude=-0.1276"));
        assert!(url.contains("timezone=auto"));
        for variable in DAILY_VARIABLES {
            assert!(url.contains(variable), "URL missing '{}'", variable);
        }
    }
}
