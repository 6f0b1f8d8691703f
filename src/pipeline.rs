//! The ingestion pipeline: per-city extraction and record assembly.
//!
//! Cities are processed one at a time, in configuration order. A failing
//! city is logged and excluded from the batch; the run continues — the
//! output batch is the union of the cities that succeeded. A run where
//! every city fails produces an empty batch, which the writer treats as
//! a no-op.

use crate::cities::CityConfig;
use crate::classify::{classify_rain, classify_wind};
use crate::ingest::open_meteo;
use crate::logging;
use crate::model::{DailySeries, FetchError, WeatherRecord};

/// Assembles one record per date index from a city's aligned raw series.
///
/// `temp_range_c` is `max - min` with no clamping or plausibility check;
/// inconsistent inputs produce a negative range, stored as-is. Status
/// labels are computed here and nowhere else.
pub fn build_records(city: &str, series: &DailySeries) -> Vec<WeatherRecord> {
    (0..series.len())
        .map(|i| {
            let max_temp_c = series.max_temp_c[i];
            let min_temp_c = series.min_temp_c[i];
            let rain_sum = series.rain_sum[i];
            let max_wind_speed_kmh = series.max_wind_speed_kmh[i];
            WeatherRecord {
                date: series.dates[i],
                city: city.to_string(),
                max_temp_c,
                min_temp_c,
                temp_range_c: max_temp_c - min_temp_c,
                rain_sum,
                max_wind_speed_kmh,
                rain_status: classify_rain(rain_sum).to_string(),
                wind_status: classify_wind(max_wind_speed_kmh).to_string(),
            }
        })
        .collect()
}

/// Runs the per-city extraction loop with the given fetch function.
///
/// Generic over the fetcher so the partial-failure policy is testable
/// without a network. No error escapes this loop: a per-city failure is
/// logged and that city's records are simply absent from the batch.
pub fn collect_batch<F>(cities: &[CityConfig], fetch: F) -> Vec<WeatherRecord>
where
    F: Fn(&CityConfig) -> Result<DailySeries, FetchError>,
{
    let mut batch = Vec::new();
    let mut failed = 0usize;

    for city in cities {
        match fetch(city) {
            Ok(series) => {
                logging::debug(
                    logging::DataSource::OpenMeteo,
                    Some(city.name.as_str()),
                    &format!("{} daily entries", series.len()),
                );
                batch.extend(build_records(&city.name, &series));
            }
            Err(err) => {
                failed += 1;
                logging::log_fetch_failure(&city.name, "daily forecast fetch", &err);
            }
        }
    }

    logging::log_ingest_summary(cities.len(), cities.len() - failed, failed);
    batch
}

/// Production entry point: fetches every configured city from Open-Meteo.
pub fn run_ingestion(
    cities: &[CityConfig],
    client: &reqwest::blocking::Client,
) -> Vec<WeatherRecord> {
    collect_batch(cities, |city| open_meteo::fetch_daily(client, city))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, day).unwrap()
    }

    fn sample_series() -> DailySeries {
        DailySeries {
            dates: vec![date(5), date(6)],
            max_temp_c: vec![21.4, 19.8],
            min_temp_c: vec![12.0, 11.3],
            rain_sum: vec![0.0, 4.2],
            max_wind_speed_kmh: vec![18.7, 31.0],
        }
    }

    fn city(name: &str) -> CityConfig {
        CityConfig {
            name: name.to_string(),
            latitude: 0.0,
            longitude: 0.0,
        }
    }

    #[test]
    fn test_build_records_one_per_date_index() {
        let records = build_records("London", &sample_series());
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].date, date(5));
        assert_eq!(records[1].date, date(6));
        assert!(records.iter().all(|r| r.city == "London"));
    }

    #[test]
    fn test_temp_range_is_max_minus_min() {
        let records = build_records("London", &sample_series());
        for record in &records {
            assert_eq!(record.temp_range_c, record.max_temp_c - record.min_temp_c);
        }
        assert!((records[0].temp_range_c - 9.4).abs() < 1e-9);
    }

    #[test]
    fn test_temp_range_may_be_negative_when_inputs_are_inconsistent() {
        // min above max is not validated; the negative range is kept.
        let series = DailySeries {
            dates: vec![date(5)],
            max_temp_c: vec![10.0],
            min_temp_c: vec![15.0],
            rain_sum: vec![0.0],
            max_wind_speed_kmh: vec![5.0],
        };
        let records = build_records("Oslo", &series);
        assert_eq!(records[0].temp_range_c, -5.0);
    }

    #[test]
    fn test_statuses_follow_the_classifier_tables() {
        let records = build_records("London", &sample_series());
        assert_eq!(records[0].rain_status, "No Rain");
        assert_eq!(records[0].wind_status, "Gentle Breeze");
        assert_eq!(records[1].rain_status, "Moderate Rain");
        assert_eq!(records[1].wind_status, "Fresh Breeze");
    }

    #[test]
    fn test_empty_series_builds_no_records() {
        let series = DailySeries {
            dates: vec![],
            max_temp_c: vec![],
            min_temp_c: vec![],
            rain_sum: vec![],
            max_wind_speed_kmh: vec![],
        };
        assert!(build_records("London", &series).is_empty());
    }

    #[test]
    fn test_one_failing_city_does_not_abort_the_batch() {
        // City B throws; the batch must contain exactly A and C.
        let cities = vec![city("Athens"), city("Bergen"), city("Cairo")];
        let batch = collect_batch(&cities, |c| {
            if c.name == "Bergen" {
                Err(FetchError::Http(503))
            } else {
                Ok(sample_series())
            }
        });

        assert_eq!(batch.len(), 4); // 2 days × 2 surviving cities
        assert!(batch.iter().any(|r| r.city == "Athens"));
        assert!(batch.iter().any(|r| r.city == "Cairo"));
        assert!(!batch.iter().any(|r| r.city == "Bergen"));
    }

    #[test]
    fn test_all_cities_failing_yields_an_empty_batch() {
        let cities = vec![city("Athens"), city("Bergen")];
        let batch = collect_batch(&cities, |_| {
            Err(FetchError::Request("connection refused".to_string()))
        });
        assert!(batch.is_empty());
    }

    #[test]
    fn test_batch_preserves_configuration_order() {
        let cities = vec![city("Athens"), city("Cairo")];
        let batch = collect_batch(&cities, |_| Ok(sample_series()));
        assert_eq!(batch[0].city, "Athens");
        assert_eq!(batch[2].city, "Cairo");
    }
}
