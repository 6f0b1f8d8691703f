//! Configuration verification.
//!
//! Probes every configured city against the live Open-Meteo API to
//! confirm it resolves to a daily forecast series. Intended for
//! operators after editing `cities.toml`, before the next scheduled
//! ingestion run.

use std::error::Error;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cities::CityConfig;
use crate::ingest::open_meteo;
use crate::model::FetchError;

// ============================================================================
// Verification results
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum VerificationStatus {
    Success,
    PartialSuccess,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CityVerification {
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
    pub status: VerificationStatus,
    pub days_returned: usize,
    pub error_message: Option<String>,
}

// ============================================================================
// Verification runner
// ============================================================================

/// Probes one city against the live API.
pub fn verify_city(client: &reqwest::blocking::Client, city: &CityConfig) -> CityVerification {
    let mut result = CityVerification {
        city: city.name.clone(),
        latitude: city.latitude,
        longitude: city.longitude,
        status: VerificationStatus::Failed,
        days_returned: 0,
        error_message: None,
    };

    match open_meteo::fetch_daily(client, city) {
        Ok(series) => {
            result.days_returned = series.len();
            result.status = VerificationStatus::Success;
        }
        Err(FetchError::EmptySeries) => {
            // API responded for these coordinates but carried no days;
            // likely a coordinate typo rather than an outage.
            result.status = VerificationStatus::PartialSuccess;
            result.error_message = Some(FetchError::EmptySeries.to_string());
        }
        Err(e) => {
            result.error_message = Some(e.to_string());
        }
    }

    result
}

/// Probes every configured city and prints per-city progress.
pub fn run_verification(cities: &[CityConfig]) -> Result<Vec<CityVerification>, Box<dyn Error>> {
    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()?;

    let mut results = Vec::new();

    println!("🔍 Verifying configured cities against Open-Meteo...");
    for city in cities {
        print!("  {} ... ", city.name);
        let result = verify_city(&client, city);

        match result.status {
            VerificationStatus::Success => {
                println!("✓ OK ({} days)", result.days_returned);
            }
            VerificationStatus::PartialSuccess => {
                println!("⚠ Responsive but no daily data");
            }
            VerificationStatus::Failed => {
                println!(
                    "✗ FAILED: {}",
                    result.error_message.as_deref().unwrap_or("Unknown")
                );
            }
        }

        results.push(result);
    }

    Ok(results)
}

/// Prints the summary block and returns the number of failed cities.
pub fn print_summary(results: &[CityVerification]) -> usize {
    let total = results.len();
    let working = results
        .iter()
        .filter(|r| r.status != VerificationStatus::Failed)
        .count();
    let failed = total - working;

    println!();
    println!("📊 Verification summary: {}/{} cities working ({} failed)", working, total, failed);
    for result in results.iter().filter(|r| r.status == VerificationStatus::Failed) {
        println!(
            "   - {}: {}",
            result.city,
            result.error_message.as_deref().unwrap_or("Unknown")
        );
    }

    failed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_summary_counts_failures() {
        let results = vec![
            CityVerification {
                city: "London".to_string(),
                latitude: 51.5,
                longitude: -0.13,
                status: VerificationStatus::Success,
                days_returned: 7,
                error_message: None,
            },
            CityVerification {
                city: "Atlantis".to_string(),
                latitude: 0.0,
                longitude: 0.0,
                status: VerificationStatus::Failed,
                days_returned: 0,
                error_message: Some("HTTP error: 400".to_string()),
            },
        ];
        assert_eq!(print_summary(&results), 1);
    }

    #[test]
    fn test_partial_success_is_not_counted_as_failed() {
        let results = vec![CityVerification {
            city: "London".to_string(),
            latitude: 51.5,
            longitude: -0.13,
            status: VerificationStatus::PartialSuccess,
            days_returned: 0,
            error_message: Some("Response contained no daily entries".to_string()),
        }];
        assert_eq!(print_summary(&results), 0);
    }
}
