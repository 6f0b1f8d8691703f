//! City configuration.
//!
//! Loads the static city → coordinates mapping from `cities.toml`. The
//! file is read once per run and the resulting list is immutable for the
//! run's duration. A malformed file is a fatal startup error — ingestion
//! must not start against a partial city set.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::error::Error;
use std::path::Path;

/// Default configuration path, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "cities.toml";

/// One configured city with its WGS84 coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct CityConfig {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Deserialize)]
struct CitiesFile {
    cities: BTreeMap<String, Coordinates>,
}

#[derive(Debug, Deserialize)]
struct Coordinates {
    latitude: f64,
    longitude: f64,
}

/// Parses city configuration from TOML text.
///
/// Cities come back sorted by name so a run processes them in a
/// deterministic order regardless of file layout.
pub fn parse_cities(text: &str) -> Result<Vec<CityConfig>, toml::de::Error> {
    let file: CitiesFile = toml::from_str(text)?;
    Ok(file
        .cities
        .into_iter()
        .map(|(name, coords)| CityConfig {
            name,
            latitude: coords.latitude,
            longitude: coords.longitude,
        })
        .collect())
}

/// Loads city configuration from `path`.
///
/// An unreadable file, a parse error, or an empty city set is fatal:
/// the caller is expected to abort before any network or store activity.
pub fn load_cities(path: &Path) -> Result<Vec<CityConfig>, Box<dyn Error>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    let cities = parse_cities(&text)
        .map_err(|e| format!("Failed to parse {}: {}", path.display(), e))?;
    if cities.is_empty() {
        return Err(format!("{} defines no cities", path.display()).into());
    }
    Ok(cities)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
