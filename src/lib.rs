//! City weather ETL and dashboard service.
//!
//! A linear extract-transform-load pipeline against the Open-Meteo
//! forecast API, plus a thin read-and-render dashboard over the same
//! PostgreSQL store:
//!
//! - `cities` — static city → coordinates configuration (`cities.toml`)
//! - `ingest::open_meteo` — blocking forecast API client
//! - `classify` — rain/wind intensity breakpoint classification
//! - `pipeline` — per-city record assembly with partial-failure policy
//! - `db` — credentials, schema, and the transactional batch upsert
//! - `dashboard` — store reads and single-page HTML rendering
//! - `verify` — configuration checks against the live API
//! - `logging` — leveled operator logging
//!
//! Ingestion and dashboard rendering are separate process invocations;
//! they share nothing but the store.

pub mod cities;
pub mod classify;
pub mod dashboard;
pub mod db;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod verify;
