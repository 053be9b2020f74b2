//! Trait and types for interacting with a daily-weather archive provider.

use anyhow::Result;
use chrono::NaiveDate;

/// A venue location in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Default for Coordinates {
    /// The venue's location; Brussels.
    fn default() -> Self {
        Self {
            latitude: 50.8503,
            longitude: 4.3517,
        }
    }
}

/// One day of raw archive data as the provider reports it.
///
/// Fields are optional because archives backfill with nulls for days they
/// have not observed yet; translation into display observations happens in
/// the weather joiner.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderDay {
    pub date: NaiveDate,
    pub mean_temperature: Option<f64>,
    pub weather_code: Option<i64>,
    pub precipitation_sum: Option<f64>,
    pub max_wind_speed: Option<f64>,
}

/// Abstraction over a historical daily-weather archive (e.g., Open-Meteo).
#[async_trait::async_trait]
pub trait WeatherProvider {
    /// Returns one entry per day in `[start, end]`, inclusive.
    async fn daily_range(
        &self,
        location: Coordinates,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ProviderDay>>;
}
