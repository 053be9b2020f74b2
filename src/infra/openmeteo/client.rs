use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::records::format_api_date;
use crate::services::weather_api::{Coordinates, ProviderDay, WeatherProvider};

const DAILY_VARIABLES: &str =
    "temperature_2m_mean,weathercode,precipitation_sum,windspeed_10m_max";

#[derive(Deserialize)]
struct ArchiveResponse {
    daily: Option<DailyArrays>,
}

/// The archive answers with parallel per-day arrays.
#[derive(Deserialize)]
struct DailyArrays {
    time: Vec<NaiveDate>,
    #[serde(default)]
    temperature_2m_mean: Vec<Option<f64>>,
    #[serde(default)]
    weathercode: Vec<Option<i64>>,
    #[serde(default)]
    precipitation_sum: Vec<Option<f64>>,
    #[serde(default)]
    windspeed_10m_max: Vec<Option<f64>>,
}

pub struct OpenMeteoClient {
    base_url: String,
}

impl OpenMeteoClient {
    pub fn new() -> Self {
        Self {
            base_url: "https://archive-api.open-meteo.com".to_string(),
        }
    }

    /// Points the client at a different host, for tests.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl Default for OpenMeteoClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoClient {
    async fn daily_range(
        &self,
        location: Coordinates,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ProviderDay>> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        let url = format!("{}/v1/archive", self.base_url);
        let response = client
            .get(&url)
            .query(&[
                ("latitude", location.latitude.to_string()),
                ("longitude", location.longitude.to_string()),
                ("start_date", format_api_date(start)),
                ("end_date", format_api_date(end)),
                ("daily", DAILY_VARIABLES.to_string()),
                ("timezone", "auto".to_string()),
            ])
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to send archive request: {}", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "Archive API returned status {}: {}",
                status,
                body
            ));
        }

        let archive: ArchiveResponse = response
            .json()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to parse archive response: {}", e))?;

        let Some(daily) = archive.daily else {
            return Err(anyhow::anyhow!("Archive response carries no daily block"));
        };

        let days = daily
            .time
            .iter()
            .enumerate()
            .map(|(i, date)| ProviderDay {
                date: *date,
                mean_temperature: column(&daily.temperature_2m_mean, i),
                weather_code: column(&daily.weathercode, i),
                precipitation_sum: column(&daily.precipitation_sum, i),
                max_wind_speed: column(&daily.windspeed_10m_max, i),
            })
            .collect();

        Ok(days)
    }
}

fn column<T: Copy>(values: &[Option<T>], index: usize) -> Option<T> {
    values.get(index).copied().flatten()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_response_parses_parallel_arrays() {
        let body = r#"{
            "daily": {
                "time": ["2024-01-01", "2024-01-02"],
                "temperature_2m_mean": [4.2, null],
                "weathercode": [61, 3],
                "precipitation_sum": [0.8, 0.0],
                "windspeed_10m_max": [22.1, 10.4]
            }
        }"#;

        let archive: ArchiveResponse = serde_json::from_str(body).unwrap();
        let daily = archive.daily.unwrap();

        assert_eq!(daily.time.len(), 2);
        assert_eq!(column(&daily.temperature_2m_mean, 0), Some(4.2));
        assert_eq!(column(&daily.temperature_2m_mean, 1), None);
        assert_eq!(column(&daily.weathercode, 1), Some(3));
        // Out-of-range lookups stay None rather than panicking.
        assert_eq!(column(&daily.windspeed_10m_max, 5), None);
    }

    #[test]
    fn test_missing_daily_block_is_detected() {
        let archive: ArchiveResponse = serde_json::from_str("{}").unwrap();
        assert!(archive.daily.is_none());
    }
}
