//! Weather joining: maps calendar days to daily observations, cache-first.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::cache::{Cache, Entry, WEATHER_TTL_SECS, weather_key};
use crate::records::format_api_date;
use crate::services::weather_api::{Coordinates, WeatherProvider};

/// One day's weather as rendered in the reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherObservation {
    pub date: NaiveDate,
    /// Mean temperature, °C, rounded to the nearest degree.
    pub temperature: i32,
    pub description: String,
    pub icon: String,
    /// Precipitation sum, mm, one decimal.
    pub precipitation: f64,
    /// Maximum wind speed, km/h, one decimal.
    pub wind_speed: f64,
}

/// Rejected date ranges; checked before any network call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("start date must be before end date")]
    EmptySpan,
    #[error("date range cannot exceed one year")]
    SpanTooLong,
}

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error(transparent)]
    Range(#[from] RangeError),
    #[error("weather fetch failed: {0}")]
    Fetch(anyhow::Error),
}

/// Validates a requested span: it must cover at least one full day and at
/// most a year.
pub fn validate_range(start: NaiveDate, end: NaiveDate) -> Result<(), RangeError> {
    let days = (end - start).num_days();
    if days <= 0 {
        return Err(RangeError::EmptySpan);
    }
    if days > 365 {
        return Err(RangeError::SpanTooLong);
    }
    Ok(())
}

/// Translates a WMO weather interpretation code into a display pair.
///
/// | Code  | Description  | Icon |
/// |-------|--------------|------|
/// | 0     | Clear sky    | 01d  |
/// | 1     | Mainly clear | 02d  |
/// | 2     | Partly cloudy| 03d  |
/// | 3     | Overcast     | 04d  |
/// | 45–48 | Foggy        | 50d  |
/// | 51–55 | Drizzle      | 09d  |
/// | 61–65 | Rain         | 10d  |
/// | 71–77 | Snow         | 13d  |
/// | 80–82 | Rain showers | 09d  |
/// | 85–86 | Snow showers | 13d  |
/// | 95–99 | Thunderstorm | 11d  |
/// | other | Unknown      | 03d  |
pub fn describe_weather_code(code: i64) -> (&'static str, &'static str) {
    match code {
        0 => ("Clear sky", "01d"),
        1 => ("Mainly clear", "02d"),
        2 => ("Partly cloudy", "03d"),
        3 => ("Overcast", "04d"),
        45..=48 => ("Foggy", "50d"),
        51..=55 => ("Drizzle", "09d"),
        61..=65 => ("Rain", "10d"),
        71..=77 => ("Snow", "13d"),
        80..=82 => ("Rain showers", "09d"),
        85..=86 => ("Snow showers", "13d"),
        95..=99 => ("Thunderstorm", "11d"),
        _ => ("Unknown", "03d"),
    }
}

/// Observations for every day in `[start, end]`, cache-first.
///
/// Days with a fresh cache entry are served locally; if any day misses, one
/// archive request covering the whole span is issued and the fetched days
/// are written back through the cache. Range validation happens before any
/// network traffic.
pub async fn weather_for_range<P, C>(
    provider: &P,
    cache: &mut C,
    location: Coordinates,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<BTreeMap<NaiveDate, WeatherObservation>, WeatherError>
where
    P: WeatherProvider,
    C: Cache,
{
    validate_range(start, end)?;

    let mut observations = BTreeMap::new();
    let mut misses = 0usize;

    let mut day = start;
    while day <= end {
        let key = weather_key(&format_api_date(day));
        match cache.get(&key) {
            Some(entry) if entry.is_fresh(WEATHER_TTL_SECS) => {
                if let Ok(observation) = entry.decode::<WeatherObservation>() {
                    observations.insert(day, observation);
                } else {
                    misses += 1;
                }
            }
            _ => misses += 1,
        }
        day = day.succ_opt().ok_or(RangeError::EmptySpan)?;
    }

    if misses == 0 {
        debug!(days = observations.len(), "Weather served entirely from cache");
        return Ok(observations);
    }

    info!(misses, start = %start, end = %end, "Fetching weather archive range");
    let fetched = provider
        .daily_range(location, start, end)
        .await
        .map_err(WeatherError::Fetch)?;

    for provided in fetched {
        let Some(mean_temperature) = provided.mean_temperature else {
            continue;
        };
        let (description, icon) = describe_weather_code(provided.weather_code.unwrap_or(-1));

        let observation = WeatherObservation {
            date: provided.date,
            temperature: mean_temperature.round() as i32,
            description: description.to_string(),
            icon: icon.to_string(),
            precipitation: round_one_decimal(provided.precipitation_sum.unwrap_or(0.0)),
            wind_speed: round_one_decimal(provided.max_wind_speed.unwrap_or(0.0)),
        };

        let key = weather_key(&format_api_date(provided.date));
        if let Ok(entry) = Entry::new(&observation) {
            cache.put(&key, entry);
        }
        observations.insert(provided.date, observation);
    }

    Ok(observations)
}

/// Observation for a single day, widening the request to the minimum valid
/// two-day span and keeping only the requested date.
pub async fn weather_for_day<P, C>(
    provider: &P,
    cache: &mut C,
    location: Coordinates,
    date: NaiveDate,
) -> Result<Option<WeatherObservation>, WeatherError>
where
    P: WeatherProvider,
    C: Cache,
{
    let end = date.succ_opt().ok_or(RangeError::EmptySpan)?;
    let mut observations = weather_for_range(provider, cache, location, date, end).await?;
    Ok(observations.remove(&date))
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
