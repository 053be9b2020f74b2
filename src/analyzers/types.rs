//! Data types produced by the aggregation pipeline.

use chrono::NaiveDate;
use serde::Serialize;

use crate::records::VisitorRecord;
use crate::weather::WeatherObservation;

/// Sums of every numeric record field over one calendar day.
///
/// Derived on demand from the record set; never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyAggregate {
    pub date: NaiveDate,
    pub entering_visitors: u32,
    pub leaving_visitors: u32,
    pub entering_men: u32,
    pub leaving_men: u32,
    pub entering_women: u32,
    pub leaving_women: u32,
    pub entering_groups: u32,
    pub leaving_groups: u32,
    pub passersby: u32,
}

impl DailyAggregate {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            entering_visitors: 0,
            leaving_visitors: 0,
            entering_men: 0,
            leaving_men: 0,
            entering_women: 0,
            leaving_women: 0,
            entering_groups: 0,
            leaving_groups: 0,
            passersby: 0,
        }
    }

    /// Adds one hourly record into the day's totals.
    pub fn absorb(&mut self, record: &VisitorRecord) {
        self.entering_visitors += record.entering_visitors;
        self.leaving_visitors += record.leaving_visitors;
        self.entering_men += record.entering_men;
        self.leaving_men += record.leaving_men;
        self.entering_women += record.entering_women;
        self.leaving_women += record.leaving_women;
        self.entering_groups += record.entering_groups;
        self.leaving_groups += record.leaving_groups;
        self.passersby += record.passersby;
    }
}

/// Rounded per-field averages for one hour of a given weekday, taken across
/// every historical day sharing that weekday.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekdayHourlyAverage {
    pub hour: u32,
    pub entering_visitors: u32,
    pub leaving_visitors: u32,
    pub entering_men: u32,
    pub leaving_men: u32,
    pub entering_women: u32,
    pub leaving_women: u32,
    pub entering_groups: u32,
    pub leaving_groups: u32,
    pub passersby: u32,
    /// Number of historical samples that contributed to the averages.
    pub samples: usize,
}

/// One row of the hourly table: the record itself plus per-row rates and
/// the running in/out totals for its day.
#[derive(Debug, Clone, Serialize)]
pub struct HourlyRow {
    pub timestamp: String,
    pub entering_visitors: u32,
    pub leaving_visitors: u32,
    pub entering_men: u32,
    pub leaving_men: u32,
    pub entering_women: u32,
    pub leaving_women: u32,
    pub entering_groups: u32,
    pub leaving_groups: u32,
    pub passersby: u32,
    pub capture_rate: f64,
    pub conversion_rate: f64,
    pub accumulated_entering: u32,
    pub accumulated_leaving: u32,
    pub live_visitors: u32,
}

/// One row of the daily rollup table: aggregate totals, derived metrics,
/// and the joined weather observation when one is available.
#[derive(Debug, Clone, Serialize)]
pub struct DailyReport {
    pub date: NaiveDate,
    pub entering_visitors: u32,
    pub leaving_visitors: u32,
    pub entering_men: u32,
    pub leaving_men: u32,
    pub entering_women: u32,
    pub leaving_women: u32,
    pub entering_groups: u32,
    pub leaving_groups: u32,
    pub passersby: u32,
    pub capture_rate: f64,
    pub business_hours_capture_rate: f64,
    pub conversion_rate: f64,
    pub accuracy: f64,
    pub dwell_minutes: f64,
    pub gender_split: String,
    pub weather_description: Option<String>,
    pub weather_icon: Option<String>,
    pub temperature_c: Option<i32>,
    pub precipitation_mm: Option<f64>,
    pub wind_speed_kmh: Option<f64>,
}

impl DailyReport {
    pub fn set_weather(&mut self, weather: Option<WeatherObservation>) {
        match weather {
            Some(obs) => {
                self.weather_description = Some(obs.description);
                self.weather_icon = Some(obs.icon);
                self.temperature_c = Some(obs.temperature);
                self.precipitation_mm = Some(obs.precipitation);
                self.wind_speed_kmh = Some(obs.wind_speed);
            }
            None => {
                self.weather_description = None;
                self.weather_icon = None;
                self.temperature_c = None;
                self.precipitation_mm = None;
                self.wind_speed_kmh = None;
            }
        }
    }
}

/// Outcome of comparing one metric between a primary and a benchmark row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparison {
    Favorable,
    Unfavorable,
    Even,
}

/// Per-metric markers for the two sides of a comparison.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ComparedMetric {
    pub primary: Comparison,
    pub benchmark: Comparison,
}

/// A primary day next to a benchmark (another date or a weekday average),
/// with each compared metric marked independently.
#[derive(Debug, Clone, Serialize)]
pub struct DayComparison {
    pub primary: DailyReport,
    pub benchmark: DailyReport,
    pub benchmark_label: String,
    pub entering_visitors: ComparedMetric,
    pub capture_rate: ComparedMetric,
    pub conversion_rate: ComparedMetric,
    pub dwell_minutes: ComparedMetric,
}

/// Capture rate over one intra-day hour window.
#[derive(Debug, Clone, Serialize)]
pub struct PeriodRate {
    pub name: String,
    pub start_hour: u32,
    pub end_hour: u32,
    pub capture_rate: f64,
    pub benchmark_rate: Option<f64>,
}

/// One ranked day in a top-performers list.
#[derive(Debug, Clone, Serialize)]
pub struct TopDay {
    pub date: NaiveDate,
    pub value: f64,
}

/// Best days by raw footfall and by capture rate.
#[derive(Debug, Clone, Serialize)]
pub struct TopDays {
    pub by_visitors: Vec<TopDay>,
    pub by_capture_rate: Vec<TopDay>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Ok,
}

/// A single data-quality finding.
#[derive(Debug, Clone, Serialize)]
pub struct Finding {
    pub severity: Severity,
    pub message: String,
}

/// Data-quality findings over the normalized record set.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub findings: Vec<Finding>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.findings
            .iter()
            .all(|f| f.severity == Severity::Ok)
    }
}
