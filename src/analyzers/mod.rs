//! Record aggregation and derived-metric computation.
//!
//! This module rolls hourly visitor records into daily totals and
//! weekday-hour averages, computes the dashboard metrics (capture rate,
//! conversion, dwell time, accuracy, gender split), and assembles the
//! report rows consumed by the presentation layer.

pub mod bucketing;
pub mod hours;
pub mod metrics;
pub mod report;
pub mod types;
pub mod utility;
