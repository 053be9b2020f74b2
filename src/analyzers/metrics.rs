//! Derived-metric formulas.
//!
//! Every function here is a pure function of a day's records (or a pair of
//! totals); nothing carries state between calls.

use chrono::{Datelike, NaiveDate};

use crate::analyzers::bucketing::records_for_day;
use crate::analyzers::hours::opening_hours;
use crate::analyzers::types::Comparison;
use crate::analyzers::utility::pct;
use crate::records::VisitorRecord;

/// Percentage of passersby who entered. 0 when no passersby were recorded.
pub fn capture_rate(entering: u32, passersby: u32) -> f64 {
    pct(entering, passersby)
}

/// Percentage of entering visitors who arrived as part of a group, capped
/// at 100 because group-member counts can exceed the visitor total in noisy
/// sensor data. 0 when there were no entering visitors.
pub fn conversion_rate(groups_in: u32, visitors_in: u32) -> f64 {
    if visitors_in == 0 {
        return 0.0;
    }
    pct(groups_in, visitors_in).min(100.0)
}

/// How closely the entering and leaving counters agree, as a percentage.
///
/// Both zero counts agree perfectly (100); exactly one zero is a full
/// mismatch (0); otherwise the smaller count over the larger. Symmetric and
/// bounded to [0, 100].
pub fn accuracy(entering: u32, leaving: u32) -> f64 {
    if entering == 0 && leaving == 0 {
        return 100.0;
    }
    if entering == 0 || leaving == 0 {
        return 0.0;
    }
    entering.min(leaving) as f64 / entering.max(leaving) as f64 * 100.0
}

/// Capture rate over the records of `date` whose hour falls in
/// `[start_hour, end_hour)`.
pub fn period_capture_rate(
    records: &[VisitorRecord],
    date: NaiveDate,
    start_hour: u32,
    end_hour: u32,
) -> f64 {
    let window: Vec<&VisitorRecord> = records_for_day(records, date)
        .into_iter()
        .filter(|r| r.hour() >= start_hour && r.hour() < end_hour)
        .collect();

    let entering: u32 = window.iter().map(|r| r.entering_visitors).sum();
    let passersby: u32 = window.iter().map(|r| r.passersby).sum();

    capture_rate(entering, passersby)
}

/// Capture rate restricted to the venue's opening hours on `date`'s
/// weekday. 0 when no records fall inside the window.
pub fn business_hours_capture_rate(records: &[VisitorRecord], date: NaiveDate) -> f64 {
    let window = opening_hours(date.weekday());
    period_capture_rate(records, date, window.open, window.close)
}

/// Heuristic dwell-time estimate in minutes for one day.
///
/// For each hourly sample, the live-visitor estimate is the cumulative
/// entering count through that sample minus the cumulative leaving count
/// through the previous sample (leaving lags one sample), floored at zero.
/// The day's average live count is divided by the day's entering total and
/// scaled by 600. This approximates occupancy from flow counts; it is not a
/// measured visit duration.
pub fn dwell_time_minutes(records: &[VisitorRecord], date: NaiveDate) -> f64 {
    let mut day = records_for_day(records, date);
    day.sort_by_key(|r| r.timestamp);

    if day.is_empty() {
        return 0.0;
    }

    let mut cumulative_entering: u64 = 0;
    let mut cumulative_leaving: u64 = 0;
    let mut live_sum = 0.0;

    for record in &day {
        cumulative_entering += record.entering_visitors as u64;
        live_sum += cumulative_entering.saturating_sub(cumulative_leaving) as f64;
        cumulative_leaving += record.leaving_visitors as u64;
    }

    let average_live = live_sum / day.len() as f64;
    let total_entering: u64 = day.iter().map(|r| r.entering_visitors as u64).sum();

    if total_entering == 0 {
        return 0.0;
    }

    average_live / total_entering as f64 * 60.0 * 10.0
}

/// Men/women percentages among entering visitors, one decimal place.
/// `N/A` when the total is zero.
pub fn gender_split(men: u32, women: u32) -> String {
    let total = men + women;
    if total == 0 {
        return "N/A".to_string();
    }

    let men_pct = men as f64 / total as f64 * 100.0;
    let women_pct = women as f64 / total as f64 * 100.0;
    format!("♂ {men_pct:.1}% / ♀ {women_pct:.1}%")
}

/// Marks the two sides of a metric pair: the higher value is favorable,
/// the lower unfavorable, equal values are even.
pub fn compare_pair(primary: f64, benchmark: f64) -> (Comparison, Comparison) {
    if primary > benchmark {
        (Comparison::Favorable, Comparison::Unfavorable)
    } else if primary < benchmark {
        (Comparison::Unfavorable, Comparison::Favorable)
    } else {
        (Comparison::Even, Comparison::Even)
    }
}
