//! Temporal bucketing: daily rollups and weekday-hour averages.

use std::collections::BTreeMap;

use chrono::{NaiveDate, Weekday};

use crate::analyzers::types::{DailyAggregate, WeekdayHourlyAverage};
use crate::records::{VisitorRecord, format_display_date};

/// Rolls the record set into one [`DailyAggregate`] per distinct calendar
/// day, ascending by date.
///
/// Sums are commutative, so input order does not matter. Grouping is by the
/// formatted display date, which maps one-to-one onto the naive calendar
/// date used as the map key.
pub fn daily_aggregates(records: &[VisitorRecord]) -> Vec<DailyAggregate> {
    let mut days: BTreeMap<NaiveDate, DailyAggregate> = BTreeMap::new();

    for record in records {
        days.entry(record.date())
            .or_insert_with(|| DailyAggregate::new(record.date()))
            .absorb(record);
    }

    days.into_values().collect()
}

/// Returns the records belonging to `date`, matched by formatted date key.
pub fn records_for_day<'a>(records: &'a [VisitorRecord], date: NaiveDate) -> Vec<&'a VisitorRecord> {
    let key = format_display_date(date);
    records.iter().filter(|r| r.day_key() == key).collect()
}

#[derive(Default)]
struct HourTotals {
    entering_visitors: u64,
    leaving_visitors: u64,
    entering_men: u64,
    leaving_men: u64,
    entering_women: u64,
    leaving_women: u64,
    entering_groups: u64,
    leaving_groups: u64,
    passersby: u64,
    samples: usize,
}

/// Averages every numeric field per hour across all historical records
/// falling on `weekday`, rounded to the nearest integer.
///
/// Hours with no matching records simply do not appear; every emitted row
/// has at least one contributing sample.
pub fn weekday_hourly_averages(
    records: &[VisitorRecord],
    weekday: Weekday,
) -> Vec<WeekdayHourlyAverage> {
    let mut hours: BTreeMap<u32, HourTotals> = BTreeMap::new();

    for record in records.iter().filter(|r| r.weekday() == weekday) {
        let totals = hours.entry(record.hour()).or_default();
        totals.entering_visitors += record.entering_visitors as u64;
        totals.leaving_visitors += record.leaving_visitors as u64;
        totals.entering_men += record.entering_men as u64;
        totals.leaving_men += record.leaving_men as u64;
        totals.entering_women += record.entering_women as u64;
        totals.leaving_women += record.leaving_women as u64;
        totals.entering_groups += record.entering_groups as u64;
        totals.leaving_groups += record.leaving_groups as u64;
        totals.passersby += record.passersby as u64;
        totals.samples += 1;
    }

    hours
        .into_iter()
        .map(|(hour, totals)| WeekdayHourlyAverage {
            hour,
            entering_visitors: round_avg(totals.entering_visitors, totals.samples),
            leaving_visitors: round_avg(totals.leaving_visitors, totals.samples),
            entering_men: round_avg(totals.entering_men, totals.samples),
            leaving_men: round_avg(totals.leaving_men, totals.samples),
            entering_women: round_avg(totals.entering_women, totals.samples),
            leaving_women: round_avg(totals.leaving_women, totals.samples),
            entering_groups: round_avg(totals.entering_groups, totals.samples),
            leaving_groups: round_avg(totals.leaving_groups, totals.samples),
            passersby: round_avg(totals.passersby, totals.samples),
            samples: totals.samples,
        })
        .collect()
}

/// Builds a synthetic day of hourly records on `date` from that weekday's
/// historical averages, for use as a benchmark.
pub fn synthesize_average_day(records: &[VisitorRecord], date: NaiveDate) -> Vec<VisitorRecord> {
    use chrono::Datelike;

    weekday_hourly_averages(records, date.weekday())
        .into_iter()
        .map(|avg| VisitorRecord {
            timestamp: date
                .and_hms_opt(avg.hour, 0, 0)
                .expect("hour taken from a valid timestamp"),
            entering_visitors: avg.entering_visitors,
            leaving_visitors: avg.leaving_visitors,
            entering_men: avg.entering_men,
            leaving_men: avg.leaving_men,
            entering_women: avg.entering_women,
            leaving_women: avg.leaving_women,
            entering_groups: avg.entering_groups,
            leaving_groups: avg.leaving_groups,
            passersby: avg.passersby,
        })
        .collect()
}

fn round_avg(sum: u64, samples: usize) -> u32 {
    (sum as f64 / samples as f64).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(day: u32, month: u32, hour: u32, entering: u32, passersby: u32) -> VisitorRecord {
        VisitorRecord {
            timestamp: NaiveDate::from_ymd_opt(2024, month, day)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
            entering_visitors: entering,
            leaving_visitors: 0,
            entering_men: 0,
            leaving_men: 0,
            entering_women: 0,
            leaving_women: 0,
            entering_groups: 0,
            leaving_groups: 0,
            passersby,
        }
    }

    #[test]
    fn test_daily_aggregates_sum_all_fields() {
        let records = vec![record(1, 1, 9, 10, 50), record(1, 1, 10, 5, 20)];
        let days = daily_aggregates(&records);

        assert_eq!(days.len(), 1);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(days[0].entering_visitors, 15);
        assert_eq!(days[0].passersby, 70);
    }

    #[test]
    fn test_daily_aggregates_are_order_independent() {
        let a = vec![record(1, 1, 9, 10, 50), record(2, 1, 9, 3, 5), record(1, 1, 10, 5, 20)];
        let mut b = a.clone();
        b.reverse();

        assert_eq!(daily_aggregates(&a), daily_aggregates(&b));
    }

    #[test]
    fn test_daily_aggregates_sorted_ascending() {
        let records = vec![record(3, 1, 9, 1, 1), record(1, 1, 9, 1, 1), record(2, 1, 9, 1, 1)];
        let days = daily_aggregates(&records);

        let dates: Vec<u32> = days.iter().map(|d| chrono::Datelike::day(&d.date)).collect();
        assert_eq!(dates, vec![1, 2, 3]);
    }

    #[test]
    fn test_records_for_day_matches_formatted_key() {
        let records = vec![record(1, 1, 9, 10, 50), record(2, 1, 9, 3, 5)];
        let day = records_for_day(&records, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());

        assert_eq!(day.len(), 1);
        assert_eq!(day[0].entering_visitors, 10);
    }

    #[test]
    fn test_weekday_averages_round_to_nearest() {
        // 1 and 8 January 2024 are both Mondays.
        let records = vec![record(1, 1, 9, 10, 40), record(8, 1, 9, 20, 41)];
        let averages = weekday_hourly_averages(&records, Weekday::Mon);

        assert_eq!(averages.len(), 1);
        assert_eq!(averages[0].hour, 9);
        assert_eq!(averages[0].entering_visitors, 15);
        // 40.5 rounds away from zero.
        assert_eq!(averages[0].passersby, 41);
        assert_eq!(averages[0].samples, 2);
    }

    #[test]
    fn test_weekday_averages_ignore_other_weekdays() {
        // 2 January 2024 is a Tuesday.
        let records = vec![record(1, 1, 9, 10, 40), record(2, 1, 9, 100, 100)];
        let averages = weekday_hourly_averages(&records, Weekday::Mon);

        assert_eq!(averages.len(), 1);
        assert_eq!(averages[0].entering_visitors, 10);
    }

    #[test]
    fn test_synthesize_average_day_places_rows_on_date() {
        let records = vec![record(1, 1, 9, 10, 40), record(8, 1, 9, 20, 40)];
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let synthetic = synthesize_average_day(&records, date);

        assert_eq!(synthetic.len(), 1);
        assert_eq!(synthetic[0].date(), date);
        assert_eq!(synthetic[0].hour(), 9);
        assert_eq!(synthetic[0].entering_visitors, 15);
    }
}
