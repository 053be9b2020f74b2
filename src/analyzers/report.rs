//! Report assembly: turns records and aggregates into presentation rows.

use std::collections::{BTreeMap, HashMap};

use chrono::{NaiveDate, Weekday};

use crate::analyzers::bucketing::{
    daily_aggregates, records_for_day, synthesize_average_day,
};
use crate::analyzers::metrics;
use crate::analyzers::types::{
    ComparedMetric, DailyAggregate, DailyReport, DayComparison, Finding, HourlyRow, PeriodRate,
    Severity, TopDay, TopDays, ValidationReport,
};
use crate::records::VisitorRecord;
use crate::weather::WeatherObservation;

/// Fixed intra-day windows reported alongside the day analysis.
pub const FIXED_PERIODS: &[(&str, u32, u32)] = &[
    ("Morning", 7, 10),
    ("Noon", 12, 14),
    ("Afternoon", 16, 20),
];

/// Builds the hourly table rows in input order, tracking per-day running
/// totals and the floored live-visitor estimate. Leaving counts lag one
/// sample in the live estimate, mirroring the dwell-time heuristic.
pub fn hourly_rows(records: &[VisitorRecord]) -> Vec<HourlyRow> {
    let mut running: HashMap<String, (u32, u32)> = HashMap::new();

    records
        .iter()
        .map(|record| {
            let (entering_so_far, leaving_so_far) =
                running.get(&record.day_key()).copied().unwrap_or((0, 0));

            let accumulated_entering = entering_so_far + record.entering_visitors;
            let accumulated_leaving = leaving_so_far + record.leaving_visitors;
            let live_visitors = accumulated_entering.saturating_sub(leaving_so_far);

            running.insert(
                record.day_key(),
                (accumulated_entering, accumulated_leaving),
            );

            HourlyRow {
                timestamp: record.display_timestamp(),
                entering_visitors: record.entering_visitors,
                leaving_visitors: record.leaving_visitors,
                entering_men: record.entering_men,
                leaving_men: record.leaving_men,
                entering_women: record.entering_women,
                leaving_women: record.leaving_women,
                entering_groups: record.entering_groups,
                leaving_groups: record.leaving_groups,
                passersby: record.passersby,
                capture_rate: metrics::capture_rate(record.entering_visitors, record.passersby),
                conversion_rate: metrics::conversion_rate(
                    record.entering_groups,
                    record.entering_visitors,
                ),
                accumulated_entering,
                accumulated_leaving,
                live_visitors,
            }
        })
        .collect()
}

fn report_from_aggregate(
    records: &[VisitorRecord],
    aggregate: &DailyAggregate,
    weather: Option<WeatherObservation>,
) -> DailyReport {
    let mut report = DailyReport {
        date: aggregate.date,
        entering_visitors: aggregate.entering_visitors,
        leaving_visitors: aggregate.leaving_visitors,
        entering_men: aggregate.entering_men,
        leaving_men: aggregate.leaving_men,
        entering_women: aggregate.entering_women,
        leaving_women: aggregate.leaving_women,
        entering_groups: aggregate.entering_groups,
        leaving_groups: aggregate.leaving_groups,
        passersby: aggregate.passersby,
        capture_rate: metrics::capture_rate(aggregate.entering_visitors, aggregate.passersby),
        business_hours_capture_rate: metrics::business_hours_capture_rate(records, aggregate.date),
        conversion_rate: metrics::conversion_rate(
            aggregate.entering_groups,
            aggregate.entering_visitors,
        ),
        accuracy: metrics::accuracy(aggregate.entering_visitors, aggregate.leaving_visitors),
        dwell_minutes: metrics::dwell_time_minutes(records, aggregate.date),
        gender_split: metrics::gender_split(aggregate.entering_men, aggregate.entering_women),
        weather_description: None,
        weather_icon: None,
        temperature_c: None,
        precipitation_mm: None,
        wind_speed_kmh: None,
    };
    report.set_weather(weather);
    report
}

/// One report row per day present in the record set, ascending by date,
/// with weather joined by date where available.
pub fn daily_reports(
    records: &[VisitorRecord],
    weather: &BTreeMap<NaiveDate, WeatherObservation>,
) -> Vec<DailyReport> {
    daily_aggregates(records)
        .iter()
        .map(|aggregate| {
            report_from_aggregate(records, aggregate, weather.get(&aggregate.date).cloned())
        })
        .collect()
}

/// The report row for a single day. A date with no records yields an
/// all-zero row for that date.
pub fn day_report(
    records: &[VisitorRecord],
    date: NaiveDate,
    weather: Option<WeatherObservation>,
) -> DailyReport {
    let mut aggregate = DailyAggregate::new(date);
    for record in records_for_day(records, date) {
        aggregate.absorb(record);
    }
    report_from_aggregate(records, &aggregate, weather)
}

/// A benchmark row built from the weekday averages of `date`'s weekday:
/// the averages are materialized as a synthetic day and reported like a
/// real one, so dwell time and business-hours capture stay consistent.
pub fn weekday_average_report(
    records: &[VisitorRecord],
    date: NaiveDate,
    weather: Option<WeatherObservation>,
) -> DailyReport {
    let synthetic = synthesize_average_day(records, date);
    day_report(&synthetic, date, weather)
}

/// Human label for a weekday-average benchmark row.
pub fn weekday_average_label(weekday: Weekday) -> String {
    let name = match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    };
    format!("{name} Averages")
}

/// Pairs a primary report with a benchmark, marking each compared metric
/// independently: entering visitors, business-hours capture rate,
/// conversion, and dwell time.
pub fn compare_days(
    primary: DailyReport,
    benchmark: DailyReport,
    benchmark_label: String,
) -> DayComparison {
    let mark = |p: f64, b: f64| {
        let (primary, benchmark) = metrics::compare_pair(p, b);
        ComparedMetric { primary, benchmark }
    };

    DayComparison {
        entering_visitors: mark(
            primary.entering_visitors as f64,
            benchmark.entering_visitors as f64,
        ),
        capture_rate: mark(
            primary.business_hours_capture_rate,
            benchmark.business_hours_capture_rate,
        ),
        conversion_rate: mark(primary.conversion_rate, benchmark.conversion_rate),
        dwell_minutes: mark(primary.dwell_minutes, benchmark.dwell_minutes),
        primary,
        benchmark,
        benchmark_label,
    }
}

/// Where period capture rates for the benchmark side come from.
pub enum PeriodBenchmark<'a> {
    /// Another real date from the same record set.
    Date(NaiveDate),
    /// A synthesized record set (weekday averages) evaluated on the
    /// primary date.
    Records(&'a [VisitorRecord]),
}

/// Capture rates for the fixed periods plus an optional custom window,
/// with benchmark-side rates when a benchmark is selected.
pub fn period_rates(
    records: &[VisitorRecord],
    date: NaiveDate,
    benchmark: Option<&PeriodBenchmark<'_>>,
    custom: Option<(u32, u32)>,
) -> Vec<PeriodRate> {
    let mut windows: Vec<(String, u32, u32)> = FIXED_PERIODS
        .iter()
        .map(|(name, start, end)| (name.to_string(), *start, *end))
        .collect();
    if let Some((start, end)) = custom {
        windows.push(("Custom".to_string(), start, end));
    }

    windows
        .into_iter()
        .map(|(name, start_hour, end_hour)| {
            let benchmark_rate = benchmark.map(|b| match b {
                PeriodBenchmark::Date(benchmark_date) => {
                    metrics::period_capture_rate(records, *benchmark_date, start_hour, end_hour)
                }
                PeriodBenchmark::Records(synthetic) => {
                    metrics::period_capture_rate(synthetic, date, start_hour, end_hour)
                }
            });

            PeriodRate {
                name,
                start_hour,
                end_hour,
                capture_rate: metrics::period_capture_rate(records, date, start_hour, end_hour),
                benchmark_rate,
            }
        })
        .collect()
}

/// Top `count` days by entering visitors and by unrestricted capture rate.
pub fn top_days(records: &[VisitorRecord], count: usize) -> TopDays {
    let aggregates = daily_aggregates(records);

    let mut by_visitors: Vec<TopDay> = aggregates
        .iter()
        .map(|a| TopDay {
            date: a.date,
            value: a.entering_visitors as f64,
        })
        .collect();
    by_visitors.sort_by(|a, b| b.value.total_cmp(&a.value));
    by_visitors.truncate(count);

    let mut by_capture_rate: Vec<TopDay> = aggregates
        .iter()
        .map(|a| TopDay {
            date: a.date,
            value: metrics::capture_rate(a.entering_visitors, a.passersby),
        })
        .collect();
    by_capture_rate.sort_by(|a, b| b.value.total_cmp(&a.value));
    by_capture_rate.truncate(count);

    TopDays {
        by_visitors,
        by_capture_rate,
    }
}

/// Data-quality findings over the normalized record set.
pub fn validate(records: &[VisitorRecord]) -> ValidationReport {
    let mut findings = Vec::new();

    if records.is_empty() {
        findings.push(Finding {
            severity: Severity::Error,
            message: "No data available".to_string(),
        });
        return ValidationReport { findings };
    }

    let inconsistent = records.iter().any(|r| {
        r.entering_men + r.entering_women > r.entering_visitors
            || r.leaving_men + r.leaving_women > r.leaving_visitors
    });
    if inconsistent {
        findings.push(Finding {
            severity: Severity::Warning,
            message: "Inconsistent visitor counts detected".to_string(),
        });
    }

    if findings.is_empty() {
        findings.push(Finding {
            severity: Severity::Ok,
            message: format!("All {} records passed validation", records.len()),
        });
    }

    ValidationReport { findings }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(day: u32, hour: u32, values: [u32; 9]) -> VisitorRecord {
        VisitorRecord {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, day)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
            entering_visitors: values[0],
            leaving_visitors: values[1],
            entering_men: values[2],
            leaving_men: values[3],
            entering_women: values[4],
            leaving_women: values[5],
            entering_groups: values[6],
            leaving_groups: values[7],
            passersby: values[8],
        }
    }

    #[test]
    fn test_hourly_rows_running_totals_reset_per_day() {
        let records = vec![
            record(1, 9, [10, 2, 6, 1, 4, 1, 3, 1, 50]),
            record(1, 10, [5, 3, 3, 2, 2, 1, 1, 1, 20]),
            record(2, 9, [7, 0, 4, 0, 3, 0, 0, 0, 10]),
        ];
        let rows = hourly_rows(&records);

        assert_eq!(rows[0].accumulated_entering, 10);
        assert_eq!(rows[0].live_visitors, 10);
        assert_eq!(rows[1].accumulated_entering, 15);
        assert_eq!(rows[1].accumulated_leaving, 5);
        // Leaving lags one sample: only the first sample's 2 are out.
        assert_eq!(rows[1].live_visitors, 13);
        // New day starts fresh.
        assert_eq!(rows[2].accumulated_entering, 7);
        assert_eq!(rows[2].live_visitors, 7);
    }

    #[test]
    fn test_day_report_end_to_end_scenario() {
        let records = vec![
            record(1, 9, [10, 2, 6, 1, 4, 1, 3, 1, 50]),
            record(1, 10, [5, 3, 3, 2, 2, 1, 1, 1, 20]),
        ];
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let report = day_report(&records, date, None);

        assert_eq!(report.entering_visitors, 15);
        assert_eq!(report.passersby, 70);
        assert!((report.capture_rate - 21.428571428571427).abs() < 1e-9);
    }

    #[test]
    fn test_weekday_average_report_totals() {
        // Two Mondays, one hour each: entering 10 and 20 average to 15.
        let records = vec![
            record(1, 9, [10, 0, 5, 0, 5, 0, 0, 0, 40]),
            record(8, 9, [20, 0, 10, 0, 10, 0, 0, 0, 40]),
        ];
        let date = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap();
        let report = weekday_average_report(&records, date, None);

        assert_eq!(report.entering_visitors, 15);
        assert_eq!(report.passersby, 40);
    }

    #[test]
    fn test_compare_days_marks_each_metric_independently() {
        let records = vec![
            record(1, 9, [10, 10, 5, 5, 5, 5, 8, 0, 100]),
            record(2, 9, [20, 20, 10, 10, 10, 10, 2, 0, 100]),
        ];
        let first = day_report(&records, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), None);
        let second = day_report(&records, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(), None);
        let comparison = compare_days(first, second, "2/01/2024".to_string());

        use crate::analyzers::types::Comparison::*;
        // Fewer visitors on day one, but a better conversion rate.
        assert_eq!(comparison.entering_visitors.primary, Unfavorable);
        assert_eq!(comparison.entering_visitors.benchmark, Favorable);
        assert_eq!(comparison.conversion_rate.primary, Favorable);
        assert_eq!(comparison.conversion_rate.benchmark, Unfavorable);
    }

    #[test]
    fn test_period_rates_include_custom_window() {
        let records = vec![record(1, 9, [10, 0, 5, 0, 5, 0, 0, 0, 100])];
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

        let rates = period_rates(&records, date, None, Some((9, 10)));
        assert_eq!(rates.len(), FIXED_PERIODS.len() + 1);

        let custom = rates.last().unwrap();
        assert_eq!(custom.name, "Custom");
        assert_eq!(custom.capture_rate, 10.0);
        assert!(custom.benchmark_rate.is_none());
    }

    #[test]
    fn test_top_days_ranking() {
        let records = vec![
            record(1, 9, [10, 0, 5, 0, 5, 0, 0, 0, 100]),
            record(2, 9, [30, 0, 15, 0, 15, 0, 0, 0, 300]),
            record(3, 9, [20, 0, 10, 0, 10, 0, 0, 0, 40]),
        ];
        let top = top_days(&records, 2);

        assert_eq!(top.by_visitors.len(), 2);
        assert_eq!(chrono::Datelike::day(&top.by_visitors[0].date), 2);
        assert_eq!(chrono::Datelike::day(&top.by_visitors[1].date), 3);

        // Day 3 has the best capture rate (50%).
        assert_eq!(chrono::Datelike::day(&top.by_capture_rate[0].date), 3);
        assert_eq!(top.by_capture_rate[0].value, 50.0);
    }

    #[test]
    fn test_validate_empty_and_clean_sets() {
        let empty = validate(&[]);
        assert_eq!(empty.findings[0].severity, Severity::Error);
        assert!(!empty.is_clean());

        let records = vec![record(1, 9, [10, 2, 6, 1, 4, 1, 3, 1, 50])];
        let clean = validate(&records);
        assert!(clean.is_clean());
    }
}
