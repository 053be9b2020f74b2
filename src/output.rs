//! Output formatting and persistence for report rows.
//!
//! Supports stdout tables, pretty JSON, and CSV append.

use anyhow::Result;
use serde::Serialize;
use tracing::debug;

use crate::analyzers::types::{
    Comparison, DailyReport, DayComparison, HourlyRow, PeriodRate, Severity, TopDays,
    ValidationReport,
};
use crate::analyzers::utility::format_minutes;
use csv::WriterBuilder;
use std::fs::OpenOptions;
use std::path::Path;

/// Prints a report as pretty JSON on stdout.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Appends serializable rows to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_rows<S: Serialize>(path: &str, rows: &[S]) -> Result<()> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, rows = rows.len(), "Appending CSV rows");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    Ok(())
}

/// Renders the hourly table.
pub fn render_hourly(rows: &[HourlyRow]) {
    println!(
        "{:<18} {:>5} {:>5} {:>5} {:>5} {:>7} {:>9} {:>8} {:>8} {:>6}",
        "Timestamp", "In", "Out", "GrpIn", "Pass", "Capt%", "Conv%", "TotIn", "TotOut", "Live"
    );
    for row in rows {
        println!(
            "{:<18} {:>5} {:>5} {:>5} {:>5} {:>7.2} {:>9.1} {:>8} {:>8} {:>6}",
            row.timestamp,
            row.entering_visitors,
            row.leaving_visitors,
            row.entering_groups,
            row.passersby,
            row.capture_rate,
            row.conversion_rate,
            row.accumulated_entering,
            row.accumulated_leaving,
            row.live_visitors,
        );
    }
}

fn weather_cell(report: &DailyReport) -> String {
    match (&report.weather_description, report.temperature_c) {
        (Some(description), Some(temperature)) => format!("{description}, {temperature}°C"),
        _ => "no weather data".to_string(),
    }
}

fn daily_line(label: &str, report: &DailyReport) {
    println!(
        "{:<22} {:>7} {:>8.2} {:>8.1} {:>7} {:>22} {:>7.1} {:>20}",
        label,
        report.entering_visitors,
        report.business_hours_capture_rate,
        report.conversion_rate,
        format_minutes(report.dwell_minutes),
        report.gender_split,
        report.accuracy,
        weather_cell(report),
    );
}

fn daily_header() {
    println!(
        "{:<22} {:>7} {:>8} {:>8} {:>7} {:>22} {:>7} {:>20}",
        "Date", "In", "Capt%", "Conv%", "Dwell", "Gender", "Acc%", "Weather"
    );
}

/// Renders the daily rollup table.
pub fn render_daily(reports: &[DailyReport]) {
    daily_header();
    for report in reports {
        daily_line(&report.date.format("%a %d %b %Y").to_string(), report);
    }
}

fn marker(comparison: Comparison) -> &'static str {
    match comparison {
        Comparison::Favorable => "+",
        Comparison::Unfavorable => "-",
        Comparison::Even => " ",
    }
}

/// Renders a primary/benchmark pair with per-metric markers.
pub fn render_comparison(comparison: &DayComparison) {
    daily_header();
    daily_line(
        &comparison.primary.date.format("%a %d %b %Y").to_string(),
        &comparison.primary,
    );
    daily_line(&comparison.benchmark_label, &comparison.benchmark);

    println!(
        "markers (primary/benchmark): visitors {}{}  capture {}{}  conversion {}{}  dwell {}{}",
        marker(comparison.entering_visitors.primary),
        marker(comparison.entering_visitors.benchmark),
        marker(comparison.capture_rate.primary),
        marker(comparison.capture_rate.benchmark),
        marker(comparison.conversion_rate.primary),
        marker(comparison.conversion_rate.benchmark),
        marker(comparison.dwell_minutes.primary),
        marker(comparison.dwell_minutes.benchmark),
    );
}

/// Renders the intra-day period capture rates.
pub fn render_periods(rates: &[PeriodRate]) {
    for rate in rates {
        match rate.benchmark_rate {
            Some(benchmark) => println!(
                "{:<10} {:>2}:00-{:>2}:00  {:>6.2}%  (benchmark {:>6.2}%)",
                rate.name, rate.start_hour, rate.end_hour, rate.capture_rate, benchmark
            ),
            None => println!(
                "{:<10} {:>2}:00-{:>2}:00  {:>6.2}%",
                rate.name, rate.start_hour, rate.end_hour, rate.capture_rate
            ),
        }
    }
}

/// Renders the top-performers lists.
pub fn render_top_days(top: &TopDays) {
    println!("Top days by entering visitors:");
    for day in &top.by_visitors {
        println!("  {}  {:.0}", day.date.format("%a %d %b %Y"), day.value);
    }
    println!("Top days by capture rate:");
    for day in &top.by_capture_rate {
        println!("  {}  {:.2}%", day.date.format("%a %d %b %Y"), day.value);
    }
}

/// Renders the data-quality findings.
pub fn render_validation(report: &ValidationReport) {
    for finding in &report.findings {
        let tag = match finding.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARN",
            Severity::Ok => "OK",
        };
        println!("[{tag}] {}", finding.message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    fn sample_row() -> HourlyRow {
        HourlyRow {
            timestamp: "1/01/2024 9:00".to_string(),
            entering_visitors: 10,
            leaving_visitors: 2,
            entering_men: 6,
            leaving_men: 1,
            entering_women: 4,
            leaving_women: 1,
            entering_groups: 3,
            leaving_groups: 1,
            passersby: 50,
            capture_rate: 20.0,
            conversion_rate: 30.0,
            accumulated_entering: 10,
            accumulated_leaving: 2,
            live_visitors: 10,
        }
    }

    #[test]
    fn test_print_json_does_not_panic() {
        print_json(&sample_row()).unwrap();
    }

    #[test]
    fn test_append_rows_creates_file() {
        let path = temp_path("footfall_analyzer_test_create.csv");
        let _ = fs::remove_file(&path); // clean up any prior run

        append_rows(&path, &[sample_row()]).unwrap();

        assert!(Path::new(&path).exists());
        let content = fs::read_to_string(&path).unwrap();
        assert!(!content.is_empty());

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_append_rows_writes_header_once() {
        let path = temp_path("footfall_analyzer_test_header.csv");
        let _ = fs::remove_file(&path);

        append_rows(&path, &[sample_row()]).unwrap();
        append_rows(&path, &[sample_row()]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        // Header line should appear exactly once
        let header_count = content.lines().filter(|l| l.contains("timestamp")).count();
        assert_eq!(header_count, 1);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_append_rows_two_batches() {
        let path = temp_path("footfall_analyzer_test_rows.csv");
        let _ = fs::remove_file(&path);

        append_rows(&path, &[sample_row()]).unwrap();
        append_rows(&path, &[sample_row()]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        // 1 header + 2 data rows = 3 lines (last may be empty due to trailing newline)
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 3);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_render_helpers_do_not_panic() {
        render_hourly(&[sample_row()]);
        render_validation(&ValidationReport { findings: vec![] });
        render_top_days(&TopDays {
            by_visitors: vec![],
            by_capture_rate: vec![],
        });
    }
}
