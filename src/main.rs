//! CLI entry point for the footfall analyzer.
//!
//! Provides subcommands for the hourly table, daily rollups with joined
//! weather, day-vs-benchmark analysis, top performers, and data validation.

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use clap::{Parser, Subcommand};
use footfall_analyzer::analyzers::bucketing::{
    daily_aggregates, records_for_day, synthesize_average_day,
};
use footfall_analyzer::analyzers::report::{self, PeriodBenchmark};
use footfall_analyzer::cache::{
    Cache, Entry, FileCache, VISITOR_RECORDS_KEY, VISITOR_TTL_SECS, resolve_cache_path,
};
use footfall_analyzer::fetch::generation::Latest;
use footfall_analyzer::fetch::{BasicClient, load_source};
use footfall_analyzer::infra::openmeteo::client::OpenMeteoClient;
use footfall_analyzer::output;
use footfall_analyzer::parser::parse_records;
use footfall_analyzer::records::{VisitorRecord, format_display_date};
use footfall_analyzer::services::weather_api::Coordinates;
use footfall_analyzer::weather::{self, WeatherObservation};
use tracing::{debug, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "footfall_analyzer")]
#[command(about = "Venue footfall analytics over an hourly visitor-sensor feed", long_about = None)]
struct Cli {
    /// Feed source: file path or URL (falls back to FEED_URL)
    #[arg(short, long, global = true)]
    source: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the normalized hourly table
    Hourly {
        /// CSV file to append the rows to
        #[arg(short, long)]
        output: Option<String>,

        /// Print the rows as JSON instead of a table
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Show daily rollups with joined weather
    Daily {
        /// CSV file to append the rows to
        #[arg(short, long)]
        output: Option<String>,

        /// Print the rows as JSON instead of a table
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Skip the weather join
        #[arg(long, default_value_t = false)]
        no_weather: bool,

        /// Venue latitude (falls back to VENUE_LATITUDE)
        #[arg(long)]
        latitude: Option<f64>,

        /// Venue longitude (falls back to VENUE_LONGITUDE)
        #[arg(long)]
        longitude: Option<f64>,
    },
    /// Analyze one day, optionally against a benchmark
    Day {
        /// Day to analyze, D/MM/YYYY
        #[arg(value_name = "DATE")]
        date: String,

        /// Benchmark date, D/MM/YYYY
        #[arg(long, conflicts_with = "weekday_average")]
        benchmark_date: Option<String>,

        /// Benchmark against the weekday's historical averages
        #[arg(long, default_value_t = false)]
        weekday_average: bool,

        /// Custom capture-rate window as START-END hours, e.g. 9-17
        #[arg(long)]
        period: Option<String>,

        /// CSV file to append the rows to
        #[arg(short, long)]
        output: Option<String>,

        /// Print the analysis as JSON instead of a table
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Skip the weather join
        #[arg(long, default_value_t = false)]
        no_weather: bool,

        /// Venue latitude (falls back to VENUE_LATITUDE)
        #[arg(long)]
        latitude: Option<f64>,

        /// Venue longitude (falls back to VENUE_LONGITUDE)
        #[arg(long)]
        longitude: Option<f64>,
    },
    /// Show the best-performing days
    Top {
        /// How many days to list per ranking
        #[arg(short = 'n', long, default_value_t = 3)]
        count: usize,

        /// Print the rankings as JSON instead of a table
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Check the record set for data-quality issues
    Validate {
        /// Print the findings as JSON instead of a table
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/footfall_analyzer.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("footfall_analyzer.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let mut cache = FileCache::load(resolve_cache_path());

    match cli.command {
        Commands::Hourly { output, json } => {
            let records = load_records(cli.source, &mut cache).await?;
            let rows = report::hourly_rows(&records);

            if json {
                output::print_json(&rows)?;
            } else {
                output::render_hourly(&rows);
            }
            if let Some(path) = output {
                output::append_rows(&path, &rows)?;
            }
        }
        Commands::Daily {
            output,
            json,
            no_weather,
            latitude,
            longitude,
        } => {
            let records = load_records(cli.source, &mut cache).await?;
            let location = resolve_coordinates(latitude, longitude);
            let weather = if no_weather {
                BTreeMap::new()
            } else {
                range_weather(&mut cache, location, &records).await
            };

            let reports = report::daily_reports(&records, &weather);
            if json {
                output::print_json(&reports)?;
            } else {
                output::render_daily(&reports);
            }
            if let Some(path) = output {
                output::append_rows(&path, &reports)?;
            }
        }
        Commands::Day {
            date,
            benchmark_date,
            weekday_average,
            period,
            output,
            json,
            no_weather,
            latitude,
            longitude,
        } => {
            let records = load_records(cli.source, &mut cache).await?;
            let date = parse_display_date(&date)?;
            if records_for_day(&records, date).is_empty() {
                anyhow::bail!("no records for {}", format_display_date(date));
            }

            let location = resolve_coordinates(latitude, longitude);
            let custom = period.as_deref().map(parse_period).transpose()?;

            let primary_weather = day_weather(&mut cache, location, date, !no_weather).await;
            let primary = report::day_report(&records, date, primary_weather.clone());

            let benchmark_date = benchmark_date
                .as_deref()
                .map(parse_display_date)
                .transpose()?;

            let (comparison, periods) = if let Some(benchmark_date) = benchmark_date {
                let benchmark_weather =
                    day_weather(&mut cache, location, benchmark_date, !no_weather).await;
                let benchmark = report::day_report(&records, benchmark_date, benchmark_weather);
                let periods = report::period_rates(
                    &records,
                    date,
                    Some(&PeriodBenchmark::Date(benchmark_date)),
                    custom,
                );
                let comparison = report::compare_days(
                    primary.clone(),
                    benchmark,
                    format_display_date(benchmark_date),
                );
                (Some(comparison), periods)
            } else if weekday_average {
                let synthetic_day = synthesize_average_day(&records, date);
                // The averages describe the same calendar day, so they share
                // the primary date's weather.
                let benchmark =
                    report::day_report(&synthetic_day, date, primary_weather.clone());
                let periods = report::period_rates(
                    &records,
                    date,
                    Some(&PeriodBenchmark::Records(&synthetic_day)),
                    custom,
                );
                let comparison = report::compare_days(
                    primary.clone(),
                    benchmark,
                    report::weekday_average_label(date.weekday()),
                );
                (Some(comparison), periods)
            } else {
                (None, report::period_rates(&records, date, None, custom))
            };

            if json {
                match &comparison {
                    Some(comparison) => output::print_json(&serde_json::json!({
                        "analysis": comparison,
                        "periods": periods,
                    }))?,
                    None => output::print_json(&serde_json::json!({
                        "analysis": primary,
                        "periods": periods,
                    }))?,
                }
            } else {
                match &comparison {
                    Some(comparison) => output::render_comparison(comparison),
                    None => output::render_daily(std::slice::from_ref(&primary)),
                }
                println!();
                output::render_periods(&periods);
            }

            if let Some(path) = output {
                let mut rows = vec![primary];
                if let Some(comparison) = comparison {
                    rows.push(comparison.benchmark);
                }
                output::append_rows(&path, &rows)?;
            }
        }
        Commands::Top { count, json } => {
            let records = load_records(cli.source, &mut cache).await?;
            let top = report::top_days(&records, count);

            if json {
                output::print_json(&top)?;
            } else {
                output::render_top_days(&top);
            }
        }
        Commands::Validate { json } => {
            let records = load_records(cli.source, &mut cache).await?;
            let validation = report::validate(&records);

            if json {
                output::print_json(&validation)?;
            } else {
                output::render_validation(&validation);
            }
            if !validation.is_clean() {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

/// Loads the visitor record set, serving a fresh cached copy for remote
/// sources and fencing the fetch with a generation token so a superseded
/// request can never overwrite newer data.
async fn load_records(source: Option<String>, cache: &mut FileCache) -> Result<Vec<VisitorRecord>> {
    let source = source
        .or_else(|| std::env::var("FEED_URL").ok())
        .context("no feed source given; pass --source or set FEED_URL")?;

    let remote = source.starts_with("http");
    if remote {
        if let Some(entry) = cache.get(VISITOR_RECORDS_KEY) {
            if entry.is_fresh(VISITOR_TTL_SECS) {
                if let Ok(records) = entry.decode::<Vec<VisitorRecord>>() {
                    debug!(records = records.len(), "Visitor records served from cache");
                    return Ok(records);
                }
            }
        }
    }

    let client = BasicClient::new();
    let mut latest = Latest::new();

    let token = latest.begin();
    let bytes = load_source(&client, &source).await?;
    latest.commit(token, parse_records(&bytes)?);

    let records = latest
        .take()
        .context("feed load superseded by a newer request")?;
    info!(records = records.len(), source = %source, "Feed loaded");

    if remote {
        if let Ok(entry) = Entry::new(&records) {
            cache.put(VISITOR_RECORDS_KEY, entry);
        }
    }

    Ok(records)
}

/// Weather for every day covered by the record set. Failures are scoped:
/// the rollup renders without weather columns rather than failing.
async fn range_weather(
    cache: &mut FileCache,
    location: Coordinates,
    records: &[VisitorRecord],
) -> BTreeMap<NaiveDate, WeatherObservation> {
    let aggregates = daily_aggregates(records);
    let (Some(first), Some(last)) = (aggregates.first(), aggregates.last()) else {
        return BTreeMap::new();
    };

    // A single-day data set widens to the minimum valid span.
    let end = if first.date == last.date {
        match last.date.succ_opt() {
            Some(end) => end,
            None => return BTreeMap::new(),
        }
    } else {
        last.date
    };

    let provider = OpenMeteoClient::new();
    match weather::weather_for_range(&provider, cache, location, first.date, end).await {
        Ok(observations) => observations,
        Err(err) => {
            warn!(error = %err, "Weather unavailable, rendering without it");
            BTreeMap::new()
        }
    }
}

/// Weather for one day, or `None` when disabled or unavailable.
async fn day_weather(
    cache: &mut FileCache,
    location: Coordinates,
    date: NaiveDate,
    enabled: bool,
) -> Option<WeatherObservation> {
    if !enabled {
        return None;
    }

    let provider = OpenMeteoClient::new();
    match weather::weather_for_day(&provider, cache, location, date).await {
        Ok(observation) => observation,
        Err(err) => {
            warn!(error = %err, date = %date, "Weather unavailable for day");
            None
        }
    }
}

fn resolve_coordinates(latitude: Option<f64>, longitude: Option<f64>) -> Coordinates {
    let default = Coordinates::default();
    let env_f64 = |name: &str| std::env::var(name).ok().and_then(|v| v.parse().ok());

    Coordinates {
        latitude: latitude
            .or_else(|| env_f64("VENUE_LATITUDE"))
            .unwrap_or(default.latitude),
        longitude: longitude
            .or_else(|| env_f64("VENUE_LONGITUDE"))
            .unwrap_or(default.longitude),
    }
}

fn parse_display_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%d/%m/%Y")
        .with_context(|| format!("'{raw}' is not a D/MM/YYYY date"))
}

fn parse_period(raw: &str) -> Result<(u32, u32)> {
    let (start, end) = raw
        .split_once('-')
        .context("period must look like START-END, e.g. 9-17")?;
    let start: u32 = start.trim().parse().context("period start is not an hour")?;
    let end: u32 = end.trim().parse().context("period end is not an hour")?;
    anyhow::ensure!(
        start < end && end <= 24,
        "period hours must satisfy start < end <= 24"
    );
    Ok((start, end))
}
