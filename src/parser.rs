//! CSV parser for the visitor-counting sensor feed.

use anyhow::Result;
use chrono::NaiveDateTime;
use csv::ReaderBuilder;
use tracing::warn;

use crate::records::{DATETIME_FORMAT, VisitorRecord, reconcile_gender};

/// Decodes the raw feed into normalized [`VisitorRecord`]s.
///
/// The feed has no header semantics beyond row 0 being skipped. Each data
/// row carries a timestamp followed by nine integer fields in fixed order;
/// a missing or unparseable integer defaults to 0 rather than rejecting the
/// row. A row whose timestamp does not parse is dropped with a warning so a
/// single bad sample never fails the batch.
///
/// # Errors
///
/// Returns an error only if the bytes are not readable as CSV at all.
pub fn parse_records(bytes: &[u8]) -> Result<Vec<VisitorRecord>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut records = Vec::new();

    for (index, row) in reader.records().enumerate() {
        let row = row?;

        // Row 0 is the header.
        if index == 0 {
            continue;
        }

        let raw_timestamp = row.get(0).unwrap_or("").trim();
        let timestamp = match NaiveDateTime::parse_from_str(raw_timestamp, DATETIME_FORMAT) {
            Ok(ts) => ts,
            Err(err) => {
                warn!(row = index, raw = raw_timestamp, error = %err, "Skipping record with unparseable timestamp");
                continue;
            }
        };

        let entering_visitors = int_field(&row, 1);
        let leaving_visitors = int_field(&row, 2);
        let (entering_men, entering_women) =
            reconcile_gender(entering_visitors, int_field(&row, 3), int_field(&row, 5));
        let (leaving_men, leaving_women) =
            reconcile_gender(leaving_visitors, int_field(&row, 4), int_field(&row, 6));

        records.push(VisitorRecord {
            timestamp,
            entering_visitors,
            leaving_visitors,
            entering_men,
            leaving_men,
            entering_women,
            leaving_women,
            entering_groups: int_field(&row, 7),
            leaving_groups: int_field(&row, 8),
            passersby: int_field(&row, 9),
        });
    }

    Ok(records)
}

fn int_field(row: &csv::StringRecord, index: usize) -> u32 {
    row.get(index)
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "timestamp,in,out,men in,men out,women in,women out,groups in,groups out,passersby\n";

    #[test]
    fn test_parse_skips_header_row() {
        let feed = format!("{HEADER}1/01/2024 9:00,10,2,6,1,4,1,3,1,50\n");
        let records = parse_records(feed.as_bytes()).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].entering_visitors, 10);
        assert_eq!(records[0].passersby, 50);
    }

    #[test]
    fn test_parse_defaults_bad_numbers_to_zero() {
        let feed = format!("{HEADER}1/01/2024 9:00,abc,,6,1,4,1,3,1,50\n");
        let records = parse_records(feed.as_bytes()).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].entering_visitors, 0);
        assert_eq!(records[0].leaving_visitors, 0);
    }

    #[test]
    fn test_parse_drops_rows_with_bad_timestamps() {
        let feed = format!(
            "{HEADER}not-a-date,1,1,1,0,0,1,0,0,5\n2/01/2024 10:00,5,3,3,2,2,1,1,1,20\n"
        );
        let records = parse_records(feed.as_bytes()).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].entering_visitors, 5);
    }

    #[test]
    fn test_parse_reconciles_gender_counts() {
        // Raw men+women disagree with the totals on both directions.
        let feed = format!("{HEADER}1/01/2024 9:00,10,4,12,1,8,1,0,0,0\n");
        let records = parse_records(feed.as_bytes()).unwrap();

        let r = &records[0];
        assert_eq!(r.entering_men + r.entering_women, r.entering_visitors);
        assert_eq!(r.leaving_men + r.leaving_women, r.leaving_visitors);
        assert_eq!(r.entering_men, 6);
        assert_eq!(r.entering_women, 4);
    }

    #[test]
    fn test_parse_accepts_unpadded_day_and_hour() {
        let feed = format!("{HEADER}3/02/2024 7:15,1,0,1,0,0,0,0,0,2\n");
        let records = parse_records(feed.as_bytes()).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].hour(), 7);
        assert_eq!(records[0].day_key(), "3/02/2024");
    }

    #[test]
    fn test_parse_short_row_pads_with_zeros() {
        let feed = format!("{HEADER}1/01/2024 9:00,10,2\n");
        let records = parse_records(feed.as_bytes()).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].entering_visitors, 10);
        // Missing gender columns fall back to an even split of the total.
        assert_eq!(records[0].entering_men, 5);
        assert_eq!(records[0].entering_women, 5);
        assert_eq!(records[0].passersby, 0);
    }
}
