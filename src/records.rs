//! Typed visitor-sensor records and gender-count normalization.

use chrono::{NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};

/// Feed timestamp layout: day and hour carry no leading zero.
pub const DATETIME_FORMAT: &str = "%d/%m/%Y %H:%M";

/// One normalized sensor sample covering a single hour.
///
/// Gender sub-counts are reconciled at construction so that
/// `entering_men + entering_women == entering_visitors` (and likewise for
/// leaving). Records are immutable once built; every downstream stage reads
/// them as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitorRecord {
    pub timestamp: NaiveDateTime,
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

impl VisitorRecord {
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    pub fn weekday(&self) -> Weekday {
        use chrono::Datelike;
        self.timestamp.date().weekday()
    }

    pub fn hour(&self) -> u32 {
        use chrono::Timelike;
        self.timestamp.hour()
    }

    /// Formatted calendar date used as the grouping key. Two records belong
    /// to the same day iff their keys compare equal as strings.
    pub fn day_key(&self) -> String {
        format_display_date(self.timestamp.date())
    }

    /// Timestamp in the feed's own layout, for display rows.
    pub fn display_timestamp(&self) -> String {
        format!(
            "{} {}:{:02}",
            self.day_key(),
            self.hour(),
            chrono::Timelike::minute(&self.timestamp)
        )
    }
}

/// Formats a date the way the feed writes it: `D/MM/YYYY`, no leading zero
/// on the day.
pub fn format_display_date(date: NaiveDate) -> String {
    date.format("%-d/%m/%Y").to_string()
}

/// ISO `YYYY-MM-DD`, used for weather cache keys and API parameters.
pub fn format_api_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Reconciles raw gender sub-counts against a recorded total.
///
/// Sensors report men/women independently of the overall counter, so the
/// sub-counts can drift from the total. When they disagree the sub-counts
/// are rescaled proportionally; when they are absent entirely the total is
/// split evenly. Either way the returned pair sums exactly to `total`.
pub fn reconcile_gender(total: u32, men_raw: u32, women_raw: u32) -> (u32, u32) {
    let sub = men_raw + women_raw;

    if sub > 0 && sub != total {
        let men = (men_raw as f64 * total as f64 / sub as f64).round() as u32;
        (men, total - men)
    } else if sub == 0 && total > 0 {
        let men = (total as f64 / 2.0).round() as u32;
        (men, total - men)
    } else {
        (men_raw, women_raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconcile_rescales_mismatched_subcounts() {
        // 6 + 4 = 10 raw against a total of 5: halve both.
        let (men, women) = reconcile_gender(5, 6, 4);
        assert_eq!(men, 3);
        assert_eq!(women, 2);
        assert_eq!(men + women, 5);
    }

    #[test]
    fn test_reconcile_splits_evenly_when_subcounts_missing() {
        let (men, women) = reconcile_gender(10, 0, 0);
        assert_eq!(men, 5);
        assert_eq!(women, 5);

        // Odd totals round the men's share up.
        let (men, women) = reconcile_gender(7, 0, 0);
        assert_eq!(men, 4);
        assert_eq!(women, 3);
    }

    #[test]
    fn test_reconcile_keeps_consistent_subcounts() {
        assert_eq!(reconcile_gender(10, 6, 4), (6, 4));
        assert_eq!(reconcile_gender(0, 0, 0), (0, 0));
    }

    #[test]
    fn test_reconcile_always_sums_to_total() {
        for total in 0..30u32 {
            for men in 0..15u32 {
                for women in 0..15u32 {
                    let (m, w) = reconcile_gender(total, men, women);
                    if men + women > 0 || total > 0 {
                        assert_eq!(m + w, total, "total={total} men={men} women={women}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_day_key_has_no_leading_zero_on_day() {
        let record = VisitorRecord {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
            entering_visitors: 0,
            leaving_visitors: 0,
            entering_men: 0,
            leaving_men: 0,
            entering_women: 0,
            leaving_women: 0,
            entering_groups: 0,
            leaving_groups: 0,
            passersby: 0,
        };

        assert_eq!(record.day_key(), "1/01/2024");
        assert_eq!(record.display_timestamp(), "1/01/2024 9:00");
    }
}
