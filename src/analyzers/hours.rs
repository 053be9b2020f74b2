//! Weekday-dependent opening hours used to scope capture-rate metrics.

use chrono::Weekday;

/// An open/close hour pair. A sample at hour `h` falls inside the window
/// iff `open <= h < close`; minutes are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpeningHours {
    pub open: u32,
    pub close: u32,
}

impl OpeningHours {
    pub fn contains(&self, hour: u32) -> bool {
        hour >= self.open && hour < self.close
    }
}

/// Venue opening hours: Mon–Fri 07:00–20:00, Sat 08:00–20:00,
/// Sun 08:00–16:00.
pub fn opening_hours(weekday: Weekday) -> OpeningHours {
    match weekday {
        Weekday::Sat => OpeningHours { open: 8, close: 20 },
        Weekday::Sun => OpeningHours { open: 8, close: 16 },
        _ => OpeningHours { open: 7, close: 20 },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weekday_windows() {
        assert_eq!(opening_hours(Weekday::Mon), OpeningHours { open: 7, close: 20 });
        assert_eq!(opening_hours(Weekday::Fri), OpeningHours { open: 7, close: 20 });
        assert_eq!(opening_hours(Weekday::Sat), OpeningHours { open: 8, close: 20 });
        assert_eq!(opening_hours(Weekday::Sun), OpeningHours { open: 8, close: 16 });
    }

    #[test]
    fn test_contains_is_half_open() {
        let sunday = opening_hours(Weekday::Sun);
        assert!(sunday.contains(8));
        assert!(sunday.contains(10));
        assert!(sunday.contains(15));
        assert!(!sunday.contains(16));
        assert!(!sunday.contains(19));
        assert!(!sunday.contains(7));
    }
}
