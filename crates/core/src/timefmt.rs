//! Human-readable timestamp formats used in API payloads.

use chrono::{DateTime, TimeZone, Utc};
use std::fmt::Display;

/// `HH:MM:SS AM/PM`, used for the completion time of an analysis.
pub fn clock_time<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    at.format("%I:%M:%S %p").to_string()
}

/// `YYYY-MM-DD HH:MM:SS`, used in history listings.
pub fn history_timestamp(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// `YYYY-MM-DD HH:MM`, used in the statistics listing.
pub fn stats_timestamp(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn formats_are_deterministic_for_a_fixed_instant() {
        let at = Utc.with_ymd_and_hms(2026, 3, 7, 14, 5, 9).unwrap();

        assert_eq!(clock_time(&at), "02:05:09 PM");
        assert_eq!(history_timestamp(&at), "2026-03-07 14:05:09");
        assert_eq!(stats_timestamp(&at), "2026-03-07 14:05");
    }

    #[test]
    fn clock_time_uses_the_given_offset() {
        let offset = FixedOffset::east_opt(-5 * 3600).unwrap();
        let at = offset.with_ymd_and_hms(2026, 3, 7, 0, 30, 0).unwrap();

        assert_eq!(clock_time(&at), "12:30:00 AM");
    }
}
