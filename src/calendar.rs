//! GPS week-number rollover correction
//!
//! The oscillator's receiver counts GPS weeks in a 10-bit field, so its calendar wraps
//! every 1024 weeks. Units that missed the firmware fix report dates roughly 19.6 years
//! in the past. Any decoded year before the threshold is shifted forward by exactly one
//! rollover period.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// One GPS week-number rollover period: 1024 weeks
pub const GPS_ROLLOVER_DAYS: i64 = 7168;

/// Years below this are treated as rolled over
pub const DEFAULT_ROLLOVER_THRESHOLD_YEAR: i32 = 2020;

/// Rollover threshold policy
///
/// The threshold is tied to real calendar time and has to move forward before the next
/// rollover; the correction amount never changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolloverPolicy {
    pub threshold_year: i32,
}

impl Default for RolloverPolicy {
    fn default() -> Self {
        Self { threshold_year: DEFAULT_ROLLOVER_THRESHOLD_YEAR }
    }
}

impl RolloverPolicy {
    pub fn new(threshold_year: i32) -> Self {
        Self { threshold_year }
    }

    /// Whether a decoded calendar year is implausibly early
    pub fn needs_correction(&self, year: i32) -> bool {
        year < self.threshold_year
    }

    /// Return the corrected timestamp when `year` triggers the correction.
    ///
    /// `year` is the calendar year as decoded from the telegram, before any correction.
    pub fn correct(&self, year: i32, timestamp: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if !self.needs_correction(year) {
            return None;
        }
        Some(timestamp + Duration::days(GPS_ROLLOVER_DAYS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone};
    use proptest::prelude::*;

    #[test]
    fn recent_years_are_untouched() {
        let policy = RolloverPolicy::default();
        let ts = Utc.with_ymd_and_hms(2025, 2, 12, 12, 15, 30).unwrap();
        assert_eq!(policy.correct(2025, ts), None);
        assert_eq!(policy.correct(2020, ts), None);
    }

    #[test]
    fn rolled_over_2019_lands_in_2038() {
        let policy = RolloverPolicy::default();
        let ts = Utc.with_ymd_and_hms(2019, 2, 12, 12, 15, 30).unwrap();

        let corrected = policy.correct(2019, ts).expect("2019 is below the threshold");
        assert_eq!(corrected - ts, Duration::days(7168));
        assert_eq!(corrected, Utc.with_ymd_and_hms(2038, 9, 28, 12, 15, 30).unwrap());
        assert_eq!(corrected.ordinal(), 271);
    }

    #[test]
    fn threshold_is_configurable() {
        let policy = RolloverPolicy::new(2030);
        let ts = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        assert!(policy.correct(2025, ts).is_some());
        assert!(RolloverPolicy::default().correct(2025, ts).is_none());
    }

    proptest! {
        #[test]
        fn correction_adds_exactly_one_period(
            year in 2001i32..2020,
            day in 0i64..365,
            secs in 0i64..86_400,
        ) {
            let start = Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).unwrap();
            let ts = start + Duration::days(day) + Duration::seconds(secs);

            let corrected = RolloverPolicy::default().correct(year, ts).unwrap();
            prop_assert_eq!(corrected - ts, Duration::days(GPS_ROLLOVER_DAYS));
            prop_assert!(corrected.year() >= DEFAULT_ROLLOVER_THRESHOLD_YEAR);
        }
    }
}
