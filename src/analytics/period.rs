//! Day-granular reporting windows.

use chrono::{DateTime, Days, Duration, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Longest window accepted from user input (20 years).
pub const MAX_RANGE_DAYS: i64 = 20 * 366;

/// A user-supplied window that cannot be analysed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("date range spans {days} days; the maximum is {MAX_RANGE_DAYS}")]
    TooLong { days: i64 },
    #[error("date range falls outside the supported calendar")]
    OutOfCalendar,
}

/// An inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    /// Build a range; a missing `to` means a single day. Reversed bounds are
    /// swapped.
    pub fn new(from: NaiveDate, to: Option<NaiveDate>) -> Self {
        let to = to.unwrap_or(from);
        if to < from {
            Self { from: to, to: from }
        } else {
            Self { from, to }
        }
    }

    /// The `days` calendar days ending on `today` (inclusive). `days == 0`
    /// is treated as 1.
    pub fn last_days(today: NaiveDate, days: u32) -> Result<Self, RangeError> {
        let span = i64::from(days.max(1));
        if span > MAX_RANGE_DAYS {
            return Err(RangeError::TooLong { days: span });
        }
        let from = today
            .checked_sub_days(Days::new(span as u64 - 1))
            .ok_or(RangeError::OutOfCalendar)?;
        Ok(Self::new(from, Some(today)))
    }

    /// Reject windows longer than [`MAX_RANGE_DAYS`].
    pub fn limited(self) -> Result<Self, RangeError> {
        let days = self.day_count();
        if days > MAX_RANGE_DAYS {
            Err(RangeError::TooLong { days })
        } else {
            Ok(self)
        }
    }

    /// `to - from` in whole days.
    pub fn duration_days(&self) -> i64 {
        (self.to - self.from).num_days()
    }

    /// Number of calendar days covered.
    pub fn day_count(&self) -> i64 {
        self.duration_days() + 1
    }

    /// The window of equal length ending the day before `from`. `None` when
    /// it would start before the earliest representable date.
    pub fn previous(&self) -> Option<Self> {
        let shift = Duration::days(self.duration_days() + 1);
        Some(Self {
            from: self.from.checked_sub_signed(shift)?,
            to: self.to.checked_sub_signed(shift)?,
        })
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        day >= self.from && day <= self.to
    }

    /// Every day in the range, ascending.
    pub fn days(self) -> impl Iterator<Item = NaiveDate> {
        (0..self.day_count()).map(move |i| self.from + Duration::days(i))
    }
}

/// Calendar day of `ts` as seen from `tz`.
pub fn day_of(ts: &DateTime<Utc>, tz: &FixedOffset) -> NaiveDate {
    ts.with_timezone(tz).date_naive()
}

/// Today's calendar day in `tz`.
pub fn today(tz: &FixedOffset) -> NaiveDate {
    day_of(&Utc::now(), tz)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn previous_window_is_contiguous_and_same_length() {
        let range = DateRange::new(d(2024, 1, 10), Some(d(2024, 1, 19)));
        let prev = range.previous().unwrap();
        assert_eq!(prev.from, d(2023, 12, 31));
        assert_eq!(prev.to, d(2024, 1, 9));
        assert_eq!(prev.day_count(), range.day_count());
        assert!(!prev.contains(range.from));
    }

    #[test]
    fn single_day_range() {
        let range = DateRange::new(d(2024, 3, 1), None);
        assert_eq!(range.day_count(), 1);
        let prev = range.previous().unwrap();
        assert_eq!(prev.from, d(2024, 2, 29));
        assert_eq!(prev.to, d(2024, 2, 29));
    }

    #[test]
    fn reversed_bounds_are_swapped() {
        let range = DateRange::new(d(2024, 1, 5), Some(d(2024, 1, 1)));
        assert_eq!(range.from, d(2024, 1, 1));
        assert_eq!(range.to, d(2024, 1, 5));
    }

    #[test]
    fn last_days_ends_today() {
        let range = DateRange::last_days(d(2024, 1, 30), 30).unwrap();
        assert_eq!(range.from, d(2024, 1, 1));
        assert_eq!(range.day_count(), 30);
        assert_eq!(DateRange::last_days(d(2024, 1, 30), 0).unwrap().day_count(), 1);
    }

    #[test]
    fn last_days_rejects_huge_counts() {
        assert_eq!(
            DateRange::last_days(d(2024, 1, 30), 4_000_000_000),
            Err(RangeError::TooLong { days: 4_000_000_000 })
        );
        assert_eq!(
            DateRange::last_days(NaiveDate::MIN, 2),
            Err(RangeError::OutOfCalendar)
        );
    }

    #[test]
    fn previous_before_the_calendar_start_is_none() {
        let to = NaiveDate::MIN.checked_add_days(Days::new(9)).unwrap();
        let range = DateRange::new(NaiveDate::MIN, Some(to));
        assert!(range.previous().is_none());
    }

    #[test]
    fn limited_caps_the_window_length() {
        let range = DateRange::new(d(2000, 1, 1), Some(d(2030, 1, 1)));
        assert!(matches!(range.limited(), Err(RangeError::TooLong { .. })));
        let range = DateRange::new(d(2024, 1, 1), Some(d(2024, 12, 31)));
        assert_eq!(range.limited(), Ok(range));
    }

    #[test]
    fn days_iterates_inclusive() {
        let range = DateRange::new(d(2023, 12, 30), Some(d(2024, 1, 2)));
        let days: Vec<_> = range.days().collect();
        assert_eq!(days.len(), 4);
        assert_eq!(days[0], d(2023, 12, 30));
        assert_eq!(days[3], d(2024, 1, 2));
    }

    #[test]
    fn day_of_respects_offset() {
        use chrono::TimeZone;
        let ts = Utc.with_ymd_and_hms(2024, 1, 2, 1, 0, 0).unwrap();
        let brt = FixedOffset::west_opt(3 * 3600).unwrap();
        assert_eq!(day_of(&ts, &brt), d(2024, 1, 1));
        assert_eq!(day_of(&ts, &FixedOffset::east_opt(0).unwrap()), d(2024, 1, 2));
    }
}
