use chrono::{DateTime, Datelike, FixedOffset, NaiveTime, Offset, TimeDelta, TimeZone, Utc, Weekday};

use crate::error::CoreError;

/// Weekly reset boundary: midnight of a fixed weekday in a fixed UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekWindow {
    anchor: Weekday,
    offset: FixedOffset,
}

impl WeekWindow {
    pub fn new(anchor: Weekday, utc_offset_minutes: i32) -> Result<Self, CoreError> {
        let offset = utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                CoreError::BadRequest(format!(
                    "UTC offset of {utc_offset_minutes} minutes is out of range"
                ))
            })?;
        Ok(Self { anchor, offset })
    }

    pub fn anchor(&self) -> Weekday {
        self.anchor
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn period() -> TimeDelta {
        TimeDelta::days(7)
    }

    /// Most recent window boundary that is `<= now`.
    pub fn current_window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let local_date = now.with_timezone(&self.offset).date_naive();
        let days_back = (local_date.weekday().num_days_from_sunday() + 7
            - self.anchor.num_days_from_sunday())
            % 7;
        let start_local = (local_date - TimeDelta::days(i64::from(days_back))).and_time(NaiveTime::MIN);
        let start_utc = start_local - TimeDelta::seconds(i64::from(self.offset.local_minus_utc()));
        Utc.from_utc_datetime(&start_utc)
    }

    pub fn next_window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.current_window_start(now) + Self::period()
    }
}

impl Default for WeekWindow {
    fn default() -> Self {
        Self {
            anchor: Weekday::Sun,
            offset: Utc.fix(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn sunday_anchor_truncates_to_previous_sunday_midnight() {
        let window = WeekWindow::default();
        // 2026-03-04 is a Wednesday.
        assert_eq!(
            window.current_window_start(utc(2026, 3, 4, 15, 30)),
            utc(2026, 3, 1, 0, 0)
        );
    }

    #[test]
    fn boundary_instant_starts_a_new_window() {
        let window = WeekWindow::default();
        assert_eq!(
            window.current_window_start(utc(2026, 3, 8, 0, 0)),
            utc(2026, 3, 8, 0, 0)
        );
        assert_eq!(
            window.current_window_start(utc(2026, 3, 7, 23, 59)),
            utc(2026, 3, 1, 0, 0)
        );
    }

    #[test]
    fn monday_anchor_with_positive_offset() {
        // UTC+7: local Monday 00:00 is Sunday 17:00 UTC.
        let window = WeekWindow::new(Weekday::Mon, 7 * 60).unwrap();
        assert_eq!(
            window.current_window_start(utc(2026, 3, 1, 18, 0)),
            utc(2026, 3, 1, 17, 0)
        );
        assert_eq!(
            window.current_window_start(utc(2026, 3, 1, 16, 59)),
            utc(2026, 2, 22, 17, 0)
        );
    }

    #[test]
    fn window_start_is_monotonic_and_never_after_now() {
        let window = WeekWindow::new(Weekday::Thu, -5 * 60).unwrap();
        let mut now = utc(2026, 1, 1, 0, 0);
        let mut previous = window.current_window_start(now);
        for _ in 0..(24 * 30) {
            now += TimeDelta::minutes(59);
            let start = window.current_window_start(now);
            assert!(start <= now);
            assert!(start >= previous);
            assert!(now - start < WeekWindow::period());
            previous = start;
        }
    }

    #[test]
    fn rejects_out_of_range_offset() {
        assert!(WeekWindow::new(Weekday::Sun, 24 * 60).is_err());
    }
}
