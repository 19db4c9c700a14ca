//! Clock - the displayed instant and whether it follows the wall clock
//!
//! A `Clock` is a small `Copy` value. Every operation returns a new clock;
//! nothing is mutated in place.
//!
//! Instants are kept [`RANGE_MARGIN_DAYS`] away from both ends of the
//! representable range so that a full day of hour columns can be laid out
//! around any of them. An offset that would leave that range keeps the
//! current instant.

use chrono::{DateTime, Duration, NaiveDateTime, Timelike, Utc};
use chrono_tz::Tz;

use crate::time_engine::resolve_local;

/// Days kept free at each end of the representable range
pub const RANGE_MARGIN_DAYS: i64 = 8;

/// Whether `instant` is far enough from the range limits to be displayed
fn is_displayable(instant: &DateTime<Tz>) -> bool {
    let margin = Duration::days(RANGE_MARGIN_DAYS);
    let utc = instant.naive_utc();
    let after_min = NaiveDateTime::MIN
        .checked_add_signed(margin)
        .is_some_and(|earliest| utc >= earliest);
    let before_max = NaiveDateTime::MAX
        .checked_sub_signed(margin)
        .is_some_and(|latest| utc <= latest);
    after_min && before_max
}

/// The instant being displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clock {
    /// Displayed instant, read in the reference (Local) zone
    instant: DateTime<Tz>,
    /// True only right after syncing to the wall clock
    tracks_wall_clock: bool,
}

impl Clock {
    /// The current time in `tz`, tracking the wall clock
    pub fn now(tz: Tz) -> Self {
        Self::synced(Utc::now(), tz)
    }

    /// A clock synced to a wall-clock reading taken by the caller
    pub fn synced(now: DateTime<Utc>, tz: Tz) -> Self {
        Self {
            instant: now.with_timezone(&tz),
            tracks_wall_clock: true,
        }
    }

    /// A fixed instant, not tracking the wall clock
    pub fn at(instant: DateTime<Tz>) -> Self {
        Self {
            instant,
            tracks_wall_clock: false,
        }
    }

    /// A fixed instant from seconds since the Unix epoch.
    ///
    /// Returns `None` when the timestamp is outside the displayable range.
    pub fn from_unix_timestamp(seconds: i64, tz: Tz) -> Option<Self> {
        DateTime::from_timestamp(seconds, 0)
            .map(|utc| utc.with_timezone(&tz))
            .filter(is_displayable)
            .map(Self::at)
    }

    pub fn instant(&self) -> DateTime<Tz> {
        self.instant
    }

    pub fn tracks_wall_clock(&self) -> bool {
        self.tracks_wall_clock
    }

    /// A fixed clock at `shifted`, or at the current instant when the shift
    /// overflowed or left the displayable range
    fn shifted(&self, shifted: Option<DateTime<Tz>>) -> Self {
        match shifted.filter(is_displayable) {
            Some(instant) => Self::at(instant),
            None => {
                log::debug!("Offset from {} is out of range", self.instant);
                Self::at(self.instant)
            }
        }
    }

    /// Shift by `n` minutes of elapsed time
    pub fn add_minutes(&self, n: i64) -> Self {
        self.shifted(self.instant.checked_add_signed(Duration::minutes(n)))
    }

    /// Shift by `n` hours of elapsed time, keeping minutes and seconds
    pub fn add_hours(&self, n: i64) -> Self {
        self.shifted(self.instant.checked_add_signed(Duration::hours(n)))
    }

    /// Shift by `n` calendar days, keeping the wall-clock reading.
    ///
    /// When the same reading does not exist on the target date (it falls in a
    /// skipped interval) the clock lands just after the gap.
    pub fn add_days(&self, n: i64) -> Self {
        let tz = self.instant.timezone();
        let days = Duration::days(n);
        let shifted = self
            .instant
            .naive_local()
            .checked_add_signed(days)
            .and_then(|target| {
                resolve_local(&tz, &target).or_else(|| {
                    target
                        .checked_add_signed(Duration::hours(1))
                        .and_then(|later| resolve_local(&tz, &later))
                })
            })
            .or_else(|| self.instant.checked_add_signed(days));
        self.shifted(shifted)
    }

    /// Truncate to the start of the current local hour
    pub fn zero_minutes(&self) -> Self {
        let elapsed = Duration::minutes(i64::from(self.instant.minute()))
            + Duration::seconds(i64::from(self.instant.second()))
            + Duration::nanoseconds(i64::from(self.instant.nanosecond()));
        self.shifted(self.instant.checked_sub_signed(elapsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone};
    use proptest::prelude::*;

    fn utc_clock(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> Clock {
        Clock::at(Tz::UTC.with_ymd_and_hms(y, m, d, h, min, s).unwrap())
    }

    #[test]
    fn test_now_tracks_wall_clock() {
        let start = Utc::now();
        let clock = Clock::now(Tz::UTC);
        assert!(clock.instant() >= start);
        assert!(clock.tracks_wall_clock());
    }

    #[test]
    fn test_at_does_not_track() {
        let clock = utc_clock(1970, 1, 1, 1, 3, 5);
        assert!(!clock.tracks_wall_clock());
        assert_eq!(clock.instant().timestamp(), 3785);
    }

    #[test]
    fn test_from_unix_timestamp() {
        let clock = Clock::from_unix_timestamp(1, Tz::UTC).unwrap();
        assert_eq!(clock.instant(), utc_clock(1970, 1, 1, 0, 0, 1).instant());
        assert!(!clock.tracks_wall_clock());
        assert!(Clock::from_unix_timestamp(i64::MAX, Tz::UTC).is_none());
    }

    fn range_limits() -> (i64, i64) {
        let margin = Duration::days(RANGE_MARGIN_DAYS);
        let first = (NaiveDateTime::MIN + margin).and_utc().timestamp();
        let last = (NaiveDateTime::MAX - margin).and_utc().timestamp();
        (first, last)
    }

    #[test]
    fn test_from_unix_timestamp_rejects_range_edges() {
        let (first, last) = range_limits();
        assert!(Clock::from_unix_timestamp(first, Tz::UTC).is_some());
        assert!(Clock::from_unix_timestamp(last, Tz::UTC).is_some());
        assert!(Clock::from_unix_timestamp(first - 1, Tz::UTC).is_none());
        assert!(Clock::from_unix_timestamp(last + 1, Tz::UTC).is_none());
        assert!(Clock::from_unix_timestamp(8_210_298_412_799, Tz::UTC).is_none());
    }

    #[test]
    fn test_offsets_stop_at_range_edges() {
        let (first, last) = range_limits();
        let tokyo: Tz = "Asia/Tokyo".parse().unwrap();

        let late = Clock::from_unix_timestamp(last - 60, tokyo).unwrap();
        assert_eq!(late.add_hours(1).instant(), late.instant());
        assert_eq!(late.add_days(7).instant(), late.instant());
        assert_eq!(late.add_minutes(1).instant().timestamp(), last);
        assert!(!late.add_hours(1).tracks_wall_clock());

        let early = Clock::from_unix_timestamp(first, tokyo).unwrap();
        assert_eq!(early.add_minutes(-1).instant(), early.instant());
        assert_eq!(early.add_days(-7).instant(), early.instant());
        assert_eq!(early.add_hours(1).instant().timestamp(), first + 3600);
    }

    #[test]
    fn test_offsets_clear_tracking() {
        let clock = Clock::now(Tz::UTC);
        assert!(!clock.add_minutes(1).tracks_wall_clock());
        assert!(!clock.add_hours(0).tracks_wall_clock());
        assert!(!clock.add_days(1).tracks_wall_clock());
        assert!(!clock.zero_minutes().tracks_wall_clock());
    }

    #[test]
    fn test_add_hours_keeps_minutes() {
        let clock = utc_clock(2017, 11, 5, 0, 29, 2);
        let next = clock.add_hours(1);
        assert_eq!(next, utc_clock(2017, 11, 5, 1, 29, 2));
        assert_eq!(next.add_hours(-2), utc_clock(2017, 11, 4, 23, 29, 2));
    }

    #[test]
    fn test_add_minutes() {
        let clock = utc_clock(2017, 11, 5, 23, 59, 30);
        assert_eq!(clock.add_minutes(1), utc_clock(2017, 11, 6, 0, 0, 30));
        assert_eq!(clock.add_minutes(-60), utc_clock(2017, 11, 5, 22, 59, 30));
    }

    #[test]
    fn test_zero_minutes() {
        let paris: Tz = "Europe/Paris".parse().unwrap();
        let instant = paris.with_ymd_and_hms(2024, 5, 1, 14, 43, 59).unwrap()
            + Duration::nanoseconds(127);
        let zeroed = Clock::at(instant).zero_minutes().instant();
        assert_eq!(
            (zeroed.hour(), zeroed.minute(), zeroed.second(), zeroed.nanosecond()),
            (14, 0, 0, 0)
        );
        assert_eq!(zeroed.day(), 1);
    }

    #[test]
    fn test_add_days_keeps_wall_clock_across_dst() {
        let paris: Tz = "Europe/Paris".parse().unwrap();
        let before = Clock::at(paris.with_ymd_and_hms(2024, 3, 30, 12, 0, 0).unwrap());
        let after = before.add_days(1).instant();
        assert_eq!((after.day(), after.hour(), after.minute()), (31, 12, 0));
        // 23 hours of elapsed time across the spring-forward night
        assert_eq!((after - before.instant()).num_hours(), 23);

        let week_back = Clock::at(after).add_days(-7).instant();
        assert_eq!((week_back.month(), week_back.day(), week_back.hour()), (3, 24, 12));
    }

    #[test]
    fn test_add_days_into_gap() {
        let paris: Tz = "Europe/Paris".parse().unwrap();
        let clock = Clock::at(paris.with_ymd_and_hms(2024, 3, 30, 2, 30, 0).unwrap());
        let shifted = clock.add_days(1).instant();
        assert_eq!((shifted.day(), shifted.hour(), shifted.minute()), (31, 3, 30));
    }

    proptest! {
        #[test]
        fn test_twenty_four_hours_is_one_day(seconds in -2_000_000_000i64..4_000_000_000i64) {
            let start = Clock::from_unix_timestamp(seconds, Tz::UTC).unwrap();
            let mut clock = start;
            for _ in 0..24 {
                clock = clock.add_hours(1);
            }
            prop_assert_eq!(clock.instant().hour(), start.instant().hour());
            prop_assert_eq!(
                clock.instant().date_naive(),
                start.instant().date_naive().succ_opt().unwrap()
            );
            for _ in 0..24 {
                clock = clock.add_hours(-1);
            }
            prop_assert_eq!(clock.instant(), start.instant());
        }
    }
}
