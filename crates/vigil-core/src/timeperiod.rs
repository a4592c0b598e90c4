//! Weekly time periods for check scheduling.
//!
//! A [`TimePeriod`] names a set of valid moments as per-weekday ranges of
//! seconds-of-day. The two evaluation functions, [`is_time_in_period`] and
//! [`next_valid_time`], drive every scheduling and freshness decision in the
//! engine: a check may only be placed at a time its period considers valid.
//!
//! Per-object timezones are expressed as fixed UTC offsets; evaluation
//! happens in the object's local wall clock.

use chrono::{DateTime, Datelike, Duration, FixedOffset, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// A half-open `[start, end)` range of seconds within a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayRange {
    /// Start second of day (inclusive), `0..86400`.
    pub start: u32,
    /// End second of day (exclusive), `1..=86400`.
    pub end: u32,
}

impl DayRange {
    /// Creates a new range.
    ///
    /// # Panics
    ///
    /// Panics if `start >= end` or `end > 86400`.
    pub fn new(start: u32, end: u32) -> Self {
        assert!(start < end, "DayRange start must be < end");
        assert!(end <= 86_400, "DayRange end must be <= 86400");
        Self { start, end }
    }

    /// Returns true if the given second-of-day falls inside the range.
    pub fn contains(&self, second_of_day: u32) -> bool {
        second_of_day >= self.start && second_of_day < self.end
    }
}

/// A named weekly time period.
///
/// `days[0]` is Sunday through `days[6]` Saturday. A period with no range on
/// any day is "always valid": it stands in for an object that has no check
/// period configured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimePeriod {
    /// Period name, the natural key in the configuration set.
    pub name: String,
    /// Alias for display.
    pub alias: String,
    /// Valid ranges per weekday, Sunday first. Kept sorted by start.
    pub days: [Vec<DayRange>; 7],
}

impl TimePeriod {
    /// Creates an empty (always valid) period.
    pub fn always(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: String::new(),
            days: Default::default(),
        }
    }

    /// Builder: set the alias.
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }

    /// Builder: add a range on a weekday (0 = Sunday .. 6 = Saturday).
    ///
    /// # Panics
    ///
    /// Panics if `weekday > 6`.
    #[must_use]
    pub fn with_range(mut self, weekday: usize, range: DayRange) -> Self {
        self.days[weekday].push(range);
        self.days[weekday].sort_by_key(|r| r.start);
        self
    }

    /// Returns true if the period has no ranges at all.
    pub fn is_always(&self) -> bool {
        self.days.iter().all(Vec::is_empty)
    }
}

/// Returns true if `time` falls inside `period`, evaluated at the given
/// UTC offset.
pub fn is_time_in_period(time: DateTime<Utc>, period: &TimePeriod, offset: FixedOffset) -> bool {
    if period.is_always() {
        return true;
    }
    let local = time.with_timezone(&offset);
    let weekday = local.weekday().num_days_from_sunday() as usize;
    let second = local.num_seconds_from_midnight();
    period.days[weekday].iter().any(|r| r.contains(second))
}

/// Returns the earliest time `>= time` that falls inside `period`.
///
/// For an always-valid period this is `time` itself. A weekly period either
/// has a valid moment within the next seven days or none at all; in the
/// latter (misconfigured) case `time` is returned unchanged so the caller
/// can detect "next valid time equals now" and skip the object.
pub fn next_valid_time(time: DateTime<Utc>, period: &TimePeriod, offset: FixedOffset) -> DateTime<Utc> {
    if is_time_in_period(time, period, offset) {
        return time;
    }

    let local = time.with_timezone(&offset);
    for day_offset in 0..8i64 {
        let day = local + Duration::days(day_offset);
        let weekday = day.weekday().num_days_from_sunday() as usize;
        let midnight = day
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .expect("midnight is valid")
            .and_local_timezone(offset)
            .single()
            .expect("fixed offsets are unambiguous");
        for range in &period.days[weekday] {
            let start = midnight + Duration::seconds(i64::from(range.start));
            if start >= time {
                return start.with_timezone(&Utc);
            }
        }
    }

    time
}
