//! UTC calendar windows

use chrono::{DateTime, Duration, DurationRound, NaiveTime, Utc};

/// Start of a window covering today and the `days - 1` preceding UTC days
#[must_use]
pub fn day_window_start(now: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    let first_day = now.date_naive() - Duration::days(i64::from(days.max(1)) - 1);
    first_day.and_time(NaiveTime::MIN).and_utc()
}

/// Start of the minute containing `at`
#[must_use]
pub fn minute_floor(at: DateTime<Utc>) -> DateTime<Utc> {
    at.duration_trunc(Duration::minutes(1)).unwrap_or(at)
}

/// Start of a window covering the current minute and the `minutes - 1` preceding ones
#[must_use]
pub fn minute_window_start(now: DateTime<Utc>, minutes: u32) -> DateTime<Utc> {
    minute_floor(now) - Duration::minutes(i64::from(minutes.max(1)) - 1)
}
