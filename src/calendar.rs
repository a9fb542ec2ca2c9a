use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, Utc};

use crate::models::GoalPeriod;

/// Sentinel for a habit that has never been logged.
pub const NEVER_LOGGED: i64 = i64::MAX;

/// The calendar day `now` falls on for a user at `offset`.
pub fn local_today(now: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    now.with_timezone(&offset).date_naive()
}

/// First day of the period containing `today`. Weeks start on Monday.
pub fn period_start(period: GoalPeriod, today: NaiveDate) -> NaiveDate {
    match period {
        GoalPeriod::PerDay => today,
        GoalPeriod::PerWeek => {
            today - Duration::days(today.weekday().num_days_from_monday() as i64)
        }
        GoalPeriod::PerMonth => today.with_day(1).unwrap_or(today),
    }
}

/// Reads the leading `YYYY-MM-DD` of a date or timestamp string as a local
/// calendar date. No timezone conversion is applied.
pub fn parse_local_date(value: &str) -> Option<NaiveDate> {
    let head = value.trim().get(..10)?;
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

/// Whole days between the last entry and `today`. Entries dated in the future
/// count as today.
pub fn days_since(last_entry: Option<NaiveDate>, today: NaiveDate) -> i64 {
    match last_entry {
        Some(date) => (today - date).num_days().max(0),
        None => NEVER_LOGGED,
    }
}

pub fn describe_days_since(days: i64) -> String {
    match days {
        NEVER_LOGGED => "never".to_string(),
        0 => "today".to_string(),
        1 => "1 day ago".to_string(),
        n => format!("{n} days ago"),
    }
}
