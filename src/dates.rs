use anyhow::{Context, Result};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

const ISO_FORMAT: &str = "%Y-%m-%d";
const SEED_FORMAT: &str = "%d-%b-%Y";

/// Monday of the week containing `date`. Clamps to `NaiveDate::MIN` at the
/// edge of the representable range.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let offset = date.weekday().num_days_from_monday();
    date.checked_sub_signed(Duration::days(i64::from(offset)))
        .unwrap_or(NaiveDate::MIN)
}

/// Sunday closing the week that starts at `week_start(date)`. Clamps to
/// `NaiveDate::MAX`.
pub fn week_end(date: NaiveDate) -> NaiveDate {
    week_start(date)
        .checked_add_signed(Duration::days(6))
        .unwrap_or(NaiveDate::MAX)
}

/// Strip the time-of-day from a wall-clock timestamp.
pub fn day_only(datetime: NaiveDateTime) -> NaiveDate {
    datetime.date()
}

pub fn parse_iso(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), ISO_FORMAT)
        .with_context(|| format!("Invalid date '{}'. Use YYYY-MM-DD", s))
}

pub fn format_iso(date: NaiveDate) -> String {
    date.format(ISO_FORMAT).to_string()
}

/// Parse the seed table's `7-Oct-2025` style dates.
pub fn parse_seed_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), SEED_FORMAT)
        .with_context(|| format!("Could not parse date: '{}'", s))
}

/// `7 Oct 2025`
pub fn format_display_date(date: NaiveDate) -> String {
    format!("{} {}", date.day(), date.format("%b %Y"))
}

pub fn parse_time(s: &str) -> Result<NaiveTime> {
    let formats = ["%H:%M", "%H:%M:%S"];

    for fmt in formats {
        if let Ok(time) = NaiveTime::parse_from_str(s.trim(), fmt) {
            return Ok(time);
        }
    }

    anyhow::bail!("Could not parse time: '{}'. Use HH:MM", s)
}

/// `14:30` -> `2:30 PM`
pub fn format_time(time: NaiveTime) -> String {
    let hour = time.hour();
    let ampm = if hour >= 12 { "PM" } else { "AM" };
    let display_hour = match hour % 12 {
        0 => 12,
        h => h,
    };
    format!("{}:{:02} {}", display_hour, time.minute(), ampm)
}

pub fn format_time_range(start: Option<NaiveTime>, end: Option<NaiveTime>) -> Option<String> {
    match (start, end) {
        (Some(s), Some(e)) => Some(format!("{} – {}", format_time(s), format_time(e))),
        (Some(t), None) | (None, Some(t)) => Some(format_time(t)),
        (None, None) => None,
    }
}
