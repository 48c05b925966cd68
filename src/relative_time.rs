use chrono::{DateTime, Utc};

const MS_PER_SECOND: f64 = 1_000.0;
const MS_PER_MINUTE: f64 = 60_000.0;
const MS_PER_HOUR: f64 = 3_600_000.0;
const MS_PER_DAY: f64 = 86_400_000.0;

// Mean Gregorian month: 400 years hold 146097 days and 4800 months.
const MONTHS_PER_DAY: f64 = 4_800.0 / 146_097.0;

/// Renders a unix timestamp relative to `now`, e.g. "an hour ago" or
/// "in 3 days".
pub fn relative_time(timestamp: i64, now: DateTime<Utc>) -> String {
    let delta_ms = timestamp as f64 * MS_PER_SECOND - now.timestamp_millis() as f64;
    let phrase = humanize(delta_ms.abs());

    if delta_ms > 0.0 {
        format!("in {}", phrase)
    } else {
        format!("{} ago", phrase)
    }
}

fn humanize(abs_ms: f64) -> String {
    let seconds = (abs_ms / MS_PER_SECOND).round();
    let minutes = (abs_ms / MS_PER_MINUTE).round();
    let hours = (abs_ms / MS_PER_HOUR).round();
    let days_exact = abs_ms / MS_PER_DAY;
    let days = days_exact.round();
    let months_exact = days_exact * MONTHS_PER_DAY;
    let months = months_exact.round();
    let years = (months_exact / 12.0).round();

    if seconds <= 44.0 {
        "a few seconds".to_string()
    } else if minutes <= 1.0 {
        "a minute".to_string()
    } else if minutes < 45.0 {
        format!("{} minutes", minutes)
    } else if hours <= 1.0 {
        "an hour".to_string()
    } else if hours < 22.0 {
        format!("{} hours", hours)
    } else if days <= 1.0 {
        "a day".to_string()
    } else if days < 26.0 {
        format!("{} days", days)
    } else if months <= 1.0 {
        "a month".to_string()
    } else if months < 11.0 {
        format!("{} months", months)
    } else if years <= 1.0 {
        "a year".to_string()
    } else {
        format!("{} years", years)
    }
}
