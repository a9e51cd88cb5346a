use std::fmt::Display;

use chrono::{DateTime, Local, TimeZone};

/// Relative label for a server timestamp, as of now in local time.
pub fn time_ago(timestamp: Option<&str>) -> String {
    format_time_ago(timestamp, Local::now())
}

/// Relative label for an RFC 3339 `timestamp` as seen at `now`.
///
/// Blank or missing timestamps read "Unknown"; unparsable ones are shown as
/// they are. Anything older than two days gets an absolute date in `now`'s
/// time zone.
pub fn format_time_ago<Tz>(timestamp: Option<&str>, now: DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let Some(raw) = timestamp.filter(|t| !t.trim().is_empty()) else {
        return "Unknown".to_string();
    };
    let Ok(parsed) = DateTime::parse_from_rfc3339(raw.trim()) else {
        return raw.to_string();
    };
    let then = parsed.with_timezone(&now.timezone());

    match (now - then.clone()).num_minutes() {
        m if m < 1 => "Just now".to_string(),
        m if m < 60 => format!("{m} min ago"),
        m if m < 24 * 60 => format!("{} hrs ago", m / 60),
        m if m < 48 * 60 => "Yesterday".to_string(),
        _ => then.format("%d %b %Y • %I:%M %p").to_string(),
    }
}
