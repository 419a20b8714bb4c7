use chrono::{Duration, NaiveDate};

/// Rounds to the nearest whole second, halves away from zero.
pub fn round_to_seconds(value: Duration) -> Duration {
    let seconds = value.num_seconds();
    let nanos = value.subsec_nanos();
    let adjustment = if nanos >= 500_000_000 {
        1
    } else if nanos <= -500_000_000 {
        -1
    } else {
        0
    };
    Duration::seconds(seconds + adjustment)
}

/// Formats durations the way they are shown in the sheet, e.g. `1h20m0s`, `30m0s`, `45s`.
/// Sub-second precision is dropped.
pub fn format_duration(v: Duration) -> String {
    if v.num_hours() > 0 {
        format!(
            "{}h{}m{}s",
            v.num_hours(),
            v.num_minutes() % 60,
            v.num_seconds() % 60
        )
    } else if v.num_minutes() > 0 {
        format!("{}m{}s", v.num_minutes() % 60, v.num_seconds() % 60)
    } else {
        format!("{}s", v.num_seconds() % 60)
    }
}

/// Short day label used for the most active day, e.g. `Mon 4 Mar`.
pub fn format_sheet_date(date: NaiveDate) -> String {
    date.format("%a %-d %b").to_string()
}

/// Date format expected by the WakaTime summaries endpoint.
pub fn format_query_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
