use chrono::{DateTime, Utc};

/// Coarse "time ago" label for status lines.
pub fn time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - then).num_seconds().max(0);

    if seconds < 60 {
        return "just now".to_string();
    }
    if seconds < 3_600 {
        return plural(seconds / 60, "minute");
    }
    if seconds < 86_400 {
        return plural(seconds / 3_600, "hour");
    }
    plural(seconds / 86_400, "day")
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{count} {unit}s ago")
    }
}
