use chrono::{DateTime, Utc};

pub const DEFAULT_EXPORT_PREFIX: &str = "coretax-data";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H-%M-%S";

/// Windows-safe, sortable export name: `{sanitized_prefix}-{YYYY-MM-DDTHH-MM-SS}.xlsx`
pub fn export_filename(prefix: &str, timestamp: DateTime<Utc>) -> String {
    let sanitized = sanitize_prefix(prefix);
    format!("{sanitized}-{}.xlsx", timestamp.format(TIMESTAMP_FORMAT))
}

fn sanitize_prefix(input: &str) -> String {
    let cleaned: String = input
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim_matches(&['_', ' ', '.', '-'][..]);
    if cleaned.is_empty() {
        return DEFAULT_EXPORT_PREFIX.to_string();
    }

    let mut compacted = String::with_capacity(cleaned.len());
    let mut prev_underscore = false;
    for c in cleaned.chars() {
        if c == '_' && prev_underscore {
            continue;
        }
        prev_underscore = c == '_';
        compacted.push(c);
    }
    if compacted.chars().count() > 60 {
        compacted = compacted.chars().take(60).collect();
    }
    compacted
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}
