use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timing of the wait that follows each click on the next-page control.
///
/// The host table renders asynchronously and gives no completion signal, so
/// the walker pauses, refocuses, polls for changed markup up to
/// `render_timeout`, refocuses again and pauses once more.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettleSettings {
    #[serde(with = "duration_ms")]
    pub pre_render_pause: Duration,
    #[serde(with = "duration_ms")]
    pub render_timeout: Duration,
    #[serde(with = "duration_ms")]
    pub poll_interval: Duration,
    #[serde(with = "duration_ms")]
    pub post_render_pause: Duration,
    /// Refocus the window and table around the render wait.
    pub refocus: bool,
}

impl Default for SettleSettings {
    fn default() -> Self {
        Self {
            pre_render_pause: Duration::from_millis(500),
            render_timeout: Duration::from_millis(5_000),
            poll_interval: Duration::from_millis(250),
            post_render_pause: Duration::from_millis(500),
            refocus: true,
        }
    }
}

/// Where the walker finds things on the host page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkSettings {
    pub row_selector: String,
    pub cell_selector: String,
    /// Control cells (checkbox, action button) before the data cells.
    pub leading_cells: usize,
    pub table_selector: String,
    pub next_selector: String,
    pub disabled_class: String,
    /// Element whose text reads "<page> of <total>", if the host shows one.
    pub total_selector: Option<String>,
    /// Member of the stored view state holding the paginator offset.
    pub cursor_field: String,
    #[serde(with = "duration_ms")]
    pub reset_delay: Duration,
    pub settle: SettleSettings,
}

impl Default for WalkSettings {
    fn default() -> Self {
        Self {
            row_selector: "table tbody > tr".to_string(),
            cell_selector: "td".to_string(),
            leading_cells: 2,
            table_selector: "table".to_string(),
            next_selector: ".p-paginator-next".to_string(),
            disabled_class: "p-disabled".to_string(),
            total_selector: Some(".p-paginator-current".to_string()),
            cursor_field: "first".to_string(),
            reset_delay: Duration::from_millis(100),
            settle: SettleSettings::default(),
        }
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let millis = u64::try_from(value.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_serialize_as_milliseconds() {
        let json = serde_json::to_value(SettleSettings::default()).unwrap();
        assert_eq!(json["render_timeout"], 5_000);
        assert_eq!(json["pre_render_pause"], 500);

        let parsed: SettleSettings =
            serde_json::from_str(r#"{ "render_timeout": 1200 }"#).unwrap();
        assert_eq!(parsed.render_timeout, Duration::from_millis(1_200));
        assert_eq!(parsed.post_render_pause, Duration::from_millis(500));
    }
}
