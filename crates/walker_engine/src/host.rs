use async_trait::async_trait;
use serde_json::Value;

use crate::types::HostError;

/// The page the walker runs inside.
///
/// Implementations drive a live browser tab or replay saved snapshots. Every
/// method may fail if the page has been closed or navigated away.
#[async_trait]
pub trait HostPage: Send + Sync {
    /// Current address of the page.
    async fn url(&self) -> Result<String, HostError>;
    /// Markup of the page as currently rendered.
    async fn snapshot(&self) -> Result<String, HostError>;
    async fn scroll_into_view(&self, selector: &str) -> Result<(), HostError>;
    async fn click(&self, selector: &str) -> Result<(), HostError>;
    async fn focus_window(&self) -> Result<(), HostError>;
    async fn focus(&self, selector: &str) -> Result<(), HostError>;
    /// Entries of the page's own persisted view state, in storage order.
    async fn view_state(&self) -> Result<Vec<(String, String)>, HostError>;
    async fn set_view_state(&self, key: &str, value: &str) -> Result<(), HostError>;
    async fn reload(&self) -> Result<(), HostError>;
}

/// Rewrites the paginator offset in one stored view-state blob.
///
/// Returns the new blob when `raw` is a JSON object holding `cursor_field`;
/// anything else (not JSON, not an object, no such member) is left alone.
pub fn rewind_cursor(raw: &str, cursor_field: &str) -> Option<String> {
    let mut value: Value = serde_json::from_str(raw).ok()?;
    let object = value.as_object_mut()?;
    let cursor = object.get_mut(cursor_field)?;
    *cursor = Value::from(0);
    Some(value.to_string())
}
