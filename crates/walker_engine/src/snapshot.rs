use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use scraper::{Html, Selector};
use serde_json::Value;
use walker_logging::{walker_debug, walker_info};

use crate::host::HostPage;
use crate::persist::{AtomicFileWriter, PersistError};
use crate::types::HostError;

/// File holding the replayed page's view state inside a snapshot directory.
pub const VIEW_STATE_FILENAME: &str = "view_state.json";

/// A host page replayed from saved HTML snapshots.
///
/// Each snapshot is one page of the table. Clicking an enabled element that
/// matches the next-page selector moves to the following snapshot; doing so on
/// the last snapshot fails, since the capture has no page to show. Reloading
/// repositions the replay from the cursor and `rows` members of a stored
/// view-state blob, the way the real paginator restores itself.
pub struct SnapshotHost {
    url: String,
    next_selector: String,
    disabled_class: String,
    cursor_field: String,
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    pages: Vec<String>,
    index: usize,
    view_state: BTreeMap<String, String>,
    detached: bool,
    clicks: usize,
    focus_calls: usize,
    reloads: usize,
}

impl SnapshotHost {
    pub fn new(url: impl Into<String>, pages: Vec<String>) -> Self {
        Self {
            url: url.into(),
            next_selector: ".p-paginator-next".to_string(),
            disabled_class: "p-disabled".to_string(),
            cursor_field: "first".to_string(),
            inner: Mutex::new(Inner {
                pages,
                ..Inner::default()
            }),
        }
    }

    /// Loads every `*.html` file in `dir`, in file-name order, plus an optional
    /// `view_state.json` object mapping storage keys to values.
    pub fn from_dir(url: impl Into<String>, dir: &Path) -> Result<Self, HostError> {
        let mut paths: Vec<_> = fs::read_dir(dir)
            .map_err(|e| HostError::Other(format!("cannot read {}: {e}", dir.display())))?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file() && p.extension().and_then(|s| s.to_str()) == Some("html"))
            .collect();
        paths.sort();

        let mut pages = Vec::with_capacity(paths.len());
        for path in &paths {
            let html = fs::read_to_string(path)
                .map_err(|e| HostError::Other(format!("cannot read {}: {e}", path.display())))?;
            pages.push(html);
        }
        walker_info!("Loaded {} page snapshots from {:?}", pages.len(), dir);

        let host = Self::new(url, pages);
        let state_path = dir.join(VIEW_STATE_FILENAME);
        if state_path.is_file() {
            let raw = fs::read_to_string(&state_path).map_err(|e| {
                HostError::Other(format!("cannot read {}: {e}", state_path.display()))
            })?;
            let entries: BTreeMap<String, Value> = serde_json::from_str(&raw).map_err(|e| {
                HostError::Other(format!("invalid {}: {e}", state_path.display()))
            })?;
            let mut inner = host.lock();
            for (key, value) in entries {
                let text = match value {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                inner.view_state.insert(key, text);
            }
        }
        Ok(host)
    }

    pub fn with_selectors(
        mut self,
        next_selector: impl Into<String>,
        disabled_class: impl Into<String>,
    ) -> Self {
        self.next_selector = next_selector.into();
        self.disabled_class = disabled_class.into();
        self
    }

    /// Member of a view-state blob that holds the paginator offset.
    pub fn with_cursor_field(mut self, cursor_field: impl Into<String>) -> Self {
        self.cursor_field = cursor_field.into();
        self
    }

    pub fn with_view_state(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.lock().view_state.insert(key.into(), value.into());
        self
    }

    /// Simulates the tab being closed; every later call fails.
    pub fn detach(&self) {
        self.lock().detached = true;
    }

    pub fn current_page(&self) -> usize {
        self.lock().index
    }

    pub fn clicks(&self) -> usize {
        self.lock().clicks
    }

    pub fn focus_calls(&self) -> usize {
        self.lock().focus_calls
    }

    pub fn reloads(&self) -> usize {
        self.lock().reloads
    }

    pub fn view_state_entry(&self, key: &str) -> Option<String> {
        self.lock().view_state.get(key).cloned()
    }

    /// Writes the current view state back to `dir/view_state.json`.
    pub fn save_view_state(&self, dir: &Path) -> Result<(), PersistError> {
        let entries: BTreeMap<String, Value> = self
            .lock()
            .view_state
            .iter()
            .map(|(k, v)| {
                let value = serde_json::from_str(v).unwrap_or_else(|_| Value::String(v.clone()));
                (k.clone(), value)
            })
            .collect();
        let content = serde_json::to_string_pretty(&entries)
            .map_err(|e| PersistError::Io(std::io::Error::other(e)))?;
        AtomicFileWriter::new(dir.to_path_buf()).write(VIEW_STATE_FILENAME, content)?;
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn attached(&self) -> Result<MutexGuard<'_, Inner>, HostError> {
        let inner = self.lock();
        if inner.detached {
            return Err(HostError::Detached(self.url.clone()));
        }
        Ok(inner)
    }
}

impl Inner {
    fn current_html(&self) -> &str {
        self.pages.get(self.index).map(String::as_str).unwrap_or("")
    }

    /// Returns whether the element exists and, if so, whether it is disabled.
    fn find_control(&self, selector: &str, disabled_class: &str) -> Result<Option<bool>, HostError> {
        let sel =
            Selector::parse(selector).map_err(|_| HostError::InvalidSelector(selector.into()))?;
        let document = Html::parse_document(self.current_html());
        let found = document.select(&sel).next().map(|el| {
            let element = el.value();
            element.classes().any(|c| c == disabled_class) || element.attr("disabled").is_some()
        });
        Ok(found)
    }

    fn reposition_from_view_state(&mut self, cursor_field: &str) {
        let offset = self.view_state.values().find_map(|raw| {
            let value: Value = serde_json::from_str(raw).ok()?;
            let first = value.get(cursor_field)?.as_u64()?;
            let rows = value.get("rows").and_then(Value::as_u64).filter(|r| *r > 0)?;
            Some((first / rows) as usize)
        });
        if let Some(page) = offset {
            self.index = page.min(self.pages.len().saturating_sub(1));
        }
    }
}

#[async_trait]
impl HostPage for SnapshotHost {
    async fn url(&self) -> Result<String, HostError> {
        let _inner = self.attached()?;
        Ok(self.url.clone())
    }

    async fn snapshot(&self) -> Result<String, HostError> {
        let inner = self.attached()?;
        Ok(inner.current_html().to_string())
    }

    async fn scroll_into_view(&self, selector: &str) -> Result<(), HostError> {
        let inner = self.attached()?;
        match inner.find_control(selector, &self.disabled_class)? {
            Some(_) => Ok(()),
            None => Err(HostError::ElementNotFound(selector.into())),
        }
    }

    async fn click(&self, selector: &str) -> Result<(), HostError> {
        let mut inner = self.attached()?;
        let disabled = inner
            .find_control(selector, &self.disabled_class)?
            .ok_or_else(|| HostError::ElementNotFound(selector.into()))?;
        inner.clicks += 1;
        if selector != self.next_selector || disabled {
            return Ok(());
        }
        if inner.index + 1 >= inner.pages.len() {
            return Err(HostError::Other(format!(
                "no more saved pages after page {}",
                inner.index + 1
            )));
        }
        inner.index += 1;
        walker_debug!("Snapshot host moved to page {}", inner.index + 1);
        Ok(())
    }

    async fn focus_window(&self) -> Result<(), HostError> {
        let mut inner = self.attached()?;
        inner.focus_calls += 1;
        Ok(())
    }

    async fn focus(&self, selector: &str) -> Result<(), HostError> {
        let mut inner = self.attached()?;
        inner.focus_calls += 1;
        match inner.find_control(selector, &self.disabled_class)? {
            Some(_) => Ok(()),
            None => Err(HostError::ElementNotFound(selector.into())),
        }
    }

    async fn view_state(&self) -> Result<Vec<(String, String)>, HostError> {
        let inner = self.attached()?;
        Ok(inner
            .view_state
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    async fn set_view_state(&self, key: &str, value: &str) -> Result<(), HostError> {
        let mut inner = self.attached()?;
        inner.view_state.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn reload(&self) -> Result<(), HostError> {
        let mut inner = self.attached()?;
        inner.reloads += 1;
        inner.reposition_from_view_state(&self.cursor_field);
        walker_info!("Snapshot host reloaded at page {}", inner.index + 1);
        Ok(())
    }
}
