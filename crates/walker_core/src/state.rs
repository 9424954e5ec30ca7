use chrono::{DateTime, Utc};
use url::Url;

use crate::view_model::{ControllerView, StatusLine};
use crate::Record;

/// Host the walk is allowed to run against unless configured otherwise.
pub const DEFAULT_TARGET_HOST: &str = "coretaxdjp.pajak.go.id";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerSettings {
    pub target_host: String,
    /// Export as soon as a completed walk is relayed.
    pub auto_export: bool,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            target_host: DEFAULT_TARGET_HOST.to_string(),
            auto_export: true,
        }
    }
}

/// Working memory of one controller session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ControllerState {
    settings: ControllerSettings,
    records: Vec<Record>,
    running: bool,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    export_in_flight: bool,
    reset_in_flight: bool,
    status: StatusLine,
    dirty: bool,
}

impl ControllerState {
    pub fn new(settings: ControllerSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn view(&self) -> ControllerView {
        ControllerView {
            running: self.running,
            start_enabled: !self.running,
            export_enabled: !self.running && !self.export_in_flight && !self.records.is_empty(),
            reset_enabled: !self.reset_in_flight,
            clear_enabled: !self.running && !self.records.is_empty(),
            record_count: self.records.len(),
            status: self.status.clone(),
            dirty: self.dirty,
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Whether `tab_url` points at the configured host or one of its subdomains.
    pub fn is_target_url(&self, tab_url: &str) -> bool {
        let target = self.settings.target_host.to_ascii_lowercase();
        Url::parse(tab_url.trim())
            .ok()
            .and_then(|url| url.host_str().map(str::to_ascii_lowercase))
            .is_some_and(|host| host == target || host.ends_with(&format!(".{target}")))
    }

    pub(crate) fn set_status(&mut self, status: StatusLine) {
        self.status = status;
        self.dirty = true;
    }

    pub(crate) fn restore_records(
        &mut self,
        records: Vec<Record>,
        completed_at: Option<DateTime<Utc>>,
    ) {
        self.records = records;
        self.completed_at = completed_at;
        self.dirty = true;
    }

    pub(crate) fn clear_records(&mut self) {
        self.records.clear();
        self.completed_at = None;
        self.dirty = true;
    }

    pub(crate) fn mark_running(&mut self, started_at: Option<DateTime<Utc>>) {
        self.running = true;
        self.started_at = started_at;
        self.dirty = true;
    }

    pub(crate) fn mark_idle(&mut self) {
        self.running = false;
        self.started_at = None;
        self.dirty = true;
    }

    pub(crate) fn set_export_in_flight(&mut self, value: bool) {
        self.export_in_flight = value;
        self.dirty = true;
    }

    pub(crate) fn export_in_flight(&self) -> bool {
        self.export_in_flight
    }

    pub(crate) fn set_reset_in_flight(&mut self, value: bool) {
        self.reset_in_flight = value;
        self.dirty = true;
    }

    pub(crate) fn reset_in_flight(&self) -> bool {
        self.reset_in_flight
    }
}
