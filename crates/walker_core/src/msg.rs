use chrono::{DateTime, Utc};

use crate::{Ack, JobEvent, JobState};

/// Outcome of a finished spreadsheet export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    pub file_name: String,
    pub row_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Controller session opened; `stored` is the durable job state.
    Opened {
        stored: JobState,
        now: DateTime<Utc>,
    },
    /// User asked to start a walk on the tab at `tab_url`.
    StartClicked {
        tab_url: String,
        now: DateTime<Utc>,
    },
    /// Extractor answered the start command, or sending it failed.
    StartAcknowledged(Result<Ack, String>),
    /// User asked to reset the host page view.
    ResetClicked { tab_url: String },
    /// Extractor answered the reset command, or sending it failed.
    ResetAcknowledged(Result<Ack, String>),
    /// User asked to drop stored records.
    ClearClicked,
    /// User asked for a spreadsheet of the held records.
    ExportClicked { now: DateTime<Utc> },
    /// Export finished; `tab_url` is the tab active at that moment, if any.
    ExportFinished {
        result: Result<ExportReport, String>,
        tab_url: Option<String>,
    },
    /// Coordinator relayed an extractor event.
    Relayed {
        event: JobEvent,
        now: DateTime<Utc>,
    },
    /// Fallback for placeholder wiring.
    NoOp,
}
