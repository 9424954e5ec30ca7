use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Record;

/// Durable, process-wide job state.
///
/// While `running` is set, `records` still holds the last fully completed
/// job; the in-flight walk buffers its own rows until completion.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JobState {
    pub running: bool,
    pub started_at: Option<DateTime<Utc>>,
    pub records: Vec<Record>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl JobState {
    /// Merges a partial update into this state.
    pub fn apply(&mut self, patch: JobStatePatch) {
        if let Some(running) = patch.running {
            self.running = running;
        }
        if let Some(started_at) = patch.started_at {
            self.started_at = started_at;
        }
        if let Some(records) = patch.records {
            self.records = records;
        }
        if let Some(completed_at) = patch.completed_at {
            self.completed_at = completed_at;
        }
    }
}

/// Partial write against [`JobState`]. `None` leaves a field untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JobStatePatch {
    pub running: Option<bool>,
    pub started_at: Option<Option<DateTime<Utc>>>,
    pub records: Option<Vec<Record>>,
    pub completed_at: Option<Option<DateTime<Utc>>>,
}

impl JobStatePatch {
    /// Controller issued start.
    pub fn started(at: DateTime<Utc>) -> Self {
        Self {
            running: Some(true),
            started_at: Some(Some(at)),
            ..Self::default()
        }
    }

    /// Extractor completed; replaces the record set.
    pub fn completed(records: Vec<Record>, at: DateTime<Utc>) -> Self {
        Self {
            running: Some(false),
            started_at: Some(None),
            records: Some(records),
            completed_at: Some(Some(at)),
        }
    }

    /// Walk stopped without a result. Previous records are kept.
    pub fn stopped() -> Self {
        Self {
            running: Some(false),
            started_at: Some(None),
            ..Self::default()
        }
    }

    /// Drops stored records and their completion time.
    pub fn clear_records() -> Self {
        Self {
            records: Some(Vec::new()),
            completed_at: Some(None),
            ..Self::default()
        }
    }
}

/// Total page count as far as the host paginator reveals it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageTotal {
    Known(u32),
    Unknown,
}

impl fmt::Display for PageTotal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageTotal::Known(total) => write!(f, "{total}"),
            PageTotal::Unknown => write!(f, "?"),
        }
    }
}

/// Lifecycle event emitted by the extractor and relayed by the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum JobEvent {
    Completed { records: Vec<Record> },
    Failed { reason: String },
    Progress { page: u32, total: PageTotal },
}

impl JobEvent {
    pub fn name(&self) -> &'static str {
        match self {
            JobEvent::Completed { .. } => "completed",
            JobEvent::Failed { .. } => "failed",
            JobEvent::Progress { .. } => "progress",
        }
    }
}

/// Immediate acknowledgement of a command sent to the extractor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub success: bool,
    pub message: Option<String>,
}

impl Ack {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn failure_keeps_previous_records() {
        let mut state = JobState::default();
        state.apply(JobStatePatch::completed(vec![Record::default()], at(10)));
        state.apply(JobStatePatch::started(at(20)));
        assert!(state.running);
        assert_eq!(state.records.len(), 1);

        state.apply(JobStatePatch::stopped());
        assert!(!state.running);
        assert_eq!(state.started_at, None);
        assert_eq!(state.records.len(), 1);
        assert_eq!(state.completed_at, Some(at(10)));
    }

    #[test]
    fn clearing_records_leaves_running_flag() {
        let mut state = JobState::default();
        state.apply(JobStatePatch::completed(vec![Record::default()], at(10)));
        state.apply(JobStatePatch::started(at(20)));
        state.apply(JobStatePatch::clear_records());

        assert!(state.running);
        assert!(state.records.is_empty());
        assert_eq!(state.completed_at, None);
        assert_eq!(state.started_at, Some(at(20)));
    }

    #[test]
    fn state_uses_four_named_fields() {
        let state = JobState {
            running: true,
            started_at: Some(at(0)),
            ..JobState::default()
        };
        let json = serde_json::to_value(&state).unwrap();
        let keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys.len(), 4);
        for key in ["running", "startedAt", "records", "completedAt"] {
            assert!(keys.iter().any(|k| k == key), "missing {key}");
        }
    }

    #[test]
    fn events_are_tagged() {
        let event = JobEvent::Progress {
            page: 3,
            total: PageTotal::Unknown,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "progress");
        assert_eq!(json["page"], 3);
        assert_eq!(PageTotal::Unknown.to_string(), "?");
        assert_eq!(PageTotal::Known(12).to_string(), "12");
    }
}
