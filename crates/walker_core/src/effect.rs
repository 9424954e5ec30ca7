use chrono::{DateTime, Utc};

use crate::Record;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Drop stored records and completion time.
    ClearStoredRecords,
    /// Persist `running=true` with the given start time.
    MarkRunning { started_at: DateTime<Utc> },
    /// Persist `running=false` after a start that never reached the extractor.
    MarkIdle,
    /// Send the start command to the extractor.
    SendStart,
    /// Send the reset command to the extractor.
    SendReset,
    /// Clear the whole durable store.
    ClearStore,
    /// Write a spreadsheet; `timestamp` goes into the file name.
    Export {
        records: Vec<Record>,
        timestamp: DateTime<Utc>,
    },
}
