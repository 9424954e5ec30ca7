use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use thiserror::Error;
use walker_core::{JobState, JobStatePatch};
use walker_logging::{walker_debug, walker_warn};

use crate::persist::{AtomicFileWriter, PersistError};

pub const STATE_FILENAME: &str = "job_state.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Single-instance durable job state.
///
/// Writes are all-or-nothing from a reader's point of view.
pub trait JobStore: Send + Sync {
    fn get(&self) -> Result<JobState, StoreError>;
    /// Merges `patch` into the stored state and persists the result.
    fn set(&self, patch: JobStatePatch) -> Result<(), StoreError>;
    /// Resets to the idle state with no records.
    fn clear(&self) -> Result<(), StoreError>;
}

/// Job state kept as one JSON document, replaced atomically on every write.
pub struct FileJobStore {
    writer: AtomicFileWriter,
    guard: Mutex<()>,
}

impl FileJobStore {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            writer: AtomicFileWriter::new(dir),
            guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.writer.dir().join(STATE_FILENAME)
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.guard.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn read(&self) -> Result<JobState, StoreError> {
        let path = self.path();
        let content = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(JobState::default());
            }
            Err(err) => return Err(err.into()),
        };

        match serde_json::from_str(&content) {
            Ok(state) => Ok(state),
            Err(err) => {
                walker_warn!("Stored job state at {:?} is unreadable ({}); treating as idle", path, err);
                Ok(JobState::default())
            }
        }
    }

    fn write(&self, state: &JobState) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(state)?;
        self.writer.write(STATE_FILENAME, content)?;
        walker_debug!(
            "Persisted job state running={} records={}",
            state.running,
            state.records.len()
        );
        Ok(())
    }
}

impl JobStore for FileJobStore {
    fn get(&self) -> Result<JobState, StoreError> {
        let _guard = self.lock();
        self.read()
    }

    fn set(&self, patch: JobStatePatch) -> Result<(), StoreError> {
        let _guard = self.lock();
        let mut state = self.read()?;
        state.apply(patch);
        self.write(&state)
    }

    fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.lock();
        self.write(&JobState::default())
    }
}

/// In-process store, for tests and throwaway sessions.
#[derive(Default)]
pub struct MemoryJobStore {
    state: Mutex<JobState>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: JobState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    fn lock(&self) -> MutexGuard<'_, JobState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl JobStore for MemoryJobStore {
    fn get(&self) -> Result<JobState, StoreError> {
        Ok(self.lock().clone())
    }

    fn set(&self, patch: JobStatePatch) -> Result<(), StoreError> {
        self.lock().apply(patch);
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.lock() = JobState::default();
        Ok(())
    }
}
