//! Walker engine: page walking, durable job state, relay and export.
mod coordinator;
mod export;
mod extractor;
mod filename;
mod host;
mod persist;
mod rows;
mod settings;
mod settle;
mod snapshot;
mod store;
mod types;

pub use coordinator::{Clock, Coordinator};
pub use export::{build_workbook, export_records, ExportError, ExportSummary};
pub use extractor::Extractor;
pub use filename::{export_filename, DEFAULT_EXPORT_PREFIX};
pub use host::{rewind_cursor, HostPage};
pub use persist::{ensure_dir, AtomicFileWriter, PersistError};
pub use rows::{extract_rows, map_row, page_signature, read_page};
pub use settings::{SettleSettings, WalkSettings};
pub use settle::{pause, wait_until};
pub use snapshot::{SnapshotHost, VIEW_STATE_FILENAME};
pub use store::{FileJobStore, JobStore, MemoryJobStore, StoreError, STATE_FILENAME};
pub use types::{Affordance, DeliveryOutcome, EventSink, ExtractError, HostError, PageRead};
