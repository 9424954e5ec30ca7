//! Walker core: job data model and the pure controller state machine.
mod effect;
mod elapsed;
mod job;
mod msg;
mod record;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use elapsed::time_ago;
pub use job::{Ack, JobEvent, JobState, JobStatePatch, PageTotal};
pub use msg::{ExportReport, Msg};
pub use record::{normalize_numeric, CellValue, FieldKind, Record, FIELD_COUNT};
pub use state::{ControllerSettings, ControllerState, DEFAULT_TARGET_HOST};
pub use update::update;
pub use view_model::{ControllerView, StatusLine, Tone};
