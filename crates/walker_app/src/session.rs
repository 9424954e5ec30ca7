use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;
use walker_core::{
    update, Ack, ControllerSettings, ControllerState, ControllerView, Effect, ExportReport,
    JobEvent, JobState, JobStatePatch, Msg,
};
use walker_engine::{export_records, Clock, Coordinator, Extractor, JobStore};
use walker_logging::{walker_debug, walker_error, walker_info, walker_warn};

/// Everything a controller session needs besides the engine parts.
pub struct SessionConfig {
    pub controller: ControllerSettings,
    pub output_dir: PathBuf,
    pub export_prefix: String,
    pub clock: Clock,
}

/// The page a session sends its commands to.
pub struct Tab {
    pub url: String,
    pub extractor: Arc<Extractor>,
}

/// One open controller: reconciled from the store on open, then driven by
/// operator commands and relayed job events until dropped.
pub struct Session {
    state: ControllerState,
    store: Arc<dyn JobStore>,
    events: broadcast::Receiver<JobEvent>,
    tab: Option<Tab>,
    output_dir: PathBuf,
    export_prefix: String,
    clock: Clock,
    cancel: CancellationToken,
    pending: VecDeque<Msg>,
    /// Set once the extractor accepted a start from this session.
    awaiting_outcome: bool,
}

impl Session {
    pub fn open(config: SessionConfig, coordinator: &Coordinator, tab: Option<Tab>) -> Self {
        let store = coordinator.store();
        let events = coordinator.subscribe();
        let mut session = Self {
            state: ControllerState::new(config.controller),
            store,
            events,
            tab,
            output_dir: config.output_dir,
            export_prefix: config.export_prefix,
            clock: config.clock,
            cancel: CancellationToken::new(),
            pending: VecDeque::new(),
            awaiting_outcome: false,
        };

        let stored = match session.store.get() {
            Ok(stored) => stored,
            Err(err) => {
                walker_error!("Could not read job state: {}", err);
                JobState::default()
            }
        };
        let now = (session.clock)();
        session.dispatch(Msg::Opened { stored, now });
        session
    }

    pub fn view(&self) -> ControllerView {
        self.state.view()
    }

    /// Cancels the walk this session started, if any.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn start(&mut self) -> ControllerView {
        let now = (self.clock)();
        self.dispatch(Msg::StartClicked {
            tab_url: self.tab_url(),
            now,
        })
    }

    pub fn reset(&mut self) -> ControllerView {
        self.dispatch(Msg::ResetClicked {
            tab_url: self.tab_url(),
        })
    }

    pub fn clear(&mut self) -> ControllerView {
        self.dispatch(Msg::ClearClicked)
    }

    pub fn export(&mut self) -> ControllerView {
        let now = (self.clock)();
        self.dispatch(Msg::ExportClicked { now })
    }

    /// Feeds relayed events into the session until the walk it started
    /// completes or fails. Returns at once if no walk was started.
    /// `on_change` sees every view that changed along the way.
    pub async fn follow_walk(&mut self, mut on_change: impl FnMut(&ControllerView)) {
        while self.awaiting_outcome {
            let event = match self.events.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    walker_warn!("Controller fell behind; {} events skipped", skipped);
                    continue;
                }
                Err(RecvError::Closed) => break,
            };
            let now = match &event {
                JobEvent::Completed { .. } => self.stored_completion(),
                _ => (self.clock)(),
            };
            if !matches!(event, JobEvent::Progress { .. }) {
                self.awaiting_outcome = false;
            }
            self.dispatch(Msg::Relayed { event, now });
            if self.state.consume_dirty() {
                on_change(&self.state.view());
            }
        }
    }

    fn tab_url(&self) -> String {
        self.tab.as_ref().map(|tab| tab.url.clone()).unwrap_or_default()
    }

    /// Completion time as the coordinator persisted it.
    fn stored_completion(&self) -> chrono::DateTime<chrono::Utc> {
        self.store
            .get()
            .ok()
            .and_then(|state| state.completed_at)
            .unwrap_or_else(|| (self.clock)())
    }

    fn dispatch(&mut self, msg: Msg) -> ControllerView {
        self.pending.push_back(msg);
        while let Some(msg) = self.pending.pop_front() {
            walker_debug!("Controller message {}", msg_name(&msg));
            let state = std::mem::take(&mut self.state);
            let (state, effects) = update(state, msg);
            self.state = state;
            for effect in effects {
                self.run_effect(effect);
            }
        }
        self.state.view()
    }

    fn run_effect(&mut self, effect: Effect) {
        match effect {
            Effect::ClearStoredRecords => self.write_store(JobStatePatch::clear_records()),
            Effect::MarkRunning { started_at } => {
                self.write_store(JobStatePatch::started(started_at))
            }
            Effect::MarkIdle => self.write_store(JobStatePatch::stopped()),
            Effect::ClearStore => {
                if let Err(err) = self.store.clear() {
                    walker_error!("Could not clear job state: {}", err);
                }
            }
            Effect::SendStart => {
                let ack = match &self.tab {
                    Some(tab) => Ok(tab.extractor.start_walk(self.cancel.clone())),
                    None => Err("no page attached".to_string()),
                };
                self.awaiting_outcome = matches!(ack, Ok(Ack { success: true, .. }));
                self.pending.push_back(Msg::StartAcknowledged(ack));
            }
            Effect::SendReset => {
                let ack: Result<Ack, String> = match &self.tab {
                    Some(tab) => Ok(tab.extractor.reset_view()),
                    None => Err("no page attached".to_string()),
                };
                self.pending.push_back(Msg::ResetAcknowledged(ack));
            }
            Effect::Export { records, timestamp } => {
                let result =
                    export_records(&self.output_dir, &self.export_prefix, &records, timestamp)
                        .map(|summary| ExportReport {
                            file_name: summary
                                .path
                                .file_name()
                                .map(|name| name.to_string_lossy().into_owned())
                                .unwrap_or_default(),
                            row_count: summary.row_count,
                        })
                        .map_err(|err| err.to_string());
                if let Ok(report) = &result {
                    walker_info!("Export written: {}", report.file_name);
                }
                let tab_url = self.tab.as_ref().map(|tab| tab.url.clone());
                self.pending.push_back(Msg::ExportFinished { result, tab_url });
            }
        }
    }

    fn write_store(&self, patch: JobStatePatch) {
        if let Err(err) = self.store.set(patch) {
            walker_error!("Could not update job state: {}", err);
        }
    }
}

fn msg_name(msg: &Msg) -> &'static str {
    match msg {
        Msg::Opened { .. } => "opened",
        Msg::StartClicked { .. } => "start",
        Msg::StartAcknowledged(_) => "start_ack",
        Msg::ResetClicked { .. } => "reset",
        Msg::ResetAcknowledged(_) => "reset_ack",
        Msg::ClearClicked => "clear",
        Msg::ExportClicked { .. } => "export",
        Msg::ExportFinished { .. } => "export_finished",
        Msg::Relayed { .. } => "relayed",
        Msg::NoOp => "noop",
    }
}
