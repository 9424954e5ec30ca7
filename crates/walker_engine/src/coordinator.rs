use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use walker_core::{JobEvent, JobStatePatch};
use walker_logging::{walker_debug, walker_error, walker_info, walker_warn};

use crate::store::JobStore;
use crate::types::{DeliveryOutcome, EventSink};

/// Source of "now" for persisted timestamps.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

const RELAY_CAPACITY: usize = 64;

/// Always-on relay between the extractor and a possibly absent controller.
///
/// `completed` and `failed` are persisted before relaying, so a controller
/// that opens later still sees the outcome. `progress` is relay-only.
pub struct Coordinator {
    store: Arc<dyn JobStore>,
    relay: broadcast::Sender<JobEvent>,
    clock: Clock,
}

impl Coordinator {
    pub fn new(store: Arc<dyn JobStore>) -> Self {
        Self::with_clock(store, Arc::new(Utc::now))
    }

    pub fn with_clock(store: Arc<dyn JobStore>, clock: Clock) -> Self {
        let (relay, _rx) = broadcast::channel(RELAY_CAPACITY);
        Self {
            store,
            relay,
            clock,
        }
    }

    /// Attaches a controller. Dropping the receiver detaches it.
    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.relay.subscribe()
    }

    pub fn store(&self) -> Arc<dyn JobStore> {
        Arc::clone(&self.store)
    }

    fn persist(&self, patch: JobStatePatch) -> bool {
        match self.store.set(patch) {
            Ok(()) => true,
            Err(err) => {
                walker_error!("Failed to persist job outcome: {}", err);
                false
            }
        }
    }
}

impl EventSink for Coordinator {
    fn publish(&self, event: JobEvent) -> DeliveryOutcome {
        let persisted = match &event {
            JobEvent::Completed { records } => {
                let at = (self.clock)();
                let saved = self.persist(JobStatePatch::completed(records.clone(), at));
                if saved {
                    walker_info!("Saved {} records, completed at {}", records.len(), at);
                }
                saved
            }
            JobEvent::Failed { reason } => {
                walker_warn!("Walk failed: {}", reason);
                self.persist(JobStatePatch::stopped())
            }
            JobEvent::Progress { .. } => false,
        };

        let name = event.name();
        let relayed = match self.relay.send(event) {
            Ok(listeners) => {
                walker_debug!("Relayed {} to {} listener(s)", name, listeners);
                true
            }
            Err(_) => {
                walker_debug!("No controller attached; {} not relayed", name);
                false
            }
        };

        DeliveryOutcome { persisted, relayed }
    }
}
