use walker_core::{JobEvent, Record};

/// Failure reported by the host page.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    #[error("host page is gone: {0}")]
    Detached(String),
    #[error("element not found: {0}")]
    ElementNotFound(String),
    #[error("invalid selector: {0}")]
    InvalidSelector(String),
    #[error("host page error: {0}")]
    Other(String),
}

/// Failure that aborts a whole walk. Nothing is committed when one occurs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    #[error("a walk is already running")]
    AlreadyRunning,
    #[error("cancelled")]
    Cancelled,
    #[error("invalid selector {selector:?}")]
    InvalidSelector { selector: String },
    #[error(transparent)]
    Host(#[from] HostError),
}

/// Result of publishing one event through the coordinator.
///
/// Callers check `persisted`; `relayed` only says whether a controller was
/// listening at that moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeliveryOutcome {
    pub persisted: bool,
    pub relayed: bool,
}

/// Receives extractor lifecycle events.
pub trait EventSink: Send + Sync {
    fn publish(&self, event: JobEvent) -> DeliveryOutcome;
}

/// What one page of the host table yielded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRead {
    pub records: Vec<Record>,
    pub next: Option<Affordance>,
    pub total: walker_core::PageTotal,
    /// Digest of the page markup, used to detect re-render.
    pub signature: String,
}

/// The "next page" control as found on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Affordance {
    pub disabled: bool,
}
