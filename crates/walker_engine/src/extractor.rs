use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use walker_core::{Ack, JobEvent, Record};
use walker_logging::{walker_debug, walker_info, walker_warn};

use crate::host::{rewind_cursor, HostPage};
use crate::rows::{page_signature, read_page};
use crate::settings::WalkSettings;
use crate::settle::{pause, wait_until};
use crate::types::{EventSink, ExtractError, HostError};

/// Walks the host table page by page and reports the outcome to a sink.
///
/// One walk at a time. Records are buffered for the duration of a walk and
/// only leave the extractor inside a `Completed` event.
pub struct Extractor {
    host: Arc<dyn HostPage>,
    sink: Arc<dyn EventSink>,
    settings: WalkSettings,
    active: AtomicBool,
    tasks: TaskTracker,
}

/// Clears the active flag when the walk ends, however it ends.
struct ActiveGuard<'a>(&'a AtomicBool);

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Extractor {
    pub fn new(host: Arc<dyn HostPage>, sink: Arc<dyn EventSink>, settings: WalkSettings) -> Self {
        Self {
            host,
            sink,
            settings,
            active: AtomicBool::new(false),
            tasks: TaskTracker::new(),
        }
    }

    pub fn host(&self) -> &Arc<dyn HostPage> {
        &self.host
    }

    pub fn settings(&self) -> &WalkSettings {
        &self.settings
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Starts a walk in the background and acknowledges immediately.
    ///
    /// The result arrives later as a `Completed` or `Failed` event.
    pub fn start_walk(self: &Arc<Self>, cancel: CancellationToken) -> Ack {
        if self.active.swap(true, Ordering::AcqRel) {
            walker_warn!("Start refused: a walk is already running");
            return Ack::rejected("A walk is already running");
        }

        let this = Arc::clone(self);
        self.tasks.spawn(async move {
            let outcome = {
                let _active = ActiveGuard(&this.active);
                this.walk_pages(&cancel).await
            };
            let event = match outcome {
                Ok(records) => JobEvent::Completed { records },
                Err(err) => JobEvent::Failed {
                    reason: err.to_string(),
                },
            };
            let delivery = this.sink.publish(event);
            if !delivery.persisted {
                walker_warn!("Walk outcome was not persisted");
            }
        });
        Ack::ok("Walk started")
    }

    /// Runs one walk to completion in the caller's task.
    pub async fn run_walk(&self, cancel: &CancellationToken) -> Result<Vec<Record>, ExtractError> {
        if self.active.swap(true, Ordering::AcqRel) {
            return Err(ExtractError::AlreadyRunning);
        }
        let _active = ActiveGuard(&self.active);
        self.walk_pages(cancel).await
    }

    async fn walk_pages(&self, cancel: &CancellationToken) -> Result<Vec<Record>, ExtractError> {
        let mut records = Vec::new();
        let mut page: u32 = 1;
        walker_info!("Walk started");

        loop {
            if cancel.is_cancelled() {
                walker_info!("Walk cancelled on page {}", page);
                return Err(ExtractError::Cancelled);
            }

            let html = self.host.snapshot().await?;
            let read = read_page(&html, &self.settings)?;
            walker_debug!("Page {} gave {} records", page, read.records.len());
            records.extend(read.records);

            match read.next {
                Some(next) if !next.disabled => {}
                _ => break,
            }

            self.host.scroll_into_view(&self.settings.next_selector).await?;
            self.host.click(&self.settings.next_selector).await?;
            page += 1;

            self.settle(&read.signature, cancel).await?;
            self.sink.publish(JobEvent::Progress {
                page,
                total: read.total,
            });
        }

        walker_info!("Walk finished after {} pages with {} records", page, records.len());
        Ok(records)
    }

    /// Waits for the table to re-render after a page change.
    async fn settle(&self, previous: &str, cancel: &CancellationToken) -> Result<(), ExtractError> {
        let settle = &self.settings.settle;
        pause(settle.pre_render_pause, cancel).await?;
        self.refocus().await;

        let host = &self.host;
        let rendered = wait_until(settle.render_timeout, settle.poll_interval, cancel, move || async move {
            let html = host.snapshot().await?;
            Ok::<_, ExtractError>(page_signature(&html) != previous)
        })
        .await?;
        if !rendered {
            walker_debug!("Page did not change within {:?}; reading it anyway", settle.render_timeout);
        }

        self.refocus().await;
        pause(settle.post_render_pause, cancel).await
    }

    async fn refocus(&self) {
        if !self.settings.settle.refocus {
            return;
        }
        if let Err(err) = self.host.focus_window().await {
            walker_debug!("Window refocus failed: {}", err);
        }
        if let Err(err) = self.host.focus(&self.settings.table_selector).await {
            walker_debug!("Table refocus failed: {}", err);
        }
    }

    /// Acknowledges at once, then rewinds the paginator and reloads the page
    /// after the configured delay.
    pub fn reset_view(self: &Arc<Self>) -> Ack {
        let this = Arc::clone(self);
        self.tasks.spawn(async move {
            tokio::time::sleep(this.settings.reset_delay).await;
            if let Err(err) = this.rewind_and_reload().await {
                walker_warn!("Reset failed: {}", err);
            }
        });
        Ack::ok("Reset scheduled")
    }

    /// Rewinds the first stored view-state blob that holds a paginator cursor
    /// and reloads the page. Returns whether a blob was rewritten.
    pub async fn rewind_and_reload(&self) -> Result<bool, HostError> {
        let cursor_field = &self.settings.cursor_field;
        let rewound = self
            .host
            .view_state()
            .await?
            .into_iter()
            .find_map(|(key, raw)| rewind_cursor(&raw, cursor_field).map(|value| (key, value)));

        let rewritten = match rewound {
            Some((key, value)) => {
                self.host.set_view_state(&key, &value).await?;
                walker_info!("Rewound paginator state in {:?}", key);
                true
            }
            None => {
                walker_debug!("No stored paginator state found; reloading only");
                false
            }
        };

        self.host.reload().await?;
        Ok(rewritten)
    }

    /// Waits for every background walk and reset spawned so far.
    pub async fn wait_idle(&self) {
        self.tasks.close();
        self.tasks.wait().await;
        self.tasks.reopen();
    }
}
