use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use walker_logging::walker_trace;

use crate::types::ExtractError;

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Sleeps for `duration` unless `cancel` fires first.
pub async fn pause(duration: Duration, cancel: &CancellationToken) -> Result<(), ExtractError> {
    tokio::select! {
        _ = cancel.cancelled() => Err(ExtractError::Cancelled),
        _ = tokio::time::sleep(duration) => Ok(()),
    }
}

/// Polls `condition` every `poll_interval` until it holds or `timeout` passes.
///
/// Returns `Ok(false)` on timeout. The condition is checked at least once.
pub async fn wait_until<F, Fut>(
    timeout: Duration,
    poll_interval: Duration,
    cancel: &CancellationToken,
    mut condition: F,
) -> Result<bool, ExtractError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, ExtractError>>,
{
    let deadline = Instant::now() + timeout;
    let poll_interval = poll_interval.max(MIN_POLL_INTERVAL);
    loop {
        if cancel.is_cancelled() {
            return Err(ExtractError::Cancelled);
        }
        if condition().await? {
            return Ok(true);
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(false);
        }
        walker_trace!("Condition not met; {:?} left", deadline - now);
        pause(poll_interval.min(deadline - now), cancel).await?;
    }
}
