use std::time::Duration;

use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Satisfied,
    TimedOut,
    Cancelled,
}

/// Re-run `check` every `interval` until it passes, `timeout` elapses, or
/// `cancel` fires. The first check runs immediately.
pub async fn poll_until(
    mut check: impl FnMut() -> bool,
    timeout: Duration,
    interval: Duration,
    cancel: &CancellationToken,
) -> PollOutcome {
    let deadline = Instant::now() + timeout;
    let interval = interval.max(Duration::from_millis(1));
    loop {
        if cancel.is_cancelled() {
            return PollOutcome::Cancelled;
        }
        if check() {
            return PollOutcome::Satisfied;
        }
        let now = Instant::now();
        if now >= deadline {
            return PollOutcome::TimedOut;
        }
        let wait = interval.min(deadline - now);
        tokio::select! {
            _ = cancel.cancelled() => return PollOutcome::Cancelled,
            _ = sleep(wait) => {}
        }
    }
}
