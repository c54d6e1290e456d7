//! Bounded fixed-interval polling for asynchronous jobs.
//!
//! Generic over the status-fetching call so the loop can be tested with
//! tokio's paused clock and an in-memory closure, without a live service.

use std::future::Future;
use std::time::Duration;

/// Status reported by one poll of a remote job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStatus {
    /// Still running; keep polling.
    Pending,
    /// Finished; carries the asset URL.
    Done(String),
    /// The job failed on the service side.
    Failed,
}

/// Terminal outcome of a polling loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Done(String),
    Failed,
    /// `max_wait` elapsed without a terminal status.
    TimedOut,
}

/// Poll `fetch` every `interval` until it reports a terminal status or
/// `max_wait` has elapsed.
///
/// The first poll happens after one full `interval`, matching a service
/// that can never complete a job instantly. Errors from `fetch` abort the
/// loop and propagate to the caller.
pub async fn poll_until_done<F, Fut, E>(
    interval: Duration,
    max_wait: Duration,
    mut fetch: F,
) -> Result<PollOutcome, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<PollStatus, E>>,
{
    let mut elapsed = Duration::ZERO;
    while elapsed < max_wait {
        tokio::time::sleep(interval).await;
        elapsed += interval;
        match fetch().await? {
            PollStatus::Pending => continue,
            PollStatus::Done(url) => return Ok(PollOutcome::Done(url)),
            PollStatus::Failed => return Ok(PollOutcome::Failed),
        }
    }
    Ok(PollOutcome::TimedOut)
}
