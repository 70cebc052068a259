//! Cancellation of blocking work
//!
//! Catalog requests run on a worker thread while the caller polls its
//! [`CancellationToken`]. Once the token fires the caller returns right away
//! and the worker's result is discarded when it eventually arrives.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;
use thiserror::Error;

pub use tokio_util::sync::CancellationToken;

/// How often the caller checks the token while waiting for the worker
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// The operation was cancelled before it completed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Operation cancelled")]
pub struct Cancelled;

/// Runs `job` on a worker thread until it finishes or `cancel` fires
///
/// A panic inside `job` is resumed on the calling thread.
pub(crate) fn run_cancellable<T, F>(cancel: &CancellationToken, job: F) -> Result<T, Cancelled>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    if cancel.is_cancelled() {
        return Err(Cancelled);
    }

    let (sender, receiver) = mpsc::channel();
    let worker = thread::spawn(move || {
        // The receiver is gone if the caller was cancelled meanwhile
        let _ = sender.send(job());
    });

    loop {
        match receiver.recv_timeout(POLL_INTERVAL) {
            Ok(result) => return Ok(result),
            Err(RecvTimeoutError::Timeout) => {
                if cancel.is_cancelled() {
                    return Err(Cancelled);
                }
            }
            Err(RecvTimeoutError::Disconnected) => {
                return match worker.join() {
                    Err(panic) => std::panic::resume_unwind(panic),
                    // Sender dropped without sending only happens on panic
                    Ok(()) => Err(Cancelled),
                };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_returns_job_result() {
        let cancel = CancellationToken::new();
        assert_eq!(run_cancellable(&cancel, || 21 * 2), Ok(42));
    }

    #[test]
    fn test_already_cancelled_does_not_run_job() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result: Result<(), Cancelled> = run_cancellable(&cancel, || panic!("must not run"));
        assert_eq!(result, Err(Cancelled));
    }

    #[test]
    fn test_cancel_interrupts_waiting() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            trigger.cancel();
        });

        let started = Instant::now();
        let result = run_cancellable(&cancel, || thread::sleep(Duration::from_secs(5)));
        assert_eq!(result, Err(Cancelled));
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
