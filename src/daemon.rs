//! The main loop: sentinel inspection, processor iteration, fixed sleep.

use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use chrono::Utc;
use tracing::warn;

use crate::processor::Processor;

/// Run the main loop until `run_for` elapses (if set), otherwise forever.
///
/// Each iteration: check the resume sentinel (and remove it, best-effort,
/// if present), run one processor iteration, then sleep `interval`. The
/// iteration itself runs on a blocking-pool thread, since probes shell out
/// synchronously and must not be able to stall the reactor driving the
/// status IPC server.
pub async fn run(
    processor: &Arc<Mutex<Processor>>,
    interval: StdDuration,
    run_for: Option<StdDuration>,
    woke_up_file: &str,
) {
    let start = Utc::now();

    loop {
        if let Some(run_for) = run_for {
            if Utc::now() >= start + chrono::Duration::from_std(run_for).unwrap_or(chrono::Duration::zero()) {
                break;
            }
        }

        let just_resumed = check_and_clear_sentinel(woke_up_file).await;
        let now = Utc::now();

        let processor = Arc::clone(processor);
        let result = tokio::task::spawn_blocking(move || {
            processor.lock().unwrap().iteration(now, just_resumed);
        })
        .await;
        if let Err(err) = result {
            warn!(error = %err, "processor iteration task panicked");
        }

        tokio::time::sleep(interval).await;
    }
}

async fn check_and_clear_sentinel(path: &str) -> bool {
    match tokio::fs::try_exists(path).await {
        Ok(true) => {
            if let Err(err) = tokio::fs::remove_file(path).await {
                warn!(path, error = %err, "failed to remove resume sentinel, will retry next tick");
            }
            true
        }
        Ok(false) => false,
        Err(err) => {
            warn!(path, error = %err, "failed to check resume sentinel");
            false
        }
    }
}
