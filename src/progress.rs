//! Cosmetic progress for a submission. The percentage is synthetic: it tracks
//! elapsed ticks, not transferred bytes.

use crate::config::Progress;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

pub const COMPLETE: f64 = 100.0;

/// One tick of the simulator. Never decreases and never passes `cap`.
pub fn advance(current: f64, increment: f64, cap: f64) -> f64 {
    (current + increment.max(0.0)).min(cap).max(current)
}

/// Running ticker for one submission. `settle` stops it; dropping an unsettled
/// ticker aborts the task as well, so a ticker cannot outlive its submission.
#[derive(Debug)]
pub struct ProgressTicker {
    handle: Option<JoinHandle<()>>,
    tx: watch::Sender<f64>,
}

impl ProgressTicker {
    /// Resets the published value to 0 and starts ticking. Needs a tokio runtime.
    pub fn start(cfg: &Progress, tx: watch::Sender<f64>) -> Self {
        tx.send_replace(0.0);
        let tick = Duration::from_millis(cfg.tick_ms.max(1));
        let max_increment = cfg.max_increment;
        let cap = cfg.cap_percent.min(COMPLETE);
        let task_tx = tx.clone();

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            interval.tick().await; // first tick completes immediately

            let mut progress = 0.0;
            loop {
                interval.tick().await;
                progress = advance(progress, rand::random::<f64>() * max_increment, cap);
                task_tx.send_replace(progress);
                if progress >= cap {
                    debug!(progress, "progress ticker reached cap");
                    break;
                }
            }
        });

        Self {
            handle: Some(handle),
            tx,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stops the ticker, waits for the task to be gone and snaps the value to 100.
    pub async fn settle(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            let _ = handle.await;
        }
        self.tx.send_replace(COMPLETE);
    }
}

impl Drop for ProgressTicker {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
