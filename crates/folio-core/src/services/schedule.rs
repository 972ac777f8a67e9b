//! Periodic background tasks.
//!
//! The host supplies the timer; the core only describes *what* runs and how
//! often. A failed run is retried with backoff before waiting for the next
//! interval.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::retry::BackoffPolicy;

/// When a task should run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// Run immediately, then again after every interval.
    Interval(Duration),
}

/// A unit of periodic work.
#[async_trait]
pub trait ScheduledTask: Send + Sync {
    /// Stable name used in logs.
    fn name(&self) -> &'static str;

    /// Run the task once.
    async fn run(&self) -> anyhow::Result<()>;
}

/// Counters returned when the runner stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScheduleStats {
    /// Scheduled runs that eventually succeeded.
    pub succeeded: u32,
    /// Scheduled runs that failed every retry.
    pub failed: u32,
    /// Individual attempts that failed.
    pub failed_attempts: u32,
}

/// Run `task` on `schedule` until `shutdown` is cancelled.
pub async fn run_scheduled(
    task: Arc<dyn ScheduledTask>,
    schedule: Schedule,
    retry: BackoffPolicy,
    shutdown: CancellationToken,
) -> ScheduleStats {
    let Schedule::Interval(interval) = schedule;
    let mut stats = ScheduleStats::default();

    loop {
        if run_with_retry(task.as_ref(), &retry, &shutdown, &mut stats).await {
            stats.succeeded += 1;
        } else if shutdown.is_cancelled() {
            break;
        } else {
            stats.failed += 1;
        }

        debug!(target: "folio.schedule", task = task.name(), ?interval, "waiting for next run");
        tokio::select! {
            () = shutdown.cancelled() => break,
            () = tokio::time::sleep(interval) => {}
        }
    }

    info!(
        target: "folio.schedule",
        task = task.name(),
        succeeded = stats.succeeded,
        failed = stats.failed,
        "scheduled task stopped"
    );
    stats
}

/// Returns true once an attempt succeeds; false when retries run out or
/// shutdown is requested.
async fn run_with_retry(
    task: &dyn ScheduledTask,
    retry: &BackoffPolicy,
    shutdown: &CancellationToken,
    stats: &mut ScheduleStats,
) -> bool {
    let mut attempt = 0;
    loop {
        match task.run().await {
            Ok(()) => return true,
            Err(e) => {
                stats.failed_attempts += 1;
                warn!(target: "folio.schedule", task = task.name(), attempt, error = %e, "scheduled run failed");
            }
        }

        attempt += 1;
        if !retry.allows(attempt) {
            return false;
        }

        tokio::select! {
            () = shutdown.cancelled() => return false,
            () = tokio::time::sleep(retry.delay_for(attempt - 1)) => {}
        }
    }
}
