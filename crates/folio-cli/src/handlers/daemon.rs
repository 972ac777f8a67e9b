//! Daemon command handler.
//!
//! Clears the share cache, then runs full scrub passes on the configured
//! interval until Ctrl-C.

use std::sync::Arc;
use std::time::Duration;

use folio_core::{
    BackoffPolicy, Schedule, ScheduleStats, ScheduledTask, ScrubTask, run_scheduled,
};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Attempts per scheduled run before waiting for the next interval.
const SCRUB_ATTEMPTS: u32 = 3;

fn scrub_retry() -> BackoffPolicy {
    BackoffPolicy::new(Duration::from_secs(5), Duration::from_secs(300))
        .with_max_retries(Some(SCRUB_ATTEMPTS))
}

/// Execute the daemon command.
pub async fn execute(ctx: &CliContext) -> Result<(), CliError> {
    let shutdown = CancellationToken::new();
    let runner = tokio::spawn(run(ctx, shutdown.clone()));

    tokio::signal::ctrl_c().await?;
    info!(target: "folio.cli", "shutting down");
    shutdown.cancel();

    let stats = runner
        .await
        .map_err(|e| CliError::Io(format!("scheduler task failed: {e}")))?;
    println!(
        "{} scrub passes succeeded, {} failed",
        stats.succeeded, stats.failed
    );
    Ok(())
}

/// Minimal pass, then scheduled full passes until `shutdown` fires.
pub fn run(
    ctx: &CliContext,
    shutdown: CancellationToken,
) -> impl Future<Output = ScheduleStats> + Send + 'static {
    let scrubber = Arc::clone(&ctx.scrubber);
    let interval = ctx.settings.scrub_interval();
    async move {
        let report = scrubber.scrub_minimal().await;
        info!(
            target: "folio.cli",
            share_cache_cleared = report.share_cache_cleared,
            ?interval,
            "scrub daemon started"
        );
        let task: Arc<dyn ScheduledTask> = Arc::new(ScrubTask::new(scrubber));
        run_scheduled(task, Schedule::Interval(interval), scrub_retry(), shutdown).await
    }
}
