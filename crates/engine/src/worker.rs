//! Periodic retention worker
//!
//! Runs one retention job on a fixed interval. Runs never overlap: the next
//! tick is only awaited after the previous run returned. The worker stops once
//! the job retires itself.

use crate::runner::{RetentionRunner, RunOutcome};
use retention_core::{ConfigError, JobArgument};
use std::sync::Arc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

/// Starts the retention worker for one job
///
/// Runs every `interval_hours` of the runner's settings; the first run starts
/// immediately. Returns when the job is retired, or right away if the
/// settings are out of range.
pub async fn start_retention_worker(
    runner: Arc<RetentionRunner>,
    argument: JobArgument,
) -> Result<(), ConfigError> {
    runner.settings().validate()?;
    let every = runner.settings().interval();

    let mut timer = interval(every);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(tag = %argument.tag, interval_secs = every.as_secs(), "Starting retention worker");

    loop {
        timer.tick().await;

        let job_runner = runner.clone();
        let job_argument = argument.clone();
        let result = tokio::task::spawn_blocking(move || job_runner.run(&job_argument)).await;

        match result {
            Ok(Ok(RunOutcome::Retired(reason))) => {
                info!(tag = %argument.tag, reason = ?reason, "Retention worker stopped");
                return Ok(());
            }
            Ok(Ok(RunOutcome::Completed(report))) => {
                debug!(
                    tag = %argument.tag,
                    pages = report.pages,
                    scanned = report.scanned,
                    "Retention worker pass finished"
                );
            }
            Ok(Err(e)) => {
                error!(tag = %argument.tag, error = %e, "Error running retention");
            }
            Err(e) => {
                error!(tag = %argument.tag, error = %e, "Retention run panicked");
            }
        }
    }
}
