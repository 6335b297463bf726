//! Daily sync schedule.
//!
//! The task sleeps until the next occurrence of a local wall-clock time,
//! requests a run through the [`SyncHandle`], and repeats. It is owned by the
//! daemon runtime and stops when the shutdown broadcast fires.

use std::time::Duration;

use chrono::{DateTime, Local, NaiveDateTime, NaiveTime, TimeZone};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use invite_sync::SyncTrigger;

use crate::error::DaemonError;
use crate::processor::SyncHandle;

/// First occurrence of `at` strictly after `now`.
pub fn next_fire_after(now: NaiveDateTime, at: NaiveTime) -> NaiveDateTime {
    let today = now.date().and_time(at);
    if today > now {
        today
    } else {
        today + chrono::Duration::days(1)
    }
}

/// Time left until the next local occurrence of `at`.
pub fn delay_until_next(now: DateTime<Local>, at: NaiveTime) -> Duration {
    let next = next_fire_after(now.naive_local(), at);
    // A fire time that falls into a DST gap is pushed one hour later.
    let next = Local
        .from_local_datetime(&next)
        .earliest()
        .or_else(|| {
            Local
                .from_local_datetime(&(next + chrono::Duration::hours(1)))
                .earliest()
        })
        .unwrap_or_else(|| now + chrono::Duration::days(1));
    (next - now).to_std().unwrap_or(Duration::ZERO)
}

/// Spawn the daily task. It subscribes to `shutdown` before returning.
pub fn spawn_daily(
    at: NaiveTime,
    sync: SyncHandle,
    shutdown: &broadcast::Sender<()>,
) -> JoinHandle<Result<(), DaemonError>> {
    let shutdown_rx = shutdown.subscribe();
    tokio::spawn(daily_task(at, sync, shutdown_rx))
}

async fn daily_task(
    at: NaiveTime,
    sync: SyncHandle,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    tracing::info!(at = %at.format("%H:%M:%S"), "daily invite count sync scheduled");

    loop {
        let delay = delay_until_next(Local::now(), at);
        tracing::debug!(in_secs = delay.as_secs(), "next scheduled sync");

        tokio::select! {
            _ = shutdown_rx.recv() => break,
            _ = tokio::time::sleep(delay) => {
                tracing::info!("scheduled trigger fired; syncing invite counts");
                match sync.run(SyncTrigger::Schedule).await {
                    Ok(report) => tracing::info!(
                        status = ?report.status,
                        updated = report.outcome.updated,
                        failed = report.outcome.failed,
                        "scheduled sync finished",
                    ),
                    Err(err) => {
                        tracing::error!(error = %err, "scheduled sync could not run");
                        break;
                    }
                }
            }
        }
    }

    Ok(())
}
