//! Single-flight sync processor.
//!
//! Every trigger (HTTP, scheduler) goes through one queue drained by one
//! task. At most one run executes at a time; triggers that arrive while a run
//! is in flight are attached to it and receive the same report.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;

use invite_sync::{SyncPipeline, SyncReport, SyncTrigger};

use crate::error::DaemonError;

const QUEUE_DEPTH: usize = 64;

struct SyncJob {
    trigger: SyncTrigger,
    respond_to: oneshot::Sender<SyncReport>,
}

/// Cloneable entry point for requesting sync runs.
#[derive(Clone)]
pub struct SyncHandle {
    tx: mpsc::Sender<SyncJob>,
}

impl SyncHandle {
    /// Spawn the processor task. It stops on `shutdown` and broadcasts
    /// shutdown itself when it exits for any other reason.
    pub fn spawn(
        pipeline: Arc<SyncPipeline>,
        shutdown: &broadcast::Sender<()>,
    ) -> (Self, JoinHandle<Result<(), DaemonError>>) {
        let (tx, rx) = mpsc::channel::<SyncJob>(QUEUE_DEPTH);
        let shutdown = shutdown.clone();
        let shutdown_rx = shutdown.subscribe();
        let handle = tokio::spawn(async move {
            let result = sync_processor_task(pipeline, rx, shutdown_rx).await;
            let _ = shutdown.send(());
            result
        });
        (Self { tx }, handle)
    }

    /// Request a run and return without waiting for it. The receiver
    /// resolves with the report of the run this request ended up in.
    pub async fn trigger(
        &self,
        trigger: SyncTrigger,
    ) -> Result<oneshot::Receiver<SyncReport>, DaemonError> {
        let (respond_to, rx) = oneshot::channel();
        self.tx
            .send(SyncJob {
                trigger,
                respond_to,
            })
            .await
            .map_err(|_| DaemonError::ChannelClosed("sync queue"))?;
        Ok(rx)
    }

    /// Request a run and wait for its report.
    pub async fn run(&self, trigger: SyncTrigger) -> Result<SyncReport, DaemonError> {
        self.trigger(trigger)
            .await?
            .await
            .map_err(|_| DaemonError::ChannelClosed("sync report"))
    }
}

async fn sync_processor_task(
    pipeline: Arc<SyncPipeline>,
    mut sync_rx: mpsc::Receiver<SyncJob>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    loop {
        let job = tokio::select! {
            _ = shutdown_rx.recv() => break,
            maybe_job = sync_rx.recv() => {
                let Some(job) = maybe_job else { break };
                job
            }
        };

        tracing::info!(trigger = %job.trigger, "starting sync run");
        let mut waiters = vec![job.respond_to];
        let run = pipeline.run(job.trigger);
        tokio::pin!(run);

        let report = loop {
            tokio::select! {
                report = &mut run => break report,
                Some(joining) = sync_rx.recv() => {
                    tracing::info!(
                        trigger = %joining.trigger,
                        "sync run already in flight; joining it",
                    );
                    waiters.push(joining.respond_to);
                }
                _ = shutdown_rx.recv() => {
                    tracing::warn!("shutdown during sync run; abandoning it");
                    return Ok(());
                }
            }
        };

        tracing::info!(
            trigger = %report.trigger,
            status = ?report.status,
            updated = report.outcome.updated,
            failed = report.outcome.failed,
            unchanged = report.outcome.unchanged,
            duration_ms = report.duration_ms,
            waiters = waiters.len(),
            "sync run completed",
        );
        for waiter in waiters {
            // The requester may have stopped listening (fire-and-forget).
            let _ = waiter.send(report.clone());
        }
    }

    Ok(())
}
