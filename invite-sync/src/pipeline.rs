//! Shared sync pipeline entrypoint used by the CLI, the HTTP trigger and the
//! daily scheduler.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::Instant;

use invite_bitable::TableService;
use invite_core::{Config, FieldNames, InvitationCountMap, SyncOutcome, TableRef};

use crate::aggregate::count_invitations;
use crate::error::{read_err, SyncError};
use crate::reconcile;
use crate::throttle::WriteThrottle;

/// What started a sync run. All triggers run the identical sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncTrigger {
    Schedule,
    Http,
    Cli,
}

impl fmt::Display for SyncTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncTrigger::Schedule => write!(f, "schedule"),
            SyncTrigger::Http => write!(f, "http"),
            SyncTrigger::Cli => write!(f, "cli"),
        }
    }
}

/// How far a run got.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Target table was reconciled (writes may still have failed).
    Completed,
    /// Source table had no usable invitation codes.
    NothingToDo,
    /// Source table could not be read.
    SourceUnavailable,
    /// Target table could not be read; nothing was written.
    TargetUnavailable,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub trigger: SyncTrigger,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u128,
    pub source_records: usize,
    pub distinct_codes: usize,
    pub target_records: usize,
    pub outcome: SyncOutcome,
}

/// Source and target tables of a sync run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncTables {
    pub source: TableRef,
    pub target: TableRef,
}

pub struct SyncPipeline {
    service: Arc<dyn TableService>,
    tables: SyncTables,
    fields: FieldNames,
    throttle: Arc<WriteThrottle>,
}

impl SyncPipeline {
    pub fn new(
        service: Arc<dyn TableService>,
        tables: SyncTables,
        fields: FieldNames,
        throttle: Arc<WriteThrottle>,
    ) -> Self {
        Self {
            service,
            tables,
            fields,
            throttle,
        }
    }

    pub fn from_config(
        service: Arc<dyn TableService>,
        config: &Config,
        throttle: Arc<WriteThrottle>,
    ) -> Self {
        Self::new(
            service,
            SyncTables {
                source: config.source_table.clone(),
                target: config.target_table.clone(),
            },
            config.fields.clone(),
            throttle,
        )
    }

    /// Read the source table and count invitation codes.
    pub async fn fetch_invite_counts(&self) -> Result<(usize, InvitationCountMap), SyncError> {
        let records = self
            .service
            .list_records(&self.tables.source)
            .await
            .map_err(|e| read_err("source", &self.tables.source, e))?;
        let counts = count_invitations(&records, &self.fields.invite_code);
        Ok((records.len(), counts))
    }

    /// Execute one sync run. Never fails: every stage error is logged and
    /// reflected in the report's [`RunStatus`].
    pub async fn run(&self, trigger: SyncTrigger) -> SyncReport {
        let started = Instant::now();
        let mut report = SyncReport {
            trigger,
            status: RunStatus::NothingToDo,
            started_at: Utc::now(),
            duration_ms: 0,
            source_records: 0,
            distinct_codes: 0,
            target_records: 0,
            outcome: SyncOutcome::empty(),
        };
        tracing::info!("sync run started (trigger: {trigger})");

        self.run_stages(&mut report).await;

        report.duration_ms = started.elapsed().as_millis();
        let outcome = &report.outcome;
        match report.status {
            RunStatus::Completed if outcome.success => tracing::info!(
                "sync run finished: {} updated, {} failed, {} unchanged in {} ms",
                outcome.updated,
                outcome.failed,
                outcome.unchanged,
                report.duration_ms
            ),
            RunStatus::Completed => tracing::warn!(
                "sync run finished without successful updates: {} failed, {} unchanged",
                outcome.failed,
                outcome.unchanged
            ),
            RunStatus::NothingToDo => {
                tracing::warn!("no invitation codes in source table; sync run stopped")
            }
            RunStatus::SourceUnavailable | RunStatus::TargetUnavailable => {
                tracing::error!("sync run aborted: {:?}", report.status)
            }
        }
        report
    }

    async fn run_stages(&self, report: &mut SyncReport) {
        let (source_records, counts) = match self.fetch_invite_counts().await {
            Ok(fetched) => fetched,
            Err(err) => {
                tracing::error!("{err}");
                report.status = RunStatus::SourceUnavailable;
                return;
            }
        };
        report.source_records = source_records;
        report.distinct_codes = counts.len();
        tracing::info!(
            "counted {} invitation codes across {} source records",
            counts.len(),
            source_records
        );
        if counts.is_empty() {
            report.status = RunStatus::NothingToDo;
            return;
        }

        let target = &self.tables.target;
        let records = match self.service.list_records(target).await {
            Ok(records) => records,
            Err(err) => {
                tracing::error!("{}", read_err("target", target, err));
                report.status = RunStatus::TargetUnavailable;
                return;
            }
        };
        report.target_records = records.len();

        report.outcome = reconcile::reconcile(
            self.service.as_ref(),
            target,
            &records,
            &counts,
            &self.fields,
            &self.throttle,
        )
        .await;
        report.status = RunStatus::Completed;
    }
}
