//! `invite sync`: run the invite count sync once, in the foreground.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;
use invite_sync::{RunStatus, SyncPipeline, SyncReport, SyncTrigger, WriteThrottle};

use super::{block_on, connect};

/// Arguments for `invite sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Print the run report as JSON.
    #[arg(long)]
    pub json: bool,
}

impl SyncArgs {
    pub fn run(self) -> Result<()> {
        // Log lines would interleave with the JSON report on stdout.
        if !self.json {
            invite_daemon::init_tracing();
        }
        let (config, service) = connect()?;
        let throttle = Arc::new(WriteThrottle::new(config.write_interval));
        let pipeline = SyncPipeline::from_config(service, &config, throttle);

        let report = block_on(pipeline.run(SyncTrigger::Cli))?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to render sync report")?
            );
        } else {
            print_report(&report);
        }

        match report.status {
            RunStatus::SourceUnavailable => bail!("source table could not be read"),
            RunStatus::TargetUnavailable => bail!("target table could not be read"),
            RunStatus::Completed | RunStatus::NothingToDo => Ok(()),
        }
    }
}

fn print_report(report: &SyncReport) {
    let outcome = &report.outcome;
    match report.status {
        RunStatus::NothingToDo => {
            println!(
                "· nothing to do ({} source records, no invitation codes)",
                report.source_records
            );
        }
        RunStatus::Completed => {
            let mark = if outcome.failed == 0 { "✓" } else { "!" };
            println!(
                "{mark} {} codes counted, {} updated, {} failed, {} unchanged ({} ms)",
                report.distinct_codes,
                outcome.updated,
                outcome.failed,
                outcome.unchanged,
                report.duration_ms
            );
        }
        RunStatus::SourceUnavailable | RunStatus::TargetUnavailable => {
            println!("✗ sync aborted: {:?}", report.status);
        }
    }
}
