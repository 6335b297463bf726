//! `invite ranking`: leaderboard as a table or JSON.

use anyhow::{Context, Result};
use clap::Args;
use tabled::{Table, Tabled};

use invite_core::RankingEntry;

use super::{block_on, connect};

/// Arguments for `invite ranking`.
#[derive(Args, Debug)]
pub struct RankingArgs {
    /// Print the leaderboard as JSON.
    #[arg(long)]
    pub json: bool,

    /// Show only the first N rows.
    #[arg(long)]
    pub top: Option<usize>,
}

#[derive(Tabled)]
struct Row {
    #[tabled(rename = "#")]
    rank: usize,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Code")]
    code: String,
    #[tabled(rename = "Invites")]
    count: u64,
}

impl RankingArgs {
    pub fn run(self) -> Result<()> {
        let (config, service) = connect()?;
        let mut entries = block_on(invite_sync::ranking(
            service.as_ref(),
            &config.search_table,
            &config.fields,
        ))?
        .context("failed to load ranking")?;
        if let Some(top) = self.top {
            entries.truncate(top);
        }

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&entries).context("failed to render ranking JSON")?
            );
        } else if entries.is_empty() {
            println!("No ranked inviters yet.");
        } else {
            println!("{}", Table::new(rows(entries)));
        }
        Ok(())
    }
}

fn rows(entries: Vec<RankingEntry>) -> Vec<Row> {
    entries
        .into_iter()
        .enumerate()
        .map(|(i, e)| Row {
            rank: i + 1,
            name: e.name,
            code: e.invite_code,
            count: e.invite_count,
        })
        .collect()
}
