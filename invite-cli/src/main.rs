//! Invite: invitation code lookup, leaderboard and count sync for Feishu
//! bitable tables.
//!
//! # Usage
//!
//! ```text
//! invite serve
//! invite sync [--json]
//! invite search <phone>
//! invite ranking [--json]
//! ```
//!
//! All commands read their configuration from the environment (and `.env`).

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{ranking::RankingArgs, search::SearchArgs, sync::SyncArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "invite",
    version,
    about = "Invitation code lookup and invite count sync over Feishu bitable",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API with the daily sync schedule.
    Serve,

    /// Run one invite count sync now and print its report.
    Sync(SyncArgs),

    /// Look up the invitation code registered for a phone number.
    Search(SearchArgs),

    /// Print the inviter leaderboard.
    Ranking(RankingArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Serve => commands::serve::run(),
        Commands::Sync(args) => args.run(),
        Commands::Search(args) => args.run(),
        Commands::Ranking(args) => args.run(),
    }
}
