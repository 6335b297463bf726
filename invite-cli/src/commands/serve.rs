//! `invite serve`: HTTP API plus daily sync, until ctrl-c / SIGTERM.

use anyhow::{Context, Result};
use invite_core::Config;

pub fn run() -> Result<()> {
    let config = Config::from_env().context("failed to load configuration")?;
    invite_daemon::start_blocking(config).context("daemon exited with error")
}
