pub mod ranking;
pub mod search;
pub mod serve;
pub mod sync;

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use invite_bitable::{BitableClient, TableService};
use invite_core::Config;

/// Load configuration and build the bitable client shared by one-shot commands.
pub(crate) fn connect() -> Result<(Config, Arc<dyn TableService>)> {
    let config = Config::from_env().context("failed to load configuration")?;
    let client = BitableClient::from_config(&config).context("failed to build bitable client")?;
    Ok((config, Arc::new(client)))
}

/// Drive a one-shot async command on a current-thread runtime.
pub(crate) fn block_on<F: Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start tokio runtime")?;
    Ok(runtime.block_on(future))
}
