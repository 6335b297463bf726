//! `invite search`: phone number → invitation code.

use anyhow::{Context, Result};
use clap::Args;
use invite_sync::find_invite_code;

use super::{block_on, connect};

/// Arguments for `invite search`.
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Verified phone number to look up.
    pub phone: String,
}

impl SearchArgs {
    pub fn run(self) -> Result<()> {
        let (config, service) = connect()?;
        let code = block_on(find_invite_code(
            service.as_ref(),
            &config.search_table,
            &config.fields,
            &self.phone,
        ))?
        .with_context(|| format!("lookup failed for {}", self.phone))?;

        match code {
            Some(code) => println!("{code}"),
            None => println!("no invitation code found for {}", self.phone),
        }
        Ok(())
    }
}
