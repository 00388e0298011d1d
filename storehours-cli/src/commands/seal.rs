//! `storehours seal` — produce the `token`/`pwd` hex pair for a config section.

use anyhow::{Context, Result};
use clap::Args;

use storehours_core::seal;

/// Arguments for `storehours seal`.
#[derive(Args, Debug)]
pub struct SealArgs {
    /// Value of `[MAIN] GLOBAL`.
    #[arg(long)]
    pub global: String,

    /// Intermediate key; stored wrapped as `token`.
    #[arg(long)]
    pub key: String,

    /// Plaintext password; stored wrapped as `pwd`.
    #[arg(long)]
    pub password: String,
}

impl SealArgs {
    pub fn run(self) -> Result<()> {
        let sealed = seal(&self.global, &self.key, &self.password)
            .context("could not seal the password")?;
        println!("pwd = {}", sealed.pwd);
        println!("token = {}", sealed.token);
        Ok(())
    }
}
