//! Command handlers

pub mod info;
pub mod list;
pub mod pull;
pub mod push;
pub mod set;

use anyhow::{Context, Result};
use vsc_core::{Config, HttpRemote, SyncClient};

/// Build a client for the configured server
///
/// Fails before any network activity when no address has been set.
fn connect(config: &Config) -> Result<SyncClient<HttpRemote>> {
    let address = config.server_address()?;
    let remote =
        HttpRemote::new(&address, config.timeout).context("Failed to create HTTP client")?;
    Ok(SyncClient::new(remote))
}
