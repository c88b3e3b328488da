//! Set command handler

use anyhow::Result;

use vsc_core::Config;

use crate::output::Output;

/// Persist the server address; no network call
pub fn set(config: &Config, host: &str, output: &Output) -> Result<()> {
    let address = config.save_server_address(host)?;

    output.success(&format!(
        "The server address {} has been written to {}",
        address,
        config.address_file.display()
    ));

    Ok(())
}
