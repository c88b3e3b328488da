//! All command handler

use anyhow::Result;

use vsc_core::Config;

use crate::output::Output;

/// Print the directory names stored on the server
pub async fn all(config: &Config, output: &Output) -> Result<()> {
    let client = super::connect(config)?;
    let list = client.list_remote().await?;
    output.print_repositories(&list);
    Ok(())
}
