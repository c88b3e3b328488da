//! Pull command handler

use std::path::Path;

use anyhow::Result;

use vsc_core::{Config, SyncError};

use crate::output::Output;

/// Pull `name` from the server into `destination`
pub async fn pull(config: &Config, name: &str, destination: &Path, output: &Output) -> Result<()> {
    let client = super::connect(config)?;

    let report = client.pull_tree(name, destination).await?;

    let destination_name = destination
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| destination.display().to_string());
    output.print_pull_report(&report, &destination_name);

    if !report.is_success() {
        return Err(SyncError::Incomplete {
            operation: "pull",
            failed: report.failures.len(),
        }
        .into());
    }
    Ok(())
}
