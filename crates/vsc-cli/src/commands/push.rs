//! Push command handler

use std::path::Path;

use anyhow::Result;

use vsc_core::{Config, PushOptions, SyncError};

use crate::output::Output;

/// Push the tree at `root` under its own directory name
pub async fn push(config: &Config, root: &Path, fail_fast: bool, output: &Output) -> Result<()> {
    let client = super::connect(config)?;

    output.progress(&format!("Sending {} ...", root.display()));
    let report = client.push_tree(root, PushOptions { fail_fast }).await?;
    output.print_push_report(&report);

    if !report.is_success() {
        return Err(SyncError::Incomplete {
            operation: "push",
            failed: report.failures.len(),
        }
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;
    use tempfile::tempdir;
    use vsc_core::ConfigError;

    #[tokio::test]
    async fn test_push_without_address_fails_cleanly() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), b"a").unwrap();
        let config = Config::in_dir(dir.path());

        let err = push(&config, dir.path(), false, &Output::new(OutputFormat::Quiet))
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::Missing { .. })
        ));
    }
}
