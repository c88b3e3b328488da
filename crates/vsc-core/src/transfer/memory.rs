//! In-memory remote
//!
//! Behaves like a file-storage server: pushed files are stored under
//! `relativeDirName\fileName`, a pull returns every file below the
//! requested name, and the listing returns the distinct top-level names.
//! Useful for exercising push/pull without a network.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::StatusCode;

use super::decoder::{FileDescriptor, RepositoryList};
use super::{Remote, PUSH_ENDPOINT};
use crate::error::TransferError;
use crate::path::WIRE_SEPARATOR;
use crate::walker::DirectoryBatch;

/// A [`Remote`] that keeps everything in memory
#[derive(Default)]
pub struct MemoryRemote {
    files: Mutex<BTreeMap<String, Vec<u8>>>,
    pushed_dirs: Mutex<Vec<String>>,
    rejected_dirs: Mutex<HashSet<String>>,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a file directly, as if another client had pushed it
    pub fn insert(&self, name: impl Into<String>, content: impl Into<Vec<u8>>) {
        lock(&self.files).insert(name.into(), content.into());
    }

    /// Make every push to `relative_dir` fail with a server error
    pub fn reject_pushes_to(&self, relative_dir: impl Into<String>) {
        lock(&self.rejected_dirs).insert(relative_dir.into());
    }

    /// Relative directory names of the accepted pushes, in arrival order
    pub fn pushed_dirs(&self) -> Vec<String> {
        lock(&self.pushed_dirs).clone()
    }

    /// Snapshot of every stored file
    pub fn files(&self) -> BTreeMap<String, Vec<u8>> {
        lock(&self.files).clone()
    }
}

#[async_trait]
impl Remote for MemoryRemote {
    async fn push_batch(&self, batch: &DirectoryBatch) -> Result<(), TransferError> {
        let dir = batch.relative_dir.encode();
        let rejected = lock(&self.rejected_dirs).contains(&dir);
        if rejected {
            return Err(TransferError::Status {
                url: format!("memory://{}", PUSH_ENDPOINT),
                status: StatusCode::INTERNAL_SERVER_ERROR,
            });
        }

        let mut received = Vec::with_capacity(batch.files.len());
        for file in &batch.files {
            let content =
                tokio::fs::read(&file.path)
                    .await
                    .map_err(|source| TransferError::OpenFile {
                        path: file.path.clone(),
                        source,
                    })?;
            received.push((format!("{}{}{}", dir, WIRE_SEPARATOR, file.name), content));
        }

        lock(&self.files).extend(received);
        lock(&self.pushed_dirs).push(dir);
        Ok(())
    }

    async fn pull(&self, directory_name: &str) -> Result<Vec<FileDescriptor>, TransferError> {
        let prefix = format!("{}{}", directory_name, WIRE_SEPARATOR);
        Ok(lock(&self.files)
            .iter()
            .filter(|(name, _)| name.starts_with(&prefix))
            .map(|(name, content)| FileDescriptor {
                name: name.clone(),
                file: content.clone(),
            })
            .collect())
    }

    async fn list(&self) -> Result<RepositoryList, TransferError> {
        let names: BTreeSet<String> = lock(&self.files)
            .keys()
            .filter_map(|name| name.split(WIRE_SEPARATOR).next())
            .map(str::to_string)
            .collect();
        Ok(RepositoryList {
            names: names.into_iter().collect(),
        })
    }
}

/// Lock ignoring poisoning; the maps stay consistent across a panic
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
