//! Sync client
//!
//! Orchestrates the three operations against a [`Remote`]:
//!
//! - **Push**: walk the local tree and send one request per batch, one at a
//!   time. A failed batch is recorded and, unless fail-fast is requested,
//!   the walk goes on.
//! - **Pull**: fetch the whole listing for a name, then materialize each
//!   file. Transport or decoding errors abort before anything is written;
//!   per-file filesystem errors are recorded and the rest is still written.
//! - **List**: fetch the directory names known to the server.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{BatchError, MaterializeError, SyncError, WalkError};
use crate::path::{segment_from_os, validate_directory_name, RelativePath};
use crate::transfer::{materialize, FileUnit, Remote, RepositoryList};
use crate::walker::{DirectoryBatch, TreeWalker};

/// Push behaviour
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PushOptions {
    /// Stop at the first failed batch instead of carrying on
    pub fail_fast: bool,
}

/// A batch that could not be pushed
#[derive(Debug)]
pub struct BatchFailure {
    /// Remote directory of the batch, or the local path when walking failed
    pub directory: String,
    pub error: BatchError,
}

/// Outcome of a push
#[derive(Debug, Default)]
pub struct PushReport {
    pub root_name: String,
    pub batches_sent: usize,
    pub files_sent: usize,
    pub failures: Vec<BatchFailure>,
    /// Push stopped early because of fail-fast
    pub aborted: bool,
}

impl PushReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A pulled file that could not be written
#[derive(Debug)]
pub struct FileFailure {
    pub name: String,
    pub error: MaterializeError,
}

/// Outcome of a pull
#[derive(Debug, Default)]
pub struct PullReport {
    pub directory_name: String,
    pub written: Vec<PathBuf>,
    pub failures: Vec<FileFailure>,
}

impl PullReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Client for a file-storage server
pub struct SyncClient<R> {
    remote: R,
}

impl<R: Remote> SyncClient<R> {
    pub fn new(remote: R) -> Self {
        Self { remote }
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// Push the tree at `root`, addressed remotely by its own directory name
    pub async fn push_tree(
        &self,
        root: &Path,
        options: PushOptions,
    ) -> Result<PushReport, SyncError> {
        let root_name = root_name(root)?;
        let root_path = RelativePath::new([root_name.clone()]).map_err(|e| {
            SyncError::InvalidRoot {
                path: root.to_path_buf(),
                reason: e.to_string(),
            }
        })?;

        info!("Pushing {:?} as {}", root, root_name);
        let mut report = self
            .push_batches(TreeWalker::new(root, root_path), options)
            .await;
        report.root_name = root_name;
        Ok(report)
    }

    /// Send every batch of a sequence, one request at a time
    pub async fn push_batches<I>(&self, batches: I, options: PushOptions) -> PushReport
    where
        I: IntoIterator<Item = Result<DirectoryBatch, WalkError>>,
    {
        let mut report = PushReport::default();

        for item in batches {
            let failure = match item {
                Ok(batch) => match self.remote.push_batch(&batch).await {
                    Ok(()) => {
                        report.batches_sent += 1;
                        report.files_sent += batch.files.len();
                        continue;
                    }
                    Err(e) => BatchFailure {
                        directory: batch.relative_dir.encode(),
                        error: e.into(),
                    },
                },
                Err(e) => BatchFailure {
                    directory: walk_error_location(&e),
                    error: e.into(),
                },
            };

            warn!("Failed to push {}: {}", failure.directory, failure.error);
            report.failures.push(failure);
            if options.fail_fast {
                report.aborted = true;
                break;
            }
        }

        debug!(
            "Push finished: {} batch(es), {} file(s), {} failure(s)",
            report.batches_sent,
            report.files_sent,
            report.failures.len()
        );
        report
    }

    /// Pull `directory_name` from the server into `destination`
    pub async fn pull_tree(
        &self,
        directory_name: &str,
        destination: &Path,
    ) -> Result<PullReport, SyncError> {
        if directory_name.trim().is_empty() {
            return Err(SyncError::EmptyDirectoryName);
        }
        validate_directory_name(directory_name).map_err(|source| {
            SyncError::InvalidDirectoryName {
                name: directory_name.to_string(),
                source,
            }
        })?;

        info!("Pulling {} into {:?}", directory_name, destination);
        let descriptors = self.remote.pull(directory_name).await?;

        let mut report = PullReport {
            directory_name: directory_name.to_string(),
            ..PullReport::default()
        };

        for descriptor in descriptors {
            let name = descriptor.name.clone();
            let result =
                FileUnit::try_from(descriptor).and_then(|unit| materialize(&unit, destination));
            match result {
                Ok(path) => report.written.push(path),
                Err(error) => {
                    warn!("Failed to write {}: {}", name, error);
                    report.failures.push(FileFailure { name, error });
                }
            }
        }

        debug!(
            "Pull finished: {} file(s) written, {} failure(s)",
            report.written.len(),
            report.failures.len()
        );
        Ok(report)
    }

    /// Names of the directory trees stored on the server, in server order
    pub async fn list_remote(&self) -> Result<RepositoryList, SyncError> {
        Ok(self.remote.list().await?)
    }
}

/// Name the root directory is pushed under
fn root_name(root: &Path) -> Result<String, SyncError> {
    let invalid = |reason: String| SyncError::InvalidRoot {
        path: root.to_path_buf(),
        reason,
    };

    let meta = std::fs::metadata(root).map_err(|e| invalid(e.to_string()))?;
    if !meta.is_dir() {
        return Err(invalid("not a directory".to_string()));
    }

    // Resolves `.` and trailing `..` to a real name
    let canonical = root.canonicalize().map_err(|e| invalid(e.to_string()))?;
    let name = canonical
        .file_name()
        .ok_or_else(|| invalid("directory has no name".to_string()))?;
    segment_from_os(name, &canonical).map_err(|e| invalid(e.to_string()))
}

fn walk_error_location(error: &WalkError) -> String {
    match error {
        WalkError::Walk(e) => e
            .path()
            .map(|p| p.display().to_string())
            .unwrap_or_default(),
        WalkError::ReadDir { path, .. } | WalkError::Path { path, .. } => {
            path.display().to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::MemoryRemote;
    use std::fs;
    use tempfile::tempdir;

    /// `<tmp>/root/{a.txt, sub/b.txt}`
    fn sample_tree() -> (tempfile::TempDir, PathBuf) {
        let dir = tempdir().unwrap();
        let root = dir.path().join("root");
        fs::create_dir_all(root.join("sub")).unwrap();
        fs::write(root.join("a.txt"), b"alpha").unwrap();
        fs::write(root.join("sub").join("b.txt"), b"beta").unwrap();
        (dir, root)
    }

    #[tokio::test]
    async fn test_push_sends_one_request_per_batch() {
        let (_dir, root) = sample_tree();
        let client = SyncClient::new(MemoryRemote::new());

        let report = client.push_tree(&root, PushOptions::default()).await.unwrap();

        assert!(report.is_success());
        assert_eq!(report.root_name, "root");
        assert_eq!(report.batches_sent, 2);
        assert_eq!(report.files_sent, 2);
        assert_eq!(client.remote().pushed_dirs(), ["root", "root\\sub"]);

        let files = client.remote().files();
        assert_eq!(files["root\\a.txt"], b"alpha");
        assert_eq!(files["root\\sub\\b.txt"], b"beta");
    }

    #[tokio::test]
    async fn test_push_then_pull_round_trip() {
        let (_dir, root) = sample_tree();
        let client = SyncClient::new(MemoryRemote::new());
        client.push_tree(&root, PushOptions::default()).await.unwrap();

        let dest = tempdir().unwrap();
        let report = client.pull_tree("root", dest.path()).await.unwrap();

        assert!(report.is_success());
        assert_eq!(report.written.len(), 2);
        assert_eq!(fs::read(dest.path().join("root").join("a.txt")).unwrap(), b"alpha");
        assert_eq!(
            fs::read(dest.path().join("root").join("sub").join("b.txt")).unwrap(),
            b"beta"
        );
        assert!(dest.path().join("root").join("sub").is_dir());
    }

    #[tokio::test]
    async fn test_pull_twice_overwrites() {
        let remote = MemoryRemote::new();
        remote.insert("docs\\sub\\n.txt", b"first".to_vec());
        let client = SyncClient::new(remote);
        let dest = tempdir().unwrap();

        client.pull_tree("docs", dest.path()).await.unwrap();
        client.remote().insert("docs\\sub\\n.txt", b"second".to_vec());
        let report = client.pull_tree("docs", dest.path()).await.unwrap();

        assert!(report.is_success());
        assert_eq!(
            fs::read(dest.path().join("docs").join("sub").join("n.txt")).unwrap(),
            b"second"
        );
        assert_eq!(fs::read_dir(dest.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_push_continues_after_failure() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("root");
        for sub in ["a", "b", "c"] {
            fs::create_dir_all(root.join(sub)).unwrap();
            fs::write(root.join(sub).join("f.txt"), sub).unwrap();
        }

        let remote = MemoryRemote::new();
        remote.reject_pushes_to("root\\b");
        let client = SyncClient::new(remote);

        let report = client.push_tree(&root, PushOptions::default()).await.unwrap();

        assert!(!report.is_success());
        assert!(!report.aborted);
        assert_eq!(report.batches_sent, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].directory, "root\\b");
        assert_eq!(client.remote().pushed_dirs(), ["root\\a", "root\\c"]);
    }

    #[tokio::test]
    async fn test_push_fail_fast_stops() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("root");
        for sub in ["a", "b", "c"] {
            fs::create_dir_all(root.join(sub)).unwrap();
            fs::write(root.join(sub).join("f.txt"), sub).unwrap();
        }

        let remote = MemoryRemote::new();
        remote.reject_pushes_to("root\\a");
        let client = SyncClient::new(remote);

        let report = client
            .push_tree(&root, PushOptions { fail_fast: true })
            .await
            .unwrap();

        assert!(report.aborted);
        assert_eq!(report.batches_sent, 0);
        assert!(client.remote().pushed_dirs().is_empty());
    }

    #[tokio::test]
    async fn test_push_of_empty_tree_sends_nothing() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("root");
        fs::create_dir_all(root.join("only").join("empty").join("dirs")).unwrap();

        let client = SyncClient::new(MemoryRemote::new());
        let report = client.push_tree(&root, PushOptions::default()).await.unwrap();

        assert!(report.is_success());
        assert_eq!(report.batches_sent, 0);
        assert!(client.remote().pushed_dirs().is_empty());
    }

    #[tokio::test]
    async fn test_push_of_missing_root_fails() {
        let dir = tempdir().unwrap();
        let client = SyncClient::new(MemoryRemote::new());

        let err = client
            .push_tree(&dir.path().join("nope"), PushOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::InvalidRoot { .. }));
    }

    #[tokio::test]
    async fn test_pull_skips_unsafe_paths() {
        let remote = MemoryRemote::new();
        remote.insert("docs\\ok.txt", b"fine".to_vec());
        remote.insert("docs\\..\\..\\escape.txt", b"evil".to_vec());
        let client = SyncClient::new(remote);

        let outer = tempdir().unwrap();
        let dest = outer.path().join("dest");
        fs::create_dir(&dest).unwrap();

        let report = client.pull_tree("docs", &dest).await.unwrap();

        assert_eq!(report.written, [dest.join("docs").join("ok.txt")]);
        assert_eq!(report.failures.len(), 1);
        assert!(matches!(
            report.failures[0].error,
            MaterializeError::UnsafePath { .. }
        ));
        assert!(!outer.path().join("escape.txt").exists());
    }

    #[tokio::test]
    async fn test_pull_continues_after_filesystem_failure() {
        let remote = MemoryRemote::new();
        remote.insert("docs\\blocked\\x.txt", b"x".to_vec());
        remote.insert("docs\\free.txt", b"y".to_vec());
        let client = SyncClient::new(remote);

        let dest = tempdir().unwrap();
        fs::create_dir(dest.path().join("docs")).unwrap();
        fs::write(dest.path().join("docs").join("blocked"), b"file").unwrap();

        let report = client.pull_tree("docs", dest.path()).await.unwrap();

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].name, "docs\\blocked\\x.txt");
        assert_eq!(fs::read(dest.path().join("docs").join("free.txt")).unwrap(), b"y");
    }

    #[tokio::test]
    async fn test_pull_rejects_empty_name() {
        let client = SyncClient::new(MemoryRemote::new());
        let dest = tempdir().unwrap();
        assert!(matches!(
            client.pull_tree(" ", dest.path()).await,
            Err(SyncError::EmptyDirectoryName)
        ));
    }

    #[tokio::test]
    async fn test_pull_rejects_names_that_change_the_url() {
        let remote = MemoryRemote::new();
        remote.insert("docs\\a.txt", b"a".to_vec());
        let client = SyncClient::new(remote);
        let dest = tempdir().unwrap();

        for name in ["..", "docs/../admin", "docs?all", "docs#x", "docs%2e%2e"] {
            assert!(matches!(
                client.pull_tree(name, dest.path()).await,
                Err(SyncError::InvalidDirectoryName { .. })
            ));
        }
        assert_eq!(fs::read_dir(dest.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_list_remote() {
        let remote = MemoryRemote::new();
        remote.insert("b\\x", vec![]);
        remote.insert("a\\y", vec![]);
        let client = SyncClient::new(remote);

        let list = client.list_remote().await.unwrap();
        assert_eq!(list.names, ["a", "b"]);
    }

    #[tokio::test]
    async fn test_push_batches_records_walk_errors() {
        let client = SyncClient::new(MemoryRemote::new());
        let batches = vec![Err(WalkError::ReadDir {
            path: PathBuf::from("/unreadable"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        })];

        let report = client.push_batches(batches, PushOptions::default()).await;
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].directory, "/unreadable");
        assert!(matches!(report.failures[0].error, BatchError::Walk(_)));
    }
}
