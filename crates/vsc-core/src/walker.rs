//! Directory tree traversal
//!
//! Turns a local directory tree into a lazy sequence of [`DirectoryBatch`]es,
//! one per directory that directly contains at least one regular file.
//!
//! ## Order
//!
//! Pre-order, depth first: a directory's own batch comes before any of its
//! subdirectories. Subdirectories and files are visited sorted by file
//! name, so the sequence is the same on every platform. Symbolic links are
//! skipped.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::{DirEntry, FilterEntry, WalkDir};

use crate::error::{PathError, WalkError};
use crate::path::{segment_from_os, RelativePath};

/// A regular file found directly inside a walked directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    /// Absolute (or root-relative) local path
    pub path: PathBuf,
    /// Base name, as sent to the server
    pub name: String,
}

/// The files of one directory level, addressed by their remote directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryBatch {
    /// Where the files go on the remote side, root name included
    pub relative_dir: RelativePath,
    /// Local directory the files were found in
    pub local_dir: PathBuf,
    /// Files sorted by name; never empty
    pub files: Vec<LocalFile>,
}

impl DirectoryBatch {
    /// Remote path of one of the batch's files
    pub fn remote_path(&self, file: &LocalFile) -> Result<RelativePath, PathError> {
        self.relative_dir.child(file.name.clone())
    }
}

type DirectoriesOnly = FilterEntry<walkdir::IntoIter, fn(&DirEntry) -> bool>;

/// Lazy iterator over the batches of a directory tree
pub struct TreeWalker {
    root: PathBuf,
    root_path: RelativePath,
    directories: DirectoriesOnly,
}

impl TreeWalker {
    /// Walk `root`, addressing it remotely as `root_path`
    pub fn new(root: impl Into<PathBuf>, root_path: RelativePath) -> Self {
        let root = root.into();
        let directories = WalkDir::new(&root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(is_directory as fn(&DirEntry) -> bool);

        Self {
            root,
            root_path,
            directories,
        }
    }

    /// Remote directory for a local directory below the root
    fn relative_dir(&self, dir: &Path) -> Result<RelativePath, WalkError> {
        let below_root = dir.strip_prefix(&self.root).unwrap_or(Path::new(""));
        let mut relative = self.root_path.clone();
        for component in below_root.components() {
            relative = segment_from_os(component.as_os_str(), dir)
                .and_then(|segment| relative.child(segment))
                .map_err(|source| WalkError::Path {
                    path: dir.to_path_buf(),
                    source,
                })?;
        }
        Ok(relative)
    }

    /// Collect the regular files directly inside `dir`
    fn batch_for(&self, dir: &Path) -> Result<Option<DirectoryBatch>, WalkError> {
        let read_error = |source: std::io::Error| WalkError::ReadDir {
            path: dir.to_path_buf(),
            source,
        };

        // walkdir reports a directory it cannot open when it tries to descend
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!("Cannot open {:?} ({}), leaving it to the walk", dir, e);
                return Ok(None);
            }
        };

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(read_error)?;
            if !entry.file_type().map_err(read_error)?.is_file() {
                continue;
            }
            let path = entry.path();
            let name =
                segment_from_os(&entry.file_name(), &path).map_err(|source| WalkError::Path {
                    path: path.clone(),
                    source,
                })?;
            files.push(LocalFile { path, name });
        }

        if files.is_empty() {
            debug!("No files directly in {:?}, skipping", dir);
            return Ok(None);
        }
        files.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(Some(DirectoryBatch {
            relative_dir: self.relative_dir(dir)?,
            local_dir: dir.to_path_buf(),
            files,
        }))
    }
}

impl Iterator for TreeWalker {
    type Item = Result<DirectoryBatch, WalkError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.directories.next()? {
                Ok(entry) => entry,
                Err(e) => return Some(Err(WalkError::from(e))),
            };

            match self.batch_for(entry.path()) {
                Ok(Some(batch)) => return Some(Ok(batch)),
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

fn is_directory(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
}
