//! Error types
//!
//! Typed errors for every stage of a transfer. Each error knows its
//! [`ErrorCategory`], which callers use to decide whether to continue and
//! which exit status to report.

use std::io;
use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

/// Broad classification of a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad input from the user, missing configuration
    Usage,
    /// Network, HTTP status or response decoding failure
    Transfer,
    /// Local filesystem failure
    Filesystem,
}

/// Errors produced while encoding or decoding relative paths
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// Path with no segments at all
    #[error("Relative path is empty")]
    Empty,

    /// Two separators in a row, or a leading/trailing separator
    #[error("Relative path contains an empty segment")]
    EmptySegment,

    /// `.`, `..`, absolute or drive-prefixed segment
    #[error("Relative path segment '{segment}' is not allowed")]
    UnsafeSegment { segment: String },

    /// A character with meaning in a URL path
    #[error("Name '{segment}' contains the reserved character '{character}'")]
    ReservedCharacter { segment: String, character: char },

    /// A name that would be split by the wire separator
    #[error("Name '{segment}' contains a path separator")]
    SeparatorInSegment { segment: String },

    /// Local name that cannot be represented on the wire
    #[error("Path '{path}' is not valid UTF-8")]
    NonUtf8 { path: PathBuf },
}

/// Errors produced while walking a local tree
#[derive(Error, Debug)]
pub enum WalkError {
    /// Failed to descend into a directory
    #[error("Failed to walk directory tree: {0}")]
    Walk(#[from] walkdir::Error),

    /// Failed to list the files of a directory
    #[error("Failed to read directory '{path}': {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A directory or file name that cannot be sent
    #[error("Cannot encode '{path}': {source}")]
    Path {
        path: PathBuf,
        #[source]
        source: PathError,
    },
}

/// Errors produced while talking to the remote
#[derive(Error, Debug)]
pub enum TransferError {
    /// HTTP client could not be constructed
    #[error("Failed to set up HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// DNS, connection, timeout or body read failure
    #[error("Request to '{url}' failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Server answered with a non-success status
    #[error("Server at '{url}' responded with {status}")]
    Status { url: String, status: StatusCode },

    /// Response body does not have the expected shape
    #[error("Unexpected response from '{url}': {details}")]
    Protocol { url: String, details: String },

    /// A file of the batch could not be opened for upload
    #[error("Failed to open '{path}' for upload: {source}")]
    OpenFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Errors produced while writing a pulled file to disk
#[derive(Error, Debug)]
pub enum MaterializeError {
    /// Remote name would escape the destination root
    #[error("Refusing to write '{name}': {source}")]
    UnsafePath {
        name: String,
        #[source]
        source: PathError,
    },

    /// Failed to create a directory of the chain
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Something other than a directory is in the way
    #[error("'{path}' exists and is not a directory")]
    NotADirectory { path: PathBuf },

    /// Target exists and is not a regular file (e.g. a symbolic link)
    #[error("'{path}' exists and is not a regular file")]
    NotARegularFile { path: PathBuf },

    /// Failed to write the file content
    #[error("Failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Why a pushed batch was not delivered
#[derive(Error, Debug)]
pub enum BatchError {
    #[error(transparent)]
    Walk(#[from] WalkError),

    #[error(transparent)]
    Transfer(#[from] TransferError),
}

/// Errors related to the persisted server address
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No address file, or an empty one
    #[error("Server address is not set (looked in '{path}')")]
    Missing { path: PathBuf },

    /// Address file exists but cannot be read
    #[error("Failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Address file cannot be written
    #[error("Failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Host argument is unusable
    #[error("Invalid server address '{host}': {reason}")]
    InvalidHost { host: String, reason: &'static str },

    /// Timeout override is not a number of seconds
    #[error("Invalid timeout '{value}': expected a whole number of seconds")]
    InvalidTimeout { value: String },
}

/// Errors returned by [`crate::SyncClient`] operations
#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error(transparent)]
    Walk(#[from] WalkError),

    /// The local root is missing, not a directory, or has no usable name
    #[error("Cannot push '{path}': {reason}")]
    InvalidRoot { path: PathBuf, reason: String },

    /// Remote directory name is empty
    #[error("Directory name must not be empty")]
    EmptyDirectoryName,

    /// Remote directory name that cannot be used as one URL segment
    #[error("Invalid directory name '{name}': {source}")]
    InvalidDirectoryName {
        name: String,
        #[source]
        source: PathError,
    },

    /// Operation ran to completion but some items failed
    #[error("{operation} finished with {failed} failed item(s)")]
    Incomplete {
        operation: &'static str,
        failed: usize,
    },
}

impl ConfigError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ConfigError::Missing { .. }
            | ConfigError::InvalidHost { .. }
            | ConfigError::InvalidTimeout { .. } => ErrorCategory::Usage,
            ConfigError::Read { .. } | ConfigError::Write { .. } => ErrorCategory::Filesystem,
        }
    }

    /// Get a recovery suggestion for this error
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            ConfigError::Missing { .. } => Some("Set it first with: vsc set <host:port>"),
            ConfigError::InvalidHost { .. } => Some("Pass a host such as example.com:8080"),
            _ => None,
        }
    }
}

impl TransferError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            TransferError::OpenFile { .. } => ErrorCategory::Filesystem,
            _ => ErrorCategory::Transfer,
        }
    }
}

impl BatchError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            BatchError::Walk(_) => ErrorCategory::Filesystem,
            BatchError::Transfer(e) => e.category(),
        }
    }
}

impl SyncError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SyncError::Config(e) => e.category(),
            SyncError::Transfer(e) => e.category(),
            SyncError::Walk(_) => ErrorCategory::Filesystem,
            SyncError::InvalidRoot { .. } => ErrorCategory::Filesystem,
            SyncError::EmptyDirectoryName | SyncError::InvalidDirectoryName { .. } => {
                ErrorCategory::Usage
            }
            SyncError::Incomplete { .. } => ErrorCategory::Transfer,
        }
    }

    /// Get a recovery suggestion for this error
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            SyncError::Config(e) => e.recovery_suggestion(),
            SyncError::Transfer(TransferError::Transport { .. }) => {
                Some("Check the server address with `vsc set` and that the server is running.")
            }
            _ => None,
        }
    }
}
