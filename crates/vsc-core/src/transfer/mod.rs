//! Transfer layer
//!
//! Moves batches and file units between this client and a file-storage
//! server.
//!
//! ## Wire contract
//!
//! | Operation | Request                              | Response                         |
//! |-----------|--------------------------------------|----------------------------------|
//! | Push      | `POST /files/push`, multipart form   | ignored                          |
//! | Pull      | `GET /files/pull/{directoryName}`    | `[{ "name": .., "file": [..] }]` |
//! | List      | `GET /files/all`                     | `{ "repositoriesNames": [..] }`  |
//!
//! The push form carries a `directory_name` text field and one `files` part
//! per file of the batch.

mod decoder;
mod encoder;
mod http;
mod memory;

use async_trait::async_trait;

pub use decoder::{decode_response, materialize, FileDescriptor, FileUnit, RepositoryList};
pub use encoder::encode_batch;
pub use http::HttpRemote;
pub use memory::MemoryRemote;

use crate::error::TransferError;
use crate::walker::DirectoryBatch;

/// Path of the push endpoint
pub const PUSH_ENDPOINT: &str = "/files/push";
/// Prefix of the pull endpoint; the directory name is appended
pub const PULL_ENDPOINT: &str = "/files/pull/";
/// Path of the listing endpoint
pub const LIST_ENDPOINT: &str = "/files/all";

/// Form field holding the remote directory of a pushed batch
pub const DIRECTORY_NAME_FIELD: &str = "directory_name";
/// Form field repeated once per pushed file
pub const FILES_FIELD: &str = "files";

/// A file-storage server, as seen by the client
#[async_trait]
pub trait Remote: Send + Sync {
    /// Upload the files of one directory level
    async fn push_batch(&self, batch: &DirectoryBatch) -> Result<(), TransferError>;

    /// Fetch every file stored under `directory_name`
    async fn pull(&self, directory_name: &str) -> Result<Vec<FileDescriptor>, TransferError>;

    /// Fetch the names of all stored directory trees
    async fn list(&self) -> Result<RepositoryList, TransferError>;
}
