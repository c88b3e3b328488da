//! VSC Core Library
//!
//! This crate provides the core functionality for VSC, a minimal client that
//! synchronizes a local directory tree with a remote file-storage server
//! over HTTP.
//!
//! # Architecture
//!
//! A nested tree is flattened into batches (the files of one directory
//! level, tagged with their relative directory) on push, and rebuilt from a
//! flat list of `(relative path, bytes)` units on pull.
//!
//! ```text
//! push: filesystem -> TreeWalker -> encode_batch -> POST /files/push
//! pull: GET /files/pull/{name} -> decode_response -> materialize -> filesystem
//! ```
//!
//! # Quick Start
//!
//! ```text
//! let config = Config::load()?;
//! let remote = HttpRemote::new(&config.server_address()?, config.timeout)?;
//! let client = SyncClient::new(remote);
//!
//! let report = client.push_tree(&std::env::current_dir()?, PushOptions::default()).await?;
//! ```
//!
//! # Modules
//!
//! - `path`: Wire form of relative paths
//! - `walker`: Directory tree traversal into batches
//! - `transfer`: Remote trait, HTTP and in-memory transports, encoding/decoding
//! - `client`: Push/pull/list orchestration
//! - `config`: Server address persistence and environment overrides
//! - `error`: Typed errors

pub mod client;
pub mod config;
pub mod error;
pub mod path;
pub mod transfer;
pub mod walker;

pub use client::{BatchFailure, FileFailure, PullReport, PushOptions, PushReport, SyncClient};
pub use config::{Config, ServerAddress};
pub use error::{
    BatchError, ConfigError, ErrorCategory, MaterializeError, PathError, SyncError,
    TransferError, WalkError,
};
pub use path::RelativePath;
pub use transfer::{FileUnit, HttpRemote, MemoryRemote, Remote, RepositoryList};
pub use walker::{DirectoryBatch, LocalFile, TreeWalker};
