//! Pull response decoding and materialization

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::MaterializeError;
use crate::path::RelativePath;

/// One file as it appears in a pull response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    /// Relative path, segments joined by `\`
    pub name: String,
    /// File content
    #[serde(with = "wire_bytes")]
    pub file: Vec<u8>,
}

/// Directory names known to the server
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryList {
    #[serde(rename = "repositoriesNames")]
    pub names: Vec<String>,
}

/// A pulled file whose path has been checked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUnit {
    pub relative_path: RelativePath,
    pub content: Vec<u8>,
}

impl TryFrom<FileDescriptor> for FileUnit {
    type Error = MaterializeError;

    fn try_from(descriptor: FileDescriptor) -> Result<Self, Self::Error> {
        let relative_path =
            RelativePath::decode(&descriptor.name).map_err(|source| MaterializeError::UnsafePath {
                name: descriptor.name.clone(),
                source,
            })?;
        Ok(Self {
            relative_path,
            content: descriptor.file,
        })
    }
}

/// Parse a pull response body
///
/// All or nothing: nothing can be materialized until the whole body parses.
pub fn decode_response(body: &[u8]) -> Result<Vec<FileDescriptor>, serde_json::Error> {
    serde_json::from_slice(body)
}

/// Write one unit below `destination`
///
/// Creates the directory chain shortest prefix first, then writes the
/// content, replacing any existing file. Nothing is rolled back on failure.
pub fn materialize(unit: &FileUnit, destination: &Path) -> Result<PathBuf, MaterializeError> {
    let mut target = destination.to_path_buf();
    for segment in unit.relative_path.parent_segments() {
        target.push(segment);
        ensure_directory(&target)?;
    }

    target.push(unit.relative_path.file_name());
    ensure_writable_file(&target)?;
    fs::write(&target, &unit.content).map_err(|source| MaterializeError::Write {
        path: target.clone(),
        source,
    })?;

    debug!("Wrote {} bytes to {:?}", unit.content.len(), target);
    Ok(target)
}

/// Create `path` unless a real directory is already there
fn ensure_directory(path: &Path) -> Result<(), MaterializeError> {
    match fs::create_dir(path) {
        Ok(()) => {
            debug!("Created directory {:?}", path);
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            // symlink_metadata so a link cannot redirect writes elsewhere
            match fs::symlink_metadata(path) {
                Ok(meta) if meta.is_dir() => Ok(()),
                _ => Err(MaterializeError::NotADirectory {
                    path: path.to_path_buf(),
                }),
            }
        }
        Err(source) => Err(MaterializeError::CreateDirectory {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// The target must be absent or a regular file
fn ensure_writable_file(path: &Path) -> Result<(), MaterializeError> {
    match fs::symlink_metadata(path) {
        Ok(meta) if !meta.is_file() => Err(MaterializeError::NotARegularFile {
            path: path.to_path_buf(),
        }),
        _ => Ok(()),
    }
}

/// File content as an array of integers, or a base64 string
mod wire_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Numbers(Vec<u8>),
        Base64(String),
    }

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(bytes)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Numbers(bytes) => Ok(bytes),
            Repr::Base64(text) => STANDARD.decode(text).map_err(D::Error::custom),
        }
    }
}
