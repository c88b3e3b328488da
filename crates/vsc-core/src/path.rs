//! Relative path codec
//!
//! Paths travel over the wire as segments joined by a backslash, whatever
//! the local platform uses. This module translates between that form and
//! local paths, and refuses anything that could point outside the root it
//! is resolved against.

use std::ffi::OsStr;
use std::fmt;
use std::path::{Component, Path, PathBuf};

use crate::error::PathError;

/// Separator used when encoding a relative path for the server
pub const WIRE_SEPARATOR: &str = "\\";

/// Separators accepted when decoding
const ACCEPTED_SEPARATORS: [char; 2] = ['\\', '/'];

/// Characters that would end or escape the path part of a URL
const URL_RESERVED: [char; 3] = ['?', '#', '%'];

/// A validated, non-empty path relative to a synchronized root
///
/// The first N-1 segments are the directory chain; the last one is the
/// file (or directory) name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelativePath {
    segments: Vec<String>,
}

impl RelativePath {
    /// Build a path from already-split segments
    pub fn new<I, S>(segments: I) -> Result<Self, PathError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(PathError::Empty);
        }
        for segment in &segments {
            validate_segment(segment)?;
        }
        Ok(Self { segments })
    }

    /// Parse the wire form. Both `\` and `/` are treated as separators.
    pub fn decode(wire: &str) -> Result<Self, PathError> {
        if wire.is_empty() {
            return Err(PathError::Empty);
        }
        Self::new(wire.split(ACCEPTED_SEPARATORS))
    }

    /// Wire form: segments joined by [`WIRE_SEPARATOR`]
    pub fn encode(&self) -> String {
        self.segments.join(WIRE_SEPARATOR)
    }

    /// Extend the path by one segment
    pub fn child(&self, segment: impl Into<String>) -> Result<Self, PathError> {
        let segment = segment.into();
        validate_segment(&segment)?;
        let mut segments = self.segments.clone();
        segments.push(segment);
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Directory chain leading to the last segment
    pub fn parent_segments(&self) -> &[String] {
        &self.segments[..self.segments.len() - 1]
    }

    /// Last segment
    pub fn file_name(&self) -> &str {
        // Construction guarantees at least one segment
        &self.segments[self.segments.len() - 1]
    }

    /// Resolve against a local root directory
    pub fn to_local(&self, root: &Path) -> PathBuf {
        let mut path = root.to_path_buf();
        path.extend(&self.segments);
        path
    }
}

impl fmt::Display for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Check that a single name can be used as a path segment
pub fn validate_segment(segment: &str) -> Result<(), PathError> {
    if segment.is_empty() {
        return Err(PathError::EmptySegment);
    }
    if segment.contains(ACCEPTED_SEPARATORS) {
        return Err(PathError::SeparatorInSegment {
            segment: segment.to_string(),
        });
    }
    if segment == "." || segment == ".." || segment.contains('\0') {
        return Err(PathError::UnsafeSegment {
            segment: segment.to_string(),
        });
    }

    // Catches drive prefixes and roots on platforms that have them
    let mut components = Path::new(segment).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(PathError::UnsafeSegment {
            segment: segment.to_string(),
        }),
    }
}

/// Check a top-level directory name that goes into a pull URL
pub fn validate_directory_name(name: &str) -> Result<(), PathError> {
    validate_segment(name)?;
    match name.chars().find(|c| URL_RESERVED.contains(c)) {
        Some(character) => Err(PathError::ReservedCharacter {
            segment: name.to_string(),
            character,
        }),
        None => Ok(()),
    }
}

/// Convert a local file name into a segment
pub fn segment_from_os(name: &OsStr, path: &Path) -> Result<String, PathError> {
    let name = name.to_str().ok_or_else(|| PathError::NonUtf8 {
        path: path.to_path_buf(),
    })?;
    validate_segment(name)?;
    Ok(name.to_string())
}
