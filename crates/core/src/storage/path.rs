//! Path normalization for caller-supplied object keys and folder names.
//!
//! Every path that reaches a backend goes through [`normalize`] first. The
//! result is a [`StoragePath`]: slash-separated, relative to the backend
//! root, without empty, `.` or `..` segments. The empty path is the root.

use std::fmt;

use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};
use serde::Serialize;
use thiserror::Error;

/// Characters escaped when a single path segment is embedded in a URL.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Path validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// A `..` segment was present before or after decoding.
    #[error("path must not contain '..' segments")]
    Traversal,

    /// The path starts with `/`.
    #[error("path must be relative")]
    Absolute,

    /// Percent-decoding did not produce valid UTF-8.
    #[error("path is not valid percent-encoded UTF-8")]
    InvalidEncoding,

    /// The path contains a character that cannot appear in a key.
    #[error("path contains invalid character {0:?}")]
    InvalidCharacter(char),

    /// An object path was required but the input resolved to the root.
    #[error("path must name an object")]
    Empty,

    /// The path lies under a directory the backend keeps for itself.
    #[error("path is reserved by the storage backend")]
    Reserved,
}

/// A normalized, backend-relative object key or folder path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct StoragePath(String);

impl StoragePath {
    /// The backend root.
    #[must_use]
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Builds a path from a key reported by a backend.
    ///
    /// Backend keys are not percent-encoded, so no decoding happens here; the
    /// same structural checks as [`normalize`] apply.
    pub fn from_key(key: &str) -> Result<Self, PathError> {
        if key.starts_with('/') {
            return Err(PathError::Absolute);
        }
        canonicalize(key)
    }

    /// Returns true for the backend root.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Appends a single segment.
    pub fn join(&self, segment: &str) -> Result<Self, PathError> {
        if segment.contains('/') {
            return Err(PathError::InvalidCharacter('/'));
        }
        if self.is_root() {
            Self::from_key(segment)
        } else {
            Self::from_key(&format!("{}/{segment}", self.0))
        }
    }

    /// Last segment, if any.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.0.rsplit('/').next().filter(|s| !s.is_empty())
    }

    /// Key used when listing this path as a directory (`a/b/`, or `/` for the root).
    #[must_use]
    pub fn dir_key(&self) -> String {
        if self.is_root() {
            "/".to_string()
        } else {
            format!("{}/", self.0)
        }
    }

    /// Percent-encodes every segment for use inside a URL.
    #[must_use]
    pub fn encoded(&self) -> String {
        self.0
            .split('/')
            .map(|segment| utf8_percent_encode(segment, SEGMENT).to_string())
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl fmt::Display for StoragePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StoragePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Decodes and validates a caller-supplied path.
///
/// Empty input resolves to the root.
pub fn normalize(raw: &str) -> Result<StoragePath, PathError> {
    if raw.starts_with('/') {
        return Err(PathError::Absolute);
    }
    if raw.split('/').any(|segment| segment == "..") {
        return Err(PathError::Traversal);
    }

    let decoded = percent_decode_str(raw)
        .decode_utf8()
        .map_err(|_| PathError::InvalidEncoding)?;

    if decoded.starts_with('/') {
        return Err(PathError::Absolute);
    }
    canonicalize(&decoded)
}

/// Like [`normalize`], but the result must name an object rather than the root.
pub fn normalize_object(raw: &str) -> Result<StoragePath, PathError> {
    let path = normalize(raw)?;
    if path.is_root() {
        return Err(PathError::Empty);
    }
    Ok(path)
}

fn canonicalize(path: &str) -> Result<StoragePath, PathError> {
    if let Some(c) = path.chars().find(|c| c.is_control() || *c == '\\') {
        return Err(PathError::InvalidCharacter(c));
    }

    let mut segments = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => return Err(PathError::Traversal),
            s => segments.push(s),
        }
    }

    Ok(StoragePath(segments.join("/")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_root() {
        assert!(normalize("").unwrap().is_root());
        assert!(normalize(".").unwrap().is_root());
        assert_eq!(normalize("").unwrap().dir_key(), "/");
    }

    #[test]
    fn test_decodes_percent_encoding() {
        let path = normalize("my%20folder/report%231.pdf").unwrap();
        assert_eq!(path.as_str(), "my folder/report#1.pdf");
    }

    #[test]
    fn test_collapses_redundant_separators() {
        assert_eq!(normalize("a//b/./c/").unwrap().as_str(), "a/b/c");
    }

    #[test]
    fn test_rejects_traversal() {
        assert_eq!(normalize("../etc/passwd"), Err(PathError::Traversal));
        assert_eq!(normalize("a/../../b"), Err(PathError::Traversal));
        assert_eq!(normalize("a/%2e%2e/b"), Err(PathError::Traversal));
        assert_eq!(normalize("a/..%2Fb"), Err(PathError::Traversal));
    }

    #[test]
    fn test_dots_inside_names_are_allowed() {
        assert_eq!(normalize("a/..b/c..").unwrap().as_str(), "a/..b/c..");
        assert_eq!(normalize("archive.tar.gz").unwrap().as_str(), "archive.tar.gz");
    }

    #[test]
    fn test_rejects_absolute() {
        assert_eq!(normalize("/etc/passwd"), Err(PathError::Absolute));
        assert_eq!(normalize("%2Fetc/passwd"), Err(PathError::Absolute));
    }

    #[test]
    fn test_rejects_invalid_input() {
        assert_eq!(normalize("bad%FFbyte"), Err(PathError::InvalidEncoding));
        assert_eq!(normalize("a%00b"), Err(PathError::InvalidCharacter('\0')));
        assert_eq!(normalize("a\\b"), Err(PathError::InvalidCharacter('\\')));
    }

    #[test]
    fn test_normalize_object_requires_non_root() {
        assert_eq!(normalize_object(""), Err(PathError::Empty));
        assert_eq!(normalize_object("//"), Err(PathError::Absolute));
        assert!(normalize_object("a.txt").is_ok());
    }

    #[test]
    fn test_join_and_file_name() {
        let folder = normalize("docs/2024").unwrap();
        let file = folder.join("summary.pdf").unwrap();
        assert_eq!(file.as_str(), "docs/2024/summary.pdf");
        assert_eq!(file.file_name(), Some("summary.pdf"));
        assert_eq!(StoragePath::root().join("a.txt").unwrap().as_str(), "a.txt");
        assert!(folder.join("x/y").is_err());
        assert!(folder.join("..").is_err());
    }

    #[test]
    fn test_encoded_escapes_segments() {
        let path = normalize("my%20folder/a%3Fb.txt").unwrap();
        assert_eq!(path.encoded(), "my%20folder/a%3Fb.txt");
    }

    #[test]
    fn test_from_key_does_not_decode() {
        let path = StoragePath::from_key("literal%20name.txt").unwrap();
        assert_eq!(path.as_str(), "literal%20name.txt");
        assert_eq!(StoragePath::from_key("a/c/").unwrap().as_str(), "a/c");
    }
}
