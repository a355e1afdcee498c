//! Path model.
//!
//! Operations accept a path either as an absolute slash-delimited string or
//! as a pre-split list of segments. Both are normalized once, at the public
//! boundary, into a [`VfsPath`]; nothing past that point knows which shape
//! the caller used.
//!
//! String paths must match the absolute-path grammar: `/`, or `/` followed by
//! non-empty, NUL-free segments each optionally followed by a single `/`.
//! `""`, `"a/b"` and `"//"` are rejected. Segment lists are taken as given
//! unless strict checking is requested; a bad segment then surfaces as an
//! `InvalidPath` from the backend when it is first used as a child name.

use std::fmt;

use crate::vfs::{VfsError, VfsResult, validate_name};

/// A path as supplied by a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathInput {
    /// Absolute slash-delimited string, validated against the grammar.
    Text(String),
    /// Pre-split segments, rooted at the storage root.
    Segments(Vec<String>),
}

impl PathInput {
    /// Normalize into a canonical path.
    ///
    /// `strict` extends segment validation to `Segments` input; text input is
    /// always checked.
    pub fn normalize(self, strict: bool) -> VfsResult<VfsPath> {
        match self {
            PathInput::Text(text) => VfsPath::parse(&text),
            PathInput::Segments(segments) if strict => {
                for segment in &segments {
                    validate_name(segment)?;
                }
                Ok(VfsPath { segments })
            }
            PathInput::Segments(segments) => Ok(VfsPath { segments }),
        }
    }
}

impl From<&str> for PathInput {
    fn from(s: &str) -> Self {
        PathInput::Text(s.to_owned())
    }
}

impl From<String> for PathInput {
    fn from(s: String) -> Self {
        PathInput::Text(s)
    }
}

impl From<&String> for PathInput {
    fn from(s: &String) -> Self {
        PathInput::Text(s.clone())
    }
}

impl From<Vec<String>> for PathInput {
    fn from(segments: Vec<String>) -> Self {
        PathInput::Segments(segments)
    }
}

impl From<&[String]> for PathInput {
    fn from(segments: &[String]) -> Self {
        PathInput::Segments(segments.to_vec())
    }
}

impl From<Vec<&str>> for PathInput {
    fn from(segments: Vec<&str>) -> Self {
        segments.as_slice().into()
    }
}

impl From<&[&str]> for PathInput {
    fn from(segments: &[&str]) -> Self {
        PathInput::Segments(segments.iter().map(|s| (*s).to_owned()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for PathInput {
    fn from(segments: [&str; N]) -> Self {
        segments.as_slice().into()
    }
}

impl From<VfsPath> for PathInput {
    fn from(path: VfsPath) -> Self {
        PathInput::Segments(path.segments)
    }
}

impl From<&VfsPath> for PathInput {
    fn from(path: &VfsPath) -> Self {
        PathInput::Segments(path.segments.clone())
    }
}

/// Canonical path: an ordered list of segments below the storage root.
///
/// The empty list is the root itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct VfsPath {
    segments: Vec<String>,
}

impl VfsPath {
    /// The storage root.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse an absolute path string.
    pub fn parse(text: &str) -> VfsResult<Self> {
        let Some(rest) = text.strip_prefix('/') else {
            return Err(VfsError::invalid_path(format!("not an absolute path: {text:?}")));
        };
        if rest.is_empty() {
            return Ok(Self::root());
        }

        let rest = rest.strip_suffix('/').unwrap_or(rest);
        let mut segments = Vec::new();
        for segment in rest.split('/') {
            if segment.is_empty() || segment.contains('\0') {
                return Err(VfsError::invalid_path(format!("malformed path: {text:?}")));
            }
            segments.push(segment.to_owned());
        }
        Ok(Self { segments })
    }

    /// Build a path from segments without validating them.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Split into parent segments and leaf name.
    ///
    /// The leaf is `None` only for the root.
    pub fn split_leaf(&self) -> (&[String], Option<&str>) {
        match self.segments.split_last() {
            Some((leaf, parents)) => (parents, Some(leaf.as_str())),
            None => (&[], None),
        }
    }

    /// Leaf name, `None` for the root.
    pub fn leaf(&self) -> Option<&str> {
        self.split_leaf().1
    }

    /// Leaf name, or `InvalidPath` for the root.
    pub fn require_leaf(&self) -> VfsResult<&str> {
        self.leaf()
            .ok_or_else(|| VfsError::invalid_path("no name provided"))
    }

    /// Containing directory. The root is its own parent.
    pub fn parent(&self) -> VfsPath {
        Self {
            segments: self.split_leaf().0.to_vec(),
        }
    }

    /// Append one segment.
    pub fn join(&self, segment: impl Into<String>) -> VfsPath {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    /// Sibling with a different leaf name.
    pub fn with_leaf(&self, name: impl Into<String>) -> VfsPath {
        self.parent().join(name)
    }

    /// Returns true if `base` is this path or one of its ancestors.
    pub fn starts_with(&self, base: &VfsPath) -> bool {
        self.segments.starts_with(&base.segments)
    }

    /// Re-root this path from under `from` to under `to`.
    ///
    /// Returns `None` if this path is not inside `from`.
    pub fn rebase(&self, from: &VfsPath, to: &VfsPath) -> Option<VfsPath> {
        let relative = self.segments.strip_prefix(from.segments.as_slice())?;
        let mut segments = to.segments.clone();
        segments.extend(relative.iter().cloned());
        Some(Self { segments })
    }
}

impl fmt::Display for VfsPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

/// Validate a replacement name for `rename`.
///
/// Surrounding slashes are tolerated; what remains must be one segment.
pub fn rename_target(name: &str) -> VfsResult<&str> {
    let trimmed = name.trim_matches('/');
    validate_name(trimmed)
        .map_err(|_| VfsError::invalid_path(format!("bad new name {name:?}")))?;
    Ok(trimmed)
}
