//! Domain types shared by the sync engine and the CLI.
//!
//! A [`DestinationPath`] can only be built through validation, so everything
//! downstream of the boundary may assume a well-formed bucket key.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::PathError;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Location of an object inside the target bucket, e.g. `static/css/app.css`.
///
/// Used verbatim as the basis of the shared cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DestinationPath(String);

impl DestinationPath {
    /// Validate and wrap a bucket key.
    ///
    /// Rejects empty keys, absolute keys, `..` segments, and NUL or backslash
    /// characters.
    pub fn new(path: impl Into<String>) -> Result<Self, PathError> {
        let path = path.into();
        if path.is_empty() {
            return Err(PathError::Empty);
        }
        if path.starts_with('/') {
            return Err(PathError::Absolute { path });
        }
        if let Some(ch) = path.chars().find(|c| matches!(c, '\0' | '\\')) {
            return Err(PathError::ForbiddenChar { path, ch });
        }
        if path.split('/').any(|segment| segment == "..") {
            return Err(PathError::ParentSegment { path });
        }
        Ok(Self(path))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DestinationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl TryFrom<String> for DestinationPath {
    type Error = PathError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl TryFrom<&str> for DestinationPath {
    type Error = PathError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<DestinationPath> for String {
    fn from(p: DestinationPath) -> Self {
        p.0
    }
}

/// Content-identity token in entity-tag form: a double-quoted lowercase hex
/// digest, e.g. `"5d41402abc4b2a76b9719d911017c592"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ETag(pub String);

impl ETag {
    /// Wrap a bare hex digest in the quoting convention used by object stores.
    pub fn from_hex_digest(hex: &str) -> Self {
        Self(format!("\"{hex}\""))
    }
}

impl fmt::Display for ETag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ETag {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ETag {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Remote metadata
// ---------------------------------------------------------------------------

/// What the remote store reported for a destination path.
///
/// "Not looked up yet" is modelled as `Option::None` by callers, never as
/// [`RemoteMetadata::Absent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum RemoteMetadata {
    Present { etag: ETag },
    Absent,
}

impl RemoteMetadata {
    pub fn present(etag: impl Into<ETag>) -> Self {
        Self::Present { etag: etag.into() }
    }
}

// ---------------------------------------------------------------------------
// Decisions
// ---------------------------------------------------------------------------

/// Whether a file needs to be sent to the bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Skip,
    Upload,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Skip => write!(f, "skip"),
            Decision::Upload => write!(f, "upload"),
        }
    }
}

/// Diagnostic attached to every [`Decision`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum Reason {
    /// Comparison disabled by the caller.
    Forced,
    /// Local fingerprint equals the remote entity tag.
    #[serde(rename = "etag_match")]
    ETagMatch,
    /// Remote object exists with a different entity tag.
    #[serde(rename = "etag_mismatch")]
    ETagMismatch,
    /// Remote object does not exist.
    RemoteAbsent,
    /// The remote lookup failed; carries the error message.
    ComparisonUnavailable(String),
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reason::Forced => write!(f, "forced upload"),
            Reason::ETagMatch => write!(f, "ETags match"),
            Reason::ETagMismatch => write!(f, "ETag mismatch"),
            Reason::RemoteAbsent => write!(f, "remote object not found"),
            Reason::ComparisonUnavailable(err) => write!(f, "comparison unavailable: {err}"),
        }
    }
}

/// Outcome of a single skip-or-upload decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub decision: Decision,
    pub reason: Reason,
}

impl Verdict {
    pub fn skip(reason: Reason) -> Self {
        Self {
            decision: Decision::Skip,
            reason,
        }
    }

    pub fn upload(reason: Reason) -> Self {
        Self {
            decision: Decision::Upload,
            reason,
        }
    }

    pub fn is_skip(&self) -> bool {
        self.decision == Decision::Skip
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
