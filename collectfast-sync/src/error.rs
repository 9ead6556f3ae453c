//! Error types for collectfast-sync.

use std::path::PathBuf;

use thiserror::Error;

use collectfast_core::PathError;

/// Errors that abort a sync run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A local source file could not be read, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A destination path was rejected at the boundary.
    #[error("invalid destination: {0}")]
    Path(#[from] PathError),

    /// The storage collaborator failed to upload, delete or list.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Shared cache backend failures. Never fatal to a run; the lookup layer
/// logs and degrades.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cache entry JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
}

/// Remote metadata lookup failures. "Object not found" is not an error; it
/// is reported as `RemoteMetadata::Absent`.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("remote I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failures of the upload/delete/list collaborator.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}

pub(crate) fn cache_io_err(path: impl Into<PathBuf>, source: std::io::Error) -> CacheError {
    CacheError::Io {
        path: path.into(),
        source,
    }
}

pub(crate) fn storage_io_err(path: impl Into<PathBuf>, source: std::io::Error) -> StorageError {
    StorageError::Io {
        path: path.into(),
        source,
    }
}
