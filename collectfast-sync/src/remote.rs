//! Remote collaborators: metadata lookup and object storage.
//!
//! The decision engine only needs [`RemoteMetadataProvider`]; the runner
//! additionally drives a [`Storage`] for uploads and deletes.
//! [`DirectoryBucket`] implements both over a local directory, reporting
//! entity tags the way S3-compatible stores do for single-part uploads.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use collectfast_core::{DestinationPath, RemoteMetadata};

use crate::error::{storage_io_err, RemoteError, StorageError};
use crate::fingerprint::fingerprint;

/// Authoritative source of remote object metadata.
///
/// A missing object is `Ok(RemoteMetadata::Absent)`; `Err` is reserved for
/// failures where the object's state is unknown.
pub trait RemoteMetadataProvider {
    fn lookup(&self, path: &DestinationPath) -> Result<RemoteMetadata, RemoteError>;
}

/// Mutating side of the bucket.
pub trait Storage {
    fn upload(&self, path: &DestinationPath, content: &[u8]) -> Result<(), StorageError>;

    /// Deleting a missing object must succeed.
    fn delete(&self, path: &DestinationPath) -> Result<(), StorageError>;

    /// Every object currently stored, in any order.
    fn list(&self) -> Result<Vec<DestinationPath>, StorageError>;
}

// ---------------------------------------------------------------------------
// DirectoryBucket
// ---------------------------------------------------------------------------

/// A bucket rooted at a local directory; object keys map to relative paths.
#[derive(Debug, Clone)]
pub struct DirectoryBucket {
    root: PathBuf,
}

impl DirectoryBucket {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `<root>/<key>`. Keys are validated, so they cannot escape the root.
    pub fn object_path(&self, path: &DestinationPath) -> PathBuf {
        path.as_str()
            .split('/')
            .filter(|segment| !segment.is_empty())
            .fold(self.root.clone(), |acc, segment| acc.join(segment))
    }

    fn collect_keys(
        &self,
        dir: &Path,
        prefix: &str,
        out: &mut Vec<DestinationPath>,
    ) -> Result<(), StorageError> {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(storage_io_err(dir, e)),
        };
        for entry in entries {
            let entry = entry.map_err(|e| storage_io_err(dir, e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let file_type = entry.file_type().map_err(|e| storage_io_err(entry.path(), e))?;
            let key = format!("{prefix}{name}");
            if file_type.is_dir() {
                self.collect_keys(&entry.path(), &format!("{key}/"), out)?;
            } else if file_type.is_file() && !is_upload_tmp(&name) {
                let key = DestinationPath::new(key)
                    .map_err(|e| StorageError::Backend(e.to_string()))?;
                out.push(key);
            }
        }
        Ok(())
    }
}

fn is_upload_tmp(name: &str) -> bool {
    name.ends_with(".collectfast.tmp")
}

impl RemoteMetadataProvider for DirectoryBucket {
    fn lookup(&self, path: &DestinationPath) -> Result<RemoteMetadata, RemoteError> {
        let object = self.object_path(path);
        match std::fs::read(&object) {
            Ok(bytes) => Ok(RemoteMetadata::Present {
                etag: fingerprint(&bytes),
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(RemoteMetadata::Absent),
            Err(e) => Err(RemoteError::Io {
                path: object,
                source: e,
            }),
        }
    }
}

impl Storage for DirectoryBucket {
    fn upload(&self, path: &DestinationPath, content: &[u8]) -> Result<(), StorageError> {
        let object = self.object_path(path);
        if let Some(parent) = object.parent() {
            std::fs::create_dir_all(parent).map_err(|e| storage_io_err(parent, e))?;
        }

        let tmp = PathBuf::from(format!("{}.collectfast.tmp", object.display()));
        std::fs::write(&tmp, content).map_err(|e| storage_io_err(&tmp, e))?;
        if let Err(e) = std::fs::rename(&tmp, &object) {
            let _ = std::fs::remove_file(&tmp);
            return Err(storage_io_err(&object, e));
        }
        Ok(())
    }

    fn delete(&self, path: &DestinationPath) -> Result<(), StorageError> {
        let object = self.object_path(path);
        match std::fs::remove_file(&object) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_io_err(&object, e)),
        }
    }

    fn list(&self) -> Result<Vec<DestinationPath>, StorageError> {
        let mut keys = Vec::new();
        self.collect_keys(&self.root, "", &mut keys)?;
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn dest(p: &str) -> DestinationPath {
        DestinationPath::new(p).unwrap()
    }

    #[test]
    fn missing_object_is_absent() {
        let tmp = TempDir::new().unwrap();
        let bucket = DirectoryBucket::new(tmp.path());
        assert_eq!(
            bucket.lookup(&dest("static/a.css")).unwrap(),
            RemoteMetadata::Absent
        );
    }

    #[test]
    fn uploaded_object_reports_md5_etag() {
        let tmp = TempDir::new().unwrap();
        let bucket = DirectoryBucket::new(tmp.path());
        bucket.upload(&dest("static/a.css"), b"hello").unwrap();

        assert!(tmp.path().join("static").join("a.css").exists());
        assert_eq!(
            bucket.lookup(&dest("static/a.css")).unwrap(),
            RemoteMetadata::present("\"5d41402abc4b2a76b9719d911017c592\"")
        );
    }

    #[test]
    fn delete_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let bucket = DirectoryBucket::new(tmp.path());
        bucket.upload(&dest("a.css"), b"x").unwrap();
        bucket.delete(&dest("a.css")).unwrap();
        bucket.delete(&dest("a.css")).unwrap();
        assert_eq!(bucket.lookup(&dest("a.css")).unwrap(), RemoteMetadata::Absent);
    }

    #[test]
    fn list_walks_nested_keys_sorted() {
        let tmp = TempDir::new().unwrap();
        let bucket = DirectoryBucket::new(tmp.path());
        bucket.upload(&dest("static/js/app.js"), b"1").unwrap();
        bucket.upload(&dest("static/a.css"), b"2").unwrap();
        bucket.upload(&dest("robots.txt"), b"3").unwrap();

        let keys: Vec<String> = bucket.list().unwrap().into_iter().map(String::from).collect();
        assert_eq!(keys, vec!["robots.txt", "static/a.css", "static/js/app.js"]);
    }

    #[test]
    fn list_of_missing_root_is_empty() {
        let tmp = TempDir::new().unwrap();
        let bucket = DirectoryBucket::new(tmp.path().join("nope"));
        assert!(bucket.list().unwrap().is_empty());
    }
}
