//! Content fingerprints and shared cache keys.
//!
//! Fingerprints are MD5 digests formatted as quoted lowercase hex, which is
//! what S3-compatible stores report as the ETag of a single-part object. A
//! local fingerprint can therefore be compared to a remote ETag with plain
//! string equality.
//!
//! Cache keys hash the destination path with SHA-256 so arbitrary bucket keys
//! map onto short, backend-safe identifiers.

use md5::Md5;
use sha2::{Digest, Sha256};

use collectfast_core::{DestinationPath, ETag};

/// Fingerprint raw bytes.
pub fn fingerprint(bytes: &[u8]) -> ETag {
    let mut h = Md5::new();
    h.update(bytes);
    ETag::from_hex_digest(&hex::encode(h.finalize()))
}

/// Fingerprint text by hashing its UTF-8 encoding.
pub fn fingerprint_text(text: &str) -> ETag {
    fingerprint(text.as_bytes())
}

/// `<prefix><sha256-hex(path)>`.
pub fn cache_key(prefix: &str, path: &DestinationPath) -> String {
    let mut h = Sha256::new();
    h.update(path.as_str().as_bytes());
    format!("{prefix}{}", hex::encode(h.finalize()))
}
