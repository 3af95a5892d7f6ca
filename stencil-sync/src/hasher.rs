//! Content hasher — SHA-256 over an artifact's raw bytes.

use std::path::Path;

use sha2::{Digest, Sha256};

use stencil_core::ContentHash;

use crate::error::{io_err, SyncError};

pub fn hash_bytes(bytes: &[u8]) -> ContentHash {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    ContentHash(hex::encode(hasher.finalize()))
}

/// Hash the file at `path`. Unreadable files are an [`SyncError::Io`].
pub fn hash_file(path: &Path) -> Result<ContentHash, SyncError> {
    let bytes = std::fs::read(path).map_err(|e| io_err(path, e))?;
    Ok(hash_bytes(&bytes))
}

/// Read an artifact as UTF-8 text together with the hash of its bytes.
pub(crate) fn read_artifact(path: &Path) -> Result<(String, ContentHash), SyncError> {
    let bytes = std::fs::read(path).map_err(|e| io_err(path, e))?;
    let hash = hash_bytes(&bytes);
    let text = String::from_utf8(bytes).map_err(|e| {
        io_err(
            path,
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.utf8_error()),
        )
    })?;
    Ok((text, hash))
}
