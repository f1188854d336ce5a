//! Filesystem helpers shared by the artifact store and the job writer.
//!
//! Writes go to a `.tmp` sibling and are renamed into place, so a reader
//! never observes a half-written log or hyperparameter file. Concurrent
//! writers to the same target still race; the last rename wins.

use crate::error::TrialkitError;
use std::path::Path;

/// Create `path` and any missing parents, like `mkdir -p`.
///
/// Succeeds when the directory already exists. Fails when something that is
/// not a directory occupies `path`.
pub fn ensure_dir(path: &Path) -> Result<(), TrialkitError> {
    std::fs::create_dir_all(path)?;
    tracing::trace!(path = %path.display(), "directory ensured");
    Ok(())
}

/// Write raw bytes to `path`, replacing any previous content.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<(), TrialkitError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_dir(parent)?;
    }
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, data)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Serialize `data` as pretty JSON and write it to `path`.
pub fn atomic_write_json<T: serde::Serialize + ?Sized>(
    path: &Path,
    data: &T,
) -> Result<(), TrialkitError> {
    let json = serde_json::to_vec_pretty(data)?;
    atomic_write(path, &json)
}

/// Read the whole file at `path`, or `Ok(None)` when it does not exist.
pub fn load_bytes(path: &Path) -> Result<Option<Vec<u8>>, TrialkitError> {
    if !path.is_file() {
        return Ok(None);
    }
    Ok(Some(std::fs::read(path)?))
}

/// Load and deserialize JSON from `path`.
///
/// Returns `Ok(None)` when the file does not exist.
pub fn load_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>, TrialkitError> {
    match load_bytes(path)? {
        Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        None => Ok(None),
    }
}
