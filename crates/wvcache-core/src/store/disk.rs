//! Disk side of the store: whole-file reads and atomic replace-on-write.

use std::io::{self, Write};
use std::path::Path;

use super::StoreError;

/// Write `bytes` to `path` through a temp file in the same directory, then rename
/// over the destination. Readers see either the old file or the complete new one.
/// Runs in the current thread; call from `spawn_blocking` if used from async code.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".wvcache-")
        .suffix(".part")
        .tempfile_in(dir)
        .map_err(|e| StoreError::io(dir, e))?;
    tmp.write_all(bytes).map_err(|e| StoreError::io(tmp.path(), e))?;
    tmp.as_file().sync_data().map_err(|e| StoreError::io(tmp.path(), e))?;
    tmp.persist(path).map_err(|e| StoreError::io(path, e.error))?;
    Ok(())
}

/// Read the whole file, or `None` if it does not exist.
pub(crate) async fn read_if_exists(path: &Path) -> Result<Option<Vec<u8>>, StoreError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StoreError::io(path, e)),
    }
}
