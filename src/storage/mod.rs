// Storage backend - atomic JSON documents with backup fallback
//
// Write protocol: full content goes to `<file>.tmp`, the current `<file>` is
// copied to `<file>.backup`, then `.tmp` is renamed over `<file>`. The rename
// is the only step that makes a new version visible.

pub mod coalescer;
pub mod fs;

#[cfg(test)]
pub(crate) mod testing;

use std::path::Path;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::constants::{BACKUP_SUFFIX, TEMP_SUFFIX};
use crate::error::{Result, VideothequeError};
use self::fs::{with_suffix, FileSystem, StdFileSystem};

pub use self::coalescer::{SaveHandle, WriteCoalescer};

/// Reads and writes whole JSON documents through a `FileSystem`.
#[derive(Clone)]
pub struct JsonStore {
    fs: Arc<dyn FileSystem>,
}

impl std::fmt::Debug for JsonStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonStore").finish_non_exhaustive()
    }
}

impl Default for JsonStore {
    fn default() -> Self {
        Self::new(Arc::new(StdFileSystem))
    }
}

impl JsonStore {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    pub fn fs(&self) -> &Arc<dyn FileSystem> {
        &self.fs
    }

    /// Serialize `value` (pretty printed) and write it atomically.
    pub fn save_atomic<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.save_bytes(path, &bytes)
    }

    /// Write pre-serialized content atomically.
    /// On failure the temp file is removed and the previous file is left untouched.
    pub fn save_bytes(&self, path: &Path, data: &[u8]) -> Result<()> {
        let tmp_path = with_suffix(path, TEMP_SUFFIX);

        match self.write_steps(path, &tmp_path, data) {
            Ok(()) => {
                log::debug!("Saved {} ({} bytes)", path.display(), data.len());
                Ok(())
            }
            Err(e) => {
                if self.fs.exists(&tmp_path) {
                    let _ = self.fs.remove(&tmp_path);
                }
                log::error!("Failed to save {}: {}", path.display(), e);
                Err(VideothequeError::Write(format!("{}: {}", path.display(), e)))
            }
        }
    }

    fn write_steps(&self, path: &Path, tmp_path: &Path, data: &[u8]) -> std::io::Result<()> {
        self.fs.write(tmp_path, data)?;

        if self.fs.exists(path) {
            self.fs.copy(path, &with_suffix(path, BACKUP_SUFFIX))?;
        }

        self.fs.rename(tmp_path, path)
    }

    /// Load a document, falling back to its backup and then to `default`.
    /// Never fails: every read or parse error is logged and absorbed.
    pub fn load_with_fallback<T: DeserializeOwned>(&self, path: &Path, default: T) -> T {
        if self.fs.exists(path) {
            match self.read_json(path) {
                Ok(value) => return value,
                Err(e) => log::warn!("Could not read {}: {}. Trying backup.", path.display(), e),
            }
        }

        let backup_path = with_suffix(path, BACKUP_SUFFIX);
        if self.fs.exists(&backup_path) {
            match self.read_json(&backup_path) {
                Ok(value) => {
                    log::warn!("Loaded {} from backup", path.display());
                    return value;
                }
                Err(e) => log::warn!("Backup {} unusable: {}", backup_path.display(), e),
            }
        }

        default
    }

    fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<T> {
        let bytes = self.fs.read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[cfg(test)]
mod tests;
