// Filesystem wrappers for tests: crash simulation and write counting

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use super::fs::{FileSystem, StdFileSystem};

/// Real filesystem that can be told to fail renames, simulating a crash
/// between writing the temp file and publishing it.
#[derive(Default)]
pub struct CrashingFs {
    fail_renames: AtomicBool,
}

impl CrashingFs {
    pub fn crash_before_rename(&self, enabled: bool) {
        self.fail_renames.store(enabled, Ordering::SeqCst);
    }
}

impl FileSystem for CrashingFs {
    fn exists(&self, path: &Path) -> bool {
        StdFileSystem.exists(path)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        StdFileSystem.read(path)
    }

    fn write(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        StdFileSystem.write(path, data)
    }

    fn copy(&self, from: &Path, to: &Path) -> io::Result<()> {
        StdFileSystem.copy(from, to)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        if self.fail_renames.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::Other, "simulated crash"));
        }
        StdFileSystem.rename(from, to)
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        StdFileSystem.remove(path)
    }

    fn list_dir(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        StdFileSystem.list_dir(dir)
    }

    fn create_dir_all(&self, dir: &Path) -> io::Result<()> {
        StdFileSystem.create_dir_all(dir)
    }
}

/// Real filesystem that counts published documents (successful renames) per target file name.
#[derive(Default)]
pub struct CountingFs {
    published: Mutex<HashMap<String, usize>>,
}

impl CountingFs {
    pub fn writes_to(&self, file_name: &str) -> usize {
        self.published
            .lock()
            .unwrap()
            .get(file_name)
            .copied()
            .unwrap_or(0)
    }
}

impl FileSystem for CountingFs {
    fn exists(&self, path: &Path) -> bool {
        StdFileSystem.exists(path)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        StdFileSystem.read(path)
    }

    fn write(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        StdFileSystem.write(path, data)
    }

    fn copy(&self, from: &Path, to: &Path) -> io::Result<()> {
        StdFileSystem.copy(from, to)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        StdFileSystem.rename(from, to)?;
        let name = to
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        *self.published.lock().unwrap().entry(name).or_insert(0) += 1;
        Ok(())
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        StdFileSystem.remove(path)
    }

    fn list_dir(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        StdFileSystem.list_dir(dir)
    }

    fn create_dir_all(&self, dir: &Path) -> io::Result<()> {
        StdFileSystem.create_dir_all(dir)
    }
}
