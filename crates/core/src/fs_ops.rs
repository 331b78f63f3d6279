//! Filesystem capability used by the engine, mover and sidecar writer.
//!
//! [`LocalFs`] forwards to `std::fs`. [`MemoryFs`] keeps files in a map so
//! batches can be exercised without touching disk.

use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub trait FileSystem: Send + Sync {
    fn exists(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
    /// Same-directory rename; atomic on the local filesystem.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;
    /// Relocation into another directory. Never copies across devices.
    fn move_file(&self, from: &Path, to: &Path) -> io::Result<()> {
        self.rename(from, to)
    }
    fn write_file(&self, path: &Path, contents: &[u8]) -> io::Result<()>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl FileSystem for LocalFs {
    fn exists(&self, path: &Path) -> bool {
        // symlink_metadata so a dangling link still counts as occupied
        fs::symlink_metadata(path).is_ok()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }

    fn write_file(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        fs::write(path, contents)
    }
}

#[derive(Debug, Default)]
pub struct MemoryFs {
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    files: BTreeMap<PathBuf, Vec<u8>>,
    dirs: BTreeSet<PathBuf>,
    read_only_dirs: BTreeSet<PathBuf>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_dir(&self, path: impl Into<PathBuf>) {
        self.state.lock().dirs.insert(path.into());
    }

    /// Adds a file and its parent directory.
    pub fn add_file(&self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) {
        let path = path.into();
        let mut state = self.state.lock();
        if let Some(parent) = path.parent() {
            state.dirs.insert(parent.to_path_buf());
        }
        state.files.insert(path, contents.into());
    }

    pub fn remove_file(&self, path: &Path) -> Option<Vec<u8>> {
        self.state.lock().files.remove(path)
    }

    /// Subsequent writes or renames into `path` fail with `PermissionDenied`.
    pub fn make_read_only(&self, path: impl Into<PathBuf>) {
        self.state.lock().read_only_dirs.insert(path.into());
    }

    pub fn read(&self, path: &Path) -> Option<Vec<u8>> {
        self.state.lock().files.get(path).cloned()
    }

    pub fn files(&self) -> Vec<PathBuf> {
        self.state.lock().files.keys().cloned().collect()
    }
}

impl MemoryState {
    fn check_writable_parent(&self, path: &Path) -> io::Result<()> {
        let parent = path.parent().unwrap_or_else(|| Path::new(""));
        if !self.dirs.contains(parent) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such directory: {}", parent.display()),
            ));
        }
        if self.read_only_dirs.contains(parent) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("read-only directory: {}", parent.display()),
            ));
        }
        Ok(())
    }
}

impl FileSystem for MemoryFs {
    fn exists(&self, path: &Path) -> bool {
        let state = self.state.lock();
        state.files.contains_key(path) || state.dirs.contains(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.state.lock().dirs.contains(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        let mut state = self.state.lock();
        if !state.files.contains_key(from) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such file: {}", from.display()),
            ));
        }
        state.check_writable_parent(from)?;
        state.check_writable_parent(to)?;
        if let Some(contents) = state.files.remove(from) {
            state.files.insert(to.to_path_buf(), contents);
        }
        Ok(())
    }

    fn write_file(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        let mut state = self.state.lock();
        state.check_writable_parent(path)?;
        if state.dirs.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("is a directory: {}", path.display()),
            ));
        }
        state.files.insert(path.to_path_buf(), contents.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn memory_rename_moves_contents() {
        let fs = MemoryFs::new();
        fs.add_file("/w/a.mkv", b"A".to_vec());
        fs.rename(Path::new("/w/a.mkv"), Path::new("/w/b.mkv"))
            .expect("rename");
        assert!(!fs.exists(Path::new("/w/a.mkv")));
        assert_eq!(fs.read(Path::new("/w/b.mkv")), Some(b"A".to_vec()));
    }

    #[test]
    fn memory_rename_into_missing_dir_fails() {
        let fs = MemoryFs::new();
        fs.add_file("/w/a.mkv", b"A".to_vec());
        let err = fs
            .rename(Path::new("/w/a.mkv"), Path::new("/nowhere/a.mkv"))
            .expect_err("must fail");
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(fs.exists(Path::new("/w/a.mkv")));
    }

    #[test]
    fn memory_write_respects_read_only_dirs() {
        let fs = MemoryFs::new();
        fs.add_dir("/ro");
        fs.make_read_only("/ro");
        let err = fs
            .write_file(Path::new("/ro/x.nfo"), b"x")
            .expect_err("must fail");
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
    }

    #[test]
    fn local_fs_round_trip() {
        let temp = tempdir().expect("tempdir");
        let a = temp.path().join("a.mkv");
        let b = temp.path().join("b.mkv");
        let fs = LocalFs;
        fs.write_file(&a, b"A").expect("write");
        assert!(fs.exists(&a));
        fs.rename(&a, &b).expect("rename");
        assert!(!fs.exists(&a));
        assert!(fs.exists(&b));
        assert!(fs.is_dir(temp.path()));
    }
}
