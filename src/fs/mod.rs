// src/fs/mod.rs

use std::fmt::Debug;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result};

pub mod mock;

/// Abstract filesystem interface used by change detection.
pub trait FileSystem: Send + Sync + Debug {
    fn read(&self, path: &Path) -> Result<Vec<u8>>;

    /// Write `contents` to `path`, creating parent directories as needed and
    /// stamping the file's modification time with the current time, whether
    /// the file is new or already existed.
    fn write(&self, path: &Path, contents: &[u8]) -> Result<()>;

    fn exists(&self, path: &Path) -> bool;
    fn is_file(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;

    /// True when `path` itself is a symbolic link, without following it.
    fn is_symlink(&self, path: &Path) -> bool;
    fn modified(&self, path: &Path) -> Result<SystemTime>;

    /// Return a list of entries in a directory.
    /// Returns full paths.
    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>>;
}

/// Implementation that uses `std::fs`.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        fs::read(path).with_context(|| format!("reading file {:?}", path))
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| format!("creating dir {:?}", parent))?;
            }
        }
        let mut file = fs::File::create(path).with_context(|| format!("creating file {:?}", path))?;
        file.write_all(contents).with_context(|| format!("writing to file {:?}", path))?;
        // Truncating an existing empty file is not guaranteed to bump mtime
        // everywhere; set it explicitly.
        file.set_modified(SystemTime::now())
            .with_context(|| format!("updating modification time of {:?}", path))?;
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_symlink(&self, path: &Path) -> bool {
        fs::symlink_metadata(path).is_ok_and(|meta| meta.file_type().is_symlink())
    }

    fn modified(&self, path: &Path) -> Result<SystemTime> {
        let meta = fs::metadata(path).with_context(|| format!("reading metadata of {:?}", path))?;
        meta.modified()
            .with_context(|| format!("reading modification time of {:?}", path))
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path).with_context(|| format!("reading dir {:?}", path))? {
            let entry = entry?;
            entries.push(entry.path());
        }
        Ok(entries)
    }
}
