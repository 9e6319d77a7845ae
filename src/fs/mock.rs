// src/fs/mock.rs

use super::FileSystem;
use anyhow::{Result, anyhow};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::SystemTime;

#[derive(Debug, Clone)]
pub enum MockEntry {
    File {
        contents: Vec<u8>,
        modified: SystemTime,
    },
    Dir(Vec<String>), // List of child names
    /// A directory that exists but cannot be listed.
    Unreadable,
    /// A symbolic link to another path in the tree.
    Symlink(PathBuf),
}

/// Link hops followed before a path counts as dangling.
const MAX_LINK_HOPS: usize = 40;

/// In-memory filesystem with explicit modification times.
///
/// Clones share the same underlying tree, so a test can keep a handle while
/// the code under test owns another.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    files: Arc<Mutex<HashMap<PathBuf, MockEntry>>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        let mut files = HashMap::new();
        // Ensure root exists
        files.insert(PathBuf::from("/"), MockEntry::Dir(Vec::new()));

        Self {
            files: Arc::new(Mutex::new(files)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PathBuf, MockEntry>> {
        // A poisoned lock only means another test thread panicked mid-update.
        self.files.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Add (or replace) a file stamped with the current time.
    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        self.add_file_at(path, content, SystemTime::now());
    }

    /// Add (or replace) a file with an explicit modification time.
    pub fn add_file_at(
        &self,
        path: impl AsRef<Path>,
        content: impl Into<Vec<u8>>,
        modified: SystemTime,
    ) {
        let path = path.as_ref().to_path_buf();
        let mut files = self.lock();
        files.insert(
            path.clone(),
            MockEntry::File {
                contents: content.into(),
                modified,
            },
        );
        Self::link_into_parent(&mut files, &path);
    }

    /// Add an empty directory.
    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        let mut files = self.lock();
        Self::ensure_dir_entry(&mut files, &path);
    }

    /// Mark a directory as present but unlistable (e.g. removed mid-scan or
    /// permission denied).
    pub fn make_unreadable(&self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        let mut files = self.lock();
        files.insert(path.clone(), MockEntry::Unreadable);
        Self::link_into_parent(&mut files, &path);
    }

    /// Add a symbolic link at `path` pointing to `target`. Relative targets
    /// are resolved against the link's parent directory.
    pub fn add_symlink(&self, path: impl AsRef<Path>, target: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        let target = match path.parent() {
            Some(parent) => parent.join(target.as_ref()),
            None => target.as_ref().to_path_buf(),
        };
        let mut files = self.lock();
        files.insert(path.clone(), MockEntry::Symlink(target));
        Self::link_into_parent(&mut files, &path);
    }

    /// Change the modification time of an existing file.
    pub fn set_modified(&self, path: impl AsRef<Path>, time: SystemTime) -> Result<()> {
        let path = path.as_ref();
        let mut files = self.lock();
        match files.get_mut(path) {
            Some(MockEntry::File { modified, .. }) => {
                *modified = time;
                Ok(())
            }
            _ => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    /// The entry at `path` with symlinks followed; `None` for missing or
    /// dangling paths.
    fn resolve<'a>(files: &'a HashMap<PathBuf, MockEntry>, path: &Path) -> Option<&'a MockEntry> {
        let mut entry = files.get(path)?;
        for _ in 0..MAX_LINK_HOPS {
            match entry {
                MockEntry::Symlink(target) => entry = files.get(normalize(target).as_path())?,
                other => return Some(other),
            }
        }
        None
    }

    fn link_into_parent(files: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
        let Some(parent) = path.parent() else {
            return;
        };
        Self::ensure_dir_entry(files, parent);
        if let (Some(MockEntry::Dir(children)), Some(name)) = (
            files.get_mut(parent),
            path.file_name().and_then(|n| n.to_str()),
        ) {
            if !children.iter().any(|c| c == name) {
                children.push(name.to_string());
            }
        }
    }

    fn ensure_dir_entry(files: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
        if files.contains_key(path) {
            return;
        }
        files.insert(path.to_path_buf(), MockEntry::Dir(Vec::new()));
        if path.parent().is_some() {
            Self::link_into_parent(files, path);
        }
    }
}

impl FileSystem for MockFileSystem {
    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let files = self.lock();
        match Self::resolve(&files, path) {
            Some(MockEntry::File { contents, .. }) => Ok(contents.clone()),
            Some(_) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.add_file(path, contents);
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.lock().contains_key(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        matches!(
            Self::resolve(&self.lock(), path),
            Some(MockEntry::File { .. })
        )
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(
            Self::resolve(&self.lock(), path),
            Some(MockEntry::Dir(_)) | Some(MockEntry::Unreadable)
        )
    }

    fn is_symlink(&self, path: &Path) -> bool {
        matches!(self.lock().get(path), Some(MockEntry::Symlink(_)))
    }

    fn modified(&self, path: &Path) -> Result<SystemTime> {
        match Self::resolve(&self.lock(), path) {
            Some(MockEntry::File { modified, .. }) => Ok(*modified),
            Some(_) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let files = self.lock();
        match Self::resolve(&files, path) {
            Some(MockEntry::Dir(children)) => {
                Ok(children.iter().map(|name| path.join(name)).collect())
            }
            Some(MockEntry::Unreadable) => Err(anyhow!("Permission denied: {:?}", path)),
            _ => Err(anyhow!("Not a directory or not found: {:?}", path)),
        }
    }
}

/// Resolve `.` and `..` lexically so link targets like `/a/b/..` hit the
/// map key `/a`.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
