// src/fs/mock.rs

use super::{FileSystem, TailFile};
use anyhow::{anyhow, Result};
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct MockState {
    files: HashMap<PathBuf, Vec<u8>>,
    dirs: HashSet<PathBuf>,
    failing_reads: HashSet<PathBuf>,
}

/// In-memory filesystem whose files can grow, shrink and vanish while they
/// are open, the way log files do.
///
/// Open handles read the *current* content of their path; a removed file makes
/// every further read on an open handle fail with `NotFound`.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    state: Arc<Mutex<MockState>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let mut state = self.state.lock().unwrap();
        ensure_dirs(&mut state, path.as_ref());
    }

    /// Create or replace a file, implicitly creating its parent directories.
    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = path.as_ref();
        let mut state = self.state.lock().unwrap();
        if let Some(parent) = path.parent() {
            ensure_dirs(&mut state, parent);
        }
        state.files.insert(path.to_path_buf(), content.into());
    }

    /// Append bytes to an existing file (creating it if needed).
    pub fn append(&self, path: impl AsRef<Path>, content: impl AsRef<[u8]>) {
        let path = path.as_ref();
        let mut state = self.state.lock().unwrap();
        if let Some(parent) = path.parent() {
            ensure_dirs(&mut state, parent);
        }
        state
            .files
            .entry(path.to_path_buf())
            .or_default()
            .extend_from_slice(content.as_ref());
    }

    pub fn truncate(&self, path: impl AsRef<Path>, len: usize) {
        let mut state = self.state.lock().unwrap();
        if let Some(content) = state.files.get_mut(path.as_ref()) {
            content.truncate(len);
        }
    }

    pub fn remove(&self, path: impl AsRef<Path>) {
        let mut state = self.state.lock().unwrap();
        state.files.remove(path.as_ref());
    }

    /// Make every read of `path` fail until cleared again.
    pub fn fail_reads(&self, path: impl AsRef<Path>, failing: bool) {
        let mut state = self.state.lock().unwrap();
        let path = path.as_ref().to_path_buf();
        if failing {
            state.failing_reads.insert(path);
        } else {
            state.failing_reads.remove(&path);
        }
    }
}

fn ensure_dirs(state: &mut MockState, path: &Path) {
    for ancestor in path.ancestors() {
        if ancestor.as_os_str().is_empty() {
            break;
        }
        state.dirs.insert(ancestor.to_path_buf());
    }
}

#[derive(Debug)]
struct MockTailFile {
    state: Arc<Mutex<MockState>>,
    path: PathBuf,
}

impl MockTailFile {
    fn with_content<T>(&self, f: impl FnOnce(&[u8]) -> io::Result<T>) -> io::Result<T> {
        let state = self.state.lock().unwrap();
        if state.failing_reads.contains(&self.path) {
            return Err(io::Error::other(format!("injected read failure on {:?}", self.path)));
        }
        match state.files.get(&self.path) {
            Some(content) => f(content),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("file vanished: {:?}", self.path),
            )),
        }
    }
}

impl TailFile for MockTailFile {
    fn size(&mut self) -> io::Result<u64> {
        self.with_content(|content| Ok(content.len() as u64))
    }

    fn read_exact_at(&mut self, pos: u64, buf: &mut [u8]) -> io::Result<()> {
        self.with_content(|content| {
            let start = usize::try_from(pos).map_err(io::Error::other)?;
            let end = start + buf.len();
            if end > content.len() {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "read past end of mock file",
                ));
            }
            buf.copy_from_slice(&content[start..end]);
            Ok(())
        })
    }
}

impl FileSystem for MockFileSystem {
    fn open_tail(&self, path: &Path) -> Result<Box<dyn TailFile>> {
        let state = self.state.lock().unwrap();
        if state.dirs.contains(path) {
            return Err(anyhow!("Is a directory: {:?}", path));
        }
        if !state.files.contains_key(path) {
            return Err(anyhow!("File not found: {:?}", path));
        }
        if state.failing_reads.contains(path) {
            return Err(anyhow!("Permission denied: {:?}", path));
        }
        Ok(Box::new(MockTailFile {
            state: Arc::clone(&self.state),
            path: path.to_path_buf(),
        }))
    }

    fn exists(&self, path: &Path) -> bool {
        let state = self.state.lock().unwrap();
        state.files.contains_key(path) || state.dirs.contains(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        let state = self.state.lock().unwrap();
        state.dirs.contains(path)
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        // Paths are used verbatim; tests are expected to pass absolute paths.
        if self.exists(path) {
            Ok(path.to_path_buf())
        } else {
            Err(anyhow!("No such file or directory: {:?}", path))
        }
    }
}
