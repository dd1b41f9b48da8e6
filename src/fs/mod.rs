// src/fs/mod.rs

//! Filesystem seam used by the watch engine.
//!
//! The engine never touches `std::fs` directly: it opens files through a
//! [`FileSystem`] and reads them through position-bounded [`TailFile`] reads.
//! Tests swap in [`mock::MockFileSystem`] to grow, truncate and delete files
//! deterministically.

use std::fmt::Debug;
use std::fs;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub mod mock;

/// An open file that supports size queries and reads at an absolute offset.
pub trait TailFile: Send + Debug {
    /// Current size of the file in bytes.
    fn size(&mut self) -> io::Result<u64>;

    /// Fill `buf` with the bytes starting at `pos`.
    ///
    /// Fails with `UnexpectedEof` if the file is shorter than `pos + buf.len()`.
    fn read_exact_at(&mut self, pos: u64, buf: &mut [u8]) -> io::Result<()>;
}

/// Abstract filesystem interface.
pub trait FileSystem: Send + Sync + Debug {
    fn open_tail(&self, path: &Path) -> Result<Box<dyn TailFile>>;
    fn exists(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
    fn canonicalize(&self, path: &Path) -> Result<PathBuf>;
}

impl TailFile for fs::File {
    fn size(&mut self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn read_exact_at(&mut self, pos: u64, buf: &mut [u8]) -> io::Result<()> {
        self.seek(SeekFrom::Start(pos))?;
        self.read_exact(buf)
    }
}

/// Implementation that uses `std::fs`.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn open_tail(&self, path: &Path) -> Result<Box<dyn TailFile>> {
        let file = fs::File::open(path).with_context(|| format!("opening file {:?}", path))?;
        Ok(Box::new(file))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        fs::canonicalize(path).with_context(|| format!("canonicalizing {:?}", path))
    }
}
