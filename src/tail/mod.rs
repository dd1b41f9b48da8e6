// src/tail/mod.rs

//! Tail reader.
//!
//! Reads only the trailing window of a file, starting at the last delivered
//! offset, and turns the new bytes into numbered lines. It knows nothing
//! about notifications or threads; the engine decides *when* to read.

pub mod splitter;

use std::io;

use encoding_rs::Encoding;
use tracing::trace;

use crate::fs::TailFile;
use crate::types::Line;

pub use splitter::LineSplitter;

/// Per-read bounds taken from the watch configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TailLimits {
    pub max_window_bytes: u64,
    pub max_lines: usize,
}

/// Result of one bounded read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TailRead {
    /// Offset just past the last byte read; the next read starts here.
    pub end_offset: u64,
    /// Lines completed by this read (capped to `max_lines`, newest kept).
    pub lines: Vec<Line>,
    /// True when the file had shrunk and all carried state was reset.
    pub reset: bool,
    /// Number of bytes actually read.
    pub bytes_read: u64,
}

/// Read position and decode state of one open-file epoch.
///
/// Offset, carried bytes, partial line and line numbering are always reset
/// together through [`TailState::reset`].
#[derive(Debug)]
pub struct TailState {
    offset: u64,
    splitter: LineSplitter,
}

impl TailState {
    pub fn new(encoding: &'static Encoding) -> Self {
        Self {
            offset: 0,
            splitter: LineSplitter::new(encoding),
        }
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn next_line_number(&self) -> u64 {
        self.splitter.next_line_number()
    }

    pub fn reset(&mut self) {
        self.offset = 0;
        self.splitter.reset();
    }

    /// Read whatever was appended since the last call, bounded by the tail
    /// window.
    ///
    /// The read starts at `max(offset, size - max_window_bytes)`. A file that
    /// is now smaller than the last offset is treated as truncated: state is
    /// reset and the window is re-derived from offset 0.
    pub fn read(&mut self, file: &mut dyn TailFile, limits: TailLimits) -> io::Result<TailRead> {
        let size = file.size()?;

        let reset = size < self.offset;
        if reset {
            self.reset();
        }

        let pos = self.offset.max(size.saturating_sub(limits.max_window_bytes));
        let len = usize::try_from(size - pos).map_err(io::Error::other)?;

        let lines = if len == 0 {
            Vec::new()
        } else {
            let mut buf = vec![0u8; len];
            file.read_exact_at(pos, &mut buf)?;
            self.splitter.push(&buf, limits.max_lines)
        };

        trace!(pos, len, size, lines = lines.len(), reset, "tail window read");

        self.offset = size;
        Ok(TailRead {
            end_offset: size,
            lines,
            reset,
            bytes_read: len as u64,
        })
    }
}
