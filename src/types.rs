// src/types.rs

//! Shared value types used across the tail reader, the engine and observers.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

/// Default size of the tail window, in KiB.
pub const DEFAULT_MAX_TAIL_KIB: u64 = 1024;

/// Default maximum number of lines handed to an observer per notification.
pub const DEFAULT_MAX_LINES: usize = 1024;

/// Default minimum gap between two notifications of the same watch.
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(50);

/// Default encoding label for watched files.
pub const DEFAULT_ENCODING: &str = "utf-8";

/// Opaque identifier of a watch.
///
/// Handles are issued from a monotonically increasing counter and are never
/// reused within one `TailWatcher`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct WatchHandle(pub u64);

impl fmt::Display for WatchHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle state reported to observers with every delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileState {
    /// The file is not there (never created, or deleted).
    DoesNotExist,
    /// The file was (re)opened or truncated; line numbering restarted at 0.
    Reset,
    /// Normal incremental growth since the previous delivery.
    Continued,
    /// An I/O failure happened while reading the file.
    Error,
}

impl FileState {
    /// Merge two states observed for the same notification.
    ///
    /// Only `Continued` with `Continued` stays `Continued`; every other
    /// combination collapses to `Error`.
    pub fn and(self, other: FileState) -> FileState {
        match (self, other) {
            (FileState::Continued, FileState::Continued) => FileState::Continued,
            _ => FileState::Error,
        }
    }
}

/// Kind of filesystem change affecting a watched file.
///
/// The derived ordering is the coalescing priority: `Delete > Create > Modify`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventKind {
    Modify,
    Create,
    Delete,
}

/// One complete line of text, numbered within its open-file epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Line {
    pub line_number: u64,
    pub text: String,
}

impl Line {
    pub fn new(line_number: u64, text: impl Into<String>) -> Self {
        Self {
            line_number,
            text: text.into(),
        }
    }
}
