// src/watch/record.rs

//! Per-watch mutable state.
//!
//! A [`WatchRecord`] is built on the caller's thread by `TailWatcher::watch`
//! and then moved into the engine, which becomes its only owner.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use encoding_rs::Encoding;
use tracing::info;

use crate::fs::TailFile;
use crate::observer::TailObserver;
use crate::tail::{TailLimits, TailState};
use crate::types::{FileState, Line, WatchHandle};
use crate::watch::options::WatchOptions;

/// Message a record carries before its first feed.
pub const MSG_UNTOUCHED: &str = "untouched";

/// A watched file, split into its (canonical) directory and file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WatchTarget {
    dir: PathBuf,
    file_name: OsString,
}

impl WatchTarget {
    pub fn new(dir: impl Into<PathBuf>, file_name: impl Into<OsString>) -> Self {
        Self {
            dir: dir.into(),
            file_name: file_name.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file_name(&self) -> &OsStr {
        &self.file_name
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.file_name)
    }
}

pub struct WatchRecord {
    pub(crate) handle: WatchHandle,
    pub(crate) target: WatchTarget,
    pub(crate) observer: Box<dyn TailObserver>,
    pub(crate) file: Option<Box<dyn TailFile>>,
    pub(crate) tail: TailState,
    pub(crate) limits: TailLimits,
    pub(crate) min_interval: Duration,
    pub(crate) last_notified: Option<Instant>,
    pub(crate) message: String,
    /// Appended to the message of the next delivery, then cleared.
    pub(crate) notice: Option<String>,
}

impl fmt::Debug for WatchRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchRecord")
            .field("handle", &self.handle)
            .field("target", &self.target)
            .field("open", &self.file.is_some())
            .field("tail", &self.tail)
            .field("limits", &self.limits)
            .field("min_interval", &self.min_interval)
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

impl WatchRecord {
    pub fn new(
        handle: WatchHandle,
        target: WatchTarget,
        encoding: &'static Encoding,
        options: &WatchOptions,
        observer: Box<dyn TailObserver>,
    ) -> Self {
        Self {
            handle,
            target,
            observer,
            file: None,
            tail: TailState::new(encoding),
            limits: options.limits(),
            min_interval: options.min_interval,
            last_notified: None,
            message: MSG_UNTOUCHED.to_string(),
            notice: None,
        }
    }

    pub fn handle(&self) -> WatchHandle {
        self.handle
    }

    pub fn target(&self) -> &WatchTarget {
        &self.target
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    pub fn tail(&self) -> &TailState {
        &self.tail
    }

    /// A record is ready when at least `min_interval` has passed since the
    /// last notification (or it was never notified).
    pub fn is_ready(&self, now: Instant) -> bool {
        self.last_notified
            .is_none_or(|last| now.saturating_duration_since(last) >= self.min_interval)
    }

    pub(crate) fn mark_notified(&mut self, now: Instant) {
        self.last_notified = Some(now);
    }

    pub(crate) fn deliver(&mut self, state: FileState, lines: Option<Vec<Line>>) {
        if let Some(notice) = self.notice.take() {
            self.message = format!("{} - {notice}", self.message);
        }
        self.observer.deliver(state, lines, &self.message);
    }

    /// Drop the open file handle, if any.
    pub fn close(&mut self) {
        if self.file.take().is_some() {
            info!(handle = %self.handle, path = ?self.target.path(), "closed file handle");
            self.message = "closed".to_string();
        }
    }
}
