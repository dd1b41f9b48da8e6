// src/engine/feed.rs

//! One feed: open/stat, bounded read, decode, split, deliver.
//!
//! Dispatch by event kind:
//! - `Create`: (re)open the file with fresh state and deliver `Reset`.
//! - `Delete`: close the file and deliver `DoesNotExist` with no lines.
//! - `Modify`: like `Create` if the file is not open; otherwise read what was
//!   appended (`Continued`), or start over if the file shrank (`Reset`).
//!
//! Any failure delivers `Error`, drops the file handle so the next event
//! re-opens it, and records the failure as the watch message.

use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::fs::FileSystem;
use crate::types::{EventKind, FileState};
use crate::watch::WatchRecord;

pub const MSG_OPENED: &str = "opened";
pub const MSG_CONTINUED: &str = "continued";
pub const MSG_SMALLER: &str = "smaller";
pub const MSG_NOT_FOUND: &str = "file not found";

/// What a feed did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedOutcome {
    /// The observer was called with this state.
    Delivered(FileState),
    /// Nothing new and nothing to announce; the observer was not called.
    Suppressed,
}

/// Feed `record` in response to `kind`, stamping it as notified at `now`.
pub fn feed(
    record: &mut WatchRecord,
    fs: &dyn FileSystem,
    kind: EventKind,
    now: Instant,
) -> FeedOutcome {
    let outcome = match try_feed(record, fs, kind) {
        Ok(outcome) => outcome,
        Err(err) => {
            record.file = None;
            record.message = format!("error: {err:#}");
            warn!(
                handle = %record.handle,
                path = ?record.target.path(),
                ?kind,
                error = %record.message,
                "feed failed"
            );
            record.deliver(FileState::Error, Some(Vec::new()));
            FeedOutcome::Delivered(FileState::Error)
        }
    };

    record.mark_notified(now);
    debug!(handle = %record.handle, ?kind, ?outcome, "fed watch");
    outcome
}

fn try_feed(record: &mut WatchRecord, fs: &dyn FileSystem, kind: EventKind) -> Result<FeedOutcome> {
    match kind {
        EventKind::Create => feed_fresh(record, fs),
        EventKind::Delete => {
            record.close();
            record.message = MSG_NOT_FOUND.to_string();
            record.deliver(FileState::DoesNotExist, None);
            Ok(FeedOutcome::Delivered(FileState::DoesNotExist))
        }
        EventKind::Modify if record.file.is_none() => feed_fresh(record, fs),
        EventKind::Modify => feed_open(record),
    }
}

/// Open the file from scratch and deliver its tail window as a `Reset`.
///
/// Delivers even when the file is empty, to announce the new epoch.
fn feed_fresh(record: &mut WatchRecord, fs: &dyn FileSystem) -> Result<FeedOutcome> {
    record.close();
    record.tail.reset();

    let path = record.target.path();
    let file = fs.open_tail(&path)?;
    info!(handle = %record.handle, path = ?path, "opened file handle");
    record.message = MSG_OPENED.to_string();

    let file = record.file.insert(file);
    let read = record
        .tail
        .read(&mut **file, record.limits)
        .with_context(|| format!("reading {:?}", path))?;

    record.deliver(FileState::Reset, Some(read.lines));
    Ok(FeedOutcome::Delivered(FileState::Reset))
}

/// Read what was appended to an already open file.
fn feed_open(record: &mut WatchRecord) -> Result<FeedOutcome> {
    let path = record.target.path();
    let file = record.file.as_mut().context("file is not open")?;
    let read = record
        .tail
        .read(&mut **file, record.limits)
        .with_context(|| format!("reading {:?}", path))?;

    let state = if read.reset {
        record.message = MSG_SMALLER.to_string();
        FileState::Reset
    } else {
        record.message = MSG_CONTINUED.to_string();
        FileState::Continued
    };

    // A truncation is announced even without content; plain growth of zero
    // bytes is not.
    if read.bytes_read == 0 && !read.reset {
        return Ok(FeedOutcome::Suppressed);
    }

    record.deliver(state, Some(read.lines));
    Ok(FeedOutcome::Delivered(state))
}
