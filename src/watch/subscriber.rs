// src/watch/subscriber.rs

//! Filesystem notification source.
//!
//! - [`DirectorySubscriber`] is the seam the engine uses to start and stop
//!   watching a directory.
//! - [`NotifySubscriber`] implements it on top of a single `notify`
//!   watcher; raw events are translated into [`FsEvent`]s and pushed into
//!   an unbounded channel that the engine loop polls.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use notify::event::{EventKind as NotifyKind, ModifyKind, RenameMode};
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{trace, warn};

use crate::types::EventKind;

/// Token for one registered directory subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Registers and cancels directory subscriptions.
pub trait DirectorySubscriber: Send {
    fn subscribe(&mut self, dir: &Path) -> Result<SubscriptionId>;
    fn cancel(&mut self, id: SubscriptionId, dir: &Path);
}

/// A change to one path inside a watched directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsEvent {
    pub path: PathBuf,
    pub kind: EventKind,
}

impl FsEvent {
    pub fn new(path: impl Into<PathBuf>, kind: EventKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    pub fn dir(&self) -> Option<&Path> {
        self.path.parent()
    }

    pub fn file_name(&self) -> Option<&std::ffi::OsStr> {
        self.path.file_name()
    }
}

/// Translate a raw `notify` event into zero or more [`FsEvent`]s.
///
/// Renames become a delete of the old name and a create of the new one.
/// Platforms that report a rename without saying which side a path is on get
/// a create if the path exists now, and a delete otherwise.
pub fn translate(event: &Event) -> Vec<FsEvent> {
    let kind_for_all = match event.kind {
        NotifyKind::Create(_) => Some(EventKind::Create),
        NotifyKind::Remove(_) => Some(EventKind::Delete),
        NotifyKind::Modify(ModifyKind::Name(RenameMode::From)) => Some(EventKind::Delete),
        NotifyKind::Modify(ModifyKind::Name(RenameMode::To)) => Some(EventKind::Create),
        NotifyKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            return event
                .paths
                .iter()
                .enumerate()
                .map(|(i, path)| {
                    let kind = if i == 0 {
                        EventKind::Delete
                    } else {
                        EventKind::Create
                    };
                    FsEvent::new(path.clone(), kind)
                })
                .collect();
        }
        NotifyKind::Modify(ModifyKind::Name(_)) => {
            return event
                .paths
                .iter()
                .map(|path| {
                    let kind = if path.exists() {
                        EventKind::Create
                    } else {
                        EventKind::Delete
                    };
                    FsEvent::new(path.clone(), kind)
                })
                .collect();
        }
        NotifyKind::Modify(_) | NotifyKind::Any => Some(EventKind::Modify),
        NotifyKind::Access(_) | NotifyKind::Other => None,
    };

    match kind_for_all {
        Some(kind) => event
            .paths
            .iter()
            .map(|path| FsEvent::new(path.clone(), kind))
            .collect(),
        None => Vec::new(),
    }
}

/// [`DirectorySubscriber`] backed by the platform's recommended `notify`
/// watcher, watching each directory non-recursively.
pub struct NotifySubscriber {
    watcher: RecommendedWatcher,
    next_id: u64,
}

impl std::fmt::Debug for NotifySubscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifySubscriber")
            .field("next_id", &self.next_id)
            .finish_non_exhaustive()
    }
}

impl NotifySubscriber {
    /// Create the underlying watcher; translated events go to `event_tx`.
    pub fn new(event_tx: mpsc::UnboundedSender<FsEvent>) -> Result<Self> {
        // Closure called synchronously by notify whenever an event arrives.
        let watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    trace!(?event, "received notify event");
                    for fs_event in translate(&event) {
                        if event_tx.send(fs_event).is_err() {
                            // Engine is gone; nothing left to notify.
                            return;
                        }
                    }
                }
                Err(err) => {
                    warn!(error = %err, "file watch error");
                }
            },
            Config::default(),
        )
        .context("creating filesystem watcher")?;

        Ok(Self { watcher, next_id: 0 })
    }
}

impl DirectorySubscriber for NotifySubscriber {
    fn subscribe(&mut self, dir: &Path) -> Result<SubscriptionId> {
        self.watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("watching directory {:?}", dir))?;
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        Ok(id)
    }

    fn cancel(&mut self, id: SubscriptionId, dir: &Path) {
        if let Err(err) = self.watcher.unwatch(dir) {
            warn!(subscription = id.0, dir = ?dir, error = %err, "could not stop watching directory");
        }
    }
}
