// src/engine/core.rs

//! Engine state machine.
//!
//! `CoreEngine` owns every watch record, the directory groups and the
//! coalescer. It is driven by three inputs:
//! - [`PendingAction`]s (start/stop a watch),
//! - [`FsEvent`]s from the notification source,
//! - periodic [`CoreEngine::flush_coalesced`] calls.
//!
//! Time is passed in explicitly as `now`, so the rate limiting and
//! coalescing rules can be tested without sleeping. The loop around it lives
//! in [`crate::engine::runtime`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, trace, warn};

use crate::engine::feed::{feed, FeedOutcome};
use crate::engine::PendingAction;
use crate::fs::FileSystem;
use crate::types::{EventKind, WatchHandle};
use crate::watch::{
    Coalescer, DirectoryGroups, DirectorySubscriber, FsEvent, JoinOutcome, WatchRecord,
};

pub struct CoreEngine<S> {
    fs: Arc<dyn FileSystem>,
    subscriber: S,
    records: HashMap<WatchHandle, WatchRecord>,
    groups: DirectoryGroups,
    coalescer: Coalescer,
    feeds: u64,
}

impl<S> std::fmt::Debug for CoreEngine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreEngine")
            .field("watches", &self.records.len())
            .field("groups", &self.groups.len())
            .field("coalesced", &self.coalescer.len())
            .field("feeds", &self.feeds)
            .finish_non_exhaustive()
    }
}

impl<S: DirectorySubscriber> CoreEngine<S> {
    pub fn new(fs: Arc<dyn FileSystem>, subscriber: S) -> Self {
        Self {
            fs,
            subscriber,
            records: HashMap::new(),
            groups: DirectoryGroups::new(),
            coalescer: Coalescer::new(),
            feeds: 0,
        }
    }

    pub fn apply(&mut self, action: PendingAction, now: Instant) {
        match action {
            PendingAction::Start(record) => self.start_watch(*record, now),
            PendingAction::Stop(handle) => self.stop_watch(handle),
        }
    }

    /// Feed every coalesced watch that is ready again, with its remembered
    /// event kind. Returns the number of feeds performed.
    pub fn flush_coalesced(&mut self, now: Instant) -> usize {
        let mut fed = 0;

        for handle in self.coalescer.handles() {
            match self.records.get_mut(&handle) {
                None => {
                    self.coalescer.consume(handle);
                }
                Some(record) if record.is_ready(now) => {
                    if let Some(kind) = self.coalescer.consume(handle) {
                        trace!(%handle, ?kind, "feeding coalesced event");
                        feed(record, self.fs.as_ref(), kind, now);
                        self.feeds += 1;
                        fed += 1;
                    }
                }
                Some(_) => {}
            }
        }

        fed
    }

    /// Route one filesystem event to the watches on that file.
    ///
    /// Returns the number of watches the event matched.
    pub fn handle_event(&mut self, event: &FsEvent, now: Instant) -> usize {
        let (Some(dir), Some(file_name)) = (event.dir(), event.file_name()) else {
            return 0;
        };

        let matching: Vec<WatchHandle> = self
            .groups
            .members(dir)
            .into_iter()
            .filter(|handle| {
                self.records
                    .get(handle)
                    .is_some_and(|r| r.target().file_name() == file_name)
            })
            .collect();

        if matching.is_empty() {
            trace!(path = ?event.path, "event for an unwatched file");
            return 0;
        }

        for handle in &matching {
            self.feed_or_coalesce(*handle, event.kind, now);
        }
        matching.len()
    }

    /// Release every directory subscription and close every file.
    pub fn shutdown(&mut self) {
        self.groups.release_all(&mut self.subscriber);
        for record in self.records.values_mut() {
            record.close();
        }
        info!(watches = self.records.len(), "engine released all watches");
        self.records.clear();
        self.coalescer.clear();
    }

    pub fn watch_count(&self) -> usize {
        self.records.len()
    }

    pub fn record(&self, handle: WatchHandle) -> Option<&WatchRecord> {
        self.records.get(&handle)
    }

    pub fn groups(&self) -> &DirectoryGroups {
        &self.groups
    }

    pub fn coalescer(&self) -> &Coalescer {
        &self.coalescer
    }

    pub fn subscriber(&self) -> &S {
        &self.subscriber
    }

    /// Total number of feeds performed so far.
    pub fn feed_count(&self) -> u64 {
        self.feeds
    }

    fn start_watch(&mut self, mut record: WatchRecord, now: Instant) {
        let handle = record.handle();
        if self.records.contains_key(&handle) {
            warn!(%handle, "watch started twice; ignoring");
            return;
        }

        let dir = record.target().dir().to_path_buf();
        let subscribe_error = match self.groups.join(&dir, handle, &mut self.subscriber) {
            JoinOutcome::SubscribeFailed(msg) => Some(msg),
            JoinOutcome::Joined | JoinOutcome::Subscribed(_) => None,
        };

        let path = record.target().path();
        let kind = if self.fs.exists(&path) {
            EventKind::Create
        } else {
            EventKind::Delete
        };
        info!(%handle, path = ?path, initial = ?kind, "watch started");

        // The watch stays registered but inert until the group subscribes.
        // The failure rides along with the initial delivery.
        if let Some(msg) = subscribe_error {
            record.notice = Some(format!("error: {msg}"));
        }

        self.records.insert(handle, record);
        self.feed_or_coalesce(handle, kind, now);
    }

    fn stop_watch(&mut self, handle: WatchHandle) {
        let Some(mut record) = self.records.remove(&handle) else {
            debug!(%handle, "stop for unknown watch; ignoring");
            return;
        };

        self.groups
            .leave(record.target().dir(), handle, &mut self.subscriber);
        record.close();
        self.coalescer.consume(handle);
        info!(%handle, path = ?record.target().path(), "watch stopped");
    }

    fn feed_or_coalesce(&mut self, handle: WatchHandle, kind: EventKind, now: Instant) {
        let Some(record) = self.records.get_mut(&handle) else {
            return;
        };

        if record.is_ready(now) {
            // A remembered kind is only ever replaced by a stronger one.
            let kind = self
                .coalescer
                .consume(handle)
                .map_or(kind, |pending| pending.max(kind));
            if feed(record, self.fs.as_ref(), kind, now) == FeedOutcome::Suppressed {
                trace!(%handle, "nothing new to deliver");
            }
            self.feeds += 1;
        } else {
            self.coalescer.record(handle, kind);
        }
    }
}
