// src/watch/group.rs

//! Directory groups: one filesystem subscription per watched directory,
//! shared by every watch on a file inside it.
//!
//! A group exists exactly as long as it has members. The first member
//! registers the subscription; removing the last member cancels it and drops
//! the group.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::types::WatchHandle;
use crate::watch::subscriber::{DirectorySubscriber, SubscriptionId};

#[derive(Debug, Default)]
pub struct DirectoryGroup {
    subscription: Option<SubscriptionId>,
    members: BTreeSet<WatchHandle>,
}

impl DirectoryGroup {
    pub fn subscription(&self) -> Option<SubscriptionId> {
        self.subscription
    }

    pub fn members(&self) -> &BTreeSet<WatchHandle> {
        &self.members
    }
}

/// What happened when a handle joined a directory group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    /// The group already had a live subscription.
    Joined,
    /// A new subscription was registered for the directory.
    Subscribed(SubscriptionId),
    /// Registration failed; the handle is a member of a group without a live
    /// subscription.
    SubscribeFailed(String),
}

#[derive(Debug, Default)]
pub struct DirectoryGroups {
    groups: HashMap<PathBuf, DirectoryGroup>,
}

impl DirectoryGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `handle` to the group for `dir`, registering a subscription when
    /// the group has none yet.
    pub fn join(
        &mut self,
        dir: &Path,
        handle: WatchHandle,
        subscriber: &mut dyn DirectorySubscriber,
    ) -> JoinOutcome {
        let group = self.groups.entry(dir.to_path_buf()).or_default();
        group.members.insert(handle);

        if group.subscription.is_some() {
            debug!(%handle, dir = ?dir, "joined existing directory group");
            return JoinOutcome::Joined;
        }

        match subscriber.subscribe(dir) {
            Ok(id) => {
                info!(%handle, dir = ?dir, subscription = id.0, "watching directory");
                group.subscription = Some(id);
                JoinOutcome::Subscribed(id)
            }
            Err(err) => {
                warn!(%handle, dir = ?dir, error = %err, "could not watch directory");
                JoinOutcome::SubscribeFailed(format!("{err:#}"))
            }
        }
    }

    /// Remove `handle` from the group for `dir`.
    ///
    /// Returns true when this released the group (and its subscription).
    pub fn leave(
        &mut self,
        dir: &Path,
        handle: WatchHandle,
        subscriber: &mut dyn DirectorySubscriber,
    ) -> bool {
        let Some(group) = self.groups.get_mut(dir) else {
            return false;
        };

        group.members.remove(&handle);
        if !group.members.is_empty() {
            return false;
        }

        if let Some(group) = self.groups.remove(dir) {
            if let Some(id) = group.subscription {
                subscriber.cancel(id, dir);
            }
            info!(dir = ?dir, "released directory group");
        }
        true
    }

    /// Member handles of the group for `dir` (empty if there is none).
    pub fn members(&self, dir: &Path) -> Vec<WatchHandle> {
        self.groups
            .get(dir)
            .map(|g| g.members.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn get(&self, dir: &Path) -> Option<&DirectoryGroup> {
        self.groups.get(dir)
    }

    /// Cancel every subscription and forget all groups.
    pub fn release_all(&mut self, subscriber: &mut dyn DirectorySubscriber) {
        for (dir, group) in self.groups.drain() {
            if let Some(id) = group.subscription {
                subscriber.cancel(id, &dir);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
