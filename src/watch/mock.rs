// src/watch/mock.rs

use super::subscriber::{DirectorySubscriber, SubscriptionId};
use anyhow::{anyhow, Result};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct MockSubscriberState {
    next_id: u64,
    active: HashMap<SubscriptionId, PathBuf>,
    subscribed: Vec<PathBuf>,
    cancelled: Vec<PathBuf>,
    failing: HashSet<PathBuf>,
}

/// Records subscribe/cancel calls instead of talking to the OS.
///
/// Clones share state, so a test can keep one clone and hand another to the
/// engine. Events are injected by the test directly into the engine.
#[derive(Debug, Clone, Default)]
pub struct MockSubscriber {
    state: Arc<Mutex<MockSubscriberState>>,
}

impl MockSubscriber {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subscriptions for `dir` fail.
    pub fn fail_for(&self, dir: impl AsRef<Path>) {
        let mut state = self.state.lock().unwrap();
        state.failing.insert(dir.as_ref().to_path_buf());
    }

    pub fn subscribe_count(&self, dir: impl AsRef<Path>) -> usize {
        let state = self.state.lock().unwrap();
        state.subscribed.iter().filter(|d| *d == dir.as_ref()).count()
    }

    pub fn cancel_count(&self, dir: impl AsRef<Path>) -> usize {
        let state = self.state.lock().unwrap();
        state.cancelled.iter().filter(|d| *d == dir.as_ref()).count()
    }

    /// Number of subscriptions currently live.
    pub fn active_count(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.active.len()
    }
}

impl DirectorySubscriber for MockSubscriber {
    fn subscribe(&mut self, dir: &Path) -> Result<SubscriptionId> {
        let mut state = self.state.lock().unwrap();
        if state.failing.contains(dir) {
            return Err(anyhow!("permission denied: {:?}", dir));
        }
        let id = SubscriptionId(state.next_id);
        state.next_id += 1;
        state.active.insert(id, dir.to_path_buf());
        state.subscribed.push(dir.to_path_buf());
        Ok(id)
    }

    fn cancel(&mut self, id: SubscriptionId, dir: &Path) {
        let mut state = self.state.lock().unwrap();
        state.active.remove(&id);
        state.cancelled.push(dir.to_path_buf());
    }
}
