// src/engine/mod.rs

//! The watch engine.
//!
//! This module ties together:
//! - the single-owner engine state ([`CoreEngine`]): watch records,
//!   directory groups and the coalescer,
//! - the feed dispatch ([`feed`]) that turns one event into one delivery,
//! - the loop ([`Runtime`]) that drains pending actions, re-checks coalesced
//!   events and polls the notification source with a bounded timeout,
//! - the public facade ([`TailWatcher`]) that owns the engine thread.
//!
//! Only the engine thread ever touches `CoreEngine`. Other threads talk to it
//! through the pending-action channel.

use std::time::Duration;

use crate::types::WatchHandle;
use crate::watch::WatchRecord;

/// Default timeout for one poll of the notification source.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Default cap on filesystem events handled in one loop iteration.
pub const DEFAULT_MAX_EVENTS_PER_TICK: usize = 256;

/// Cross-thread request for the engine loop.
#[derive(Debug)]
pub enum PendingAction {
    /// Activate a freshly created watch.
    Start(Box<WatchRecord>),
    /// Remove a watch; unknown handles are ignored.
    Stop(WatchHandle),
}

/// Options for the engine loop itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Upper bound on how long one poll of the notification source blocks.
    /// Shutdown and new actions are noticed within this interval.
    pub poll_interval: Duration,
    /// Maximum number of filesystem events handled per iteration before
    /// pending actions and the shutdown flag are looked at again.
    pub max_events_per_tick: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_events_per_tick: DEFAULT_MAX_EVENTS_PER_TICK,
        }
    }
}

pub mod core;
pub mod feed;
pub mod runtime;
pub mod service;

pub use self::core::CoreEngine;
pub use feed::{feed, FeedOutcome};
pub use runtime::Runtime;
pub use service::TailWatcher;
