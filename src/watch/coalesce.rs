// src/watch/coalesce.rs

//! Per-watch coalescing of filesystem events.
//!
//! While a watch is rate-limited, incoming events are not fed immediately.
//! Instead the coalescer remembers the single most important one:
//! `Delete > Create > Modify`. A remembered kind is only replaced by a
//! strictly higher-priority kind, and the entry disappears when consumed.
//! There is never more than one entry per handle, however many events arrive.

use std::collections::BTreeMap;

use tracing::trace;

use crate::types::{EventKind, WatchHandle};

#[derive(Debug, Default)]
pub struct Coalescer {
    pending: BTreeMap<WatchHandle, EventKind>,
}

impl Coalescer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember `kind` for `handle`, keeping the higher-priority kind.
    ///
    /// Returns the kind now remembered for the handle.
    pub fn record(&mut self, handle: WatchHandle, kind: EventKind) -> EventKind {
        let remembered = self
            .pending
            .entry(handle)
            .and_modify(|current| {
                if kind > *current {
                    *current = kind;
                }
            })
            .or_insert(kind);
        trace!(%handle, ?kind, remembered = ?*remembered, "coalesced event");
        *remembered
    }

    /// Take the remembered kind for `handle`, clearing it.
    pub fn consume(&mut self, handle: WatchHandle) -> Option<EventKind> {
        self.pending.remove(&handle)
    }

    pub fn peek(&self, handle: WatchHandle) -> Option<EventKind> {
        self.pending.get(&handle).copied()
    }

    /// Handles with a remembered event, in handle order.
    pub fn handles(&self) -> Vec<WatchHandle> {
        self.pending.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
