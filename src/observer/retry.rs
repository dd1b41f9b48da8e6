// src/observer/retry.rs

//! Retry-bundle discipline for transports that may refuse a send.
//!
//! A [`RetryingObserver`] keeps at most one outstanding bundle of undelivered
//! content. Each failed send folds the update into the bundle; the next
//! successful send flushes the whole bundle. After more than
//! `max_failures` consecutive failures the bundle is dropped, the sink is told
//! out-of-band via [`UpdateSink::abandoned`], and delivery resumes from a
//! clean slate.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

use crate::observer::{NamedUpdate, TailObserver, TailUpdate};
use crate::types::{FileState, Line};

/// Consecutive failures tolerated before the bundle is dropped.
pub const DEFAULT_MAX_SEND_FAILURES: u32 = 25;

/// A send that the transport refused, handing the update back.
#[derive(Debug)]
pub struct Rejected {
    pub reason: String,
    pub update: TailUpdate,
}

/// Non-blocking transport endpoint.
pub trait UpdateSink: Send {
    /// Try to hand the update to the transport without blocking.
    fn try_send(&mut self, update: TailUpdate) -> Result<(), Rejected>;

    /// Called once whenever a bundle is given up after too many failures.
    fn abandoned(&mut self, reason: &str, dropped: TailUpdate) {
        warn!(
            reason,
            dropped_lines = dropped.line_count(),
            "giving up on undelivered tail update"
        );
    }
}

/// [`TailObserver`] adapter that applies the retry-bundle discipline on top of
/// an [`UpdateSink`].
#[derive(Debug)]
pub struct RetryingObserver<S> {
    sink: S,
    bundle: Option<TailUpdate>,
    failures: u32,
    max_failures: u32,
}

impl<S: UpdateSink> RetryingObserver<S> {
    pub fn new(sink: S) -> Self {
        Self::with_max_failures(sink, DEFAULT_MAX_SEND_FAILURES)
    }

    pub fn with_max_failures(sink: S, max_failures: u32) -> Self {
        Self {
            sink,
            bundle: None,
            failures: 0,
            max_failures,
        }
    }

    /// Consecutive failed sends since the last success or drop.
    pub fn consecutive_failures(&self) -> u32 {
        self.failures
    }

    /// The merged, not-yet-delivered update, if any.
    pub fn pending(&self) -> Option<&TailUpdate> {
        self.bundle.as_ref()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    fn push(&mut self, update: TailUpdate) {
        let update = match self.bundle.take() {
            Some(pending) => pending.merge(update),
            None => update,
        };

        match self.sink.try_send(update) {
            Ok(()) => {
                if self.failures > 0 {
                    debug!(after_failures = self.failures, "flushed retry bundle");
                }
                self.failures = 0;
            }
            Err(Rejected { reason, update }) => {
                self.failures += 1;
                if self.failures > self.max_failures {
                    warn!(
                        failures = self.failures,
                        reason = %reason,
                        "dropping retry bundle after too many failed sends"
                    );
                    self.failures = 0;
                    self.sink.abandoned(&reason, update);
                } else {
                    debug!(
                        failures = self.failures,
                        reason = %reason,
                        "send failed; keeping update for the next attempt"
                    );
                    self.bundle = Some(update);
                }
            }
        }
    }
}

impl<S: UpdateSink> TailObserver for RetryingObserver<S> {
    fn deliver(&mut self, state: FileState, lines: Option<Vec<Line>>, message: &str) {
        self.push(TailUpdate::new(state, lines, message));
    }
}

/// Sink that `try_send`s into a bounded tokio channel, tagging each update
/// with the watch name. A full channel counts as a transient failure.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    watch: Arc<str>,
    tx: mpsc::Sender<NamedUpdate>,
}

impl ChannelSink {
    pub fn new(watch: impl Into<Arc<str>>, tx: mpsc::Sender<NamedUpdate>) -> Self {
        Self {
            watch: watch.into(),
            tx,
        }
    }
}

impl UpdateSink for ChannelSink {
    fn try_send(&mut self, update: TailUpdate) -> Result<(), Rejected> {
        let named = NamedUpdate {
            watch: self.watch.to_string(),
            update,
        };
        self.tx.try_send(named).map_err(|err| match err {
            TrySendError::Full(named) => Rejected {
                reason: "channel full".to_string(),
                update: named.update,
            },
            TrySendError::Closed(named) => Rejected {
                reason: "channel closed".to_string(),
                update: named.update,
            },
        })
    }

    fn abandoned(&mut self, reason: &str, dropped: TailUpdate) {
        warn!(
            watch = %self.watch,
            reason,
            dropped_lines = dropped.line_count(),
            "giving up on undelivered tail update"
        );
    }
}
