// src/engine/runtime.rs

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::time::{sleep, timeout};
use tracing::{debug, info};

use super::core::CoreEngine;
use super::{EngineOptions, PendingAction};
use crate::watch::{DirectorySubscriber, FsEvent};

/// Drives a [`CoreEngine`] from its two input channels.
///
/// Each iteration:
/// 1. stops (releasing everything) if shutdown was requested,
/// 2. drains all pending start/stop actions,
/// 3. feeds coalesced events whose watches became ready,
/// 4. waits at most `poll_interval` for filesystem events and handles them.
///
/// Feeds run to completion; shutdown is only observed between iterations.
pub struct Runtime<S> {
    core: CoreEngine<S>,
    action_rx: mpsc::UnboundedReceiver<PendingAction>,
    event_rx: mpsc::UnboundedReceiver<FsEvent>,
    shutdown: Arc<AtomicBool>,
    options: EngineOptions,
}

impl<S> fmt::Debug for Runtime<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<S: DirectorySubscriber> Runtime<S> {
    pub fn new(
        core: CoreEngine<S>,
        action_rx: mpsc::UnboundedReceiver<PendingAction>,
        event_rx: mpsc::UnboundedReceiver<FsEvent>,
        shutdown: Arc<AtomicBool>,
        options: EngineOptions,
    ) -> Self {
        Self {
            core,
            action_rx,
            event_rx,
            shutdown,
            options,
        }
    }

    /// Main loop. Returns once shutdown was requested and every directory
    /// subscription and file handle has been released.
    pub async fn run(mut self) {
        info!(options = ?self.options, "tail watcher engine started");

        loop {
            if self.shutdown.load(Ordering::Acquire) {
                info!("shutdown requested");
                break;
            }

            self.drain_actions();
            self.core.flush_coalesced(Instant::now());
            self.poll_events().await;
        }

        self.core.shutdown();
        info!(feeds = self.core.feed_count(), "tail watcher engine stopped");
    }

    fn drain_actions(&mut self) {
        loop {
            match self.action_rx.try_recv() {
                Ok(action) => {
                    debug!(?action, "applying pending action");
                    self.core.apply(action, Instant::now());
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    // Every producer is gone, so nobody can ask for shutdown
                    // any more: stop on our own.
                    info!("pending action channel closed");
                    self.shutdown.store(true, Ordering::Release);
                    break;
                }
            }
        }
    }

    async fn poll_events(&mut self) {
        match timeout(self.options.poll_interval, self.event_rx.recv()).await {
            Err(_elapsed) => {}
            Ok(None) => {
                // Notification source is gone; keep ticking for actions and
                // coalesced events.
                sleep(self.options.poll_interval).await;
            }
            Ok(Some(event)) => {
                self.core.handle_event(&event, Instant::now());
                for _ in 1..self.options.max_events_per_tick {
                    match self.event_rx.try_recv() {
                        Ok(event) => {
                            self.core.handle_event(&event, Instant::now());
                        }
                        Err(_) => break,
                    }
                }
            }
        }
    }
}
