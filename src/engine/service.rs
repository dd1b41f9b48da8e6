// src/engine/service.rs

//! Public entry point: [`TailWatcher`].
//!
//! `TailWatcher` owns the engine thread. `watch` and `unwatch` may be called
//! from any thread; they only validate input and enqueue a
//! [`PendingAction`], which the engine applies on its next iteration.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;

use tokio::sync::mpsc;
use tracing::{debug, error, info};

use super::core::CoreEngine;
use super::runtime::Runtime;
use super::{EngineOptions, PendingAction};
use crate::errors::{Result, TailwatchError};
use crate::fs::{FileSystem, RealFileSystem};
use crate::observer::TailObserver;
use crate::types::WatchHandle;
use crate::watch::{DirectorySubscriber, FsEvent, NotifySubscriber, WatchOptions, WatchRecord, WatchTarget};

static THREAD_NO: AtomicUsize = AtomicUsize::new(0);

/// Handle to a running watch engine.
///
/// Dropping it shuts the engine down (see [`TailWatcher::shutdown`]).
pub struct TailWatcher {
    fs: Arc<dyn FileSystem>,
    action_tx: mpsc::UnboundedSender<PendingAction>,
    next_handle: AtomicU64,
    active: Mutex<HashSet<WatchHandle>>,
    shutdown: Arc<AtomicBool>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for TailWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TailWatcher")
            .field("next_handle", &self.next_handle)
            .field("shutdown", &self.shutdown)
            .finish_non_exhaustive()
    }
}

impl TailWatcher {
    /// Start an engine on the real filesystem with default options.
    pub fn start() -> Result<Self> {
        Self::start_with_options(EngineOptions::default())
    }

    /// Start an engine on the real filesystem, watching through `notify`.
    pub fn start_with_options(options: EngineOptions) -> Result<Self> {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let subscriber = NotifySubscriber::new(event_tx)?;
        Self::start_with(Arc::new(RealFileSystem), subscriber, event_rx, options)
    }

    /// Start an engine with explicit filesystem and notification source.
    ///
    /// `event_rx` must receive the events for the directories `subscriber`
    /// subscribes to.
    pub fn start_with<S>(
        fs: Arc<dyn FileSystem>,
        subscriber: S,
        event_rx: mpsc::UnboundedReceiver<FsEvent>,
        options: EngineOptions,
    ) -> Result<Self>
    where
        S: DirectorySubscriber + 'static,
    {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let shutdown = Arc::new(AtomicBool::new(false));

        let core = CoreEngine::new(Arc::clone(&fs), subscriber);
        let runtime = Runtime::new(core, action_rx, event_rx, Arc::clone(&shutdown), options);

        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()?;

        let name = format!("tail-watcher-{}", THREAD_NO.fetch_add(1, Ordering::Relaxed));
        let thread = std::thread::Builder::new()
            .name(name.clone())
            .spawn(move || rt.block_on(runtime.run()))?;
        info!(thread = %name, "spawned engine thread");

        Ok(Self {
            fs,
            action_tx,
            next_handle: AtomicU64::new(0),
            active: Mutex::new(HashSet::new()),
            shutdown,
            thread: Mutex::new(Some(thread)),
        })
    }

    /// Start tailing `path` for `observer`.
    ///
    /// The file itself does not need to exist yet, but its parent directory
    /// must. Fails if `path` is a directory or the options are invalid.
    pub fn watch<O>(&self, path: impl AsRef<Path>, options: WatchOptions, observer: O) -> Result<WatchHandle>
    where
        O: TailObserver + 'static,
    {
        self.watch_boxed(path, options, Box::new(observer))
    }

    pub fn watch_boxed(
        &self,
        path: impl AsRef<Path>,
        options: WatchOptions,
        observer: Box<dyn TailObserver>,
    ) -> Result<WatchHandle> {
        if self.shutdown.load(Ordering::Acquire) {
            return Err(TailwatchError::EngineStopped);
        }

        let path = path.as_ref();
        if self.fs.is_dir(path) {
            return Err(TailwatchError::IsDirectory(path.to_path_buf()));
        }
        let encoding = options.validate()?;

        let file_name = path
            .file_name()
            .ok_or_else(|| TailwatchError::InvalidOption(format!("no file name in {:?}", path)))?;
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let dir = self
            .fs
            .canonicalize(&parent)
            .map_err(|source| TailwatchError::UnresolvablePath {
                path: path.to_path_buf(),
                source,
            })?;

        let handle = WatchHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        let record = WatchRecord::new(
            handle,
            WatchTarget::new(dir, file_name),
            encoding,
            &options,
            observer,
        );

        self.active_set().insert(handle);
        if self
            .action_tx
            .send(PendingAction::Start(Box::new(record)))
            .is_err()
        {
            self.active_set().remove(&handle);
            return Err(TailwatchError::EngineStopped);
        }

        debug!(%handle, path = ?path, "watch requested");
        Ok(handle)
    }

    /// Stop a watch. Unknown or already removed handles are ignored.
    pub fn unwatch(&self, handle: WatchHandle) {
        if !self.active_set().remove(&handle) {
            return;
        }
        if self.action_tx.send(PendingAction::Stop(handle)).is_err() {
            debug!(%handle, "engine already stopped; nothing to unwatch");
        }
    }

    /// Whether `handle` refers to a watch that has not been removed.
    pub fn is_watching(&self, handle: WatchHandle) -> bool {
        self.active_set().contains(&handle)
    }

    /// Signal the engine to stop and wait until it has released every
    /// directory subscription and file handle. Safe to call more than once.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);

        let thread = self
            .thread
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(thread) = thread {
            if thread.join().is_err() {
                error!("engine thread panicked");
            }
            self.active_set().clear();
        }
    }

    fn active_set(&self) -> std::sync::MutexGuard<'_, HashSet<WatchHandle>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for TailWatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}
