#![allow(dead_code)]

pub use tailwatch_test_utils::builders;
pub use tailwatch_test_utils::{init_tracing, wait_until, Delivery, RecordingObserver};

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tailwatch::engine::{CoreEngine, PendingAction};
use tailwatch::fs::mock::MockFileSystem;
use tailwatch::types::WatchHandle;
use tailwatch::watch::mock::MockSubscriber;
use tailwatch::watch::{WatchOptions, WatchRecord, WatchTarget};

pub const LOG_DIR: &str = "/logs";
pub const APP_LOG: &str = "/logs/app.log";

/// Engine over an in-memory filesystem containing an empty `/logs`.
pub fn mock_engine() -> (MockFileSystem, MockSubscriber, CoreEngine<MockSubscriber>) {
    let fs = MockFileSystem::new();
    fs.add_dir(LOG_DIR);
    let sub = MockSubscriber::new();
    let core = CoreEngine::new(Arc::new(fs.clone()), sub.clone());
    (fs, sub, core)
}

/// Build a record for `path` the way `TailWatcher::watch` would.
pub fn record_for(
    handle: u64,
    path: impl AsRef<Path>,
    options: &WatchOptions,
    observer: RecordingObserver,
) -> WatchRecord {
    let path = path.as_ref();
    let encoding = options.validate().expect("valid options");
    let dir = path.parent().expect("path has a parent");
    let name = path.file_name().expect("path has a file name");
    WatchRecord::new(
        WatchHandle(handle),
        WatchTarget::new(dir, name),
        encoding,
        options,
        Box::new(observer),
    )
}

/// Start a watch on `core` at `now` and return its observer.
pub fn start_watch(
    core: &mut CoreEngine<MockSubscriber>,
    handle: u64,
    path: impl AsRef<Path>,
    options: &WatchOptions,
    now: Instant,
) -> RecordingObserver {
    let observer = RecordingObserver::new();
    let record = record_for(handle, path, options, observer.clone());
    core.apply(PendingAction::Start(Box::new(record)), now);
    observer
}

pub fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

/// Owned copies of `lines`, for comparing against delivered texts.
pub fn texts(lines: &[&str]) -> Vec<String> {
    lines.iter().map(|s| s.to_string()).collect()
}
