// tests/tail_watcher.rs

mod common;
use crate::common::{init_tracing, ms, texts, wait_until, RecordingObserver, APP_LOG, LOG_DIR};

use std::collections::HashSet;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use tailwatch::engine::{EngineOptions, TailWatcher};
use tailwatch::errors::TailwatchError;
use tailwatch::fs::mock::MockFileSystem;
use tailwatch::types::{EventKind, FileState, WatchHandle};
use tailwatch::watch::mock::MockSubscriber;
use tailwatch::watch::{FsEvent, WatchOptions};

type TestResult = Result<(), Box<dyn Error>>;

const WAIT: Duration = Duration::from_secs(5);

struct Harness {
    fs: MockFileSystem,
    sub: MockSubscriber,
    events: mpsc::UnboundedSender<FsEvent>,
    watcher: TailWatcher,
}

fn harness() -> Result<Harness, Box<dyn Error>> {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_dir(LOG_DIR);
    let sub = MockSubscriber::new();
    let (events, event_rx) = mpsc::unbounded_channel();
    let options = EngineOptions {
        poll_interval: ms(10),
        ..EngineOptions::default()
    };
    let watcher = TailWatcher::start_with(Arc::new(fs.clone()), sub.clone(), event_rx, options)?;
    Ok(Harness {
        fs,
        sub,
        events,
        watcher,
    })
}

fn quick() -> WatchOptions {
    WatchOptions::default().min_interval(ms(5))
}

#[test]
fn watch_delivers_initial_state_and_follows_events() -> TestResult {
    let h = harness()?;
    let obs = RecordingObserver::new();

    let handle = h.watcher.watch(APP_LOG, quick(), obs.clone())?;
    assert_eq!(handle, WatchHandle(0));
    assert!(h.watcher.is_watching(handle));

    assert!(wait_until(WAIT, || obs.len() == 1));
    assert_eq!(obs.last().ok_or("no delivery")?.state, FileState::DoesNotExist);
    assert!(wait_until(WAIT, || h.sub.subscribe_count(LOG_DIR) == 1));

    h.fs.add_file(APP_LOG, "hello\n");
    h.events.send(FsEvent::new(APP_LOG, EventKind::Create))?;
    assert!(wait_until(WAIT, || obs.len() == 2));
    let d = obs.last().ok_or("no delivery")?;
    assert_eq!(d.state, FileState::Reset);
    assert_eq!(d.texts(), texts(&["hello"]));

    h.fs.append(APP_LOG, "world\n");
    h.events.send(FsEvent::new(APP_LOG, EventKind::Modify))?;
    assert!(wait_until(WAIT, || obs.len() == 3));
    assert_eq!(obs.last().ok_or("no delivery")?.state, FileState::Continued);
    assert_eq!(obs.all_texts(), texts(&["hello", "world"]));
    Ok(())
}

#[test]
fn handles_are_issued_in_order_and_never_reused() -> TestResult {
    let h = harness()?;
    let a = h.watcher.watch(APP_LOG, quick(), RecordingObserver::new())?;
    h.watcher.unwatch(a);
    let b = h.watcher.watch(APP_LOG, quick(), RecordingObserver::new())?;
    assert_eq!((a, b), (WatchHandle(0), WatchHandle(1)));
    Ok(())
}

#[test]
fn watching_a_directory_is_rejected() -> TestResult {
    let h = harness()?;
    let err = h
        .watcher
        .watch(LOG_DIR, quick(), RecordingObserver::new())
        .expect_err("directory must be rejected");
    assert!(matches!(err, TailwatchError::IsDirectory(_)), "got {err:?}");
    Ok(())
}

#[test]
fn missing_parent_directory_is_rejected() -> TestResult {
    let h = harness()?;
    let err = h
        .watcher
        .watch("/nowhere/app.log", quick(), RecordingObserver::new())
        .expect_err("missing parent must be rejected");
    assert!(matches!(err, TailwatchError::UnresolvablePath { .. }), "got {err:?}");
    Ok(())
}

#[test]
fn invalid_options_are_rejected() -> TestResult {
    let h = harness()?;

    let err = h
        .watcher
        .watch(APP_LOG, quick().encoding("klingon"), RecordingObserver::new())
        .expect_err("unknown encoding");
    assert!(matches!(err, TailwatchError::UnknownEncoding(_)), "got {err:?}");

    let err = h
        .watcher
        .watch(APP_LOG, quick().max_lines(0), RecordingObserver::new())
        .expect_err("zero max_lines");
    assert!(matches!(err, TailwatchError::InvalidOption(_)), "got {err:?}");

    let err = h
        .watcher
        .watch(APP_LOG, quick().max_tail_kib(0), RecordingObserver::new())
        .expect_err("zero window");
    assert!(matches!(err, TailwatchError::InvalidOption(_)), "got {err:?}");
    Ok(())
}

#[test]
fn unwatch_is_idempotent_and_releases_the_directory() -> TestResult {
    let h = harness()?;
    let handle = h.watcher.watch(APP_LOG, quick(), RecordingObserver::new())?;
    assert!(wait_until(WAIT, || h.sub.active_count() == 1));

    h.watcher.unwatch(handle);
    h.watcher.unwatch(handle);
    h.watcher.unwatch(WatchHandle(99));
    assert!(!h.watcher.is_watching(handle));

    assert!(wait_until(WAIT, || h.sub.active_count() == 0));
    assert_eq!(h.sub.cancel_count(LOG_DIR), 1);
    Ok(())
}

#[test]
fn shutdown_is_a_clean_barrier() -> TestResult {
    let h = harness()?;
    h.fs.add_file("/var/other.log", "x\n");
    let a = h.watcher.watch(APP_LOG, quick(), RecordingObserver::new())?;
    h.watcher
        .watch("/var/other.log", quick(), RecordingObserver::new())?;
    assert!(wait_until(WAIT, || h.sub.active_count() == 2));

    h.watcher.shutdown();
    assert_eq!(h.sub.active_count(), 0);
    assert!(!h.watcher.is_watching(a));

    // A second shutdown is harmless.
    h.watcher.shutdown();

    let err = h
        .watcher
        .watch(APP_LOG, quick(), RecordingObserver::new())
        .expect_err("engine is stopped");
    assert!(matches!(err, TailwatchError::EngineStopped), "got {err:?}");
    Ok(())
}

#[test]
fn concurrent_watch_and_unwatch_from_many_threads() -> TestResult {
    let h = harness()?;
    for i in 0..8 {
        h.fs.add_dir(format!("/logs/t{i}"));
    }

    let handles: Vec<(WatchHandle, bool)> = std::thread::scope(|s| {
        let workers: Vec<_> = (0..8)
            .map(|t| {
                let watcher = &h.watcher;
                s.spawn(move || {
                    let mut mine = Vec::new();
                    for i in 0..10 {
                        let path = format!("/logs/t{t}/f{i}.log");
                        let handle = watcher
                            .watch(&path, quick(), RecordingObserver::new())
                            .expect("watch");
                        let keep = i % 2 == 0;
                        if !keep {
                            watcher.unwatch(handle);
                        }
                        mine.push((handle, keep));
                    }
                    mine
                })
            })
            .collect();
        workers
            .into_iter()
            .flat_map(|w| w.join().expect("worker panicked"))
            .collect()
    });

    let unique: HashSet<WatchHandle> = handles.iter().map(|(h, _)| *h).collect();
    assert_eq!(unique.len(), 80);
    for (handle, keep) in &handles {
        assert_eq!(h.watcher.is_watching(*handle), *keep);
    }

    // Every directory still has kept watches, so each keeps one subscription.
    assert!(wait_until(WAIT, || h.sub.active_count() == 8));
    for t in 0..8 {
        assert_eq!(h.sub.subscribe_count(format!("/logs/t{t}")), 1);
    }

    h.watcher.shutdown();
    assert_eq!(h.sub.active_count(), 0);
    Ok(())
}

#[test]
fn rapid_events_are_coalesced_by_the_engine_loop() -> TestResult {
    let h = harness()?;
    h.fs.add_file(APP_LOG, "a\n");
    let obs = RecordingObserver::new();
    h.watcher.watch(
        APP_LOG,
        WatchOptions::default().min_interval(ms(300)),
        obs.clone(),
    )?;
    assert!(wait_until(WAIT, || obs.len() == 1));

    for i in 0..20 {
        h.fs.append(APP_LOG, format!("line {i}\n"));
        h.events.send(FsEvent::new(APP_LOG, EventKind::Modify))?;
    }

    assert!(wait_until(WAIT, || obs.all_texts().len() == 21));
    // All twenty appends arrive in at most two deliveries after the first.
    assert!(obs.len() <= 3, "got {} deliveries", obs.len());
    Ok(())
}

#[test]
fn channel_observer_forwards_owned_updates() -> TestResult {
    let h = harness()?;
    h.fs.add_file(APP_LOG, "x\n");
    let (observer, mut rx) = tailwatch::observer::ChannelObserver::channel();
    h.watcher.watch(APP_LOG, quick(), observer)?;

    let mut received = None;
    assert!(wait_until(WAIT, || {
        received = rx.try_recv().ok();
        received.is_some()
    }));
    let update = received.ok_or("no update")?;
    assert_eq!(update.state, FileState::Reset);
    assert_eq!(update.message, "opened");
    assert_eq!(update.line_count(), 1);
    Ok(())
}
