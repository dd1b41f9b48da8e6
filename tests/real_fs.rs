// tests/real_fs.rs

mod common;
use crate::common::{init_tracing, ms, wait_until, RecordingObserver};

use std::error::Error;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::time::Duration;

use tempfile::tempdir;

use tailwatch::engine::{EngineOptions, TailWatcher};
use tailwatch::errors::TailwatchError;
use tailwatch::types::FileState;
use tailwatch::watch::WatchOptions;

type TestResult = Result<(), Box<dyn Error>>;

const WAIT: Duration = Duration::from_secs(10);

fn start() -> Result<TailWatcher, TailwatchError> {
    init_tracing();
    TailWatcher::start_with_options(EngineOptions {
        poll_interval: ms(20),
        ..EngineOptions::default()
    })
}

fn quick() -> WatchOptions {
    WatchOptions::default().min_interval(ms(10))
}

fn append(path: &std::path::Path, text: &str) -> std::io::Result<()> {
    let mut f = OpenOptions::new().append(true).open(path)?;
    f.write_all(text.as_bytes())?;
    f.sync_all()
}

#[test]
fn appends_to_a_real_file_are_delivered() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("app.log");
    fs::write(&path, "one\n")?;

    let watcher = start()?;
    let obs = RecordingObserver::new();
    watcher.watch(&path, quick(), obs.clone())?;

    assert!(wait_until(WAIT, || obs.all_texts() == ["one"]));
    assert_eq!(obs.deliveries()[0].state, FileState::Reset);

    append(&path, "two\n")?;
    append(&path, "three\n")?;
    assert!(
        wait_until(WAIT, || obs.all_texts() == ["one", "two", "three"]),
        "got {:?}",
        obs.all_texts()
    );

    watcher.shutdown();
    Ok(())
}

#[test]
fn truncated_real_file_restarts_numbering() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("app.log");
    fs::write(&path, "one\ntwo\nthree\n")?;

    let watcher = start()?;
    let obs = RecordingObserver::new();
    watcher.watch(&path, quick(), obs.clone())?;
    assert!(wait_until(WAIT, || obs.len() == 1));

    fs::write(&path, "new\n")?;
    assert!(
        wait_until(WAIT, || obs.all_texts().last().map(String::as_str) == Some("new")),
        "got {:?}",
        obs.deliveries()
    );

    let after = obs.deliveries().split_off(1);
    assert!(after.iter().any(|d| d.state == FileState::Reset));
    let last = after.last().ok_or("no delivery")?;
    assert_eq!(last.line_numbers(), vec![0]);
    Ok(())
}

#[test]
fn deleted_and_recreated_file_is_followed() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("app.log");
    fs::write(&path, "old\n")?;

    let watcher = start()?;
    let obs = RecordingObserver::new();
    watcher.watch(&path, quick(), obs.clone())?;
    assert!(wait_until(WAIT, || obs.len() == 1));

    fs::remove_file(&path)?;
    assert!(wait_until(WAIT, || obs
        .deliveries()
        .iter()
        .any(|d| d.state == FileState::DoesNotExist)));

    fs::write(&path, "reborn\n")?;
    assert!(
        wait_until(WAIT, || obs.all_texts().last().map(String::as_str) == Some("reborn")),
        "got {:?}",
        obs.deliveries()
    );
    Ok(())
}

#[test]
fn file_created_after_watch_starts_is_picked_up() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("later.log");

    let watcher = start()?;
    let obs = RecordingObserver::new();
    watcher.watch(&path, quick(), obs.clone())?;
    assert!(wait_until(WAIT, || obs.len() == 1));
    assert_eq!(obs.deliveries()[0].lines, None);

    fs::write(&path, "hi\n")?;
    assert!(wait_until(WAIT, || obs.all_texts() == ["hi"]));
    Ok(())
}

#[test]
fn real_directory_cannot_be_watched() -> TestResult {
    let dir = tempdir()?;
    let watcher = start()?;
    let err = watcher
        .watch(dir.path(), quick(), RecordingObserver::new())
        .expect_err("directory");
    assert!(matches!(err, TailwatchError::IsDirectory(_)));
    Ok(())
}
