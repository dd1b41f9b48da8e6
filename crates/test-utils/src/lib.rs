pub mod builders;

use std::sync::{Arc, Mutex, Once, PoisonError};
use std::time::{Duration, Instant};

use tailwatch::observer::TailObserver;
use tailwatch::types::{FileState, Line};
use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer() // print only for failing tests unless --nocapture
            .with_target(true)
            .with_thread_names(true)
            .init();
    });
}

/// Poll `predicate` every 10ms until it holds or `timeout` elapses.
///
/// Returns whether the predicate eventually held.
pub fn wait_until(timeout: Duration, mut predicate: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if predicate() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
}

/// One recorded observer call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub state: FileState,
    pub lines: Option<Vec<Line>>,
    pub message: String,
}

impl Delivery {
    /// Line texts, or an empty list when `lines` is `None`.
    pub fn texts(&self) -> Vec<String> {
        self.lines
            .as_ref()
            .map(|lines| lines.iter().map(|l| l.text.clone()).collect())
            .unwrap_or_default()
    }

    pub fn line_numbers(&self) -> Vec<u64> {
        self.lines
            .as_ref()
            .map(|lines| lines.iter().map(|l| l.line_number).collect())
            .unwrap_or_default()
    }
}

/// Observer that records every delivery. Clones share the same log, so keep
/// one clone in the test and hand the other to the engine.
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    log: Arc<Mutex<Vec<Delivery>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deliveries(&self) -> Vec<Delivery> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn len(&self) -> usize {
        self.log.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn last(&self) -> Option<Delivery> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    /// Drain the log, returning what was recorded so far.
    pub fn take(&self) -> Vec<Delivery> {
        std::mem::take(&mut *self.log.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Every delivered line text, across all deliveries, in order.
    pub fn all_texts(&self) -> Vec<String> {
        self.deliveries().iter().flat_map(Delivery::texts).collect()
    }
}

impl TailObserver for RecordingObserver {
    fn deliver(&mut self, state: FileState, lines: Option<Vec<Line>>, message: &str) {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Delivery {
                state,
                lines,
                message: message.to_string(),
            });
    }
}
