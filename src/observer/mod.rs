// src/observer/mod.rs

//! Delivery contract between the engine and whatever transports updates.
//!
//! - [`TailObserver`] is the single callback the engine invokes, always from
//!   the engine thread. Implementations must not block.
//! - [`TailUpdate`] is the owned form of one delivery, with the optional
//!   NDJSON wire format used by the CLI.
//! - [`retry`] implements the retry-bundle discipline for transports that
//!   can transiently refuse a send.

pub mod retry;

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::debug;

use crate::types::{FileState, Line};

pub use retry::{ChannelSink, Rejected, RetryingObserver, UpdateSink, DEFAULT_MAX_SEND_FAILURES};

/// Receives the tail of a watched file.
///
/// `lines` is `None` only when the file does not exist; "no new lines" is
/// `Some(vec![])`.
pub trait TailObserver: Send {
    fn deliver(&mut self, state: FileState, lines: Option<Vec<Line>>, message: &str);
}

impl<F> TailObserver for F
where
    F: FnMut(FileState, Option<Vec<Line>>, &str) + Send,
{
    fn deliver(&mut self, state: FileState, lines: Option<Vec<Line>>, message: &str) {
        self(state, lines, message)
    }
}

/// One delivery, owned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TailUpdate {
    pub state: FileState,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lines: Option<Vec<Line>>,
}

impl TailUpdate {
    pub fn new(state: FileState, lines: Option<Vec<Line>>, message: impl Into<String>) -> Self {
        Self {
            state,
            message: message.into(),
            lines,
        }
    }

    /// Fold a newer update into this (older) one.
    ///
    /// Lines keep their order (older first), states merge with
    /// [`FileState::and`] and messages are concatenated.
    pub fn merge(self, newer: TailUpdate) -> TailUpdate {
        let lines = match (self.lines, newer.lines) {
            (None, None) => None,
            (Some(older), None) => Some(older),
            (None, Some(newer)) => Some(newer),
            (Some(mut older), Some(newer)) => {
                older.extend(newer);
                Some(older)
            }
        };

        TailUpdate {
            state: self.state.and(newer.state),
            message: format!("{} - {}", self.message, newer.message),
            lines,
        }
    }

    pub fn line_count(&self) -> usize {
        self.lines.as_ref().map_or(0, Vec::len)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// A [`TailUpdate`] tagged with the name of the watch that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedUpdate {
    pub watch: String,
    #[serde(flatten)]
    pub update: TailUpdate,
}

impl NamedUpdate {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Forwards every delivery into an unbounded channel.
///
/// Sending never blocks, so this is safe to call from the engine thread.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<TailUpdate>,
}

impl ChannelObserver {
    pub fn new(tx: mpsc::UnboundedSender<TailUpdate>) -> Self {
        Self { tx }
    }

    /// Convenience: create an observer together with its receiving end.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<TailUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl TailObserver for ChannelObserver {
    fn deliver(&mut self, state: FileState, lines: Option<Vec<Line>>, message: &str) {
        if self.tx.send(TailUpdate::new(state, lines, message)).is_err() {
            debug!("update receiver dropped; discarding delivery");
        }
    }
}
