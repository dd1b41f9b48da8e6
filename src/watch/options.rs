// src/watch/options.rs

use std::time::Duration;

use encoding_rs::Encoding;

use crate::errors::{Result, TailwatchError};
use crate::tail::TailLimits;
use crate::types::{DEFAULT_ENCODING, DEFAULT_MAX_LINES, DEFAULT_MAX_TAIL_KIB, DEFAULT_MIN_INTERVAL};

/// Per-watch tuning knobs.
///
/// All fields have the documented defaults; use the builder-style setters to
/// override only what you need:
///
/// ```
/// use std::time::Duration;
/// use tailwatch::watch::WatchOptions;
///
/// let opts = WatchOptions::default()
///     .max_lines(100)
///     .min_interval(Duration::from_millis(250));
/// assert_eq!(opts.max_tail_kib, 1024);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchOptions {
    /// WHATWG encoding label (e.g. `"utf-8"`, `"windows-1252"`, `"utf-16le"`).
    pub encoding: String,
    /// Size of the tail window, in KiB.
    pub max_tail_kib: u64,
    /// Maximum number of lines handed to the observer per notification.
    pub max_lines: usize,
    /// Minimum time between two notifications.
    pub min_interval: Duration,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            encoding: DEFAULT_ENCODING.to_string(),
            max_tail_kib: DEFAULT_MAX_TAIL_KIB,
            max_lines: DEFAULT_MAX_LINES,
            min_interval: DEFAULT_MIN_INTERVAL,
        }
    }
}

impl WatchOptions {
    pub fn encoding(mut self, label: impl Into<String>) -> Self {
        self.encoding = label.into();
        self
    }

    pub fn max_tail_kib(mut self, kib: u64) -> Self {
        self.max_tail_kib = kib;
        self
    }

    pub fn max_lines(mut self, lines: usize) -> Self {
        self.max_lines = lines;
        self
    }

    pub fn min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = interval;
        self
    }

    /// Check the options and resolve the encoding label.
    pub fn validate(&self) -> Result<&'static Encoding> {
        if self.max_tail_kib == 0 {
            return Err(TailwatchError::InvalidOption(
                "max_tail_kib must be >= 1 (got 0)".to_string(),
            ));
        }
        if self.max_lines == 0 {
            return Err(TailwatchError::InvalidOption(
                "max_lines must be >= 1 (got 0)".to_string(),
            ));
        }
        resolve_encoding(&self.encoding)
    }

    pub fn limits(&self) -> TailLimits {
        TailLimits {
            max_window_bytes: self.max_tail_kib.saturating_mul(1024),
            max_lines: self.max_lines,
        }
    }
}

/// Look up an encoding by its WHATWG label.
pub fn resolve_encoding(label: &str) -> Result<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| TailwatchError::UnknownEncoding(label.to_string()))
}
