// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::engine::{EngineOptions, DEFAULT_MAX_EVENTS_PER_TICK, DEFAULT_POLL_INTERVAL};
use crate::watch::WatchOptions;

/// Raw configuration as deserialized from TOML, before validation.
///
/// ```toml
/// [engine]
/// poll_interval_ms = 50
/// max_events_per_tick = 256
/// channel_capacity = 64
///
/// [default]
/// encoding = "utf-8"
/// max_tail_kib = 1024
/// max_lines = 1024
/// min_interval_ms = 50
///
/// [watch.app]
/// path = "/var/log/app.log"
/// encoding = "windows-1252"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    /// Engine loop tuning from `[engine]`.
    #[serde(default)]
    pub engine: EngineSection,

    /// Defaults applied to every watch from `[default]`.
    #[serde(default)]
    pub default: DefaultSection,

    /// All watches from `[watch.<name>]`.
    #[serde(default)]
    pub watch: BTreeMap<String, WatchConfig>,
}

/// Validated configuration. Build it with `ConfigFile::try_from(raw)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub engine: EngineSection,
    pub default: DefaultSection,
    pub watch: BTreeMap<String, WatchConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        engine: EngineSection,
        default: DefaultSection,
        watch: BTreeMap<String, WatchConfig>,
    ) -> Self {
        Self {
            engine,
            default,
            watch,
        }
    }

    pub fn engine_options(&self) -> EngineOptions {
        self.engine.options()
    }

    /// Effective options for one watch: `[default]` first, then the watch's
    /// own overrides.
    pub fn watch_options(&self, watch: &WatchConfig) -> WatchOptions {
        effective_watch_options(&self.default, watch)
    }
}

pub(crate) fn effective_watch_options(default: &DefaultSection, watch: &WatchConfig) -> WatchOptions {
    let mut opts = default.apply(WatchOptions::default());
    if let Some(ref encoding) = watch.encoding {
        opts = opts.encoding(encoding.clone());
    }
    if let Some(kib) = watch.max_tail_kib {
        opts = opts.max_tail_kib(kib);
    }
    if let Some(lines) = watch.max_lines {
        opts = opts.max_lines(lines);
    }
    if let Some(ms) = watch.min_interval_ms {
        opts = opts.min_interval(Duration::from_millis(ms));
    }
    opts
}

/// `[engine]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineSection {
    /// Upper bound, in milliseconds, for one poll of the notification source.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Filesystem events handled per loop iteration at most.
    #[serde(default = "default_max_events_per_tick")]
    pub max_events_per_tick: usize,

    /// Capacity of the channel between the engine and the stdout printer.
    /// When it is full, deliveries are kept in each watch's retry bundle.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL.as_millis() as u64
}

fn default_max_events_per_tick() -> usize {
    DEFAULT_MAX_EVENTS_PER_TICK
}

fn default_channel_capacity() -> usize {
    64
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            max_events_per_tick: default_max_events_per_tick(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl EngineSection {
    pub fn options(&self) -> EngineOptions {
        EngineOptions {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            max_events_per_tick: self.max_events_per_tick,
        }
    }
}

/// `[default]` section. Unset fields fall back to the built-in defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DefaultSection {
    #[serde(default)]
    pub encoding: Option<String>,
    #[serde(default)]
    pub max_tail_kib: Option<u64>,
    #[serde(default)]
    pub max_lines: Option<usize>,
    #[serde(default)]
    pub min_interval_ms: Option<u64>,
}

impl DefaultSection {
    pub fn apply(&self, mut opts: WatchOptions) -> WatchOptions {
        if let Some(ref encoding) = self.encoding {
            opts = opts.encoding(encoding.clone());
        }
        if let Some(kib) = self.max_tail_kib {
            opts = opts.max_tail_kib(kib);
        }
        if let Some(lines) = self.max_lines {
            opts = opts.max_lines(lines);
        }
        if let Some(ms) = self.min_interval_ms {
            opts = opts.min_interval(Duration::from_millis(ms));
        }
        opts
    }
}

/// `[watch.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchConfig {
    /// File to tail. Its parent directory must exist.
    pub path: PathBuf,

    #[serde(default)]
    pub encoding: Option<String>,

    #[serde(default)]
    pub max_tail_kib: Option<u64>,

    #[serde(default)]
    pub max_lines: Option<usize>,

    #[serde(default)]
    pub min_interval_ms: Option<u64>,
}

impl WatchConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            encoding: None,
            max_tail_kib: None,
            max_lines: None,
            min_interval_ms: None,
        }
    }
}
