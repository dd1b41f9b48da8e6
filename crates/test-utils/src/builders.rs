#![allow(dead_code)]

use std::path::Path;

use tailwatch::config::{ConfigFile, RawConfigFile, WatchConfig};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn with_watch(mut self, name: &str, watch: WatchConfig) -> Self {
        self.config.watch.insert(name.to_string(), watch);
        self
    }

    pub fn with_default_encoding(mut self, label: &str) -> Self {
        self.config.default.encoding = Some(label.to_string());
        self
    }

    pub fn with_default_max_lines(mut self, lines: usize) -> Self {
        self.config.default.max_lines = Some(lines);
        self
    }

    pub fn with_poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.engine.poll_interval_ms = ms;
        self
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.config.engine.channel_capacity = capacity;
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `WatchConfig`.
pub struct WatchConfigBuilder {
    watch: WatchConfig,
}

impl WatchConfigBuilder {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            watch: WatchConfig::new(path.as_ref()),
        }
    }

    pub fn encoding(mut self, label: &str) -> Self {
        self.watch.encoding = Some(label.to_string());
        self
    }

    pub fn max_tail_kib(mut self, kib: u64) -> Self {
        self.watch.max_tail_kib = Some(kib);
        self
    }

    pub fn max_lines(mut self, lines: usize) -> Self {
        self.watch.max_lines = Some(lines);
        self
    }

    pub fn min_interval_ms(mut self, ms: u64) -> Self {
        self.watch.min_interval_ms = Some(ms);
        self
    }

    pub fn build(self) -> WatchConfig {
        self.watch
    }
}
