// src/config/validate.rs

use crate::config::model::{effective_watch_options, ConfigFile, RawConfigFile};
use crate::errors::{Result, TailwatchError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::TailwatchError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.engine, raw.default, raw.watch))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_engine(cfg)?;
    validate_defaults(cfg)?;
    validate_watches(cfg)?;
    Ok(())
}

fn validate_engine(cfg: &RawConfigFile) -> Result<()> {
    if cfg.engine.poll_interval_ms == 0 {
        return Err(TailwatchError::ConfigError(
            "[engine].poll_interval_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    if cfg.engine.max_events_per_tick == 0 {
        return Err(TailwatchError::ConfigError(
            "[engine].max_events_per_tick must be >= 1 (got 0)".to_string(),
        ));
    }
    if cfg.engine.channel_capacity == 0 {
        return Err(TailwatchError::ConfigError(
            "[engine].channel_capacity must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_defaults(cfg: &RawConfigFile) -> Result<()> {
    let opts = cfg.default.apply(Default::default());
    opts.validate()
        .map_err(|e| TailwatchError::ConfigError(format!("[default]: {e}")))?;
    Ok(())
}

fn validate_watches(cfg: &RawConfigFile) -> Result<()> {
    for (name, watch) in cfg.watch.iter() {
        if watch.path.as_os_str().is_empty() {
            return Err(TailwatchError::ConfigError(format!(
                "watch '{}' has an empty `path`",
                name
            )));
        }
        effective_watch_options(&cfg.default, watch)
            .validate()
            .map_err(|e| TailwatchError::ConfigError(format!("watch '{}': {e}", name)))?;
    }
    Ok(())
}
