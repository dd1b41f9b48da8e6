// src/errors.rs

//! Crate-wide error aliases and helpers.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TailwatchError {
    #[error("It's a directory: {0:?}")]
    IsDirectory(PathBuf),

    #[error("Could not resolve the real path of {path:?}: {source}")]
    UnresolvablePath {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Unknown encoding: {0}")]
    UnknownEncoding(String),

    #[error("Invalid watch option: {0}")]
    InvalidOption(String),

    #[error("The watch engine has been shut down")]
    EngineStopped,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, TailwatchError>;
