// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `tailwatch`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "tailwatch",
    version,
    about = "Follow growing text files and print new lines as NDJSON.",
    long_about = None
)]
pub struct CliArgs {
    /// Files to tail, in addition to the `[watch.*]` entries of the config.
    ///
    /// Each file becomes a watch named after the path as given.
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Path to the config file (TOML).
    ///
    /// If omitted, `Tailwatch.toml` in the current working directory is used
    /// when it exists.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Encoding label applied to every watch (overrides `[default]`).
    #[arg(long, value_name = "LABEL")]
    pub encoding: Option<String>,

    /// Tail window in KiB (overrides `[default]`).
    #[arg(long, value_name = "KIB")]
    pub max_tail_kib: Option<u64>,

    /// Maximum lines per delivery (overrides `[default]`).
    #[arg(long, value_name = "N")]
    pub max_lines: Option<usize>,

    /// Minimum delay between deliveries in milliseconds (overrides `[default]`).
    #[arg(long, value_name = "MS")]
    pub min_interval_ms: Option<u64>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TAILWATCH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the resolved watches, but don't start tailing.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
