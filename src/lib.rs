// src/lib.rs

//! Incremental file tailing.
//!
//! A [`TailWatcher`] follows any number of text files and hands each observer
//! the lines appended since its previous notification, decoded with the
//! watch's encoding. Truncation, deletion and recreation are reported as
//! lifecycle states alongside the lines.

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod observer;
pub mod tail;
pub mod types;
pub mod watch;

use std::io::Write;

use anyhow::{bail, Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::loader::{default_config_path, load_from_path};
use crate::config::model::{ConfigFile, RawConfigFile, WatchConfig};
use crate::observer::{ChannelSink, NamedUpdate, RetryingObserver};

pub use crate::engine::TailWatcher;
pub use crate::observer::{TailObserver, TailUpdate};
pub use crate::types::{FileState, Line, WatchHandle};
pub use crate::watch::WatchOptions;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and CLI overrides
/// - one engine thread for all watches
/// - the NDJSON printer on stdout
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = resolve_config(&args)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let watcher = TailWatcher::start_with_options(cfg.engine_options())?;
    let (tx, mut rx) = mpsc::channel::<NamedUpdate>(cfg.engine.channel_capacity);

    // Only the observers keep the channel open from here on.
    if let Err(err) = watch_all(&watcher, &cfg, tx) {
        shutdown_engine(watcher).await?;
        return Err(err);
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut stdout = std::io::stdout();
    loop {
        tokio::select! {
            update = rx.recv() => {
                match update {
                    Some(update) => print_update(&mut stdout, &update)?,
                    None => {
                        debug!("all observers dropped");
                        break;
                    }
                }
            }
            res = &mut ctrl_c => {
                if let Err(e) = res {
                    warn!(error = %e, "failed to listen for Ctrl+C");
                }
                info!("shutdown requested");
                break;
            }
        }
    }

    shutdown_engine(watcher).await?;

    while let Ok(update) = rx.try_recv() {
        print_update(&mut stdout, &update)?;
    }

    Ok(())
}

fn watch_all(
    watcher: &TailWatcher,
    cfg: &ConfigFile,
    tx: mpsc::Sender<NamedUpdate>,
) -> Result<()> {
    for (name, watch) in cfg.watch.iter() {
        let options = cfg.watch_options(watch);
        let observer = RetryingObserver::new(ChannelSink::new(name.as_str(), tx.clone()));
        let handle = watcher
            .watch(&watch.path, options, observer)
            .with_context(|| format!("failed to watch '{}' ({})", name, watch.path.display()))?;
        info!(%handle, watch = %name, path = ?watch.path, "watching");
    }
    Ok(())
}

/// Joining the engine thread blocks, so it happens off the async workers.
async fn shutdown_engine(watcher: TailWatcher) -> Result<()> {
    tokio::task::spawn_blocking(move || watcher.shutdown())
        .await
        .context("engine shutdown task failed")
}

/// Build the effective configuration from the config file (if any) and the
/// command line.
///
/// - `--config PATH` must exist; without it `Tailwatch.toml` is used only
///   when present.
/// - CLI option flags override `[default]`.
/// - CLI files are added as watches named by their path.
pub fn resolve_config(args: &CliArgs) -> Result<ConfigFile> {
    let mut raw = match args.config {
        Some(ref path) => load_from_path(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => {
            let path = default_config_path();
            if path.is_file() {
                load_from_path(&path)
                    .with_context(|| format!("failed to load config {}", path.display()))?
            } else {
                RawConfigFile::default()
            }
        }
    };

    apply_cli_overrides(&mut raw, args);

    if raw.watch.is_empty() {
        bail!("nothing to watch: pass files on the command line or add [watch.<name>] entries");
    }

    Ok(ConfigFile::try_from(raw)?)
}

fn apply_cli_overrides(raw: &mut RawConfigFile, args: &CliArgs) {
    if let Some(ref encoding) = args.encoding {
        raw.default.encoding = Some(encoding.clone());
    }
    if let Some(kib) = args.max_tail_kib {
        raw.default.max_tail_kib = Some(kib);
    }
    if let Some(lines) = args.max_lines {
        raw.default.max_lines = Some(lines);
    }
    if let Some(ms) = args.min_interval_ms {
        raw.default.min_interval_ms = Some(ms);
    }
    for file in args.files.iter() {
        let name = file.display().to_string();
        raw.watch.insert(name, WatchConfig::new(file.clone()));
    }
}

fn print_update(out: &mut impl Write, update: &NamedUpdate) -> Result<()> {
    let line = update.to_json().context("failed to serialize update")?;
    writeln!(out, "{line}").context("failed to write update to stdout")?;
    out.flush().context("failed to flush stdout")?;
    Ok(())
}

/// Simple dry-run output: engine settings and the effective options of every watch.
fn print_dry_run(cfg: &ConfigFile) {
    println!("tailwatch dry-run");
    println!("  engine.poll_interval_ms = {}", cfg.engine.poll_interval_ms);
    println!("  engine.max_events_per_tick = {}", cfg.engine.max_events_per_tick);
    println!("  engine.channel_capacity = {}", cfg.engine.channel_capacity);
    println!();

    println!("watches ({}):", cfg.watch.len());
    for (name, watch) in cfg.watch.iter() {
        let opts = cfg.watch_options(watch);
        println!("  - {name}");
        println!("      path: {}", watch.path.display());
        println!("      encoding: {}", opts.encoding);
        println!("      max_tail_kib: {}", opts.max_tail_kib);
        println!("      max_lines: {}", opts.max_lines);
        println!("      min_interval_ms: {}", opts.min_interval.as_millis());
    }

    debug!("dry-run complete (nothing watched)");
}
