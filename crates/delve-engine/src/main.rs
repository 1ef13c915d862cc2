//! # Delve Engine
//!
//! Headless runner for Delve, a top-down dungeon crawler.
//!
//! Loads a tile map (or the built-in dungeon), plays it with a scripted
//! player and reports how the run ended.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod app;
mod config;

use anyhow::Result;
use clap::Parser;
use config::{EngineConfig, CONFIG_FILE, DEFAULT_LOG_FILTER};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, reload, EnvFilter};

/// A top-down dungeon crawler, run headless
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file
    #[arg(short, long, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Tile map to play instead of the built-in dungeon
    #[arg(short, long)]
    map: Option<PathBuf>,

    /// Maximum ticks to simulate
    #[arg(short, long)]
    ticks: Option<u64>,

    /// Random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Write the waypoint registry here after the run
    #[arg(long)]
    export_registry: Option<PathBuf>,

    /// Start with chasing disabled
    #[arg(long)]
    no_chase: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Write the effective config to this path and exit
    #[arg(long, value_name = "PATH")]
    write_config: Option<PathBuf>,
}

impl Args {
    /// Overrides file settings with the flags that were given.
    fn apply(&self, config: &mut EngineConfig) {
        if let Some(map) = &self.map {
            config.map_path = Some(map.clone());
        }
        if let Some(ticks) = self.ticks {
            config.ticks = ticks;
        }
        if let Some(seed) = self.seed {
            config.simulation.seed = seed;
        }
        if let Some(path) = &self.export_registry {
            config.export_registry = Some(path.clone());
        }
        if self.no_chase {
            config.simulation.chase_enabled = false;
        }
        if self.verbose {
            config.log_filter = "delve=debug".to_string();
        }
    }
}

/// Filter the config asks for, if it should replace the startup filter.
///
/// `RUST_LOG` always wins over the config file.
fn config_filter(config: &EngineConfig, from_env: bool) -> Option<&str> {
    (!from_env && config.log_filter != DEFAULT_LOG_FILTER).then_some(config.log_filter.as_str())
}

/// Main entry point.
fn main() -> Result<()> {
    let args = Args::parse();

    // Install logging before the config file is read.
    let env_filter = EnvFilter::try_from_default_env().ok();
    let from_env = env_filter.is_some();
    let (filter, filter_handle) =
        reload::Layer::new(env_filter.unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER)));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();

    let mut config = EngineConfig::load_from(&args.config);
    args.apply(&mut config);
    config.validate();

    if let Some(directives) = config_filter(&config, from_env) {
        filter_handle.reload(EnvFilter::new(directives))?;
    }

    if let Some(path) = &args.write_config {
        config.save_to(path)?;
        return Ok(());
    }

    info!("Delve starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let summary = app::run(&config)?;
    info!(
        ticks = summary.ticks,
        health = summary.health,
        treasures = summary.treasures,
        seconds = summary.elapsed_ms / 1000,
        "finished: {}",
        summary.outcome
    );
    Ok(())
}
