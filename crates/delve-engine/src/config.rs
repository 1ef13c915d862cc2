//! Engine configuration.
//!
//! Run settings for the headless runner plus the nested gameplay tunables.
//! Configuration can be loaded from and saved to a TOML file; every field has
//! a default so partial files are fine.

use delve_gameplay::SimulationConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Configuration file name.
pub const CONFIG_FILE: &str = "delve.toml";

/// Log filter used when neither `RUST_LOG` nor the config sets one.
pub const DEFAULT_LOG_FILTER: &str = "delve=info";

/// Errors that can occur while reading a config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No file at the given path
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    /// The file exists but could not be read
    #[error("failed to read config file: {0}")]
    Read(#[from] io::Error),

    /// The file is not valid TOML for [`EngineConfig`]
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Engine configuration parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // === Run Settings ===
    /// Maximum number of ticks to simulate
    pub ticks: u64,
    /// Milliseconds of game time per tick
    pub tick_ms: u64,
    /// Log progress every this many ticks (0 = never)
    pub report_interval: u64,
    /// Ticks the scripted player holds each direction
    pub input_hold_ticks: u32,

    // === Files ===
    /// Tile map to play (built-in dungeon when unset)
    pub map_path: Option<PathBuf>,
    /// Where to write the waypoint registry after the run
    pub export_registry: Option<PathBuf>,

    // === Logging ===
    /// `tracing` filter used when `RUST_LOG` is unset
    pub log_filter: String,

    // === Gameplay ===
    /// Gameplay tunables
    pub simulation: SimulationConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ticks: 3600,
            tick_ms: 16,
            report_interval: 600,
            input_hold_ticks: 45,

            map_path: None,
            export_registry: None,

            log_filter: DEFAULT_LOG_FILTER.to_string(),

            simulation: SimulationConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Read configuration from a specific path.
    pub fn try_load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let contents = fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Load configuration from a specific path.
    /// Returns default config if file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::try_load_from(path) {
            Ok(config) => {
                info!("Loaded config from {}", path.display());
                config
            },
            Err(ConfigError::NotFound(_)) => {
                info!("Config file not found, using defaults");
                Self::default()
            },
            Err(e) => {
                warn!("{e}; using defaults");
                Self::default()
            },
        }
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(path, contents)?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Clamp values the runner cannot work with.
    pub fn validate(&mut self) {
        self.tick_ms = self.tick_ms.max(1);
        self.input_hold_ticks = self.input_hold_ticks.max(1);

        let sim = &mut self.simulation;
        if !(sim.tile_size.is_finite() && sim.tile_size > 0.0) {
            warn!("tile_size {} is invalid, using 32", sim.tile_size);
            sim.tile_size = 32.0;
        }
        sim.agent.fast_chance = sim.agent.fast_chance.clamp(0.0, 1.0);
        sim.player.diagonal_factor = sim.player.diagonal_factor.clamp(0.0, 1.0);
    }
}
