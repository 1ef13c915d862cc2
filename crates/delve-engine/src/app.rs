//! Headless run loop.
//!
//! Loads a level, drives the simulation with a scripted player for a fixed
//! number of ticks (or until the run ends) and optionally exports the
//! waypoint registry.

use crate::config::EngineConfig;
use anyhow::{Context, Result};
use delve_gameplay::{LevelLayout, MoveIntent, Outcome, Simulation};
use tracing::info;

const fn intent(up: bool, down: bool, left: bool, right: bool) -> MoveIntent {
    MoveIntent {
        up,
        down,
        left,
        right,
    }
}

/// Directions the scripted player cycles through.
const SCRIPT: [MoveIntent; 8] = [
    intent(false, false, false, true),
    intent(false, true, false, false),
    intent(false, false, true, false),
    intent(true, false, false, false),
    intent(false, true, false, true),
    intent(true, false, true, false),
    MoveIntent::IDLE,
    intent(false, true, true, false),
];

/// Stand-in for keyboard input: holds each scripted direction for a while.
#[derive(Debug, Clone)]
pub struct ScriptedPlayer {
    hold_ticks: u32,
    tick: u64,
}

impl ScriptedPlayer {
    /// Creates a script holding each direction for `hold_ticks` ticks.
    #[must_use]
    pub fn new(hold_ticks: u32) -> Self {
        Self {
            hold_ticks: hold_ticks.max(1),
            tick: 0,
        }
    }

    /// Returns the input for the next tick.
    pub fn next_intent(&mut self) -> MoveIntent {
        let step = (self.tick / u64::from(self.hold_ticks)) as usize % SCRIPT.len();
        self.tick += 1;
        SCRIPT[step]
    }
}

/// What a run ended with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Ticks actually simulated
    pub ticks: u64,
    /// Final outcome
    pub outcome: Outcome,
    /// Remaining health
    pub health: i32,
    /// Treasures collected
    pub treasures: u32,
    /// Game time in milliseconds
    pub elapsed_ms: u64,
}

/// Loads the configured level.
pub fn load_level(config: &EngineConfig) -> Result<LevelLayout> {
    let tile_size = config.simulation.tile_size;
    match &config.map_path {
        Some(path) => LevelLayout::load_map_file(path, tile_size)
            .with_context(|| format!("failed to load map {}", path.display())),
        None => LevelLayout::default_dungeon(tile_size).context("failed to build the built-in dungeon"),
    }
}

/// Runs the simulation to completion.
pub fn run(config: &EngineConfig) -> Result<RunSummary> {
    let layout = load_level(config)?;
    let mut sim = Simulation::new(layout, config.simulation.clone());
    let mut script = ScriptedPlayer::new(config.input_hold_ticks);

    let mut outcome = sim.outcome();
    for tick in 1..=config.ticks {
        outcome = sim.tick(script.next_intent(), config.tick_ms);

        if config.report_interval > 0 && tick % config.report_interval == 0 {
            let alerted = sim.agents().iter().filter(|a| a.is_alerted()).count();
            info!(
                tick,
                health = sim.session().health,
                treasures = sim.session().treasures_collected,
                alerted,
                "progress"
            );
        }
        if outcome.is_finished() {
            break;
        }
    }

    if let Some(path) = &config.export_registry {
        sim.registry()
            .save_to_file(path)
            .with_context(|| format!("failed to export registry to {}", path.display()))?;
    }

    let session = sim.session();
    Ok(RunSummary {
        ticks: session.ticks,
        outcome,
        health: session.health,
        treasures: session.treasures_collected,
        elapsed_ms: session.elapsed_ms,
    })
}
