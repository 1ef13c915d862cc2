//! Gameplay tunables.
//!
//! Every constant the simulation uses lives here so the engine can override it
//! from its config file. All structs use `#[serde(default)]`, so a partial
//! file only overrides the keys it names.

use serde::{Deserialize, Serialize};

/// Default enemy speed in pixels per tick.
pub const DEFAULT_AGENT_SPEED: f32 = 2.0;
/// Default distance at which an enemy notices the player.
pub const DEFAULT_DETECTION_RANGE: f32 = 300.0;
/// Ticks an enemy keeps searching the last known player position.
pub const DEFAULT_FORGET_AFTER_TICKS: u32 = 120;
/// Ticks between idle random direction changes.
pub const DEFAULT_DIRECTION_CHANGE_INTERVAL: u32 = 60;
/// Default leash distance for guard mode.
pub const DEFAULT_GUARD_RADIUS: f32 = 100.0;
/// Side length of the synthesized patrol square.
pub const DEFAULT_PATROL_STEP: f32 = 100.0;
/// Distance under which a patrol point counts as reached.
pub const DEFAULT_WAYPOINT_REACH: f32 = 10.0;

/// Enemy agent tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Base movement speed (pixels per tick)
    pub speed: f32,
    /// Speed used for the occasional faster enemy
    pub fast_speed: f32,
    /// Probability (0.0-1.0) that a spawned enemy is fast
    pub fast_chance: f64,
    /// Distance at which the player is detected
    pub detection_range: f32,
    /// Ticks a lost target is still pursued
    pub forget_after_ticks: u32,
    /// Ticks between idle direction changes
    pub direction_change_interval: u32,
    /// Guard leash radius
    pub guard_radius: f32,
    /// Default patrol square side length
    pub patrol_step: f32,
    /// Distance at which a patrol point is reached
    pub waypoint_reach: f32,
    /// Half width/height of the enemy bounding box
    pub half_extent: f32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            speed: DEFAULT_AGENT_SPEED,
            fast_speed: 3.0,
            fast_chance: 0.3,
            detection_range: DEFAULT_DETECTION_RANGE,
            forget_after_ticks: DEFAULT_FORGET_AFTER_TICKS,
            direction_change_interval: DEFAULT_DIRECTION_CHANGE_INTERVAL,
            guard_radius: DEFAULT_GUARD_RADIUS,
            patrol_step: DEFAULT_PATROL_STEP,
            waypoint_reach: DEFAULT_WAYPOINT_REACH,
            half_extent: 14.0,
        }
    }
}

/// Player tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Movement speed (pixels per tick)
    pub speed: f32,
    /// Multiplier applied to both axes when moving diagonally
    pub diagonal_factor: f32,
    /// Starting and maximum health
    pub max_health: i32,
    /// Health lost per enemy contact
    pub contact_damage: i32,
    /// Ticks of invulnerability after taking damage
    pub invulnerability_ticks: u32,
    /// Half width/height of the player bounding box
    pub half_extent: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            speed: 8.0,
            diagonal_factor: 0.707,
            max_health: 100,
            contact_damage: 10,
            invulnerability_ticks: 60,
            half_extent: 14.0,
        }
    }
}

/// Top-level simulation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Tile size in pixels
    pub tile_size: f32,
    /// Seed for every random decision in the simulation
    pub seed: u64,
    /// Treasures needed to win
    pub treasures_to_win: u32,
    /// Upper bound for a single tick's elapsed time (milliseconds)
    pub max_tick_ms: u64,
    /// Whether enemies start with chasing enabled
    pub chase_enabled: bool,
    /// Enemy tunables
    pub agent: AgentConfig,
    /// Player tunables
    pub player: PlayerConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tile_size: 32.0,
            seed: 0x00DE_1BE5,
            treasures_to_win: 4,
            max_tick_ms: 100,
            chase_enabled: true,
            agent: AgentConfig::default(),
            player: PlayerConfig::default(),
        }
    }
}
