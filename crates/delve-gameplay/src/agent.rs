//! Enemy agents and their per-agent behavior state.
//!
//! An [`Agent`] carries everything the behavior controller and the motion
//! integrator need: position, heading, speed, the active [`Behavior`] and the
//! memory of where the target was last seen. Mode-specific data (patrol route,
//! guard post) lives inside the [`Behavior`] variant that uses it.

use crate::config::AgentConfig;
use delve_common::{AgentId, Vec2, AABB, CARDINALS};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error types for agent configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AgentError {
    /// Mode name is not one of the idle modes
    #[error("invalid behavior mode: {0:?} (expected patrol, wander or guard)")]
    InvalidMode(String),
    /// Agent not present in the roster
    #[error("agent not found: {0}")]
    NotFound(AgentId),
}

/// Result type for agent operations.
pub type AgentResult<T> = Result<T, AgentError>;

/// The four mutually exclusive behavior modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BehaviorMode {
    /// Pursue the target; wander when there is nothing to pursue
    Chase,
    /// Walk a closed route
    Patrol,
    /// Random cardinal walk
    Wander,
    /// Stay near an anchor point
    Guard,
}

impl BehaviorMode {
    /// Modes an agent may fall back to when not chasing.
    pub const IDLE: [Self; 3] = [Self::Patrol, Self::Wander, Self::Guard];

    /// Returns the lowercase name used in config files and logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Chase => "chase",
            Self::Patrol => "patrol",
            Self::Wander => "wander",
            Self::Guard => "guard",
        }
    }

    /// Returns `true` for patrol, wander and guard.
    #[must_use]
    pub const fn is_idle(self) -> bool {
        !matches!(self, Self::Chase)
    }
}

impl fmt::Display for BehaviorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BehaviorMode {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chase" => Ok(Self::Chase),
            "patrol" => Ok(Self::Patrol),
            "wander" => Ok(Self::Wander),
            "guard" => Ok(Self::Guard),
            _ => Err(AgentError::InvalidMode(s.to_string())),
        }
    }
}

/// A closed patrol route with the index of the point being approached.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatrolRoute {
    points: Vec<Vec2>,
    index: usize,
}

impl PatrolRoute {
    /// Creates a route starting at its first point.
    #[must_use]
    pub fn new(points: Vec<Vec2>) -> Self {
        Self { points, index: 0 }
    }

    /// The default loop: right, right+down, down, back to the origin.
    #[must_use]
    pub fn square(origin: Vec2, step: f32) -> Self {
        Self::new(vec![
            origin + Vec2::new(step, 0.0),
            origin + Vec2::new(step, step),
            origin + Vec2::new(0.0, step),
            origin,
        ])
    }

    /// Returns the route points.
    #[must_use]
    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    /// Returns the index of the current point.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Returns the point currently being approached.
    #[must_use]
    pub fn current(&self) -> Option<Vec2> {
        self.points.get(self.index).copied()
    }

    /// Moves on to the next point, wrapping around.
    pub fn advance(&mut self) {
        if !self.points.is_empty() {
            self.index = (self.index + 1) % self.points.len();
        }
    }

    /// Returns `true` if the route has no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Per-mode behavior state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Behavior {
    /// Pursuit mode
    Chase,
    /// Patrol a route; an empty route is filled in lazily
    Patrol(PatrolRoute),
    /// Random walk
    Wander,
    /// Hold a post
    Guard {
        /// Point to stay near
        anchor: Vec2,
        /// Leash distance from the anchor
        radius: f32,
    },
}

impl Behavior {
    /// Returns the mode tag of this behavior.
    #[must_use]
    pub const fn mode(&self) -> BehaviorMode {
        match self {
            Self::Chase => BehaviorMode::Chase,
            Self::Patrol(_) => BehaviorMode::Patrol,
            Self::Wander => BehaviorMode::Wander,
            Self::Guard { .. } => BehaviorMode::Guard,
        }
    }
}

/// Where the target was last detected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetMemory {
    /// Last position seen inside detection range
    pub last_known: Option<Vec2>,
    /// Ticks since the target left detection range
    pub ticks_since_lost: u32,
}

/// What drove an agent's direction on its most recent tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pursuit {
    /// Idle behavior was in control
    #[default]
    None,
    /// Chasing a target inside detection range
    Live,
    /// Heading for the remembered position
    Remembered,
}

impl Pursuit {
    /// Returns `true` for live or remembered pursuit.
    #[must_use]
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::None)
    }
}

/// The direction issued for the current tick.
///
/// Pursuit directions are already multiplied by speed; idle and re-aim
/// directions are unit (or zero) vectors scaled when applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Heading {
    /// Velocity, already scaled by speed
    Scaled(Vec2),
    /// Unit or zero vector, scaled by speed when applied
    Unit(Vec2),
}

impl Heading {
    /// Returns the stored vector as issued.
    #[must_use]
    pub const fn vector(self) -> Vec2 {
        match self {
            Self::Scaled(v) | Self::Unit(v) => v,
        }
    }

    /// Returns the per-tick displacement for the given speed.
    #[must_use]
    pub fn displacement(self, speed: f32) -> Vec2 {
        match self {
            Self::Scaled(v) => v,
            Self::Unit(v) => v * speed,
        }
    }
}

impl Default for Heading {
    fn default() -> Self {
        Self::Unit(Vec2::ZERO)
    }
}

/// One enemy instance.
#[derive(Debug, Clone)]
pub struct Agent {
    pub(crate) id: AgentId,
    pub(crate) spawn: Vec2,
    pub(crate) position: Vec2,
    pub(crate) half_extents: Vec2,
    pub(crate) heading: Heading,
    pub(crate) speed: f32,
    pub(crate) behavior: Behavior,
    pub(crate) chase_enabled: bool,
    pub(crate) detection_range: f32,
    pub(crate) memory: TargetMemory,
    pub(crate) pursuit: Pursuit,
    pub(crate) direction_change_timer: u32,
    /// Side step queued by a blocked pursuit, used instead of the next pursuit heading
    pub(crate) detour: Option<Vec2>,
    pub(crate) tuning: AgentConfig,
    pub(crate) rng: fastrand::Rng,
}

impl Agent {
    /// Creates an agent at its spawn point.
    ///
    /// Chase-enabled agents start in chase mode; the rest pick a random idle
    /// mode. The initial heading is a random cardinal direction.
    #[must_use]
    pub fn new(id: AgentId, spawn: Vec2, chase_enabled: bool, tuning: &AgentConfig, seed: u64) -> Self {
        let mut rng = fastrand::Rng::with_seed(seed);
        let heading = Heading::Unit(CARDINALS[rng.usize(..CARDINALS.len())]);
        let mode = if chase_enabled {
            BehaviorMode::Chase
        } else {
            BehaviorMode::IDLE[rng.usize(..BehaviorMode::IDLE.len())]
        };

        let mut agent = Self {
            id,
            spawn,
            position: spawn,
            half_extents: Vec2::splat(tuning.half_extent),
            heading,
            speed: tuning.speed,
            behavior: Behavior::Chase,
            chase_enabled,
            detection_range: tuning.detection_range,
            memory: TargetMemory::default(),
            pursuit: Pursuit::None,
            direction_change_timer: 0,
            detour: None,
            tuning: tuning.clone(),
            rng,
        };
        agent.set_mode(mode);
        agent
    }

    /// Returns the agent id.
    #[must_use]
    pub const fn id(&self) -> AgentId {
        self.id
    }

    /// Returns the spawn position.
    #[must_use]
    pub const fn spawn(&self) -> Vec2 {
        self.spawn
    }

    /// Returns the center position.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Teleports the agent; the bounding box follows the center.
    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    /// Returns the current bounding box.
    #[must_use]
    pub fn bounding_box(&self) -> AABB {
        AABB::from_center(self.position, self.half_extents)
    }

    /// Returns the direction issued for the current tick.
    #[must_use]
    pub const fn direction(&self) -> Vec2 {
        self.heading.vector()
    }

    /// Returns the heading with its scaling tag.
    #[must_use]
    pub const fn heading(&self) -> Heading {
        self.heading
    }

    /// Returns the movement speed.
    #[must_use]
    pub const fn speed(&self) -> f32 {
        self.speed
    }

    /// Changes the movement speed.
    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    /// Returns the active behavior.
    #[must_use]
    pub const fn behavior(&self) -> &Behavior {
        &self.behavior
    }

    /// Returns the active mode.
    #[must_use]
    pub const fn mode(&self) -> BehaviorMode {
        self.behavior.mode()
    }

    /// Returns whether chasing is enabled.
    #[must_use]
    pub const fn chase_enabled(&self) -> bool {
        self.chase_enabled
    }

    /// Returns the detection range.
    #[must_use]
    pub const fn detection_range(&self) -> f32 {
        self.detection_range
    }

    /// Returns the target memory.
    #[must_use]
    pub const fn memory(&self) -> TargetMemory {
        self.memory
    }

    /// Returns what drove the last tick's direction.
    #[must_use]
    pub const fn pursuit(&self) -> Pursuit {
        self.pursuit
    }

    /// Whether the agent should be drawn as alerted.
    ///
    /// True once a chase-enabled agent has seen the target, even after the
    /// memory window has run out.
    #[must_use]
    pub const fn is_alerted(&self) -> bool {
        self.chase_enabled && self.memory.last_known.is_some()
    }

    /// Returns the idle direction-change timer.
    #[must_use]
    pub const fn direction_change_timer(&self) -> u32 {
        self.direction_change_timer
    }

    /// Returns the distance from the agent center to a point.
    #[must_use]
    pub fn distance_to(&self, point: Vec2) -> f32 {
        self.position.distance(point)
    }

    /// Switches mode, building default per-mode state.
    ///
    /// Re-selecting the current mode keeps its state. A new patrol starts with
    /// an empty route (filled in on first use); a new guard post is the spawn
    /// point with the configured radius.
    pub fn set_mode(&mut self, mode: BehaviorMode) {
        if self.behavior.mode() == mode {
            return;
        }
        self.behavior = match mode {
            BehaviorMode::Chase => Behavior::Chase,
            BehaviorMode::Patrol => Behavior::Patrol(PatrolRoute::default()),
            BehaviorMode::Wander => Behavior::Wander,
            BehaviorMode::Guard => Behavior::Guard {
                anchor: self.spawn,
                radius: self.tuning.guard_radius,
            },
        };
    }

    /// Switches to an idle mode by name.
    ///
    /// Only `patrol`, `wander` and `guard` are accepted; anything else is
    /// rejected and the current mode is kept. Chase is controlled through
    /// [`Agent::set_chase_mode`].
    pub fn set_behavior(&mut self, name: &str) -> AgentResult<()> {
        let mode = name
            .parse::<BehaviorMode>()
            .ok()
            .filter(|mode| mode.is_idle())
            .ok_or_else(|| AgentError::InvalidMode(name.to_string()))?;
        self.set_mode(mode);
        Ok(())
    }

    /// Replaces the patrol route and switches to patrol mode.
    pub fn set_patrol_route(&mut self, points: Vec<Vec2>) {
        self.behavior = Behavior::Patrol(PatrolRoute::new(points));
    }

    /// Sets a guard post and switches to guard mode.
    pub fn set_guard_post(&mut self, anchor: Vec2, radius: f32) {
        self.behavior = Behavior::Guard { anchor, radius };
    }

    /// Enables or disables chasing with a detection range.
    ///
    /// Enabling also switches the mode to chase.
    pub fn set_chase_mode(&mut self, enabled: bool, detection_range: f32) {
        self.chase_enabled = enabled;
        self.detection_range = detection_range;
        if enabled {
            self.set_mode(BehaviorMode::Chase);
        }
    }

    /// Returns a uniformly random cardinal unit vector.
    pub(crate) fn random_cardinal(&mut self) -> Vec2 {
        CARDINALS[self.rng.usize(..CARDINALS.len())]
    }
}
