//! Player movement.
//!
//! The player moves on a fixed speed per tick from four directional inputs and
//! resolves walls one axis at a time, so it slides along a wall instead of
//! sticking to it.

use crate::collision::CollisionQuery;
use crate::config::PlayerConfig;
use delve_common::{Vec2, AABB};
use serde::{Deserialize, Serialize};

/// Directional input for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MoveIntent {
    /// Move up (negative y)
    pub up: bool,
    /// Move down (positive y)
    pub down: bool,
    /// Move left (negative x)
    pub left: bool,
    /// Move right (positive x)
    pub right: bool,
}

impl MoveIntent {
    /// No input.
    pub const IDLE: Self = Self {
        up: false,
        down: false,
        left: false,
        right: false,
    };

    /// Returns `true` if any direction is held.
    #[must_use]
    pub const fn is_moving(&self) -> bool {
        self.up || self.down || self.left || self.right
    }

    /// Computes the per-tick velocity.
    ///
    /// Down wins over up and right over left when both are held. Diagonal
    /// components are scaled by `diagonal_factor` and truncated toward zero.
    #[must_use]
    pub fn velocity(&self, speed: f32, diagonal_factor: f32) -> Vec2 {
        let mut dx = 0.0;
        let mut dy = 0.0;
        if self.up {
            dy = -speed;
        }
        if self.down {
            dy = speed;
        }
        if self.left {
            dx = -speed;
        }
        if self.right {
            dx = speed;
        }

        if dx != 0.0 && dy != 0.0 {
            dx = (dx * diagonal_factor).trunc();
            dy = (dy * diagonal_factor).trunc();
        }
        Vec2::new(dx, dy)
    }
}

/// The player character.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    position: Vec2,
    half_extents: Vec2,
    speed: f32,
    diagonal_factor: f32,
    invulnerable_ticks: u32,
}

impl Player {
    /// Creates a player centred at `position`.
    #[must_use]
    pub fn new(position: Vec2, config: &PlayerConfig) -> Self {
        Self {
            position,
            half_extents: Vec2::splat(config.half_extent),
            speed: config.speed,
            diagonal_factor: config.diagonal_factor,
            invulnerable_ticks: 0,
        }
    }

    /// Returns the centre position.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Teleports the player.
    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    /// Returns the movement speed.
    #[must_use]
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Returns the bounding box.
    #[must_use]
    pub fn bounding_box(&self) -> AABB {
        AABB::from_center(self.position, self.half_extents)
    }

    /// Returns `true` while contact damage is ignored.
    #[must_use]
    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable_ticks > 0
    }

    /// Returns the remaining invulnerability ticks.
    #[must_use]
    pub fn invulnerable_ticks(&self) -> u32 {
        self.invulnerable_ticks
    }

    /// Starts an invulnerability window.
    pub fn make_invulnerable(&mut self, ticks: u32) {
        self.invulnerable_ticks = ticks;
    }

    /// Advances one tick: counts down invulnerability, then moves.
    ///
    /// Each axis is applied separately and undone if the player box then
    /// overlaps a wall. Returns the distance actually travelled.
    pub fn update<C>(&mut self, intent: MoveIntent, walls: &C) -> Vec2
    where
        C: CollisionQuery + ?Sized,
    {
        self.invulnerable_ticks = self.invulnerable_ticks.saturating_sub(1);

        let start = self.position;
        let velocity = intent.velocity(self.speed, self.diagonal_factor);

        self.position.x += velocity.x;
        if walls.collides(&self.bounding_box()) {
            self.position.x = start.x;
        }

        self.position.y += velocity.y;
        if walls.collides(&self.bounding_box()) {
            self.position.y = start.y;
        }

        self.position - start
    }
}
