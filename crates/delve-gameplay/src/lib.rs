//! # Delve Gameplay
//!
//! Gameplay systems for Delve, a top-down dungeon crawler.
//!
//! This crate holds the whole simulation and has no rendering or input
//! dependencies:
//! - Enemy agents with chase, patrol, wander and guard behaviors
//! - Motion with wall rollback and re-aim
//! - Static wall collision with a grid broad phase
//! - Waypoint registry with JSON import and persistence
//! - Tile-map levels and the built-in dungeon
//! - Player movement, treasure, damage and run outcome
//! - The fixed-order tick loop

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod agent;
pub mod behavior;
pub mod collision;
pub mod config;
pub mod level;
pub mod motion;
pub mod player;
pub mod session;
pub mod simulation;
pub mod waypoints;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::agent::*;
    pub use crate::behavior::decide;
    pub use crate::collision::*;
    pub use crate::config::*;
    pub use crate::level::*;
    pub use crate::motion::{step, StepOutcome};
    pub use crate::player::*;
    pub use crate::session::*;
    pub use crate::simulation::*;
    pub use crate::waypoints::*;
}

pub use prelude::*;
