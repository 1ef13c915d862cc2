//! Tile-map levels.
//!
//! A level is a list of text rows, one character per tile:
//!
//! | char | meaning |
//! |------|---------|
//! | `W` `B` `S` `L` `I` | wall (wood, brick, stone, lava, ice) |
//! | `T` | treasure, also registered as a waypoint |
//! | `E` | enemy spawn |
//! | `P` | preferred player spawn |
//! | `.` | floor, usable as a fallback player spawn |
//!
//! Any other character is floor that is never used as a spawn. Rows may be
//! ragged.

use crate::collision::{collides, WallLayer};
use crate::waypoints::WaypointRegistry;
use delve_common::{DelveError, DelveResult, Vec2, AABB};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

/// Fallback player spawn when nothing better is known.
pub const FALLBACK_SPAWN: Vec2 = Vec2::new(400.0, 400.0);

/// Built-in dungeon map.
pub const DEFAULT_DUNGEON: &[&str] = &[
    "WWWWWWWWWWWWWWWWWWWWWWWWWWWWWWWWWWWWWWWW",
    "W......................................W",
    "W..T.........BBBBB.....................W",
    "W...........B.....B........E...........W",
    "W..........B.......B...................W",
    "W.........B....T....B..................W",
    "W........BBBBB.BBBBB...................W",
    "W......................................W",
    "WSSSSSS................LLLLLLLLL.......W",
    "W.....S................L.......L.......W",
    "W.....S....E...........L...T...L.......W",
    "W.....S................L.......L.......W",
    "W.....S................LLLLLLLLL.......W",
    "W.....SSSSSSS..........................W",
    "W......................................W",
    "W..........................P...........W",
    "W......................................W",
    "W......................................W",
    "W......................................W",
    "W......................................W",
    "W......................................W",
    "W..T................E..................W",
    "W......................................W",
    "WWWWWWWWWWWWWWWWWWWWWWWWWWWWWWWWWWWWWWWW",
];

/// Errors that can occur while building a level.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LevelError {
    /// The map has no rows
    #[error("level map is empty")]
    Empty,

    /// Tile size must be positive and finite
    #[error("invalid tile size: {0}")]
    InvalidTileSize(f32),
}

/// Result type for level operations.
pub type LevelResult<T> = Result<T, LevelError>;

impl From<LevelError> for DelveError {
    fn from(err: LevelError) -> Self {
        DelveError::Level(err.to_string())
    }
}

/// Wall material. Only affects presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WallKind {
    /// `W`
    Wood,
    /// `B`
    Brick,
    /// `S`
    Stone,
    /// `L`
    Lava,
    /// `I`
    Ice,
}

impl WallKind {
    /// Maps a tile character to a wall kind.
    #[must_use]
    pub fn from_tile(tile: char) -> Option<Self> {
        match tile {
            'W' => Some(Self::Wood),
            'B' => Some(Self::Brick),
            'S' => Some(Self::Stone),
            'L' => Some(Self::Lava),
            'I' => Some(Self::Ice),
            _ => None,
        }
    }

    /// Returns the tile character for this kind.
    #[must_use]
    pub const fn tile(self) -> char {
        match self {
            Self::Wood => 'W',
            Self::Brick => 'B',
            Self::Stone => 'S',
            Self::Lava => 'L',
            Self::Ice => 'I',
        }
    }
}

/// One wall tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wall {
    /// Tile bounds
    pub bounds: AABB,
    /// Material
    pub kind: WallKind,
}

/// A parsed level.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelLayout {
    /// Tile size in pixels
    pub tile_size: f32,
    /// World width in pixels (widest row)
    pub width: f32,
    /// World height in pixels
    pub height: f32,
    /// Wall tiles in row-major order
    pub walls: Vec<Wall>,
    /// Treasure tile centres
    pub treasures: Vec<Vec2>,
    /// Enemy spawn tile centres
    pub enemy_spawns: Vec<Vec2>,
    /// Preferred player spawn (last `P` in the map)
    pub player_spawn: Option<Vec2>,
    /// Floor tile centres usable as fallback spawns, row-major
    pub safe_spawns: Vec<Vec2>,
}

impl LevelLayout {
    /// Parses a tile map.
    pub fn parse<S: AsRef<str>>(rows: &[S], tile_size: f32) -> LevelResult<Self> {
        if !(tile_size.is_finite() && tile_size > 0.0) {
            return Err(LevelError::InvalidTileSize(tile_size));
        }
        if rows.is_empty() {
            return Err(LevelError::Empty);
        }

        let columns = rows
            .iter()
            .map(|row| row.as_ref().chars().count())
            .max()
            .unwrap_or(0);
        let mut layout = Self {
            tile_size,
            width: columns as f32 * tile_size,
            height: rows.len() as f32 * tile_size,
            walls: Vec::new(),
            treasures: Vec::new(),
            enemy_spawns: Vec::new(),
            player_spawn: None,
            safe_spawns: Vec::new(),
        };

        let half = tile_size / 2.0;
        for (row_index, row) in rows.iter().enumerate() {
            for (col_index, tile) in row.as_ref().chars().enumerate() {
                let x = col_index as f32 * tile_size;
                let y = row_index as f32 * tile_size;
                let center = Vec2::new(x + half, y + half);

                if let Some(kind) = WallKind::from_tile(tile) {
                    layout.walls.push(Wall {
                        bounds: AABB::from_corner(x, y, tile_size, tile_size),
                        kind,
                    });
                    continue;
                }
                match tile {
                    'T' => layout.treasures.push(center),
                    'E' => layout.enemy_spawns.push(center),
                    'P' => layout.player_spawn = Some(center),
                    '.' => layout.safe_spawns.push(center),
                    _ => {},
                }
            }
        }

        info!(
            walls = layout.walls.len(),
            treasures = layout.treasures.len(),
            enemies = layout.enemy_spawns.len(),
            "parsed {}x{} level",
            columns,
            rows.len()
        );
        Ok(layout)
    }

    /// Parses newline-separated map text. Blank lines are skipped.
    pub fn parse_str(text: &str, tile_size: f32) -> LevelResult<Self> {
        let rows: Vec<&str> = text
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.is_empty())
            .collect();
        Self::parse(&rows, tile_size)
    }

    /// Builds the built-in dungeon.
    pub fn default_dungeon(tile_size: f32) -> LevelResult<Self> {
        Self::parse(DEFAULT_DUNGEON, tile_size)
    }

    /// Loads a map file.
    pub fn load_map_file<P: AsRef<Path>>(path: P, tile_size: f32) -> DelveResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let layout = Self::parse_str(&text, tile_size)?;
        info!("loaded level from {}", path.display());
        Ok(layout)
    }

    /// Returns every wall box.
    #[must_use]
    pub fn wall_boxes(&self) -> Vec<AABB> {
        self.walls.iter().map(|wall| wall.bounds).collect()
    }

    /// Builds the collision layer for this level.
    #[must_use]
    pub fn wall_layer(&self) -> WallLayer {
        WallLayer::new(self.wall_boxes(), self.tile_size)
    }

    /// Picks a spawn point where a player box of `half_extents` hits no wall.
    ///
    /// Tries the `P` tile, then each `.` tile in map order. If none is clear,
    /// the `P` tile is used anyway, or [`FALLBACK_SPAWN`] when there is none.
    #[must_use]
    pub fn safe_player_spawn(&self, half_extents: Vec2) -> Vec2 {
        let walls = self.wall_boxes();
        let is_clear = |pos: &Vec2| !collides(&AABB::from_center(*pos, half_extents), &walls);

        if let Some(preferred) = self.player_spawn.filter(|pos| is_clear(pos)) {
            return preferred;
        }
        if let Some(&spawn) = self.safe_spawns.iter().find(|pos| is_clear(*pos)) {
            return spawn;
        }

        warn!("no clear player spawn, using the preferred position");
        self.player_spawn.unwrap_or(FALLBACK_SPAWN)
    }

    /// Builds the waypoint registry annotated by this level.
    ///
    /// Treasures become waypoints, `E` tiles enemy spawns and the `P` tile a
    /// spawn point.
    #[must_use]
    pub fn to_registry(&self) -> WaypointRegistry {
        let mut registry = WaypointRegistry::new(self.width, self.height);
        for treasure in &self.treasures {
            registry.add_waypoint(treasure.x, treasure.y);
        }
        for spawn in &self.enemy_spawns {
            registry.add_enemy_spawn(spawn.x, spawn.y);
        }
        if let Some(spawn) = self.player_spawn {
            registry.add_spawn_point(spawn.x, spawn.y);
        }
        registry
    }
}
