//! Static collision queries against the wall layer.
//!
//! The contract is a plain overlap test: a box is blocked if it strictly
//! overlaps any obstacle. [`WallLayer`] adds a uniform grid broad phase so the
//! per-tick cost stays flat as maps grow, without changing the answer.

use delve_common::AABB;
use std::collections::HashMap;

/// Collision query interface for static obstacles.
///
/// Implementations never mutate the obstacle set; the simulation treats it as
/// read-only between level loads.
pub trait CollisionQuery {
    /// Returns `true` if `aabb` overlaps any obstacle.
    fn collides(&self, aabb: &AABB) -> bool;
}

/// Returns `true` on the first obstacle that overlaps `aabb`.
#[must_use]
pub fn collides(aabb: &AABB, obstacles: &[AABB]) -> bool {
    obstacles.iter().any(|obstacle| aabb.overlaps(obstacle))
}

impl CollisionQuery for [AABB] {
    fn collides(&self, aabb: &AABB) -> bool {
        collides(aabb, self)
    }
}

impl CollisionQuery for Vec<AABB> {
    fn collides(&self, aabb: &AABB) -> bool {
        collides(aabb, self)
    }
}

/// Static obstacles bucketed into a uniform grid.
#[derive(Debug, Clone, Default)]
pub struct WallLayer {
    /// All obstacle boxes, in insertion order
    obstacles: Vec<AABB>,
    /// Grid cell size in world units
    cell_size: f32,
    /// Obstacle indices per grid cell
    cells: HashMap<(i32, i32), Vec<usize>>,
}

impl WallLayer {
    /// Builds a wall layer with the given broad-phase cell size.
    ///
    /// A non-positive cell size falls back to 32.
    #[must_use]
    pub fn new(obstacles: Vec<AABB>, cell_size: f32) -> Self {
        let cell_size = if cell_size > 0.0 { cell_size } else { 32.0 };
        let mut layer = Self {
            obstacles: Vec::with_capacity(obstacles.len()),
            cell_size,
            cells: HashMap::new(),
        };
        for obstacle in obstacles {
            layer.insert(obstacle);
        }
        layer
    }

    fn insert(&mut self, obstacle: AABB) {
        let index = self.obstacles.len();
        let (min, max) = self.cell_range(&obstacle);
        for cy in min.1..=max.1 {
            for cx in min.0..=max.0 {
                self.cells.entry((cx, cy)).or_default().push(index);
            }
        }
        self.obstacles.push(obstacle);
    }

    fn cell_range(&self, aabb: &AABB) -> ((i32, i32), (i32, i32)) {
        let to_cell = |v: f32| (v / self.cell_size).floor() as i32;
        (
            (to_cell(aabb.min_x), to_cell(aabb.min_y)),
            (to_cell(aabb.max_x), to_cell(aabb.max_y)),
        )
    }

    /// Returns every obstacle box.
    #[must_use]
    pub fn obstacles(&self) -> &[AABB] {
        &self.obstacles
    }

    /// Returns the number of obstacles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    /// Returns `true` if the layer holds no obstacles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }
}

impl CollisionQuery for WallLayer {
    fn collides(&self, aabb: &AABB) -> bool {
        let (min, max) = self.cell_range(aabb);
        for cy in min.1..=max.1 {
            for cx in min.0..=max.0 {
                let Some(bucket) = self.cells.get(&(cx, cy)) else {
                    continue;
                };
                if bucket
                    .iter()
                    .filter_map(|&i| self.obstacles.get(i))
                    .any(|obstacle| aabb.overlaps(obstacle))
                {
                    return true;
                }
            }
        }
        false
    }
}
