//! Waypoint registry: points of interest annotated on a level.
//!
//! The registry stores three insertion-ordered point lists (waypoints, player
//! spawn points, enemy spawns) plus the world size. It is used for level
//! annotation and debug overlays only; movement never reads it.
//!
//! Import is lenient. Two document shapes are understood:
//!
//! - a Tiled-style map with a `layers` array (`waypoints` layer objects carry a
//!   `polyline`, `spawns` and `enemies` layer objects carry `x`/`y`);
//! - the flat document written by [`WaypointRegistry::save_to_file`].
//!
//! Missing coordinates default to zero. A document that is not a JSON object
//! is logged and yields an empty registry.

use delve_common::{DelveError, DelveResult, Vec2};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Result of a nearest-waypoint query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestWaypoint {
    /// The waypoint
    pub point: Vec2,
    /// Euclidean distance from the query point
    pub distance: f32,
    /// Index of the waypoint in insertion order
    pub index: usize,
}

/// On-disk layout of the registry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryDocument {
    /// Generic waypoints as `[x, y]`
    pub waypoints: Vec<[f32; 2]>,
    /// Player spawn points as `[x, y]`
    pub spawn_points: Vec<[f32; 2]>,
    /// Enemy spawn points as `[x, y]`
    pub enemy_spawns: Vec<[f32; 2]>,
    /// World width in pixels
    pub width: f32,
    /// World height in pixels
    pub height: f32,
}

/// Flat store of level points of interest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WaypointRegistry {
    waypoints: Vec<Vec2>,
    spawn_points: Vec<Vec2>,
    enemy_spawns: Vec<Vec2>,
    width: f32,
    height: f32,
}

impl WaypointRegistry {
    /// Creates an empty registry for a world of the given size.
    #[must_use]
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// Returns the world width.
    #[must_use]
    pub const fn width(&self) -> f32 {
        self.width
    }

    /// Returns the world height.
    #[must_use]
    pub const fn height(&self) -> f32 {
        self.height
    }

    /// Sets the world size.
    pub fn set_size(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
    }

    /// Returns the generic waypoints.
    #[must_use]
    pub fn waypoints(&self) -> &[Vec2] {
        &self.waypoints
    }

    /// Returns the player spawn points.
    #[must_use]
    pub fn spawn_points(&self) -> &[Vec2] {
        &self.spawn_points
    }

    /// Returns the enemy spawn points.
    #[must_use]
    pub fn enemy_spawns(&self) -> &[Vec2] {
        &self.enemy_spawns
    }

    /// Appends a waypoint.
    pub fn add_waypoint(&mut self, x: f32, y: f32) {
        self.waypoints.push(Vec2::new(x, y));
    }

    /// Appends a player spawn point.
    pub fn add_spawn_point(&mut self, x: f32, y: f32) {
        self.spawn_points.push(Vec2::new(x, y));
    }

    /// Appends an enemy spawn point.
    pub fn add_enemy_spawn(&mut self, x: f32, y: f32) {
        self.enemy_spawns.push(Vec2::new(x, y));
    }

    /// Removes all waypoints.
    pub fn clear_waypoints(&mut self) {
        self.waypoints.clear();
    }

    /// Removes all player spawn points.
    pub fn clear_spawn_points(&mut self) {
        self.spawn_points.clear();
    }

    /// Removes all enemy spawn points.
    pub fn clear_enemy_spawns(&mut self) {
        self.enemy_spawns.clear();
    }

    /// Finds the waypoint closest to `point`.
    ///
    /// Ties keep the earliest waypoint. Returns `None` only when there are no
    /// waypoints.
    #[must_use]
    pub fn nearest(&self, point: Vec2) -> Option<NearestWaypoint> {
        let mut best: Option<NearestWaypoint> = None;
        for (index, &waypoint) in self.waypoints.iter().enumerate() {
            let distance = waypoint.distance(point);
            if best.map_or(true, |b| distance < b.distance) {
                best = Some(NearestWaypoint {
                    point: waypoint,
                    distance,
                    index,
                });
            }
        }
        best
    }

    /// Returns the waypoints from `start` to `end`, inclusive.
    ///
    /// When `start > end` the path wraps: the tail from `start` followed by the
    /// head up to `end`. Negative indices and `end >= len` give an empty
    /// result; a `start` past the end behaves like slicing.
    #[must_use]
    pub fn path(&self, start: i64, end: i64) -> Vec<Vec2> {
        let len = self.waypoints.len() as i64;
        if start < 0 || end < 0 || end >= len {
            return Vec::new();
        }
        let (start, end) = (start as usize, end as usize);

        if start <= end {
            self.waypoints
                .get(start..=end)
                .map(<[Vec2]>::to_vec)
                .unwrap_or_default()
        } else {
            let tail = self.waypoints.get(start..).unwrap_or(&[]);
            let head = self.waypoints.get(..=end).unwrap_or(&[]);
            tail.iter().chain(head).copied().collect()
        }
    }

    /// Checks if a position lies within the world bounds (edges included).
    #[must_use]
    pub fn is_position_valid(&self, x: f32, y: f32) -> bool {
        (0.0..=self.width).contains(&x) && (0.0..=self.height).contains(&y)
    }

    /// Converts the registry into its on-disk layout.
    #[must_use]
    pub fn to_document(&self) -> RegistryDocument {
        let pairs = |points: &[Vec2]| points.iter().map(|p| p.to_array()).collect();
        RegistryDocument {
            waypoints: pairs(&self.waypoints),
            spawn_points: pairs(&self.spawn_points),
            enemy_spawns: pairs(&self.enemy_spawns),
            width: self.width,
            height: self.height,
        }
    }

    /// Builds a registry from a structured document.
    ///
    /// Never fails: malformed input is logged and produces empty collections.
    #[must_use]
    pub fn from_json_value(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            warn!("level data is not a JSON object, using an empty registry");
            return Self::default();
        };

        match Self::from_object(object) {
            Ok(registry) => registry,
            Err(reason) => {
                warn!("error processing level data: {reason}; using an empty registry");
                Self::default()
            },
        }
    }

    /// Parses a JSON string; parse errors yield an empty registry.
    #[must_use]
    pub fn from_json_str(text: &str) -> Self {
        match serde_json::from_str::<Value>(text) {
            Ok(value) => Self::from_json_value(&value),
            Err(e) => {
                warn!("failed to parse level data: {e}");
                Self::default()
            },
        }
    }

    fn from_object(object: &Map<String, Value>) -> Result<Self, String> {
        let mut registry = Self::default();

        if let Some(layers) = object.get("layers") {
            let layers = layers.as_array().ok_or("`layers` is not an array")?;
            for layer in layers {
                registry.import_layer(layer)?;
            }
        } else if let Some(waypoints) = object.get("waypoints") {
            registry.waypoints = points_from_list(waypoints, "waypoints")?;
        }

        if let Some(spawns) = object.get("spawn_points") {
            registry.spawn_points = points_from_list(spawns, "spawn_points")?;
        }
        if let Some(spawns) = object.get("enemy_spawns") {
            registry.enemy_spawns = points_from_list(spawns, "enemy_spawns")?;
        }

        registry.width = coordinate(object.get("width"));
        registry.height = coordinate(object.get("height"));
        Ok(registry)
    }

    fn import_layer(&mut self, layer: &Value) -> Result<(), String> {
        let layer = layer.as_object().ok_or("layer is not an object")?;
        let name = layer.get("name").and_then(Value::as_str).unwrap_or_default();
        let objects = match layer.get("objects") {
            Some(objects) => objects.as_array().ok_or("`objects` is not an array")?.as_slice(),
            None => &[],
        };

        match name {
            "waypoints" => {
                for polyline in objects.iter().filter_map(|obj| obj.get("polyline")) {
                    match polyline.as_array() {
                        Some(points) => self.waypoints.extend(points.iter().map(point_from_value)),
                        None => warn!("waypoint polyline is not an array, skipping"),
                    }
                }
            },
            "spawns" => self.spawn_points.extend(objects.iter().map(point_from_value)),
            "enemies" => self.enemy_spawns.extend(objects.iter().map(point_from_value)),
            _ => {},
        }
        Ok(())
    }

    /// Loads a registry from a JSON file.
    ///
    /// I/O and parse failures are logged and produce an empty registry.
    #[must_use]
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(text) => {
                let registry = Self::from_json_str(&text);
                info!(
                    waypoints = registry.waypoints.len(),
                    spawns = registry.spawn_points.len(),
                    enemy_spawns = registry.enemy_spawns.len(),
                    "loaded world data from {}",
                    path.display()
                );
                registry
            },
            Err(e) => {
                warn!("failed to load world data from {}: {e}", path.display());
                Self::default()
            },
        }
    }

    /// Saves the registry as pretty-printed JSON.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> DelveResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(&self.to_document())
            .map_err(|e| DelveError::Serialization(e.to_string()))?;
        fs::write(path, contents)?;
        info!("saved world data to {}", path.display());
        Ok(())
    }
}

fn coordinate(value: Option<&Value>) -> f32 {
    value.and_then(Value::as_f64).unwrap_or(0.0) as f32
}

/// Reads `[x, y]` or `{"x": .., "y": ..}`; anything missing is zero.
fn point_from_value(value: &Value) -> Vec2 {
    match value {
        Value::Array(items) => Vec2::new(coordinate(items.first()), coordinate(items.get(1))),
        Value::Object(map) => Vec2::new(coordinate(map.get("x")), coordinate(map.get("y"))),
        _ => Vec2::ZERO,
    }
}

fn points_from_list(value: &Value, key: &str) -> Result<Vec<Vec2>, String> {
    value
        .as_array()
        .map(|items| items.iter().map(point_from_value).collect())
        .ok_or_else(|| format!("`{key}` is not an array"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn registry_with(points: &[(f32, f32)]) -> WaypointRegistry {
        let mut registry = WaypointRegistry::new(800.0, 600.0);
        for &(x, y) in points {
            registry.add_waypoint(x, y);
        }
        registry
    }

    fn tiled_sample() -> Value {
        json!({
            "layers": [
                {
                    "name": "waypoints",
                    "objects": [
                        {"polyline": [
                            {"x": 100, "y": 150},
                            {"x": 200, "y": 250},
                            {"x": 300, "y": 100},
                            {"x": 400, "y": 200}
                        ]},
                        {"polyline": [{"x": 500, "y": 300}, {"x": 600}]}
                    ]
                },
                {"name": "spawns", "objects": [{"x": 50, "y": 50}, {"x": 750, "y": 550}]},
                {"name": "enemies", "objects": [{"x": 200, "y": 200}, {"x": 400, "y": 400}, {"y": 7}]},
                {"name": "decor", "objects": [{"x": 1, "y": 1}]}
            ]
        })
    }

    #[test]
    fn test_nearest_empty_registry() {
        assert_eq!(WaypointRegistry::default().nearest(Vec2::ZERO), None);
    }

    #[test]
    fn test_nearest_single_point() {
        let registry = registry_with(&[(3.0, 4.0)]);
        let nearest = registry.nearest(Vec2::new(1000.0, -50.0)).expect("one waypoint");
        assert_eq!(nearest.index, 0);
        assert_eq!(nearest.point, Vec2::new(3.0, 4.0));
    }

    #[test]
    fn test_nearest_ties_keep_first() {
        let registry = registry_with(&[(10.0, 0.0), (-10.0, 0.0), (0.0, 3.0)]);
        let nearest = registry.nearest(Vec2::new(0.0, -3.0)).expect("waypoints");
        // (10,0) and (-10,0) are farther than (0,3) at distance 6.
        assert_eq!(nearest.index, 2);

        let nearest = registry.nearest(Vec2::ZERO).expect("waypoints");
        assert_eq!(nearest.index, 2);

        let tied = registry_with(&[(5.0, 0.0), (-5.0, 0.0)]);
        assert_eq!(tied.nearest(Vec2::ZERO).map(|n| n.index), Some(0));
    }

    #[test]
    fn test_path_forward_and_wraparound() {
        let registry = registry_with(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (3.0, 0.0)]);
        let xs = |path: Vec<Vec2>| path.iter().map(|p| p.x as i32).collect::<Vec<_>>();

        assert_eq!(xs(registry.path(1, 2)), vec![1, 2]);
        assert_eq!(xs(registry.path(2, 2)), vec![2]);
        assert_eq!(xs(registry.path(2, 1)), vec![2, 3, 0, 1]);
        assert_eq!(xs(registry.path(3, 0)), vec![3, 0]);
    }

    #[test]
    fn test_path_rejects_bad_bounds() {
        let registry = registry_with(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]);
        assert!(registry.path(-1, 1).is_empty());
        assert!(registry.path(0, 3).is_empty());
        assert!(WaypointRegistry::default().path(0, 0).is_empty());
        assert!(registry.path(0, -1).is_empty());
        assert!(registry.path(2, -2).is_empty());
        // A start past the end is not rejected; only the head remains.
        assert_eq!(registry.path(7, 1).len(), 2);
    }

    #[test]
    fn test_is_position_valid() {
        let registry = WaypointRegistry::new(100.0, 50.0);
        assert!(registry.is_position_valid(0.0, 0.0));
        assert!(registry.is_position_valid(100.0, 50.0));
        assert!(!registry.is_position_valid(100.5, 10.0));
        assert!(!registry.is_position_valid(10.0, -1.0));
    }

    #[test]
    fn test_import_tiled_layers() {
        let registry = WaypointRegistry::from_json_value(&tiled_sample());
        assert_eq!(registry.waypoints().len(), 6);
        assert_eq!(registry.waypoints()[5], Vec2::new(600.0, 0.0));
        assert_eq!(registry.spawn_points(), &[Vec2::new(50.0, 50.0), Vec2::new(750.0, 550.0)]);
        assert_eq!(registry.enemy_spawns().len(), 3);
        assert_eq!(registry.enemy_spawns()[2], Vec2::new(0.0, 7.0));
    }

    #[test]
    fn test_import_flat_document() {
        let registry = WaypointRegistry::from_json_value(&json!({
            "waypoints": [[1, 2], {"x": 3}],
            "spawn_points": [[5, 6]],
            "enemy_spawns": [],
            "width": 640,
            "height": 480
        }));
        assert_eq!(registry.waypoints(), &[Vec2::new(1.0, 2.0), Vec2::new(3.0, 0.0)]);
        assert_eq!(registry.spawn_points(), &[Vec2::new(5.0, 6.0)]);
        assert!(registry.enemy_spawns().is_empty());
        assert!((registry.width() - 640.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_import_malformed_is_empty() {
        assert_eq!(WaypointRegistry::from_json_value(&json!([1, 2, 3])), WaypointRegistry::default());
        assert_eq!(
            WaypointRegistry::from_json_value(&json!({"layers": 5})),
            WaypointRegistry::default()
        );
        assert_eq!(
            WaypointRegistry::from_json_value(&json!({"waypoints": [[1, 1]], "spawn_points": "x"})),
            WaypointRegistry::default()
        );
        assert_eq!(WaypointRegistry::from_json_str("{not json"), WaypointRegistry::default());
    }

    #[test]
    fn test_clear_collections() {
        let mut registry = WaypointRegistry::from_json_value(&tiled_sample());
        registry.clear_waypoints();
        registry.clear_spawn_points();
        registry.clear_enemy_spawns();
        assert!(registry.waypoints().is_empty());
        assert!(registry.spawn_points().is_empty());
        assert!(registry.enemy_spawns().is_empty());
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("world").join("registry.json");

        let mut registry = registry_with(&[(16.0, 48.0), (80.0, 112.0)]);
        registry.add_spawn_point(400.0, 400.0);
        registry.add_enemy_spawn(208.0, 112.0);
        registry.save_to_file(&path).expect("save");

        let text = std::fs::read_to_string(&path).expect("read back");
        let value: Value = serde_json::from_str(&text).expect("valid json");
        assert_eq!(value["waypoints"][1], json!([80.0, 112.0]));
        assert_eq!(value["width"], json!(800.0));

        assert_eq!(WaypointRegistry::load_from_file(&path), registry);
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let registry = WaypointRegistry::load_from_file(dir.path().join("missing.json"));
        assert_eq!(registry, WaypointRegistry::default());
    }

    proptest! {
        #[test]
        fn prop_wraparound_length(len in 1usize..20, a in 0usize..20, b in 0usize..20) {
            let start = a % len;
            let end = b % len;
            let points: Vec<(f32, f32)> = (0..len).map(|i| (i as f32, 0.0)).collect();
            let registry = registry_with(&points);
            let path = registry.path(start as i64, end as i64);
            let expected = if start <= end { end - start + 1 } else { len - start + end + 1 };
            prop_assert_eq!(path.len(), expected);
            prop_assert_eq!(path.first().map(|p| p.x as usize), Some(start));
            prop_assert_eq!(path.last().map(|p| p.x as usize), Some(end));
        }
    }
}
