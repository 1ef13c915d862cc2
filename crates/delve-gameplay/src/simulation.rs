//! The tick loop.
//!
//! [`Simulation`] owns everything a level run needs and advances it one tick
//! at a time in a fixed order: player movement, treasure pickup, contact
//! damage, then every enemy in roster order. Nothing here is global; reset
//! rebuilds the run from the stored level and config.

use crate::agent::{Agent, AgentError, AgentResult};
use crate::collision::WallLayer;
use crate::config::SimulationConfig;
use crate::level::LevelLayout;
use crate::motion;
use crate::player::{MoveIntent, Player};
use crate::session::{Outcome, SessionState};
use crate::waypoints::WaypointRegistry;
use delve_common::{AgentId, PickupId, Vec2, AABB};
use tracing::{debug, info};

/// A treasure waiting to be picked up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pickup {
    /// Pickup id, stable for the run
    pub id: PickupId,
    /// Pickup bounds (half a tile, centred in its tile)
    pub bounds: AABB,
}

/// A running level.
#[derive(Debug, Clone)]
pub struct Simulation {
    config: SimulationConfig,
    layout: LevelLayout,
    walls: WallLayer,
    pickups: Vec<Pickup>,
    agents: Vec<Agent>,
    player: Player,
    session: SessionState,
    registry: WaypointRegistry,
    outcome: Outcome,
}

impl Simulation {
    /// Builds a run for `layout`.
    #[must_use]
    pub fn new(layout: LevelLayout, config: SimulationConfig) -> Self {
        let walls = layout.wall_layer();
        let registry = layout.to_registry();
        let mut sim = Self {
            player: Player::new(Vec2::ZERO, &config.player),
            session: SessionState::new(config.player.max_health),
            pickups: Vec::new(),
            agents: Vec::new(),
            outcome: Outcome::Playing,
            config,
            layout,
            walls,
            registry,
        };
        sim.populate();
        sim
    }

    /// Restarts the level: fresh player, enemies, treasures and counters.
    ///
    /// Waypoint registry edits made during the run are kept.
    pub fn reset(&mut self) {
        info!("resetting level");
        self.session = SessionState::new(self.config.player.max_health);
        self.outcome = Outcome::Playing;
        self.populate();
    }

    fn populate(&mut self) {
        let tile = self.layout.tile_size;
        let half_pickup = Vec2::splat(tile / 4.0);
        self.pickups = self
            .layout
            .treasures
            .iter()
            .enumerate()
            .map(|(i, &center)| Pickup {
                id: PickupId::from_raw(i as u32),
                bounds: AABB::from_center(center, half_pickup),
            })
            .collect();

        let spawn = self
            .layout
            .safe_player_spawn(Vec2::splat(self.config.player.half_extent));
        self.player = Player::new(spawn, &self.config.player);

        let mut rng = fastrand::Rng::with_seed(self.config.seed);
        let tuning = &self.config.agent;
        self.agents = self
            .layout
            .enemy_spawns
            .iter()
            .enumerate()
            .map(|(i, &spawn_point)| {
                let fast = rng.f64() < tuning.fast_chance;
                let mut agent = Agent::new(
                    AgentId::from_raw(i as u32),
                    spawn_point,
                    self.config.chase_enabled,
                    tuning,
                    rng.u64(..),
                );
                if fast {
                    agent.set_speed(tuning.fast_speed);
                }
                agent
            })
            .collect();

        info!(
            enemies = self.agents.len(),
            treasures = self.pickups.len(),
            x = spawn.x,
            y = spawn.y,
            "level ready"
        );
    }

    /// Advances one tick and returns the resulting outcome.
    ///
    /// `dt_ms` is clamped to the configured maximum. Once the run has ended
    /// ticks are ignored until [`Simulation::reset`].
    pub fn tick(&mut self, intent: MoveIntent, dt_ms: u64) -> Outcome {
        if self.outcome.is_finished() {
            return self.outcome;
        }

        self.session.advance(dt_ms.min(self.config.max_tick_ms));
        self.player.update(intent, &self.walls);
        self.collect_pickups();
        self.apply_contact_damage();

        let target = self.player.position();
        for agent in &mut self.agents {
            motion::step(agent, Some(target), &self.walls);
        }

        let outcome = self.session.outcome(self.config.treasures_to_win);
        if outcome != self.outcome {
            info!(
                ticks = self.session.ticks,
                health = self.session.health,
                treasures = self.session.treasures_collected,
                "run ended: {outcome}"
            );
            self.outcome = outcome;
        }
        self.outcome
    }

    fn collect_pickups(&mut self) {
        let player_box = self.player.bounding_box();
        let before = self.pickups.len();
        self.pickups.retain(|pickup| !pickup.bounds.overlaps(&player_box));
        let collected = before - self.pickups.len();
        if collected > 0 {
            self.session.collect(collected as u32);
            debug!(
                collected,
                total = self.session.treasures_collected,
                "treasure picked up"
            );
        }
    }

    fn apply_contact_damage(&mut self) {
        if self.player.is_invulnerable() {
            return;
        }
        let player_box = self.player.bounding_box();
        if let Some(agent) = self
            .agents
            .iter()
            .find(|agent| agent.bounding_box().overlaps(&player_box))
        {
            self.session.apply_damage(self.config.player.contact_damage);
            self.player
                .make_invulnerable(self.config.player.invulnerability_ticks);
            debug!(agent = %agent.id(), health = self.session.health, "player hit");
        }
    }

    /// Enables or disables chasing for every enemy.
    ///
    /// The detection range goes back to the configured default; enabling also
    /// puts every enemy in chase mode.
    pub fn set_chase_enabled(&mut self, enabled: bool) {
        let range = self.config.agent.detection_range;
        for agent in &mut self.agents {
            agent.set_chase_mode(enabled, range);
        }
        info!("chase mode {}", if enabled { "enabled" } else { "disabled" });
    }

    /// Returns the enemy roster.
    #[must_use]
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Looks up one enemy.
    #[must_use]
    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(id.index())
    }

    /// Looks up one enemy for tuning.
    pub fn agent_mut(&mut self, id: AgentId) -> AgentResult<&mut Agent> {
        self.agents.get_mut(id.index()).ok_or(AgentError::NotFound(id))
    }

    /// Returns the player.
    #[must_use]
    pub fn player(&self) -> &Player {
        &self.player
    }

    /// Returns the session counters.
    #[must_use]
    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Returns the current outcome.
    #[must_use]
    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// Returns the waypoint registry.
    #[must_use]
    pub fn registry(&self) -> &WaypointRegistry {
        &self.registry
    }

    /// Returns the waypoint registry for editing.
    pub fn registry_mut(&mut self) -> &mut WaypointRegistry {
        &mut self.registry
    }

    /// Returns the wall layer.
    #[must_use]
    pub fn walls(&self) -> &WallLayer {
        &self.walls
    }

    /// Returns the treasures still on the map.
    #[must_use]
    pub fn pickups(&self) -> &[Pickup] {
        &self.pickups
    }

    /// Returns the level being played.
    #[must_use]
    pub fn layout(&self) -> &LevelLayout {
        &self.layout
    }

    /// Returns the active configuration.
    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }
}
