//! Per-tick decision making for enemy agents.
//!
//! [`decide`] runs once per tick, before motion is applied. Priority order:
//!
//! 1. Live pursuit when chasing is enabled and the target is inside detection
//!    range. The target position is remembered.
//! 2. Remembered pursuit while the memory is younger than the forget window.
//! 3. The idle behavior of the agent's mode.
//!
//! Pursuit aims diagonally at the target. Patrol and guard step along one axis
//! at a time, so idle movement stays grid-aligned.
//!
//! When the previous pursuit move was blocked, the side step queued by the
//! motion integrator replaces the pursuit heading for exactly one tick.

use crate::agent::{Agent, Behavior, Heading, PatrolRoute, Pursuit};
use delve_common::{dominant_axis_step, Vec2};
use tracing::debug;

/// Stand-still is one of the options a guard can roll.
const GUARD_CHOICES: [Vec2; 5] = [Vec2::X, Vec2::NEG_X, Vec2::Y, Vec2::NEG_Y, Vec2::ZERO];

/// Updates `agent`'s heading for this tick and returns what drove it.
pub fn decide(agent: &mut Agent, target: Option<Vec2>) -> Pursuit {
    agent.direction_change_timer = agent.direction_change_timer.saturating_add(1);

    let pursuit = match target {
        Some(target) if agent.chase_enabled => chase(agent, target),
        _ => Pursuit::None,
    };

    if pursuit == Pursuit::None {
        agent.detour = None;
        idle(agent);
    } else if let Some(detour) = agent.detour.take() {
        agent.heading = Heading::Unit(detour);
    }

    if pursuit != agent.pursuit {
        debug!(
            agent = %agent.id,
            from = ?agent.pursuit,
            to = ?pursuit,
            x = agent.position.x,
            y = agent.position.y,
            "pursuit changed"
        );
    }
    agent.pursuit = pursuit;
    pursuit
}

fn chase(agent: &mut Agent, target: Vec2) -> Pursuit {
    if agent.distance_to(target) < agent.detection_range {
        agent.memory.last_known = Some(target);
        agent.memory.ticks_since_lost = 0;
        pursue(agent, target);
        return Pursuit::Live;
    }

    match agent.memory.last_known {
        Some(remembered) if agent.memory.ticks_since_lost < agent.tuning.forget_after_ticks => {
            agent.memory.ticks_since_lost += 1;
            pursue(agent, remembered);
            Pursuit::Remembered
        },
        _ => Pursuit::None,
    }
}

/// Aims straight at `point`, pre-scaled by speed.
fn pursue(agent: &mut Agent, point: Vec2) {
    let delta = point - agent.position;
    let distance = delta.length();
    let velocity = if distance > 0.0 {
        delta / distance * agent.speed
    } else {
        Vec2::ZERO
    };
    agent.heading = Heading::Scaled(velocity);
}

fn idle(agent: &mut Agent) {
    match agent.behavior {
        Behavior::Chase | Behavior::Wander => wander(agent),
        Behavior::Patrol(_) => patrol(agent),
        Behavior::Guard { anchor, radius } => guard(agent, anchor, radius),
    }
}

fn timer_elapsed(agent: &Agent) -> bool {
    agent.direction_change_timer > agent.tuning.direction_change_interval
}

fn wander(agent: &mut Agent) {
    if timer_elapsed(agent) {
        agent.heading = Heading::Unit(agent.random_cardinal());
        agent.direction_change_timer = 0;
    }
}

fn patrol(agent: &mut Agent) {
    let Behavior::Patrol(route) = &mut agent.behavior else {
        return;
    };
    if route.is_empty() {
        *route = PatrolRoute::square(agent.spawn, agent.tuning.patrol_step);
        debug!(agent = %agent.id, "synthesized default patrol route");
    }
    let Some(point) = route.current() else {
        return;
    };

    let delta = point - agent.position;
    if delta.length() < agent.tuning.waypoint_reach {
        route.advance();
    } else {
        agent.heading = Heading::Unit(dominant_axis_step(delta));
    }
}

fn guard(agent: &mut Agent, anchor: Vec2, radius: f32) {
    let delta = anchor - agent.position;
    if delta.length() > radius {
        agent.heading = Heading::Unit(dominant_axis_step(delta));
    } else if timer_elapsed(agent) {
        let choice = GUARD_CHOICES[agent.rng.usize(..GUARD_CHOICES.len())];
        agent.heading = Heading::Unit(choice);
        agent.direction_change_timer = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::BehaviorMode;
    use crate::config::AgentConfig;
    use delve_common::{AgentId, CARDINALS};
    use proptest::prelude::*;

    fn agent_at(x: f32, y: f32, chase: bool) -> Agent {
        Agent::new(AgentId::from_raw(0), Vec2::new(x, y), chase, &AgentConfig::default(), 42)
    }

    fn approx(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn test_target_at_zero_distance_gives_zero_direction() {
        let mut agent = agent_at(100.0, 100.0, true);
        let pursuit = decide(&mut agent, Some(Vec2::new(100.0, 100.0)));
        assert_eq!(pursuit, Pursuit::Live);
        assert_eq!(agent.direction(), Vec2::ZERO);
        assert!(!agent.direction().is_nan());
    }

    #[test]
    fn test_live_pursuit_scales_by_speed() {
        let mut agent = agent_at(100.0, 100.0, true);
        decide(&mut agent, Some(Vec2::new(100.0, 200.0)));
        assert!(approx(agent.direction(), Vec2::new(0.0, 2.0)));
        assert_eq!(agent.memory().last_known, Some(Vec2::new(100.0, 200.0)));
        assert_eq!(agent.memory().ticks_since_lost, 0);
    }

    #[test]
    fn test_remembered_pursuit_expires_after_forget_window() {
        let mut agent = agent_at(0.0, 0.0, true);
        agent.set_speed(0.0);
        decide(&mut agent, Some(Vec2::new(100.0, 0.0)));

        let far = Some(Vec2::new(1000.0, 0.0));
        for tick in 1..=120 {
            assert_eq!(decide(&mut agent, far), Pursuit::Remembered, "tick {tick}");
            assert_eq!(agent.memory().ticks_since_lost, tick);
        }
        assert_eq!(decide(&mut agent, far), Pursuit::None);
        // Memory is kept even after giving up.
        assert_eq!(agent.memory().last_known, Some(Vec2::new(100.0, 0.0)));
        assert_eq!(agent.memory().ticks_since_lost, 120);
        assert!(agent.is_alerted());
    }

    #[test]
    fn test_remembered_pursuit_aims_at_last_known_position() {
        let mut agent = agent_at(0.0, 0.0, true);
        decide(&mut agent, Some(Vec2::new(0.0, 250.0)));
        agent.set_position(Vec2::new(0.0, 10.0));
        decide(&mut agent, Some(Vec2::new(400.0, 400.0)));
        assert_eq!(agent.pursuit(), Pursuit::Remembered);
        assert!(approx(agent.direction(), Vec2::new(0.0, 2.0)));
    }

    #[test]
    fn test_reacquiring_resets_memory_counter() {
        let mut agent = agent_at(0.0, 0.0, true);
        decide(&mut agent, Some(Vec2::new(50.0, 0.0)));
        decide(&mut agent, Some(Vec2::new(500.0, 0.0)));
        decide(&mut agent, Some(Vec2::new(500.0, 0.0)));
        assert_eq!(agent.memory().ticks_since_lost, 2);
        decide(&mut agent, Some(Vec2::new(60.0, 0.0)));
        assert_eq!(agent.memory().ticks_since_lost, 0);
    }

    #[test]
    fn test_chase_disabled_ignores_target() {
        let mut agent = agent_at(0.0, 0.0, false);
        agent.set_mode(BehaviorMode::Wander);
        let before = agent.direction();
        assert_eq!(decide(&mut agent, Some(Vec2::new(10.0, 0.0))), Pursuit::None);
        assert_eq!(agent.direction(), before);
        assert_eq!(agent.memory().last_known, None);
    }

    #[test]
    fn test_wander_changes_direction_only_after_interval() {
        let mut agent = agent_at(0.0, 0.0, false);
        agent.set_mode(BehaviorMode::Wander);
        let initial = agent.direction();
        for _ in 0..60 {
            decide(&mut agent, None);
            assert_eq!(agent.direction(), initial);
        }
        assert_eq!(agent.direction_change_timer(), 60);
        decide(&mut agent, None);
        assert_eq!(agent.direction_change_timer(), 0);
        assert!(CARDINALS.contains(&agent.direction()));
    }

    #[test]
    fn test_chase_mode_without_target_wanders() {
        let mut agent = agent_at(0.0, 0.0, true);
        for _ in 0..61 {
            decide(&mut agent, None);
        }
        assert_eq!(agent.direction_change_timer(), 0);
        assert_eq!(agent.pursuit(), Pursuit::None);
    }

    #[test]
    fn test_patrol_synthesizes_square_and_steps_one_axis() {
        let mut agent = agent_at(0.0, 0.0, false);
        agent.set_mode(BehaviorMode::Patrol);
        decide(&mut agent, None);

        let Behavior::Patrol(route) = agent.behavior() else {
            panic!("expected patrol");
        };
        assert_eq!(
            route.points(),
            &[
                Vec2::new(100.0, 0.0),
                Vec2::new(100.0, 100.0),
                Vec2::new(0.0, 100.0),
                Vec2::ZERO,
            ]
        );
        assert_eq!(agent.direction(), Vec2::X);
    }

    #[test]
    fn test_patrol_visits_points_in_cyclic_order() {
        let mut agent = agent_at(0.0, 0.0, false);
        agent.set_mode(BehaviorMode::Patrol);
        decide(&mut agent, None);

        let corners = [
            Vec2::new(100.0, 0.0),
            Vec2::new(100.0, 100.0),
            Vec2::new(0.0, 100.0),
            Vec2::ZERO,
        ];
        for (i, corner) in corners.iter().enumerate() {
            agent.set_position(*corner + Vec2::new(3.0, 0.0));
            decide(&mut agent, None);
            let Behavior::Patrol(route) = agent.behavior() else {
                panic!("expected patrol");
            };
            assert_eq!(route.index(), (i + 1) % 4);
        }
    }

    #[test]
    fn test_guard_returns_along_dominant_axis() {
        let mut agent = agent_at(200.0, 50.0, false);
        agent.set_guard_post(Vec2::new(50.0, 50.0), 100.0);
        decide(&mut agent, None);
        assert_eq!(agent.direction(), Vec2::NEG_X);
        assert_eq!(agent.heading().displacement(agent.speed()), Vec2::new(-2.0, 0.0));
    }

    #[test]
    fn test_guard_holds_inside_radius_until_timer() {
        let mut agent = agent_at(60.0, 50.0, false);
        agent.set_guard_post(Vec2::new(50.0, 50.0), 100.0);
        let initial = agent.direction();
        for _ in 0..60 {
            decide(&mut agent, None);
        }
        assert_eq!(agent.direction(), initial);
        decide(&mut agent, None);
        assert!(GUARD_CHOICES.contains(&agent.direction()));
        assert_eq!(agent.direction_change_timer(), 0);
    }

    proptest! {
        #[test]
        fn prop_live_pursuit_has_speed_magnitude(
            ax in -500.0f32..500.0, ay in -500.0f32..500.0,
            dx in -200.0f32..200.0, dy in -200.0f32..200.0,
            speed in 0.5f32..6.0,
        ) {
            prop_assume!(dx.hypot(dy) > 1e-2);
            let mut agent = agent_at(ax, ay, true);
            agent.set_speed(speed);
            let target = Vec2::new(ax + dx, ay + dy);
            prop_assert_eq!(decide(&mut agent, Some(target)), Pursuit::Live);

            let dir = agent.direction();
            prop_assert!((dir.length() - speed).abs() < 1e-3);
            prop_assert!(dir.dot(target - agent.position()) > 0.0);
        }

        #[test]
        fn prop_guard_stays_within_one_step_of_radius(
            sx in -300.0f32..300.0, sy in -300.0f32..300.0,
            radius in 20.0f32..150.0,
            seed in 0u64..1000,
        ) {
            let anchor = Vec2::ZERO;
            let mut agent = Agent::new(
                AgentId::from_raw(0),
                Vec2::new(sx, sy),
                false,
                &AgentConfig::default(),
                seed,
            );
            agent.set_guard_post(anchor, radius);

            // Let the agent return to its post, then watch steady state.
            for _ in 0..600 {
                decide(&mut agent, None);
                let step = agent.heading().displacement(agent.speed());
                agent.set_position(agent.position() + step);
            }
            for _ in 0..600 {
                decide(&mut agent, None);
                let step = agent.heading().displacement(agent.speed());
                agent.set_position(agent.position() + step);
                prop_assert!(agent.position().distance(anchor) <= radius + agent.speed() + 1e-3);
            }
        }
    }
}
