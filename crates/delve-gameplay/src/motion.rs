//! Applies an agent's decision to its position.
//!
//! A step is attempt, rollback, re-aim: the agent moves by its displacement,
//! and if the new box hits a wall both axes are restored and a new direction
//! is chosen for the next tick. This stands in for pathfinding and can
//! oscillate against concave walls.

use crate::agent::{Agent, Heading};
use crate::behavior::decide;
use crate::collision::CollisionQuery;
use delve_common::{step_sign, Vec2};
use tracing::trace;

/// Result of one motion step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepOutcome {
    /// Whether the agent's position changed
    pub moved: bool,
    /// Whether the attempted move hit a wall and was rolled back
    pub collided: bool,
}

/// Runs the behavior controller and applies the resulting move.
pub fn step<C>(agent: &mut Agent, target: Option<Vec2>, walls: &C) -> StepOutcome
where
    C: CollisionQuery + ?Sized,
{
    decide(agent, target);

    let before = agent.position;
    let displacement = agent.heading.displacement(agent.speed);
    agent.position = before + displacement;

    if !walls.collides(&agent.bounding_box()) {
        return StepOutcome {
            moved: displacement != Vec2::ZERO,
            collided: false,
        };
    }

    agent.position = before;
    let reaim = match target {
        Some(target) if agent.chase_enabled => {
            let side_step = side_step_toward(target - before);
            agent.detour = Some(side_step);
            side_step
        },
        _ => agent.random_cardinal(),
    };
    trace!(agent = %agent.id, x = reaim.x, y = reaim.y, "blocked, re-aiming");
    agent.heading = Heading::Unit(reaim);

    StepOutcome {
        moved: false,
        collided: true,
    }
}

/// Steps along the minor axis of `delta`, toward the target.
///
/// Direct chase prefers the major axis; when that is blocked, sliding along
/// the other axis is the only local way around the obstacle.
fn side_step_toward(delta: Vec2) -> Vec2 {
    if delta.x.abs() > delta.y.abs() {
        Vec2::new(0.0, step_sign(delta.y))
    } else {
        Vec2::new(step_sign(delta.x), 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{BehaviorMode, Pursuit};
    use crate::collision::WallLayer;
    use crate::config::AgentConfig;
    use delve_common::{AgentId, AABB, CARDINALS};

    fn agent_at(x: f32, y: f32, chase: bool) -> Agent {
        Agent::new(AgentId::from_raw(0), Vec2::new(x, y), chase, &AgentConfig::default(), 9)
    }

    #[test]
    fn test_chase_step_moves_by_speed() {
        let mut agent = agent_at(100.0, 100.0, true);
        let outcome = step(&mut agent, Some(Vec2::new(100.0, 200.0)), &Vec::<AABB>::new());
        assert_eq!(outcome, StepOutcome { moved: true, collided: false });
        assert!((agent.position() - Vec2::new(100.0, 102.0)).length() < 1e-4);
        assert!((agent.direction() - Vec2::new(0.0, 2.0)).length() < 1e-4);
    }

    #[test]
    fn test_guard_step_moves_toward_anchor() {
        let mut agent = agent_at(200.0, 50.0, false);
        agent.set_guard_post(Vec2::new(50.0, 50.0), 100.0);
        step(&mut agent, None, &Vec::<AABB>::new());
        assert_eq!(agent.direction(), Vec2::NEG_X);
        assert_eq!(agent.position(), Vec2::new(198.0, 50.0));
    }

    #[test]
    fn test_blocked_chase_reaims_along_minor_axis() {
        // Wall directly to the right; target further right and slightly below.
        let wall = AABB::from_corner(115.0, 0.0, 32.0, 300.0);
        let walls = vec![wall];
        let mut agent = agent_at(100.0, 100.0, true);
        let target = Vec2::new(250.0, 130.0);

        let outcome = step(&mut agent, Some(target), &walls);
        assert!(outcome.collided);
        assert!(!outcome.moved);
        assert_eq!(agent.position(), Vec2::new(100.0, 100.0));
        assert_eq!(agent.direction(), Vec2::Y);
        assert_eq!(agent.pursuit(), Pursuit::Live);
    }

    #[test]
    fn test_detour_overrides_pursuit_for_one_tick() {
        let walls = vec![AABB::from_corner(115.0, 0.0, 32.0, 300.0)];
        let mut agent = agent_at(100.0, 100.0, true);
        let target = Vec2::new(250.0, 130.0);
        step(&mut agent, Some(target), &walls);

        // The side step is a unit vector and still counts as live pursuit.
        assert_eq!(decide(&mut agent, Some(target)), Pursuit::Live);
        assert_eq!(agent.heading(), Heading::Unit(Vec2::Y));
        assert_eq!(agent.heading().displacement(agent.speed()), Vec2::new(0.0, 2.0));

        // Consumed: the following tick aims at the target again.
        assert_eq!(decide(&mut agent, Some(target)), Pursuit::Live);
        let direction = agent.direction();
        assert!((direction.length() - agent.speed()).abs() < 1e-4);
        assert!(direction.dot(target - agent.position()) > 0.0);
    }

    #[test]
    fn test_blocked_vertical_chase_reaims_along_x() {
        let walls = vec![AABB::from_corner(0.0, 115.0, 300.0, 32.0)];
        let mut agent = agent_at(100.0, 100.0, true);
        step(&mut agent, Some(Vec2::new(90.0, 250.0)), &walls);
        assert_eq!(agent.direction(), Vec2::NEG_X);
    }

    #[test]
    fn test_blocked_idle_picks_random_cardinal() {
        let mut agent = agent_at(100.0, 100.0, false);
        agent.set_mode(BehaviorMode::Guard);
        agent.set_guard_post(Vec2::new(400.0, 100.0), 10.0);
        let walls = WallLayer::new(vec![AABB::from_corner(115.0, 0.0, 32.0, 300.0)], 32.0);

        let outcome = step(&mut agent, None, &walls);
        assert!(outcome.collided);
        assert_eq!(agent.position(), Vec2::new(100.0, 100.0));
        assert!(CARDINALS.contains(&agent.direction()));
    }

    #[test]
    fn test_side_step_slides_past_wall_end() {
        // A short wall segment: blocked pursuit alternates with side steps
        // until the agent clears the bottom edge.
        let walls = vec![AABB::from_corner(115.0, 60.0, 32.0, 60.0)];
        let mut agent = agent_at(100.0, 100.0, true);
        let target = Vec2::new(300.0, 200.0);

        let mut passed = false;
        for _ in 0..200 {
            step(&mut agent, Some(target), &walls);
            if agent.position().x > 147.0 + 14.0 {
                passed = true;
                break;
            }
        }
        assert!(passed, "agent stuck at {:?}", agent.position());
    }

    #[test]
    fn test_zero_displacement_reports_not_moved() {
        let mut agent = agent_at(10.0, 10.0, true);
        let outcome = step(&mut agent, Some(Vec2::new(10.0, 10.0)), &Vec::<AABB>::new());
        assert_eq!(outcome, StepOutcome::default());
    }
}
