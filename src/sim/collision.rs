//! Collision detection and response for circles
//!
//! Everything in the arena is a circle: actors, food, pickups, projectiles and
//! obstacles. Overlap is strict (`distance < r1 + r2`), so circles that merely
//! touch do not collide.

use std::sync::Arc;

use glam::Vec2;

use super::state::GameState;
use crate::clamp_to_world;

/// Result of a collision check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether a collision occurred
    pub hit: bool,
    /// Contact point on the second circle's surface
    pub point: Vec2,
    /// Unit normal pointing from the second circle towards the first
    pub normal: Vec2,
    /// Penetration depth (for position correction)
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            point: Vec2::ZERO,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// Strict circle overlap test
#[inline]
pub fn circles_overlap(a_pos: Vec2, a_radius: f32, b_pos: Vec2, b_radius: f32) -> bool {
    a_pos.distance_squared(b_pos) < (a_radius + b_radius) * (a_radius + b_radius)
}

/// Check collision of circle `a` against circle `b`
///
/// Concentric circles report a miss: there is no direction to push along.
pub fn circle_collision(a_pos: Vec2, a_radius: f32, b_pos: Vec2, b_radius: f32) -> CollisionResult {
    let offset = a_pos - b_pos;
    let dist = offset.length();
    let min_dist = a_radius + b_radius;
    if dist >= min_dist || dist <= 0.0 {
        return CollisionResult::miss();
    }
    let normal = offset / dist;
    CollisionResult {
        hit: true,
        point: b_pos + normal * b_radius,
        normal,
        penetration: min_dist - dist,
    }
}

/// Kinematics: bots steer to their target, humans follow their move
/// direction. Everyone ends clamped inside the world.
pub fn move_entities(state: &mut GameState, dt: f32) {
    let cfg = Arc::clone(&state.config);
    let size = cfg.world_size();
    for entity in state.entities.iter_mut().filter(|e| e.alive) {
        let speed = entity.speed(&cfg);
        let next = match entity.brain() {
            Some(brain) => brain.steer(entity.pos, speed, dt),
            None => entity.pos + entity.move_dir.clamp_length_max(1.0) * speed * dt,
        };
        entity.pos = clamp_to_world(next, entity.radius(&cfg.entity), size);
    }
}

/// Entities eat every live food they overlap
pub fn resolve_food(state: &mut GameState) {
    let cfg = Arc::clone(&state.config);
    for entity in state.entities.iter_mut().filter(|e| e.alive) {
        let radius = entity.radius(&cfg.entity);
        let gain = entity.stats().gain_multiplier;
        for food in state.food.iter_mut().filter(|f| f.alive) {
            if circles_overlap(entity.pos, radius, food.pos, food.radius) {
                entity.gain(food.nutrition * gain);
                food.alive = false;
            }
        }
    }
}

/// Push entities out of obstacles. Each obstacle is resolved once, in order,
/// with no iteration to a global fixpoint. The result is clamped back into
/// the world, so an obstacle near the edge may still overlap.
pub fn resolve_obstacles(state: &mut GameState) {
    let cfg = Arc::clone(&state.config);
    let size = cfg.world_size();
    for entity in state.entities.iter_mut().filter(|e| e.alive) {
        let radius = entity.radius(&cfg.entity);
        for obstacle in &state.obstacles {
            let result = circle_collision(entity.pos, radius, obstacle.pos, obstacle.radius);
            if result.hit {
                entity.pos += result.normal * result.penetration;
            }
        }
        entity.pos = clamp_to_world(entity.pos, radius, size);
    }
}

/// Collision pass: food pickup, then obstacle push-out
pub fn update(state: &mut GameState) {
    resolve_food(state);
    resolve_obstacles(state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{Food, Obstacle};
    use crate::sim::testutil::{add_actor, empty_state};

    fn food_at(id: u32, pos: Vec2, nutrition: f32) -> Food {
        Food {
            id,
            pos,
            radius: 4.0,
            nutrition,
            hue: 0,
            alive: true,
        }
    }

    #[test]
    fn test_circle_collision_hit() {
        let result = circle_collision(Vec2::new(15.0, 0.0), 10.0, Vec2::ZERO, 10.0);
        assert!(result.hit);
        assert_eq!(result.normal, Vec2::X);
        assert!((result.penetration - 5.0).abs() < 1e-5);
        assert_eq!(result.point, Vec2::new(10.0, 0.0));
    }

    #[test]
    fn test_touching_is_not_overlap() {
        assert!(!circle_collision(Vec2::new(20.0, 0.0), 10.0, Vec2::ZERO, 10.0).hit);
        assert!(!circles_overlap(Vec2::new(20.0, 0.0), 10.0, Vec2::ZERO, 10.0));
        assert!(circles_overlap(Vec2::new(19.9, 0.0), 10.0, Vec2::ZERO, 10.0));
    }

    #[test]
    fn test_concentric_is_miss() {
        assert!(!circle_collision(Vec2::ONE, 10.0, Vec2::ONE, 30.0).hit);
    }

    #[test]
    fn test_food_pickup_applies_gain_multiplier() {
        let mut state = empty_state();
        let i = add_actor(&mut state, Vec2::new(500.0, 500.0), 20.0, false);
        state.food.push(food_at(1, Vec2::new(505.0, 500.0), 5.0));
        state.food.push(food_at(2, Vec2::new(900.0, 500.0), 1.0));

        resolve_food(&mut state);
        assert_eq!(state.entities[i].mass, 25.0);
        assert!(!state.food[0].alive);
        assert!(state.food[1].alive);
    }

    #[test]
    fn test_obstacle_push_out() {
        let mut state = empty_state();
        let i = add_actor(&mut state, Vec2::new(1000.0, 1000.0), 100.0, false);
        state.obstacles.push(Obstacle {
            id: 50,
            pos: Vec2::new(1030.0, 1000.0),
            radius: 30.0,
            health: 60.0,
        });

        resolve_obstacles(&mut state);
        // radius 40 + 30 = 70 apart after the push
        let pos = state.entities[i].pos;
        assert!((pos.x - 960.0).abs() < 1e-3, "{pos:?}");
        assert_eq!(pos.y, 1000.0);
    }

    #[test]
    fn test_push_out_stays_in_world() {
        let mut state = empty_state();
        let i = add_actor(&mut state, Vec2::new(20.0, 1000.0), 20.0, false);
        state.obstacles.push(Obstacle {
            id: 51,
            pos: Vec2::new(40.0, 1000.0),
            radius: 40.0,
            health: 80.0,
        });

        resolve_obstacles(&mut state);
        let radius = state.entities[i].radius(&state.config.entity);
        let pos = state.entities[i].pos;
        assert!((pos.x - radius).abs() < 1e-4, "{pos:?}");
        assert_eq!(pos.y, 1000.0);
    }

    #[test]
    fn test_human_moves_and_clamps() {
        let mut state = empty_state();
        let i = add_actor(&mut state, Vec2::new(100.0, 3000.0), 20.0, true);
        state.entities[i].move_dir = Vec2::NEG_X;
        move_entities(&mut state, 1.0);
        let radius = state.entities[i].radius(&state.config.entity);
        assert!((state.entities[i].pos.x - radius).abs() < 1e-4);
    }

    #[test]
    fn test_bot_steers_without_overshoot() {
        let mut state = empty_state();
        let i = add_actor(&mut state, Vec2::new(1000.0, 1000.0), 20.0, false);
        if let Some(brain) = state.entities[i].brain_mut() {
            brain.target = Vec2::new(1010.0, 1000.0);
        }
        move_entities(&mut state, 1.0);
        assert_eq!(state.entities[i].pos, Vec2::new(1010.0, 1000.0));
    }
}
