//! Utility-scoring bot AI
//!
//! Every candidate action gets a score; the highest wins and ties go to the
//! candidate considered first. Scoring is a pure function of a [`WorldView`]
//! so it can be tested without a running world.

use std::sync::Arc;

use glam::Vec2;
use rand::Rng;
use serde::Serialize;

use super::state::{EntityId, GameState};
use crate::config::SimConfig;
use crate::{random_point, random_range, random_unit};

/// Per-bot temperament, fixed for the bot's lifetime
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Personality {
    pub aggressiveness: f32,
    pub caution: f32,
    pub food_focus: f32,
    /// Seconds between decisions
    pub reaction_time: f32,
    /// Target noise, as a fraction of 50 world units
    pub jitter: f32,
}

impl Personality {
    pub fn random(rng: &mut impl Rng) -> Self {
        Self {
            aggressiveness: random_range(rng, 0.2, 0.8),
            caution: random_range(rng, 0.3, 0.7),
            food_focus: random_range(rng, 0.4, 0.9),
            reaction_time: random_range(rng, 0.15, 0.40),
            jitter: random_range(rng, 0.05, 0.2),
        }
    }

    /// Middle-of-the-road temperament used by the autopilot
    pub fn balanced() -> Self {
        Self {
            aggressiveness: 0.5,
            caution: 0.5,
            food_focus: 0.65,
            reaction_time: 0.25,
            jitter: 0.1,
        }
    }
}

/// What the bot is currently going for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Goal {
    FleeZone,
    Evade(EntityId),
    Hunt(EntityId),
    Buff,
    Equipment,
    Food,
    Wander,
}

/// Winning candidate of one scoring round
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub goal: Goal,
    pub target: Vec2,
    pub score: f32,
}

/// Another actor as seen by a bot
#[derive(Debug, Clone, Copy)]
pub struct Sighting {
    pub id: EntityId,
    pub pos: Vec2,
    pub mass: f32,
}

/// Everything a bot perceives when deciding
#[derive(Debug, Clone, Default)]
pub struct WorldView {
    pub pos: Vec2,
    pub mass: f32,
    pub outside_zone: bool,
    pub zone_center: Vec2,
    pub others: Vec<Sighting>,
    pub food: Vec<Vec2>,
    pub buffs: Vec<Vec2>,
    pub equipment: Vec<Vec2>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BotBrain {
    pub personality: Personality,
    /// Point the bot is steering towards
    pub target: Vec2,
    pub goal: Goal,
    /// Seconds until the next decision
    pub decision_timer: f32,
    /// Seconds until the next shot
    pub shoot_cooldown: f32,
}

impl BotBrain {
    pub fn new(personality: Personality, target: Vec2) -> Self {
        Self {
            personality,
            target,
            goal: Goal::Wander,
            decision_timer: 0.0,
            shoot_cooldown: 0.0,
        }
    }

    /// Count down the decision timer; re-arms and returns true when a new
    /// decision is due
    pub fn needs_decision(&mut self, dt: f32) -> bool {
        self.decision_timer -= dt;
        if self.decision_timer <= 0.0 {
            self.decision_timer = self.personality.reaction_time;
            return true;
        }
        false
    }

    /// Score the view and adopt the winner (with jitter), or keep wandering
    pub fn think(&mut self, view: &WorldView, cfg: &SimConfig, rng: &mut impl Rng) {
        match decide(&self.personality, view, cfg.absorption.size_ratio) {
            Some(decision) => {
                let jitter = random_unit(rng) * self.personality.jitter * 50.0;
                self.target = decision.target + jitter;
                self.goal = decision.goal;
            }
            None => {
                self.goal = Goal::Wander;
                if view.pos.distance(self.target) < cfg.bots.arrive_distance {
                    self.target = random_point(rng, cfg.world_size(), cfg.bots.wander_margin);
                }
            }
        }
    }

    /// Position after moving towards the target at `speed` for `dt`,
    /// stopping on the target rather than overshooting it
    pub fn steer(&self, pos: Vec2, speed: f32, dt: f32) -> Vec2 {
        let to_target = self.target - pos;
        let dist = to_target.length();
        if dist <= 1.0 {
            return pos;
        }
        pos + to_target / dist * (speed * dt).min(dist)
    }
}

/// Pure utility scoring. `None` when nothing is worth pursuing.
pub fn decide(personality: &Personality, view: &WorldView, size_ratio: f32) -> Option<Decision> {
    let mut best: Option<Decision> = None;
    let mut consider = |goal: Goal, target: Vec2, score: f32| {
        if best.is_none_or(|b| score > b.score) {
            best = Some(Decision { goal, target, score });
        }
    };
    let dist = |p: Vec2| view.pos.distance(p).max(1.0);

    if view.outside_zone {
        consider(Goal::FleeZone, view.zone_center, 100.0);
    }

    for other in &view.others {
        if other.mass > view.mass * size_ratio {
            let score = (other.mass / view.mass) / dist(other.pos) * 500.0 * personality.caution;
            let away = (view.pos - other.pos).normalize_or_zero();
            consider(Goal::Evade(other.id), view.pos + away * 200.0, score);
        }
    }

    for other in &view.others {
        if view.mass > other.mass * size_ratio {
            let score = (view.mass / other.mass) / dist(other.pos) * 300.0 * personality.aggressiveness;
            consider(Goal::Hunt(other.id), other.pos, score);
        }
    }

    for &buff in &view.buffs {
        consider(Goal::Buff, buff, 80.0 * 100.0 / dist(buff));
    }

    for &item in &view.equipment {
        consider(Goal::Equipment, item, 90.0 * 100.0 / dist(item));
    }

    let nearest_food = view
        .food
        .iter()
        .copied()
        .min_by(|a, b| view.pos.distance_squared(*a).total_cmp(&view.pos.distance_squared(*b)));
    if let Some(food) = nearest_food {
        let score = personality.food_focus * 50.0 / dist(food) / (1.0 + view.mass * 0.01);
        consider(Goal::Food, food, score);
    }

    best
}

/// Perception of entity `idx`: live others, food and pickups within vision
pub fn build_view(state: &GameState, idx: usize) -> WorldView {
    let cfg = &state.config;
    let me = &state.entities[idx];
    let vision = cfg.bots.vision_range * me.stats().vision_multiplier;
    let in_sight = |p: Vec2| me.pos.distance(p) < vision;

    let others = state
        .grid
        .query_area(me.pos, vision)
        .into_iter()
        .filter(|&j| j != idx)
        .filter_map(|j| state.entities.get(j))
        .filter(|e| e.alive && in_sight(e.pos))
        .map(|e| Sighting {
            id: e.id,
            pos: e.pos,
            mass: e.mass,
        })
        .collect();

    WorldView {
        pos: me.pos,
        mass: me.mass,
        outside_zone: state.zone.started && state.zone.is_outside(me.pos),
        zone_center: state.zone.center,
        others,
        food: state.food.iter().filter(|f| f.alive && in_sight(f.pos)).map(|f| f.pos).collect(),
        buffs: state
            .buff_pickups
            .iter()
            .filter(|b| b.alive && in_sight(b.pos))
            .map(|b| b.pos)
            .collect(),
        equipment: state
            .equipment_pickups
            .iter()
            .filter(|p| p.alive && in_sight(p.pos))
            .map(|p| p.pos)
            .collect(),
    }
}

/// Nearest live other entity within shooting range of entity `idx`
pub fn shoot_target(state: &GameState, idx: usize) -> Option<Vec2> {
    let me = &state.entities[idx];
    let range = state.config.bots.shoot_range;
    state
        .entities
        .iter()
        .enumerate()
        .filter(|&(j, e)| j != idx && e.alive)
        .map(|(_, e)| (me.pos.distance(e.pos), e.pos))
        .filter(|&(d, _)| d < range)
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, pos)| pos)
}

/// Gated decisions for every live bot
pub fn update_decisions(state: &mut GameState, dt: f32) {
    let cfg = Arc::clone(&state.config);
    for i in 0..state.entities.len() {
        if !state.entities[i].alive {
            continue;
        }
        let due = match state.entities[i].brain_mut() {
            Some(brain) => brain.needs_decision(dt),
            None => continue,
        };
        if !due {
            continue;
        }
        let view = build_view(state, i);
        if let Some(brain) = state.entities[i].brain_mut() {
            brain.think(&view, &cfg, &mut state.rng);
        }
    }
}

/// Bot fire: shoot at the nearest entity in range once the cooldown is up
pub fn update_firing(state: &mut GameState, dt: f32) {
    let cfg = Arc::clone(&state.config);
    for i in 0..state.entities.len() {
        if !state.entities[i].alive {
            continue;
        }
        let ready = match state.entities[i].brain_mut() {
            Some(brain) => {
                brain.shoot_cooldown -= dt;
                brain.shoot_cooldown <= 0.0
            }
            None => continue,
        };
        if !ready {
            continue;
        }
        let Some(target) = shoot_target(state, i) else {
            continue;
        };
        if !super::projectile::fire(state, i, target) {
            continue;
        }
        let rearm = cfg.projectile.fire_cooldown + random_range(&mut state.rng, 0.0, cfg.projectile.bot_cooldown_jitter);
        if let Some(brain) = state.entities[i].brain_mut() {
            brain.shoot_cooldown = rearm;
        }
    }
}
