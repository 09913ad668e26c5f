//! Timed buffs picked up from the world
//!
//! At most one instance per kind per entity: picking up a kind that is
//! already active refreshes it to full duration instead of stacking.

use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::state::{BuffPickup, Entity, GameState};
use crate::config::BuffConfig;
use crate::random_point;

/// Buff kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuffKind {
    /// Movement speed multiplier
    Speed,
    /// Blocks a fixed number of projectile hits
    Shield,
    /// Stronger projectiles
    Power,
    /// Pulls nearby food toward the holder
    Magnet,
}

impl BuffKind {
    pub const ALL: [BuffKind; 4] = [BuffKind::Speed, BuffKind::Shield, BuffKind::Power, BuffKind::Magnet];
}

/// A buff currently affecting an entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ActiveBuff {
    pub kind: BuffKind,
    /// Seconds left
    pub remaining: f32,
    pub duration: f32,
}

impl Entity {
    pub fn has_buff(&self, kind: BuffKind) -> bool {
        self.buffs.iter().any(|b| b.kind == kind)
    }

    /// Grant `kind`, or refresh it to full duration if already active
    pub fn add_buff(&mut self, kind: BuffKind, cfg: &BuffConfig) {
        let duration = cfg.durations.for_kind(kind);
        if let Some(existing) = self.buffs.iter_mut().find(|b| b.kind == kind) {
            existing.remaining = duration;
            existing.duration = duration;
            return;
        }
        self.buffs.push(ActiveBuff {
            kind,
            remaining: duration,
            duration,
        });
        if kind == BuffKind::Shield {
            self.shield_charges = cfg.shield_charges;
        }
    }

    pub fn remove_buff(&mut self, kind: BuffKind) {
        self.buffs.retain(|b| b.kind != kind);
        if kind == BuffKind::Shield {
            self.shield_charges = 0;
        }
    }

    /// Count down every buff and drop the expired ones
    pub fn decay_buffs(&mut self, dt: f32) {
        for buff in &mut self.buffs {
            buff.remaining -= dt;
        }
        self.buffs.retain(|b| b.remaining > 0.0);
        if !self.has_buff(BuffKind::Shield) {
            self.shield_charges = 0;
        }
    }
}

/// Buff pass: spawn, pickup, magnet pull, then decay
pub fn update(state: &mut GameState, dt: f32) {
    update_spawner(state, dt);
    resolve_pickups(state);
    apply_magnets(state, dt);
    for entity in state.entities.iter_mut().filter(|e| e.alive) {
        entity.decay_buffs(dt);
    }
    state.buff_pickups.retain(|b| b.alive);
}

fn update_spawner(state: &mut GameState, dt: f32) {
    let cfg = Arc::clone(&state.config);
    state.spawners.buff_timer -= dt;
    let live = state.buff_pickups.iter().filter(|b| b.alive).count();
    if state.spawners.buff_timer <= 0.0 && live < cfg.buffs.cap {
        let kind = BuffKind::ALL[state.rng.random_range(0..BuffKind::ALL.len())];
        let pos = random_point(&mut state.rng, cfg.world_size(), cfg.world.spawn_margin);
        let id = state.next_id();
        state.buff_pickups.push(BuffPickup {
            id,
            kind,
            pos,
            radius: cfg.buffs.pickup_radius,
            alive: true,
        });
        state.spawners.buff_timer = cfg.buffs.spawn_interval;
        log::debug!("Spawned {:?} buff at ({:.0}, {:.0})", kind, pos.x, pos.y);
    }
}

/// First live entity (in list order) touching a pickup takes it
fn resolve_pickups(state: &mut GameState) {
    let cfg = Arc::clone(&state.config);
    for pickup in state.buff_pickups.iter_mut().filter(|p| p.alive) {
        let taker = state.entities.iter_mut().filter(|e| e.alive).find(|e| {
            e.pos.distance(pickup.pos) < e.radius(&cfg.entity) + pickup.radius
        });
        if let Some(entity) = taker {
            entity.add_buff(pickup.kind, &cfg.buffs);
            pickup.alive = false;
        }
    }
}

/// Every magnet holder drags food within range toward itself
fn apply_magnets(state: &mut GameState, dt: f32) {
    let cfg = &state.config.buffs;
    let step = cfg.magnet_pull_speed * dt;
    for holder in state
        .entities
        .iter()
        .filter(|e| e.alive && e.has_buff(BuffKind::Magnet))
    {
        for food in state.food.iter_mut().filter(|f| f.alive) {
            let offset = holder.pos - food.pos;
            let dist = offset.length();
            if dist < cfg.magnet_range && dist > 1.0 {
                food.pos += offset / dist * step.min(dist);
            }
        }
    }
}
