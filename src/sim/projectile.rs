//! Projectile firing, flight and hit resolution

use std::sync::Arc;

use glam::Vec2;

use super::buffs::BuffKind;
use super::collision::circles_overlap;
use super::equipment::EquipKind;
use super::events::{KillCause, SimEvent};
use super::state::{GameState, Projectile};

/// Spawn a shot from entity `idx` towards `aim`, applying buffs and gear.
///
/// Returns `false` (and fires nothing) when the aim point sits on top of the
/// shooter, since there is no direction to fire in.
pub fn fire(state: &mut GameState, idx: usize, aim: Vec2) -> bool {
    let cfg = Arc::clone(&state.config);
    let shot = &cfg.projectile;
    let shooter = &mut state.entities[idx];
    let offset = aim - shooter.pos;
    let dist = offset.length();
    if dist <= 1.0 {
        return false;
    }
    let dir = offset / dist;

    let mut damage = if shooter.has_buff(BuffKind::Power) {
        shot.powered_damage
    } else {
        shot.damage
    };
    let mut speed = shot.speed;
    let mut lifetime = shot.lifetime;

    let speed_bonus = shooter.equip_stat(|s| s.projectile_speed);
    if speed_bonus > 0.0 {
        speed *= 1.0 + speed_bonus;
        lifetime *= 1.0 + shooter.equip_stat(|s| s.projectile_lifetime);
        shooter.wear(EquipKind::Scope, 1.0);
    }
    let damage_boost = shooter.equip_stat(|s| s.damage_boost);
    if damage_boost > 0.0 {
        damage += damage_boost;
        shooter.wear(EquipKind::HeavyAmmo, 1.0);
    }

    let pos = shooter.pos + dir * (shooter.radius(&cfg.entity) + shot.muzzle_offset);
    let owner = shooter.id;
    let hue = shooter.hue;
    let id = state.next_id();
    state.projectiles.push(Projectile {
        id,
        owner,
        pos,
        vel: dir * speed,
        radius: shot.radius,
        damage,
        lifetime,
        hue,
        alive: true,
    });
    true
}

/// Apply one hit from `shot` to entity `target`
fn resolve_hit(state: &mut GameState, target: usize, shot: &Projectile) {
    let entity = &mut state.entities[target];

    if entity.has_buff(BuffKind::Shield) && entity.shield_charges > 0 {
        entity.shield_charges -= 1;
        if entity.shield_charges == 0 {
            entity.remove_buff(BuffKind::Shield);
        }
        return;
    }

    let mut damage = shot.damage;
    let reduction = entity.equip_stat(|s| s.damage_reduction);
    if reduction > 0.0 {
        damage *= (1.0 - reduction).max(0.0);
        entity.wear(EquipKind::Armor, 1.0);
    }
    entity.mass -= damage;
    if !entity.below_floor(&state.config.entity) {
        return;
    }

    entity.kill();
    let victim = entity.id;
    log::debug!("{} shot down by {}", victim, shot.owner);
    if let Some(shooter) = state.entity_index(shot.owner) {
        state.entities[shooter].kills += 1;
    }
    state.push_event(SimEvent::EntityKilled {
        victim,
        killer: Some(shot.owner),
        cause: KillCause::Projectile,
    });
}

/// Projectile pass: move, expire, collide
pub fn update(state: &mut GameState, dt: f32) {
    let cfg = Arc::clone(&state.config);
    let size = cfg.world_size();

    for p in 0..state.projectiles.len() {
        let shot = &mut state.projectiles[p];
        if !shot.alive {
            continue;
        }
        shot.pos += shot.vel * dt;
        shot.lifetime -= dt;
        let out_of_world = shot.pos.x < 0.0 || shot.pos.y < 0.0 || shot.pos.x > size.x || shot.pos.y > size.y;
        if shot.lifetime <= 0.0 || out_of_world {
            shot.alive = false;
            continue;
        }
        let shot = shot.clone();

        if state
            .obstacles
            .iter()
            .any(|o| circles_overlap(shot.pos, shot.radius, o.pos, o.radius))
        {
            state.projectiles[p].alive = false;
            continue;
        }

        let hit = state.entities.iter().position(|e| {
            e.alive && e.id != shot.owner && circles_overlap(shot.pos, shot.radius, e.pos, e.radius(&cfg.entity))
        });
        if let Some(target) = hit {
            state.projectiles[p].alive = false;
            resolve_hit(state, target, &shot);
        }
    }

    state.projectiles.retain(|p| p.alive);
}
