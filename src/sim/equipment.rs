//! Equipment: rarity-scaled gear that wears out with use

use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::state::{Entity, EquipmentPickup, GameState};
use crate::config::SimConfig;
use crate::random_point;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipKind {
    /// Reduces projectile damage, wears per hit taken
    Armor,
    /// Faster, longer-lived shots, wears per shot
    Scope,
    /// Movement speed, wears over time
    Boots,
    /// Extra projectile damage, wears per shot
    HeavyAmmo,
}

impl EquipKind {
    pub const ALL: [EquipKind; 4] = [EquipKind::Armor, EquipKind::Scope, EquipKind::Boots, EquipKind::HeavyAmmo];
}

/// Rarity tier; ordering is rank (common < rare < epic)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    Common,
    Rare,
    Epic,
}

/// Stat contributions of one item. Unused fields stay zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EquipStats {
    pub damage_reduction: f32,
    pub projectile_speed: f32,
    pub projectile_lifetime: f32,
    pub speed_boost: f32,
    pub damage_boost: f32,
}

impl EquipStats {
    pub fn scaled(&self, mult: f32) -> Self {
        Self {
            damage_reduction: self.damage_reduction * mult,
            projectile_speed: self.projectile_speed * mult,
            projectile_lifetime: self.projectile_lifetime * mult,
            speed_boost: self.speed_boost * mult,
            damage_boost: self.damage_boost * mult,
        }
    }
}

/// Base definition of one equipment kind
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquipDef {
    pub kind: EquipKind,
    pub stats: EquipStats,
    pub base_durability: f32,
}

/// Multipliers and spawn weight of one rarity tier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RarityDef {
    pub rarity: Rarity,
    pub stat_mult: f32,
    pub durability_mult: f32,
    pub weight: f32,
}

/// Gear worn by an entity, stats frozen at pickup time
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EquippedItem {
    pub kind: EquipKind,
    pub rarity: Rarity,
    pub durability: f32,
    pub max_durability: f32,
    pub stats: EquipStats,
}

impl EquippedItem {
    /// Build the item a pickup of `kind`/`rarity` would give, or `None` if
    /// the config has no table entry for it
    pub fn roll(kind: EquipKind, rarity: Rarity, cfg: &SimConfig) -> Option<Self> {
        let def = cfg.equip_def(kind)?;
        let tier = cfg.rarity_def(rarity)?;
        let durability = (def.base_durability * tier.durability_mult).round();
        Some(Self {
            kind,
            rarity,
            durability,
            max_durability: durability,
            stats: def.stats.scaled(tier.stat_mult),
        })
    }
}

impl Entity {
    /// Whether a pickup of this kind and rarity would be accepted
    pub fn accepts_equipment(&self, kind: EquipKind, rarity: Rarity) -> bool {
        self.equipped_rarity(kind).is_none_or(|held| rarity > held)
    }

    /// Wear `item`, replacing any held item of the same kind
    pub fn equip(&mut self, item: EquippedItem) {
        self.equipment.retain(|e| e.kind != item.kind);
        self.equipment.push(item);
    }

    /// Reduce durability of the held item of `kind`; unequip at zero
    pub fn wear(&mut self, kind: EquipKind, amount: f32) {
        let Some(item) = self.equipment.iter_mut().find(|e| e.kind == kind) else {
            return;
        };
        item.durability -= amount;
        if item.durability <= 0.0 {
            self.equipment.retain(|e| e.kind != kind);
        }
    }
}

/// Weighted rarity pick over the configured tiers
pub fn roll_rarity<R: Rng>(rng: &mut R, cfg: &SimConfig) -> Rarity {
    let tiers = &cfg.equipment.rarities;
    let total: f32 = tiers.iter().map(|t| t.weight).sum();
    let mut roll = rng.random::<f32>() * total;
    for tier in tiers {
        if roll < tier.weight {
            return tier.rarity;
        }
        roll -= tier.weight;
    }
    tiers.last().map_or(Rarity::Common, |t| t.rarity)
}

/// Equipment pass: spawn, pickup, then boots wear
pub fn update(state: &mut GameState, dt: f32) {
    update_spawner(state, dt);
    resolve_pickups(state);
    let wear = state.config.equipment.boots_wear_per_second * dt;
    for entity in state.entities.iter_mut().filter(|e| e.alive) {
        entity.wear(EquipKind::Boots, wear);
    }
    state.equipment_pickups.retain(|p| p.alive);
}

fn update_spawner(state: &mut GameState, dt: f32) {
    let cfg = Arc::clone(&state.config);
    state.spawners.equipment_timer -= dt;
    let live = state.equipment_pickups.iter().filter(|p| p.alive).count();
    if state.spawners.equipment_timer <= 0.0 && live < cfg.equipment.cap {
        let kind = EquipKind::ALL[state.rng.random_range(0..EquipKind::ALL.len())];
        let rarity = roll_rarity(&mut state.rng, &cfg);
        let pos = random_point(&mut state.rng, cfg.world_size(), cfg.world.spawn_margin);
        let id = state.next_id();
        state.equipment_pickups.push(EquipmentPickup {
            id,
            kind,
            rarity,
            pos,
            radius: cfg.equipment.pickup_radius,
            alive: true,
        });
        state.spawners.equipment_timer = cfg.equipment.spawn_interval;
        log::debug!("Spawned {:?} {:?} at ({:.0}, {:.0})", rarity, kind, pos.x, pos.y);
    }
}

/// First touching entity that wants the item takes it; others that decline
/// leave it in the world
fn resolve_pickups(state: &mut GameState) {
    let cfg = Arc::clone(&state.config);
    for pickup in state.equipment_pickups.iter_mut().filter(|p| p.alive) {
        let Some(item) = EquippedItem::roll(pickup.kind, pickup.rarity, &cfg) else {
            log::warn!("No equipment table entry for {:?} {:?}", pickup.rarity, pickup.kind);
            pickup.alive = false;
            continue;
        };
        let taker = state.entities.iter_mut().filter(|e| e.alive).find(|e| {
            e.pos.distance(pickup.pos) < e.radius(&cfg.entity) + pickup.radius
                && e.accepts_equipment(pickup.kind, pickup.rarity)
        });
        if let Some(entity) = taker {
            entity.equip(item);
            pickup.alive = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::testutil::{add_actor, empty_state};
    use glam::Vec2;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn pickup(id: u32, kind: EquipKind, rarity: Rarity, pos: Vec2) -> EquipmentPickup {
        EquipmentPickup {
            id,
            kind,
            rarity,
            pos,
            radius: 14.0,
            alive: true,
        }
    }

    #[test]
    fn test_rarity_scaling() {
        let cfg = SimConfig::default();
        let common = EquippedItem::roll(EquipKind::Armor, Rarity::Common, &cfg).unwrap();
        assert_eq!(common.durability, 15.0);
        assert!((common.stats.damage_reduction - 0.3).abs() < 1e-6);

        let epic = EquippedItem::roll(EquipKind::Armor, Rarity::Epic, &cfg).unwrap();
        assert_eq!(epic.durability, 27.0);
        assert!((epic.stats.damage_reduction - 0.6).abs() < 1e-6);

        // 12 * 1.4 = 16.8 rounds up
        let rare_ammo = EquippedItem::roll(EquipKind::HeavyAmmo, Rarity::Rare, &cfg).unwrap();
        assert_eq!(rare_ammo.durability, 17.0);
        assert!((rare_ammo.stats.damage_boost - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_replacement_requires_strictly_higher_rarity() {
        let mut state = empty_state();
        let i = add_actor(&mut state, Vec2::new(800.0, 800.0), 50.0, false);
        let here = state.entities[i].pos;

        state.equipment_pickups.push(pickup(1, EquipKind::Scope, Rarity::Rare, here));
        update(&mut state, 0.0);
        assert_eq!(state.entities[i].equipped_rarity(EquipKind::Scope), Some(Rarity::Rare));

        // Equal rarity is declined and stays on the ground
        state.equipment_pickups.push(pickup(2, EquipKind::Scope, Rarity::Rare, here));
        update(&mut state, 0.0);
        assert_eq!(state.equipment_pickups.len(), 1);

        state.equipment_pickups.push(pickup(3, EquipKind::Scope, Rarity::Common, here));
        update(&mut state, 0.0);
        assert_eq!(state.equipment_pickups.len(), 2);
        assert_eq!(state.entities[i].equipped_rarity(EquipKind::Scope), Some(Rarity::Rare));

        state.equipment_pickups.push(pickup(4, EquipKind::Scope, Rarity::Epic, here));
        update(&mut state, 0.0);
        assert_eq!(state.entities[i].equipped_rarity(EquipKind::Scope), Some(Rarity::Epic));
        assert_eq!(state.entities[i].equipment.len(), 1);
    }

    #[test]
    fn test_declined_pickup_goes_to_next_entity() {
        let mut state = empty_state();
        let a = add_actor(&mut state, Vec2::new(800.0, 800.0), 50.0, false);
        let b = add_actor(&mut state, Vec2::new(810.0, 800.0), 50.0, false);
        let cfg = Arc::clone(&state.config);
        let epic = EquippedItem::roll(EquipKind::Armor, Rarity::Epic, &cfg).unwrap();
        state.entities[a].equip(epic);

        state
            .equipment_pickups
            .push(pickup(1, EquipKind::Armor, Rarity::Rare, Vec2::new(805.0, 800.0)));
        update(&mut state, 0.0);
        assert_eq!(state.entities[a].equipped_rarity(EquipKind::Armor), Some(Rarity::Epic));
        assert_eq!(state.entities[b].equipped_rarity(EquipKind::Armor), Some(Rarity::Rare));
        assert!(state.equipment_pickups.is_empty());
    }

    #[test]
    fn test_boots_wear_out() {
        let mut state = empty_state();
        let i = add_actor(&mut state, Vec2::new(800.0, 800.0), 50.0, false);
        let cfg = Arc::clone(&state.config);
        let boots = EquippedItem::roll(EquipKind::Boots, Rarity::Common, &cfg).unwrap();
        state.entities[i].equip(boots);
        state.spawners.equipment_timer = f32::INFINITY;

        let before = state.entities[i].speed(&cfg);
        update(&mut state, 39.0);
        assert!(state.entities[i].equipped(EquipKind::Boots).is_some());
        update(&mut state, 1.0);
        assert!(state.entities[i].equipped(EquipKind::Boots).is_none());
        assert!(state.entities[i].speed(&cfg) < before);
    }

    #[test]
    fn test_wear_unequips_at_zero() {
        let cfg = SimConfig::default();
        let mut state = empty_state();
        let i = add_actor(&mut state, Vec2::new(800.0, 800.0), 50.0, false);
        let entity = &mut state.entities[i];
        entity.equip(EquippedItem::roll(EquipKind::HeavyAmmo, Rarity::Common, &cfg).unwrap());
        for _ in 0..11 {
            entity.wear(EquipKind::HeavyAmmo, 1.0);
        }
        assert_eq!(entity.equip_stat(|s| s.damage_boost), 2.0);
        entity.wear(EquipKind::HeavyAmmo, 1.0);
        assert!(entity.equipment.is_empty());
        assert_eq!(entity.equip_stat(|s| s.damage_boost), 0.0);
    }

    #[test]
    fn test_rarity_roll_distribution() {
        let cfg = SimConfig::default();
        let mut rng = Pcg32::seed_from_u64(3);
        let mut counts = [0u32; 3];
        for _ in 0..10_000 {
            match roll_rarity(&mut rng, &cfg) {
                Rarity::Common => counts[0] += 1,
                Rarity::Rare => counts[1] += 1,
                Rarity::Epic => counts[2] += 1,
            }
        }
        assert!((5500..6500).contains(&counts[0]), "{counts:?}");
        assert!((2500..3500).contains(&counts[1]), "{counts:?}");
        assert!((700..1300).contains(&counts[2]), "{counts:?}");
    }
}
