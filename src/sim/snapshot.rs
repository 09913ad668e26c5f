//! Read-only per-step view for renderers and HUDs

use glam::Vec2;
use serde::Serialize;

use super::buffs::ActiveBuff;
use super::equipment::EquippedItem;
use super::ranking::LeaderboardEntry;
use super::skills::SkillChoice;
use super::state::{AbsorbCue, BuffPickup, EntityId, EquipmentPickup, Food, GameState, MatchPhase, Obstacle, Projectile};
use super::zone::ZoneMode;

#[derive(Debug, Clone, Serialize)]
pub struct EntityView {
    pub id: EntityId,
    pub name: String,
    pub hue: u16,
    pub pos: Vec2,
    pub radius: f32,
    pub mass: f32,
    pub alive: bool,
    pub kills: u32,
    /// Leaderboard position, live entities only
    pub rank: Option<usize>,
    pub level: u32,
    pub buffs: Vec<ActiveBuff>,
    pub equipment: Vec<EquippedItem>,
    pub is_human: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ZoneView {
    pub center: Vec2,
    pub radius: f32,
    /// 1-based phase number for display
    pub phase: usize,
    pub mode: ZoneMode,
    pub label: String,
    pub next_center: Vec2,
    pub next_radius: f32,
    pub time_left: f32,
}

/// Everything an outside collaborator may look at after a step
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot<'a> {
    pub time: f32,
    pub phase: MatchPhase,
    pub entities: Vec<EntityView>,
    pub food: &'a [Food],
    pub buff_pickups: &'a [BuffPickup],
    pub equipment_pickups: &'a [EquipmentPickup],
    pub projectiles: &'a [Projectile],
    pub obstacles: &'a [Obstacle],
    pub cues: &'a [AbsorbCue],
    pub zone: ZoneView,
    pub leaderboard: &'a [LeaderboardEntry],
    /// Skill offer awaiting the human's choice
    pub level_up: Option<&'a [SkillChoice]>,
}

impl<'a> Snapshot<'a> {
    pub fn capture(state: &'a GameState) -> Self {
        let cfg = &state.config.entity;
        let entities = state
            .entities
            .iter()
            .map(|e| EntityView {
                id: e.id,
                name: e.name.clone(),
                hue: e.hue,
                pos: e.pos,
                radius: e.radius(cfg),
                mass: e.mass,
                alive: e.alive,
                kills: e.kills,
                rank: state.leaderboard.rank_of(e.id),
                level: e.skills.level(),
                buffs: e.buffs.clone(),
                equipment: e.equipment.clone(),
                is_human: e.is_human(),
            })
            .collect();

        let zone = &state.zone;
        let level_up = if state.level_up_paused {
            state.human_entity().map(|h| h.skills.choices())
        } else {
            None
        };

        Self {
            time: state.time,
            phase: state.phase,
            entities,
            food: &state.food,
            buff_pickups: &state.buff_pickups,
            equipment_pickups: &state.equipment_pickups,
            projectiles: &state.projectiles,
            obstacles: &state.obstacles,
            cues: &state.cues,
            zone: ZoneView {
                center: zone.center,
                radius: zone.radius,
                phase: zone.phase + 1,
                mode: zone.mode,
                label: zone.label(),
                next_center: zone.next_center,
                next_radius: zone.next_radius,
                time_left: zone.time_left(),
            },
            leaderboard: &state.leaderboard.entries,
            level_up,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
