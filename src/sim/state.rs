//! Simulation state and core entity types
//!
//! [`GameState`] exclusively owns every live collection of a run. Subsystems
//! borrow it for one step; anything they need to remember between steps lives
//! here.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::bot::{BotBrain, Personality};
use super::buffs::{ActiveBuff, BuffKind};
use super::equipment::{EquipKind, EquipStats, EquippedItem, Rarity};
use super::events::{GameResult, SimEvent};
use super::ranking::Leaderboard;
use super::skills::{SkillBook, SkillStats};
use super::spatial::SpatialGrid;
use super::zone::Zone;
use crate::config::{EntityConfig, SimConfig};

/// Identity of an actor, unique within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Per-run monotonic id source, shared by actors, pickups and projectiles
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next: u32,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdAllocator {
    pub fn next(&mut self) -> u32 {
        let id = self.next;
        self.next += 1;
        id
    }
}

/// Radius for a given mass: `radius_factor * sqrt(mass)`
#[inline]
pub fn radius_for_mass(mass: f32, cfg: &EntityConfig) -> f32 {
    cfg.radius_factor * mass.sqrt()
}

/// Who steers an entity
#[derive(Debug, Clone)]
pub enum Control {
    /// Driven by per-step intent from the input collaborator
    Human,
    /// Driven by the utility AI
    Bot(BotBrain),
}

/// A mass-growing actor (human or bot)
#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    /// Display hue in degrees (0-359)
    pub hue: u16,
    pub control: Control,
    pub pos: Vec2,
    pub mass: f32,
    pub alive: bool,
    pub kills: u32,
    /// Largest mass ever reached
    pub max_mass: f32,
    pub skills: SkillBook,
    pub buffs: Vec<ActiveBuff>,
    /// Remaining projectile blocks of the shield buff
    pub shield_charges: u32,
    pub equipment: Vec<EquippedItem>,
    /// Normalized movement direction (human) or zero
    pub move_dir: Vec2,
    /// World-space aim point
    pub aim: Vec2,
    /// Seconds until the next shot is allowed
    pub fire_cooldown: f32,
}

impl Entity {
    pub fn new(id: EntityId, name: String, hue: u16, control: Control, pos: Vec2, mass: f32) -> Self {
        Self {
            id,
            name,
            hue,
            control,
            pos,
            mass,
            alive: true,
            kills: 0,
            max_mass: mass,
            skills: SkillBook::new(),
            buffs: Vec::new(),
            shield_charges: 0,
            equipment: Vec::new(),
            move_dir: Vec2::ZERO,
            aim: pos,
            fire_cooldown: 0.0,
        }
    }

    #[inline]
    pub fn is_human(&self) -> bool {
        matches!(self.control, Control::Human)
    }

    /// AI brain, if this entity is bot-controlled
    pub fn brain(&self) -> Option<&BotBrain> {
        match &self.control {
            Control::Bot(brain) => Some(brain),
            Control::Human => None,
        }
    }

    pub fn brain_mut(&mut self) -> Option<&mut BotBrain> {
        match &mut self.control {
            Control::Bot(brain) => Some(brain),
            Control::Human => None,
        }
    }

    #[inline]
    pub fn radius(&self, cfg: &EntityConfig) -> f32 {
        radius_for_mass(self.mass, cfg)
    }

    #[inline]
    pub fn stats(&self) -> &SkillStats {
        self.skills.stats()
    }

    /// Current movement speed from mass, skills, buffs and gear
    pub fn speed(&self, cfg: &SimConfig) -> f32 {
        let mut multiplier = self.stats().speed_multiplier;
        if self.has_buff(BuffKind::Speed) {
            multiplier *= cfg.buffs.speed_multiplier;
        }
        multiplier *= 1.0 + self.equip_stat(|s| s.speed_boost);
        let decay = 1.0 / (1.0 + self.mass * cfg.entity.speed_decay);
        cfg.entity.base_speed * decay * multiplier
    }

    /// Sum of one stat across every equipped item with durability left
    pub fn equip_stat(&self, stat: impl Fn(&EquipStats) -> f32) -> f32 {
        self.equipment
            .iter()
            .filter(|e| e.durability > 0.0)
            .map(|e| stat(&e.stats))
            .sum()
    }

    pub fn equipped(&self, kind: EquipKind) -> Option<&EquippedItem> {
        self.equipment.iter().find(|e| e.kind == kind)
    }

    pub fn equipped_rarity(&self, kind: EquipKind) -> Option<Rarity> {
        self.equipped(kind).map(|e| e.rarity)
    }

    #[inline]
    pub fn below_floor(&self, cfg: &EntityConfig) -> bool {
        self.mass < cfg.min_mass
    }

    /// Add mass, keeping the max-mass record current
    pub fn gain(&mut self, amount: f32) {
        self.mass += amount;
        self.max_mass = self.max_mass.max(self.mass);
    }

    pub fn kill(&mut self) {
        self.alive = false;
    }
}

/// Edible pellet
#[derive(Debug, Clone, Serialize)]
pub struct Food {
    pub id: u32,
    pub pos: Vec2,
    pub radius: f32,
    pub nutrition: f32,
    pub hue: u16,
    pub alive: bool,
}

/// Buff lying in the world
#[derive(Debug, Clone, Serialize)]
pub struct BuffPickup {
    pub id: u32,
    pub kind: BuffKind,
    pub pos: Vec2,
    pub radius: f32,
    pub alive: bool,
}

/// Equipment lying in the world
#[derive(Debug, Clone, Serialize)]
pub struct EquipmentPickup {
    pub id: u32,
    pub kind: EquipKind,
    pub rarity: Rarity,
    pub pos: Vec2,
    pub radius: f32,
    pub alive: bool,
}

/// Shot in flight
#[derive(Debug, Clone, Serialize)]
pub struct Projectile {
    pub id: u32,
    pub owner: EntityId,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub damage: f32,
    /// Seconds of flight left
    pub lifetime: f32,
    pub hue: u16,
    pub alive: bool,
}

/// Static circular cover
#[derive(Debug, Clone, Serialize)]
pub struct Obstacle {
    pub id: u32,
    pub pos: Vec2,
    pub radius: f32,
    /// Not damaged by anything yet; reported for display
    pub health: f32,
}

/// Fading ring left where an entity was absorbed (render-only)
#[derive(Debug, Clone, Serialize)]
pub struct AbsorbCue {
    pub pos: Vec2,
    pub radius: f32,
    pub hue: u16,
    /// Seconds left
    pub ttl: f32,
}

/// Lifecycle phase seen by the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchPhase {
    /// Human alive and playing
    Playing,
    /// Human dead, others continue
    Spectating,
    /// Round result revealed
    Result,
}

/// Spawn timers and accumulators
#[derive(Debug, Clone)]
pub struct Spawners {
    /// Fractional food owed to the field
    pub food_accumulator: f32,
    /// Seconds until the next buff spawn attempt
    pub buff_timer: f32,
    /// Seconds until the next equipment spawn attempt
    pub equipment_timer: f32,
}

/// Human death record, used for the final result
#[derive(Debug, Clone, Copy)]
pub struct DeathRecord {
    pub time: f32,
    pub rank: usize,
}

/// Deferred result reveal after the human's death
#[derive(Debug, Clone, Copy)]
pub struct PendingReveal {
    /// Run generation that armed it; stale reveals never fire
    pub run_id: u64,
    pub remaining: f32,
}

/// Complete simulation state of one run
#[derive(Debug, Clone)]
pub struct GameState {
    pub config: Arc<SimConfig>,
    /// Run seed for reproducibility
    pub seed: u64,
    /// Run generation, bumped by every restart
    pub run_id: u64,
    pub rng: Pcg32,
    pub ids: IdAllocator,
    /// Simulated seconds since the run started
    pub time: f32,
    /// Steps advanced
    pub steps: u64,
    pub phase: MatchPhase,
    /// Actors, in spawn order. Never shrinks during a run, so indices are
    /// stable keys for the spatial grid.
    pub entities: Vec<Entity>,
    /// Index of the human-controlled entity
    pub human: Option<usize>,
    pub food: Vec<Food>,
    pub buff_pickups: Vec<BuffPickup>,
    pub equipment_pickups: Vec<EquipmentPickup>,
    pub projectiles: Vec<Projectile>,
    pub obstacles: Vec<Obstacle>,
    pub cues: Vec<AbsorbCue>,
    pub zone: Zone,
    pub grid: SpatialGrid,
    pub spawners: Spawners,
    pub leaderboard: Leaderboard,
    /// Brain used when the human slot runs on autopilot
    pub autopilot: BotBrain,
    /// Gameplay frozen until the human picks a skill
    pub level_up_paused: bool,
    pub death: Option<DeathRecord>,
    pub pending_reveal: Option<PendingReveal>,
    pub result: Option<GameResult>,
    /// At most one actor left; further ticks are no-ops
    pub finished: bool,
    /// Halted by the driver
    pub stopped: bool,
    events: Vec<SimEvent>,
}

impl GameState {
    /// Start a fresh run with the given seed and human display name
    pub fn new(config: Arc<SimConfig>, seed: u64, human_name: &str) -> Self {
        let rng = Pcg32::seed_from_u64(seed);
        let zone = Zone::new(&config);
        let center = config.world_center();
        let mut state = Self {
            grid: SpatialGrid::new(config.world.cell_size),
            spawners: Spawners {
                food_accumulator: 0.0,
                buff_timer: config.buffs.first_spawn,
                equipment_timer: config.equipment.first_spawn,
            },
            autopilot: BotBrain::new(Personality::balanced(), center),
            config,
            seed,
            run_id: 0,
            rng,
            ids: IdAllocator::default(),
            time: 0.0,
            steps: 0,
            phase: MatchPhase::Playing,
            entities: Vec::new(),
            human: None,
            food: Vec::new(),
            buff_pickups: Vec::new(),
            equipment_pickups: Vec::new(),
            projectiles: Vec::new(),
            obstacles: Vec::new(),
            cues: Vec::new(),
            zone,
            leaderboard: Leaderboard::default(),
            level_up_paused: false,
            death: None,
            pending_reveal: None,
            result: None,
            finished: false,
            stopped: false,
            events: Vec::new(),
        };

        super::spawn::populate(&mut state, human_name);
        state.rebuild_grid();
        super::ranking::update(&mut state);
        log::info!(
            "Run started: seed {}, {} actors, {} food, {} obstacles",
            seed,
            state.entities.len(),
            state.food.len(),
            state.obstacles.len()
        );
        state
    }

    /// Throw the current run away and start over. Ids restart from 1 and any
    /// deferred reveal from the old run is dropped.
    pub fn restart(&mut self, seed: u64) {
        let name = self
            .human_entity()
            .map(|e| e.name.clone())
            .unwrap_or_default();
        let run_id = self.run_id + 1;
        *self = Self::new(Arc::clone(&self.config), seed, &name);
        self.run_id = run_id;
    }

    /// Halt the run: no further steps and no pending reveal
    pub fn stop(&mut self) {
        self.stopped = true;
        self.pending_reveal = None;
    }

    #[inline]
    pub fn next_id(&mut self) -> u32 {
        self.ids.next()
    }

    pub fn next_entity_id(&mut self) -> EntityId {
        EntityId(self.ids.next())
    }

    pub fn human_entity(&self) -> Option<&Entity> {
        self.human.map(|i| &self.entities[i])
    }

    pub fn human_entity_mut(&mut self) -> Option<&mut Entity> {
        self.human.map(|i| &mut self.entities[i])
    }

    pub fn entity_index(&self, id: EntityId) -> Option<usize> {
        self.entities.iter().position(|e| e.id == id)
    }

    pub fn alive_count(&self) -> usize {
        self.entities.iter().filter(|e| e.alive).count()
    }

    /// Rebuild the spatial grid from current live positions
    pub fn rebuild_grid(&mut self) {
        self.grid.clear();
        for (i, entity) in self.entities.iter().enumerate() {
            if entity.alive {
                self.grid.insert(i, entity.pos, entity.radius(&self.config.entity));
            }
        }
    }

    pub fn push_event(&mut self, event: SimEvent) {
        self.events.push(event);
    }

    /// Events raised since the last drain, oldest first
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    /// Panic on states no step should ever produce
    pub fn check_invariants(&self) {
        for entity in self.entities.iter().filter(|e| e.alive) {
            assert!(
                entity.mass.is_finite() && entity.mass >= 0.0,
                "entity {} has invalid mass {}",
                entity.id,
                entity.mass
            );
        }
        let mut seen = HashSet::with_capacity(self.entities.len());
        for entity in &self.entities {
            assert!(seen.insert(entity.id), "duplicate entity id {}", entity.id);
        }
    }
}

/// Mutable references to two distinct entities
pub fn pair_mut(entities: &mut [Entity], a: usize, b: usize) -> (&mut Entity, &mut Entity) {
    assert_ne!(a, b, "pair_mut needs two distinct indices");
    if a < b {
        let (left, right) = entities.split_at_mut(b);
        (&mut left[a], &mut right[0])
    } else {
        let (left, right) = entities.split_at_mut(a);
        (&mut right[0], &mut left[b])
    }
}
