//! Simulation configuration
//!
//! One immutable value, built once per process and shared by reference with
//! every subsystem. Every section is `#[serde(default)]`, so a JSON file only
//! needs the fields it overrides.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::buffs::BuffKind;
use crate::sim::equipment::{EquipDef, EquipKind, EquipStats, Rarity, RarityDef};
use crate::sim::skills::{SkillDef, SkillId, default_catalog};
use crate::sim::zone::ZonePhase;

/// Errors raised while loading or validating a configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("world dimensions must be positive (got {width}x{height})")]
    WorldSize { width: f32, height: f32 },

    #[error("spatial grid cell size must be positive (got {0})")]
    CellSize(f32),

    #[error("initial mass {initial} is below the mass floor {floor}")]
    InitialMass { initial: f32, floor: f32 },

    #[error("zone phase table is empty")]
    NoZonePhases,

    #[error("zone phase {index} has a negative duration")]
    ZonePhaseDuration { index: usize },

    #[error("rarity weights must be non-negative and sum to a positive value")]
    RarityWeights,

    #[error("equipment table has no entry for {0:?}")]
    MissingEquipment(EquipKind),

    #[error("skill catalog is empty")]
    NoSkills,

    #[error("skill {0:?} appears more than once in the catalog")]
    DuplicateSkill(SkillId),
}

/// World extents and static layout
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub width: f32,
    pub height: f32,
    /// Spatial grid cell size
    pub cell_size: f32,
    /// Keep-out distance from the world edge for spawned actors and pickups
    pub spawn_margin: f32,
    pub obstacle_count: usize,
    pub obstacle_min_radius: f32,
    pub obstacle_max_radius: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 6000.0,
            height: 6000.0,
            cell_size: 200.0,
            spawn_margin: 200.0,
            obstacle_count: 30,
            obstacle_min_radius: 25.0,
            obstacle_max_radius: 60.0,
        }
    }
}

/// Mass, size and speed model shared by every actor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityConfig {
    pub initial_mass: f32,
    /// Below this mass an entity is destroyed
    pub min_mass: f32,
    pub base_speed: f32,
    pub speed_decay: f32,
    /// radius = radius_factor * sqrt(mass)
    pub radius_factor: f32,
}

impl Default for EntityConfig {
    fn default() -> Self {
        Self {
            initial_mass: 20.0,
            min_mass: 10.0,
            base_speed: 300.0,
            speed_decay: 0.003,
            radius_factor: 4.0,
        }
    }
}

/// Contact absorption tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AbsorptionConfig {
    /// Attacker must outweigh the defender by this factor
    pub size_ratio: f32,
    /// Fraction of the attacker radius that counts as absorbing range
    pub overlap_ratio: f32,
    /// Fraction of the defender's mass handed to the attacker
    pub transfer_rate: f32,
    /// Lifetime of the visual cue left behind by an absorption
    pub cue_duration: f32,
}

impl Default for AbsorptionConfig {
    fn default() -> Self {
        Self {
            size_ratio: 1.0,
            overlap_ratio: 0.6,
            transfer_rate: 0.8,
            cue_duration: 0.3,
        }
    }
}

/// Projectile ballistics and fire rate
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileConfig {
    pub speed: f32,
    pub radius: f32,
    pub damage: f32,
    /// Damage while the power buff is active
    pub powered_damage: f32,
    pub lifetime: f32,
    pub fire_cooldown: f32,
    /// Random extra cooldown added after each bot shot
    pub bot_cooldown_jitter: f32,
    /// Spawn distance beyond the shooter's radius
    pub muzzle_offset: f32,
}

impl Default for ProjectileConfig {
    fn default() -> Self {
        Self {
            speed: 2000.0,
            radius: 4.0,
            damage: 3.0,
            powered_damage: 5.0,
            lifetime: 2.0,
            fire_cooldown: 0.3,
            bot_cooldown_jitter: 0.3,
            muzzle_offset: 8.0,
        }
    }
}

/// Bot population and perception
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub count: usize,
    pub vision_range: f32,
    pub shoot_range: f32,
    /// Edge margin for wander targets
    pub wander_margin: f32,
    /// A wander target closer than this is considered reached
    pub arrive_distance: f32,
    pub names: Vec<String>,
}

impl Default for BotConfig {
    fn default() -> Self {
        let names = [
            "Alpha", "Bravo", "Charlie", "Delta", "Echo", "Foxtrot", "Golf", "Hotel", "India",
            "Juliet", "Kilo", "Lima", "Mike", "November", "Oscar", "Papa", "Quebec", "Romeo",
            "Sierra", "Tango", "Uniform", "Victor", "Whiskey", "Xray", "Yankee",
        ];
        Self {
            count: 20,
            vision_range: 800.0,
            shoot_range: 400.0,
            wander_margin: 100.0,
            arrive_distance: 50.0,
            names: names.iter().map(|n| n.to_string()).collect(),
        }
    }
}

/// Food field
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FoodConfig {
    /// Population the spawner tops up towards
    pub target_count: usize,
    /// Food items spawned per second while below target
    pub respawn_rate: f32,
    pub large_chance: f32,
    pub small_nutrition: f32,
    pub large_nutrition: f32,
    pub small_radius: f32,
    pub large_radius: f32,
    pub margin: f32,
    /// Catch-up cap per step
    pub max_spawn_per_step: u32,
}

impl Default for FoodConfig {
    fn default() -> Self {
        Self {
            target_count: 600,
            respawn_rate: 4.0,
            large_chance: 0.05,
            small_nutrition: 1.0,
            large_nutrition: 5.0,
            small_radius: 4.0,
            large_radius: 8.0,
            margin: 50.0,
            max_spawn_per_step: 100,
        }
    }
}

/// Buff durations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuffDurations {
    pub speed: f32,
    pub shield: f32,
    pub power: f32,
    pub magnet: f32,
}

impl Default for BuffDurations {
    fn default() -> Self {
        Self {
            speed: 6.0,
            shield: 8.0,
            power: 8.0,
            magnet: 7.0,
        }
    }
}

impl BuffDurations {
    pub fn for_kind(&self, kind: BuffKind) -> f32 {
        match kind {
            BuffKind::Speed => self.speed,
            BuffKind::Shield => self.shield,
            BuffKind::Power => self.power,
            BuffKind::Magnet => self.magnet,
        }
    }
}

/// Buff pickups and effects
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuffConfig {
    pub cap: usize,
    pub first_spawn: f32,
    pub spawn_interval: f32,
    pub pickup_radius: f32,
    pub durations: BuffDurations,
    pub speed_multiplier: f32,
    pub shield_charges: u32,
    pub magnet_range: f32,
    pub magnet_pull_speed: f32,
}

impl Default for BuffConfig {
    fn default() -> Self {
        Self {
            cap: 8,
            first_spawn: 5.0,
            spawn_interval: 12.0,
            pickup_radius: 12.0,
            durations: BuffDurations::default(),
            speed_multiplier: 1.5,
            shield_charges: 3,
            magnet_range: 200.0,
            magnet_pull_speed: 300.0,
        }
    }
}

/// Equipment pickups, per-kind base stats and rarity tiers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EquipmentConfig {
    pub cap: usize,
    pub first_spawn: f32,
    pub spawn_interval: f32,
    pub pickup_radius: f32,
    /// Passive durability loss for boots, per second
    pub boots_wear_per_second: f32,
    pub kinds: Vec<EquipDef>,
    pub rarities: Vec<RarityDef>,
}

impl Default for EquipmentConfig {
    fn default() -> Self {
        Self {
            cap: 6,
            first_spawn: 8.0,
            spawn_interval: 18.0,
            pickup_radius: 14.0,
            boots_wear_per_second: 1.0,
            kinds: vec![
                EquipDef {
                    kind: EquipKind::Armor,
                    stats: EquipStats {
                        damage_reduction: 0.3,
                        ..Default::default()
                    },
                    base_durability: 15.0,
                },
                EquipDef {
                    kind: EquipKind::Scope,
                    stats: EquipStats {
                        projectile_speed: 1.4,
                        projectile_lifetime: 1.5,
                        ..Default::default()
                    },
                    base_durability: 20.0,
                },
                EquipDef {
                    kind: EquipKind::Boots,
                    stats: EquipStats {
                        speed_boost: 0.25,
                        ..Default::default()
                    },
                    base_durability: 40.0,
                },
                EquipDef {
                    kind: EquipKind::HeavyAmmo,
                    stats: EquipStats {
                        damage_boost: 2.0,
                        ..Default::default()
                    },
                    base_durability: 12.0,
                },
            ],
            rarities: vec![
                RarityDef {
                    rarity: Rarity::Common,
                    stat_mult: 1.0,
                    durability_mult: 1.0,
                    weight: 0.6,
                },
                RarityDef {
                    rarity: Rarity::Rare,
                    stat_mult: 1.5,
                    durability_mult: 1.4,
                    weight: 0.3,
                },
                RarityDef {
                    rarity: Rarity::Epic,
                    stat_mult: 2.0,
                    durability_mult: 1.8,
                    weight: 0.1,
                },
            ],
        }
    }
}

/// Zone phase table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneConfig {
    pub phases: Vec<ZonePhase>,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        let phase = |wait, shrink, target_radius, damage_rate, drift| ZonePhase {
            wait,
            shrink,
            target_radius,
            damage_rate,
            drift,
        };
        Self {
            phases: vec![
                phase(30.0, 20.0, 2000.0, 0.02, 300.0),
                phase(25.0, 12.0, 700.0, 0.04, 200.0),
                phase(20.0, 12.0, 350.0, 0.07, 120.0),
                phase(15.0, 10.0, 150.0, 0.12, 60.0),
                phase(10.0, 8.0, 50.0, 0.20, 30.0),
            ],
        }
    }
}

/// Complete simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub world: WorldConfig,
    pub entity: EntityConfig,
    pub absorption: AbsorptionConfig,
    pub projectile: ProjectileConfig,
    pub bots: BotConfig,
    pub food: FoodConfig,
    pub buffs: BuffConfig,
    pub equipment: EquipmentConfig,
    pub zone: ZoneConfig,
    pub skills: Vec<SkillDef>,
    /// Upper bound on a single step's dt
    pub max_step: f32,
    /// Simulated seconds between the human's death and the result reveal
    pub result_delay: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            world: WorldConfig::default(),
            entity: EntityConfig::default(),
            absorption: AbsorptionConfig::default(),
            projectile: ProjectileConfig::default(),
            bots: BotConfig::default(),
            food: FoodConfig::default(),
            buffs: BuffConfig::default(),
            equipment: EquipmentConfig::default(),
            zone: ZoneConfig::default(),
            skills: default_catalog(),
            max_step: 0.05,
            result_delay: 3.0,
        }
    }
}

impl SimConfig {
    /// Parse a JSON document and validate it
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        log::info!(
            "Loaded config: world {}x{}, {} bots, {} zone phases",
            config.world.width,
            config.world.height,
            config.bots.count,
            config.zone.phases.len()
        );
        Ok(config)
    }

    /// Check the cross-field constraints serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        let world = &self.world;
        if world.width <= 0.0 || world.height <= 0.0 {
            return Err(ConfigError::WorldSize {
                width: world.width,
                height: world.height,
            });
        }
        if world.cell_size <= 0.0 {
            return Err(ConfigError::CellSize(world.cell_size));
        }
        if self.entity.initial_mass < self.entity.min_mass {
            return Err(ConfigError::InitialMass {
                initial: self.entity.initial_mass,
                floor: self.entity.min_mass,
            });
        }
        if self.zone.phases.is_empty() {
            return Err(ConfigError::NoZonePhases);
        }
        if let Some(index) = self
            .zone
            .phases
            .iter()
            .position(|p| p.wait < 0.0 || p.shrink < 0.0)
        {
            return Err(ConfigError::ZonePhaseDuration { index });
        }
        let weights = &self.equipment.rarities;
        if weights.iter().any(|r| r.weight < 0.0) || weights.iter().map(|r| r.weight).sum::<f32>() <= 0.0 {
            return Err(ConfigError::RarityWeights);
        }
        for kind in EquipKind::ALL {
            if self.equip_def(kind).is_none() {
                return Err(ConfigError::MissingEquipment(kind));
            }
        }
        if self.skills.is_empty() {
            return Err(ConfigError::NoSkills);
        }
        for (i, skill) in self.skills.iter().enumerate() {
            if self.skills[..i].iter().any(|s| s.id == skill.id) {
                return Err(ConfigError::DuplicateSkill(skill.id));
            }
        }
        Ok(())
    }

    #[inline]
    pub fn world_size(&self) -> Vec2 {
        Vec2::new(self.world.width, self.world.height)
    }

    #[inline]
    pub fn world_center(&self) -> Vec2 {
        self.world_size() * 0.5
    }

    pub fn equip_def(&self, kind: EquipKind) -> Option<&EquipDef> {
        self.equipment.kinds.iter().find(|d| d.kind == kind)
    }

    pub fn rarity_def(&self, rarity: Rarity) -> Option<&RarityDef> {
        self.equipment.rarities.iter().find(|r| r.rarity == rarity)
    }

    pub fn skill_def(&self, id: SkillId) -> Option<&SkillDef> {
        self.skills.iter().find(|s| s.id == id)
    }
}
