//! Mass-gated progression
//!
//! Each level-up offers up to three distinct skills that are not yet maxed.
//! Learned skills never mutate stats incrementally: the whole [`SkillStats`]
//! set is rebuilt from defaults by replaying every learned level, and every
//! skill writes only its own field, so the replay order does not matter.

use std::collections::BTreeMap;

use rand::Rng;
use rand::seq::index;
use serde::{Deserialize, Serialize};

/// Number of skills offered per level-up
pub const CHOICES_PER_LEVEL: usize = 3;

/// Mass needed to reach player level `level` (1-based)
pub fn mass_threshold(level: u32) -> f32 {
    (30.0 * 1.5f64.powi(level as i32 - 1)).floor() as f32
}

/// Skill identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillId {
    Swift,
    Glutton,
    StormShield,
    Thorns,
    GravityWell,
    Regen,
}

impl SkillId {
    pub const ALL: [SkillId; 6] = [
        SkillId::Swift,
        SkillId::Glutton,
        SkillId::StormShield,
        SkillId::Thorns,
        SkillId::GravityWell,
        SkillId::Regen,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SkillId::Swift => "swift",
            SkillId::Glutton => "glutton",
            SkillId::StormShield => "storm_shield",
            SkillId::Thorns => "thorns",
            SkillId::GravityWell => "gravity_well",
            SkillId::Regen => "regen",
        }
    }

    /// Parse a UI-supplied identifier; unknown ids yield `None`
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.as_str() == s)
    }
}

/// Stat multipliers derived from learned skills
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkillStats {
    pub speed_multiplier: f32,
    /// Scales absorption range
    pub range_multiplier: f32,
    /// Fraction of zone damage ignored (0-1)
    pub zone_resistance: f32,
    /// Scales mass gained from food and absorption
    pub gain_multiplier: f32,
    /// Mass removed from anyone who absorbs this entity
    pub thorns_damage: f32,
    /// Mass regained per second
    pub regen_rate: f32,
    pub vision_multiplier: f32,
}

impl Default for SkillStats {
    fn default() -> Self {
        Self {
            speed_multiplier: 1.0,
            range_multiplier: 1.0,
            zone_resistance: 0.0,
            gain_multiplier: 1.0,
            thorns_damage: 0.0,
            regen_rate: 0.0,
            vision_multiplier: 1.0,
        }
    }
}

/// Catalog entry: data only, the effect is chosen by `id`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillDef {
    pub id: SkillId,
    pub name: String,
    pub max_level: u32,
    /// Effect magnitude per level
    pub per_level: f32,
    /// Optional ceiling on the resulting stat
    #[serde(default)]
    pub cap: Option<f32>,
}

impl SkillDef {
    pub fn new(id: SkillId, name: &str, max_level: u32, per_level: f32) -> Self {
        Self {
            id,
            name: name.to_string(),
            max_level,
            per_level,
            cap: None,
        }
    }

    fn amount(&self, level: u32) -> f32 {
        let raw = self.per_level * level as f32;
        self.cap.map_or(raw, |cap| raw.min(cap))
    }

    /// Write this skill's contribution at `level` into `stats`
    pub fn apply(&self, level: u32, stats: &mut SkillStats) {
        let amount = self.amount(level);
        match self.id {
            SkillId::Swift => stats.speed_multiplier = 1.0 + amount,
            SkillId::Glutton => stats.gain_multiplier = 1.0 + amount,
            SkillId::StormShield => stats.zone_resistance = amount,
            SkillId::Thorns => stats.thorns_damage = amount,
            SkillId::GravityWell => stats.range_multiplier = 1.0 + amount,
            SkillId::Regen => stats.regen_rate = amount,
        }
    }
}

/// Built-in skill catalog
pub fn default_catalog() -> Vec<SkillDef> {
    vec![
        SkillDef::new(SkillId::Swift, "Swift", 5, 0.15),
        SkillDef::new(SkillId::Glutton, "Glutton", 5, 0.2),
        SkillDef {
            cap: Some(0.75),
            ..SkillDef::new(SkillId::StormShield, "Storm Shield", 3, 0.25)
        },
        SkillDef::new(SkillId::Thorns, "Thorns", 3, 2.0),
        SkillDef::new(SkillId::GravityWell, "Gravity Well", 3, 0.25),
        SkillDef::new(SkillId::Regen, "Regen", 3, 0.5),
    ]
}

/// One offered choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillChoice {
    pub id: SkillId,
    pub current_level: u32,
    pub next_level: u32,
}

/// Per-entity progression state
#[derive(Debug, Clone, Default)]
pub struct SkillBook {
    levels: BTreeMap<SkillId, u32>,
    stats: SkillStats,
    level: u32,
    pending: bool,
    choices: Vec<SkillChoice>,
}

impl SkillBook {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn stats(&self) -> &SkillStats {
        &self.stats
    }

    /// Player level (number of level-ups granted so far)
    #[inline]
    pub fn level(&self) -> u32 {
        self.level
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn choices(&self) -> &[SkillChoice] {
        &self.choices
    }

    pub fn skill_level(&self, id: SkillId) -> u32 {
        self.levels.get(&id).copied().unwrap_or(0)
    }

    /// Grant at most one level-up if `mass` reached the next threshold.
    ///
    /// Returns `true` when a new offer was generated. Nothing happens while
    /// an earlier offer is still pending, or once every skill is maxed.
    pub fn check_level_up(&mut self, mass: f32, catalog: &[SkillDef], rng: &mut impl Rng) -> bool {
        if self.pending || mass < mass_threshold(self.level + 1) {
            return false;
        }
        let choices = self.generate_choices(catalog, rng);
        if choices.is_empty() {
            return false;
        }
        self.level += 1;
        self.pending = true;
        self.choices = choices;
        true
    }

    fn generate_choices(&self, catalog: &[SkillDef], rng: &mut impl Rng) -> Vec<SkillChoice> {
        let eligible: Vec<&SkillDef> = catalog
            .iter()
            .filter(|def| self.skill_level(def.id) < def.max_level)
            .collect();
        let amount = eligible.len().min(CHOICES_PER_LEVEL);
        index::sample(rng, eligible.len(), amount)
            .into_iter()
            .map(|i| {
                let current = self.skill_level(eligible[i].id);
                SkillChoice {
                    id: eligible[i].id,
                    current_level: current,
                    next_level: current + 1,
                }
            })
            .collect()
    }

    /// Learn an offered skill. Returns `false` (and changes nothing) when
    /// `id` is not among the current choices.
    pub fn select(&mut self, id: SkillId, catalog: &[SkillDef]) -> bool {
        let Some(choice) = self.choices.iter().find(|c| c.id == id).copied() else {
            return false;
        };
        self.levels.insert(id, choice.next_level);
        self.recompute(catalog);
        self.pending = false;
        self.choices.clear();
        true
    }

    /// Pick one of the current choices uniformly at random
    pub fn auto_select(&mut self, catalog: &[SkillDef], rng: &mut impl Rng) -> Option<SkillId> {
        if self.choices.is_empty() {
            // Every skill maxed: nothing to offer, release the gate
            self.pending = false;
            return None;
        }
        let id = self.choices[rng.random_range(0..self.choices.len())].id;
        self.select(id, catalog).then_some(id)
    }

    /// Set a skill level directly, bypassing offers
    #[cfg(test)]
    pub(crate) fn force_level(&mut self, id: SkillId, level: u32, catalog: &[SkillDef]) {
        self.levels.insert(id, level);
        self.recompute(catalog);
    }

    /// Rebuild stats from defaults by replaying every learned skill
    fn recompute(&mut self, catalog: &[SkillDef]) {
        let mut stats = SkillStats::default();
        for (&id, &level) in &self.levels {
            if level == 0 {
                continue;
            }
            if let Some(def) = catalog.iter().find(|d| d.id == id) {
                def.apply(level, &mut stats);
            }
        }
        self.stats = stats;
    }
}
