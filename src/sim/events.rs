//! Typed lifecycle and gameplay events
//!
//! Raised during a step into the state's event list and drained once by the
//! caller afterwards, so nothing reacts re-entrantly mid-step.

use serde::{Deserialize, Serialize};

use super::skills::SkillChoice;
use super::state::{EntityId, MatchPhase};

/// How an entity died
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KillCause {
    Absorbed,
    Thorns,
    Projectile,
    Zone,
}

/// Final record for the human player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameResult {
    pub name: String,
    pub rank: usize,
    pub kills: u32,
    pub max_mass: u32,
    /// Seconds survived
    pub survival_time: f32,
    pub is_winner: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    PhaseChanged {
        from: MatchPhase,
        to: MatchPhase,
    },
    MatchResult(GameResult),
    /// The human reached a new level and must pick a skill
    LevelUpOffer {
        level: u32,
        choices: Vec<SkillChoice>,
    },
    EntityKilled {
        victim: EntityId,
        killer: Option<EntityId>,
        cause: KillCause,
    },
    /// A zone phase entered its waiting period (0-based phase index)
    ZonePhaseStarted {
        phase: usize,
    },
    ZoneShrinkStarted {
        phase: usize,
    },
}
