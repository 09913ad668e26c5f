//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must stay pure and
//! deterministic:
//! - One step per call, dt clamped to the configured maximum
//! - Seeded RNG only
//! - Stable iteration order (entity list order)
//! - No rendering or platform dependencies

pub mod absorption;
pub mod bot;
pub mod buffs;
pub mod collision;
pub mod equipment;
pub mod events;
pub mod projectile;
pub mod ranking;
pub mod skills;
pub mod snapshot;
pub mod spatial;
pub mod spawn;
pub mod state;
pub mod tick;
pub mod zone;

pub use bot::{BotBrain, Personality};
pub use buffs::BuffKind;
pub use collision::{CollisionResult, circle_collision};
pub use equipment::{EquipKind, Rarity};
pub use events::{GameResult, KillCause, SimEvent};
pub use ranking::{Leaderboard, LeaderboardEntry};
pub use skills::{SkillChoice, SkillId};
pub use snapshot::Snapshot;
pub use spatial::SpatialGrid;
pub use state::{Control, Entity, EntityId, GameState, MatchPhase};
pub use tick::{TickInput, tick};
pub use zone::{Zone, ZoneMode, ZonePhase};
