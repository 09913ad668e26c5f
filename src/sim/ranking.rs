//! Live leaderboard
//!
//! Rebuilt every step from the live entities, sorted by mass descending.
//! Equal masses keep spawn order.

use serde::Serialize;

use super::state::{EntityId, GameState};

/// A single leaderboard row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub id: EntityId,
    pub name: String,
    /// Mass rounded down for display
    pub mass: u32,
    pub kills: u32,
    /// 1-based position
    pub rank: usize,
    pub is_human: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Leaderboard {
    pub entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current leader (if anyone is alive)
    pub fn leader(&self) -> Option<&LeaderboardEntry> {
        self.entries.first()
    }

    /// 1-based rank of a live entity
    pub fn rank_of(&self, id: EntityId) -> Option<usize> {
        self.entries.iter().find(|e| e.id == id).map(|e| e.rank)
    }

    /// First `n` rows
    pub fn top(&self, n: usize) -> &[LeaderboardEntry] {
        &self.entries[..n.min(self.entries.len())]
    }
}

/// Recompute the leaderboard from the live entities
pub fn update(state: &mut GameState) {
    let mut live: Vec<_> = state.entities.iter().filter(|e| e.alive).collect();
    // Stable sort, so ties stay in list order
    live.sort_by(|a, b| b.mass.total_cmp(&a.mass));
    state.leaderboard.entries = live
        .into_iter()
        .enumerate()
        .map(|(i, e)| LeaderboardEntry {
            id: e.id,
            name: e.name.clone(),
            mass: e.mass.floor().max(0.0) as u32,
            kills: e.kills,
            rank: i + 1,
            is_human: e.is_human(),
        })
        .collect();
}
