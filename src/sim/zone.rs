//! Shrinking safe zone
//!
//! Two-state machine per phase: waiting (timer counts down, next circle is
//! previewed) then shrinking (linear interpolation from the circle captured at
//! shrink start to the previewed one). After the last phase the zone holds
//! still and keeps hurting at the last phase's rate.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::events::{KillCause, SimEvent};
use super::state::GameState;
use crate::config::SimConfig;
use crate::random_range;

/// One row of the phase table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZonePhase {
    /// Seconds before shrinking starts
    pub wait: f32,
    /// Seconds the shrink takes
    pub shrink: f32,
    pub target_radius: f32,
    /// Fraction of mass lost per second outside the zone
    pub damage_rate: f32,
    /// Max per-axis center offset of the next circle
    pub drift: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneMode {
    Waiting,
    Shrinking,
    /// Past the last phase
    Settled,
}

/// Notable change produced by [`Zone::advance`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneTransition {
    PhaseStarted(usize),
    ShrinkStarted(usize),
    Settled,
}

#[derive(Debug, Clone, Serialize)]
pub struct Zone {
    /// 0-based index into the phase table
    pub phase: usize,
    pub mode: ZoneMode,
    /// Seconds left in the current mode
    pub timer: f32,
    pub center: Vec2,
    pub radius: f32,
    pub start_center: Vec2,
    pub start_radius: f32,
    pub target_center: Vec2,
    pub target_radius: f32,
    /// Preview of the circle the current phase shrinks to
    pub next_center: Vec2,
    pub next_radius: f32,
    pub damage_rate: f32,
    /// False until the first step; an unstarted zone is harmless
    pub started: bool,
}

impl Zone {
    /// Full-world circle, not yet started
    pub fn new(cfg: &SimConfig) -> Self {
        let center = cfg.world_center();
        let radius = cfg.world.width.max(cfg.world.height) * 0.5;
        Self {
            phase: 0,
            mode: ZoneMode::Waiting,
            timer: 0.0,
            center,
            radius,
            start_center: center,
            start_radius: radius,
            target_center: center,
            target_radius: radius,
            next_center: center,
            next_radius: radius,
            damage_rate: 0.0,
            started: false,
        }
    }

    /// Enter the waiting period of `self.phase` and pick the next circle
    fn begin_phase(&mut self, cfg: &SimConfig, rng: &mut impl Rng) {
        let Some(row) = cfg.zone.phases.get(self.phase) else {
            self.mode = ZoneMode::Settled;
            return;
        };
        self.mode = ZoneMode::Waiting;
        self.timer = row.wait;
        self.damage_rate = row.damage_rate;

        let r = row.target_radius;
        let size = cfg.world_size();
        let drifted = Vec2::new(
            self.center.x + random_range(rng, -row.drift, row.drift),
            self.center.y + random_range(rng, -row.drift, row.drift),
        );
        // Keep the whole circle inside the world where it fits at all
        self.next_center = Vec2::new(
            drifted.x.min(size.x - r).max(r),
            drifted.y.min(size.y - r).max(r),
        );
        self.next_radius = r;
    }

    /// Advance timers by `dt`. Returns at most one transition per call.
    pub fn advance(&mut self, dt: f32, cfg: &SimConfig, rng: &mut impl Rng) -> Option<ZoneTransition> {
        if !self.started {
            self.started = true;
            self.phase = 0;
            self.begin_phase(cfg, rng);
            return Some(ZoneTransition::PhaseStarted(0));
        }
        let row = match self.mode {
            ZoneMode::Settled => return None,
            _ => cfg.zone.phases.get(self.phase)?,
        };

        self.timer -= dt;
        match self.mode {
            ZoneMode::Waiting => {
                if self.timer <= 0.0 {
                    self.mode = ZoneMode::Shrinking;
                    self.timer = row.shrink;
                    self.start_center = self.center;
                    self.start_radius = self.radius;
                    self.target_center = self.next_center;
                    self.target_radius = self.next_radius;
                    return Some(ZoneTransition::ShrinkStarted(self.phase));
                }
                None
            }
            ZoneMode::Shrinking => {
                let t = if row.shrink > 0.0 {
                    (1.0 - self.timer / row.shrink).clamp(0.0, 1.0)
                } else {
                    1.0
                };
                self.center = self.start_center.lerp(self.target_center, t);
                self.radius = self.start_radius + (self.target_radius - self.start_radius) * t;

                if self.timer > 0.0 {
                    return None;
                }
                self.center = self.target_center;
                self.radius = self.target_radius;
                self.phase += 1;
                self.begin_phase(cfg, rng);
                if self.mode == ZoneMode::Settled {
                    Some(ZoneTransition::Settled)
                } else {
                    Some(ZoneTransition::PhaseStarted(self.phase))
                }
            }
            ZoneMode::Settled => None,
        }
    }

    /// Strictly outside the circle; the boundary itself is safe
    #[inline]
    pub fn is_outside(&self, pos: Vec2) -> bool {
        pos.distance(self.center) > self.radius
    }

    /// Mass lost this step by an entity at `pos`
    pub fn damage_for(&self, pos: Vec2, mass: f32, resistance: f32, dt: f32) -> f32 {
        if !self.started || !self.is_outside(pos) {
            return 0.0;
        }
        mass * self.damage_rate * (1.0 - resistance) * dt
    }

    pub fn time_left(&self) -> f32 {
        self.timer.max(0.0)
    }

    /// Short status line for the HUD
    pub fn label(&self) -> String {
        if !self.started {
            return String::new();
        }
        let secs = self.time_left().ceil() as u32;
        match self.mode {
            ZoneMode::Waiting => format!("Phase {} | zone closes in {}s", self.phase + 1, secs),
            ZoneMode::Shrinking => format!("Zone shrinking... {}s", secs),
            ZoneMode::Settled => "Final zone".to_string(),
        }
    }
}

/// Advance the zone and report its transitions
pub fn update(state: &mut GameState, dt: f32) {
    let config = std::sync::Arc::clone(&state.config);
    let Some(transition) = state.zone.advance(dt, &config, &mut state.rng) else {
        return;
    };
    match transition {
        ZoneTransition::PhaseStarted(phase) => {
            log::info!(
                "Zone phase {} started: next circle r={:.0} at ({:.0}, {:.0})",
                phase + 1,
                state.zone.next_radius,
                state.zone.next_center.x,
                state.zone.next_center.y
            );
            state.push_event(SimEvent::ZonePhaseStarted { phase });
        }
        ZoneTransition::ShrinkStarted(phase) => {
            log::info!("Zone phase {} shrinking", phase + 1);
            state.push_event(SimEvent::ZoneShrinkStarted { phase });
        }
        ZoneTransition::Settled => {
            log::info!("Zone settled at r={:.0}", state.zone.radius);
        }
    }
}

/// Hurt every live entity outside the zone; kill those pushed below the floor
pub fn apply_damage(state: &mut GameState, dt: f32) {
    let floor = state.config.entity.min_mass;
    let mut killed = Vec::new();
    for entity in state.entities.iter_mut().filter(|e| e.alive) {
        let damage = state
            .zone
            .damage_for(entity.pos, entity.mass, entity.stats().zone_resistance, dt);
        if damage <= 0.0 {
            continue;
        }
        entity.mass -= damage;
        if entity.mass < floor {
            entity.kill();
            killed.push(entity.id);
        }
    }
    for victim in killed {
        log::debug!("{} died in the zone", victim);
        state.push_event(SimEvent::EntityKilled {
            victim,
            killer: None,
            cause: KillCause::Zone,
        });
    }
}
