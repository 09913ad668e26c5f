//! Fixed-order simulation step
//!
//! Advances every subsystem once, then runs the match lifecycle (level-up
//! gate, human death, deferred result reveal, termination).

use std::sync::Arc;

use glam::Vec2;

use super::events::{GameResult, SimEvent};
use super::skills::SkillId;
use super::state::{DeathRecord, GameState, MatchPhase, PendingReveal};
use super::{absorption, bot, buffs, collision, equipment, projectile, ranking, spawn, zone};

/// Per-step intent from the input collaborator (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Desired movement direction, unit length or zero
    pub move_dir: Vec2,
    /// World-space aim point
    pub aim: Vec2,
    /// Fire held
    pub fire: bool,
    /// Skill picked from the pending level-up offer
    pub selected_skill: Option<SkillId>,
    /// Demo mode: the human slot is driven by the autopilot brain
    pub autopilot: bool,
}

/// Advance the run by one step of `dt` seconds (clamped to `max_step`)
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    if state.stopped || state.finished {
        return;
    }
    let dt = dt.max(0.0).min(state.config.max_step);

    if state.level_up_paused {
        resolve_level_up(state, input);
        if state.level_up_paused {
            return;
        }
    }

    apply_human_intent(state, input, dt);
    bot::update_decisions(state, dt);
    bot::update_firing(state, dt);

    collision::move_entities(state, dt);
    state.rebuild_grid();

    zone::update(state, dt);
    spawn::update_food(state, dt);

    collision::update(state);
    absorption::update(state, dt);
    projectile::update(state, dt);
    buffs::update(state, dt);
    equipment::update(state, dt);

    zone::apply_damage(state, dt);
    apply_regen(state, dt);
    sweep(state);

    ranking::update(state);
    check_level_ups(state, input.autopilot);

    state.time += dt;
    state.steps += 1;
    update_lifecycle(state, dt);

    state.check_invariants();
}

/// Apply the human's pick (or the autopilot's) to the pending offer
fn resolve_level_up(state: &mut GameState, input: &TickInput) {
    let cfg = Arc::clone(&state.config);
    let Some(h) = state.human else {
        state.level_up_paused = false;
        return;
    };
    let human = &mut state.entities[h];
    if !human.alive || !human.skills.is_pending() {
        state.level_up_paused = false;
        return;
    }

    let picked = if input.autopilot {
        human.skills.auto_select(&cfg.skills, &mut state.rng)
    } else {
        input
            .selected_skill
            .filter(|&id| human.skills.select(id, &cfg.skills))
    };
    if let Some(id) = picked {
        let skill = cfg.skill_def(id).map_or(id.as_str(), |def| def.name.as_str());
        log::info!("{} learned {} (level {})", human.name, skill, human.skills.level());
    }
    if !human.skills.is_pending() {
        state.level_up_paused = false;
    }
}

/// Feed the human's movement and fire intent, from input or the autopilot
fn apply_human_intent(state: &mut GameState, input: &TickInput, dt: f32) {
    let cfg = Arc::clone(&state.config);
    let Some(h) = state.human else {
        return;
    };
    if !state.entities[h].alive {
        return;
    }

    let (move_dir, aim, fire) = if input.autopilot {
        if state.autopilot.needs_decision(dt) {
            let view = bot::build_view(state, h);
            state.autopilot.think(&view, &cfg, &mut state.rng);
        }
        let human = &state.entities[h];
        let step = (human.speed(&cfg) * dt).max(f32::EPSILON);
        let to_target = state.autopilot.target - human.pos;
        let move_dir = if to_target.length() > 1.0 {
            (to_target / step).clamp_length_max(1.0)
        } else {
            Vec2::ZERO
        };
        match bot::shoot_target(state, h) {
            Some(target) => (move_dir, target, true),
            None => (move_dir, human.aim, false),
        }
    } else {
        (input.move_dir.clamp_length_max(1.0), input.aim, input.fire)
    };

    let human = &mut state.entities[h];
    human.move_dir = move_dir;
    human.aim = aim;
    human.fire_cooldown -= dt;
    if fire && human.fire_cooldown <= 0.0 && projectile::fire(state, h, aim) {
        state.entities[h].fire_cooldown = cfg.projectile.fire_cooldown;
    }
}

/// Regeneration skill: flat mass per second
fn apply_regen(state: &mut GameState, dt: f32) {
    for entity in state.entities.iter_mut().filter(|e| e.alive) {
        let rate = entity.stats().regen_rate;
        if rate > 0.0 {
            entity.gain(rate * dt);
        }
    }
}

/// Drop consumed pickups and dead shots
fn sweep(state: &mut GameState) {
    state.food.retain(|f| f.alive);
    state.buff_pickups.retain(|b| b.alive);
    state.equipment_pickups.retain(|p| p.alive);
    state.projectiles.retain(|p| p.alive);
}

/// At most one new level per entity per step. Bots (and the autopiloted
/// human) pick at once; a manual human freezes the run until they choose.
fn check_level_ups(state: &mut GameState, autopilot: bool) {
    let cfg = Arc::clone(&state.config);
    for i in 0..state.entities.len() {
        let entity = &mut state.entities[i];
        if !entity.alive || !entity.skills.check_level_up(entity.mass, &cfg.skills, &mut state.rng) {
            continue;
        }
        let manual = entity.is_human() && !autopilot;
        if !manual {
            if let Some(id) = entity.skills.auto_select(&cfg.skills, &mut state.rng) {
                log::debug!("{} auto-learned {}", entity.name, id.as_str());
            }
            continue;
        }
        let level = entity.skills.level();
        let choices = entity.skills.choices().to_vec();
        log::info!("{} reached level {}, choosing a skill", entity.name, level);
        state.level_up_paused = true;
        state.push_event(SimEvent::LevelUpOffer { level, choices });
    }
}

fn set_phase(state: &mut GameState, to: MatchPhase) {
    let from = state.phase;
    if from == to {
        return;
    }
    state.phase = to;
    state.push_event(SimEvent::PhaseChanged { from, to });
}

/// Human death, deferred reveal, win detection and termination
fn update_lifecycle(state: &mut GameState, dt: f32) {
    let alive = state.alive_count();
    let human_alive = state.human_entity().map(|e| e.alive);

    let just_died = state.phase == MatchPhase::Playing && human_alive == Some(false);
    if just_died {
        let rank = alive + 1;
        state.death = Some(DeathRecord { time: state.time, rank });
        state.level_up_paused = false;
        if let Some(human) = state.human_entity() {
            log::info!("{} was eliminated at {:.1}s, rank #{}", human.name, state.time, rank);
        }
        set_phase(state, MatchPhase::Spectating);
        state.pending_reveal = Some(PendingReveal {
            run_id: state.run_id,
            remaining: state.config.result_delay,
        });
    }

    match state.phase {
        MatchPhase::Playing if human_alive == Some(true) && alive <= 1 => reveal_result(state),
        MatchPhase::Spectating => {
            // A reveal armed by an earlier run never fires
            let run_id = state.run_id;
            if state.pending_reveal.is_some_and(|r| r.run_id != run_id) {
                state.pending_reveal = None;
            }
            let due = match state.pending_reveal.as_mut() {
                Some(reveal) if !just_died => {
                    reveal.remaining -= dt;
                    reveal.remaining <= 0.0
                }
                _ => false,
            };
            if due || alive <= 1 {
                reveal_result(state);
            }
        }
        _ => {}
    }

    let result_shown = state.phase == MatchPhase::Result || state.human.is_none();
    if result_shown && alive <= 1 && !state.finished {
        state.finished = true;
        log::info!("Run finished after {:.1}s with {} left standing", state.time, alive);
    }
}

/// Build the human's final record and move to the result phase (once)
fn reveal_result(state: &mut GameState) {
    if state.phase == MatchPhase::Result {
        return;
    }
    state.pending_reveal = None;
    let Some(human) = state.human_entity() else {
        return;
    };
    let (rank, survival_time) = match (human.alive, state.death) {
        (true, _) => (1, state.time),
        (false, Some(death)) => (death.rank, death.time),
        (false, None) => (state.alive_count() + 1, state.time),
    };
    let result = GameResult {
        name: human.name.clone(),
        rank,
        kills: human.kills,
        max_mass: human.max_mass.floor().max(0.0) as u32,
        survival_time,
        is_winner: human.alive,
    };
    log::info!(
        "Result: {} placed #{} with {} kills, max mass {}",
        result.name,
        result.rank,
        result.kills,
        result.max_mass
    );
    set_phase(state, MatchPhase::Result);
    state.result = Some(result.clone());
    state.push_event(SimEvent::MatchResult(result));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SimConfig;
    use crate::sim::testutil::{add_actor, empty_state};
    use crate::sim::skills::SkillDef;
    use crate::sim::zone::ZonePhase;

    const DT: f32 = 0.05;

    #[test]
    fn test_dt_is_clamped() {
        let mut state = empty_state();
        add_actor(&mut state, Vec2::new(1000.0, 1000.0), 20.0, true);
        add_actor(&mut state, Vec2::new(4000.0, 4000.0), 20.0, false);
        tick(&mut state, &TickInput::default(), 1.0);
        assert!((state.time - 0.05).abs() < 1e-6);
        tick(&mut state, &TickInput::default(), -1.0);
        assert!((state.time - 0.05).abs() < 1e-6);
        assert_eq!(state.steps, 2);
    }

    #[test]
    fn test_first_step_starts_zone() {
        let mut state = empty_state();
        add_actor(&mut state, Vec2::new(3000.0, 3000.0), 20.0, true);
        add_actor(&mut state, Vec2::new(4000.0, 4000.0), 20.0, false);
        tick(&mut state, &TickInput::default(), DT);
        let events = state.drain_events();
        assert!(events.contains(&SimEvent::ZonePhaseStarted { phase: 0 }));
        assert!(state.zone.started);
    }

    #[test]
    fn test_human_moves_with_intent() {
        let mut state = empty_state();
        let h = add_actor(&mut state, Vec2::new(1000.0, 1000.0), 20.0, true);
        add_actor(&mut state, Vec2::new(4000.0, 4000.0), 20.0, false);
        let input = TickInput {
            move_dir: Vec2::X,
            ..Default::default()
        };
        tick(&mut state, &input, DT);
        assert!(state.entities[h].pos.x > 1000.0);
        assert_eq!(state.entities[h].pos.y, 1000.0);
    }

    #[test]
    fn test_level_up_pauses_until_valid_choice() {
        let mut state = empty_state();
        let h = add_actor(&mut state, Vec2::new(1000.0, 1000.0), 31.0, true);
        add_actor(&mut state, Vec2::new(4000.0, 4000.0), 20.0, false);

        tick(&mut state, &TickInput::default(), DT);
        assert!(state.level_up_paused);
        let offer = state.drain_events().into_iter().find_map(|e| match e {
            SimEvent::LevelUpOffer { level, choices } => Some((level, choices)),
            _ => None,
        });
        let (level, choices) = offer.expect("level-up offer");
        assert_eq!(level, 1);
        assert_eq!(choices.len(), 3);

        // Frozen: no time passes, a skill outside the offer changes nothing
        let time = state.time;
        let offered: Vec<SkillId> = choices.iter().map(|c| c.id).collect();
        let outsider = SkillId::ALL.iter().copied().find(|id| !offered.contains(id));
        let invalid = TickInput {
            selected_skill: outsider,
            ..Default::default()
        };
        tick(&mut state, &invalid, DT);
        assert!(state.level_up_paused);
        assert_eq!(state.time, time);

        let valid = TickInput {
            selected_skill: Some(choices[0].id),
            ..Default::default()
        };
        tick(&mut state, &valid, DT);
        assert!(!state.level_up_paused);
        assert!(state.time > time);
        assert_eq!(state.entities[h].skills.skill_level(choices[0].id), 1);
    }

    #[test]
    fn test_maxed_catalog_never_freezes_run() {
        let mut cfg = SimConfig::default();
        cfg.skills = vec![SkillDef::new(SkillId::Swift, "Swift", 1, 0.15)];
        let mut state = empty_state();
        state.config = Arc::new(cfg);
        add_actor(&mut state, Vec2::new(1000.0, 1000.0), 50.0, true);
        add_actor(&mut state, Vec2::new(4000.0, 4000.0), 20.0, false);

        tick(&mut state, &TickInput::default(), DT);
        assert!(state.level_up_paused);
        let pick = TickInput {
            selected_skill: Some(SkillId::Swift),
            ..Default::default()
        };
        tick(&mut state, &pick, DT);
        assert!(!state.level_up_paused);

        // Mass still clears level 2, but there is nothing left to offer
        let time = state.time;
        for _ in 0..20 {
            tick(&mut state, &TickInput::default(), DT);
        }
        assert!(!state.level_up_paused);
        assert!((state.time - (time + 20.0 * DT)).abs() < 1e-4);
        let offers = state
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, SimEvent::LevelUpOffer { .. }))
            .count();
        assert_eq!(offers, 1);
    }

    #[test]
    fn test_empty_world_finishes_cleanly() {
        let mut state = empty_state();
        tick(&mut state, &TickInput::default(), DT);
        assert!(state.finished);
        assert!(state.result.is_none());
        assert!(state.leaderboard.is_empty());

        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.steps, 1);
    }

    #[test]
    fn test_autopilot_picks_without_pausing() {
        let mut state = empty_state();
        let h = add_actor(&mut state, Vec2::new(1000.0, 1000.0), 31.0, true);
        add_actor(&mut state, Vec2::new(4000.0, 4000.0), 20.0, false);
        let input = TickInput {
            autopilot: true,
            ..Default::default()
        };
        tick(&mut state, &input, DT);
        assert!(!state.level_up_paused);
        assert_eq!(state.entities[h].skills.level(), 1);
        assert!(!state.entities[h].skills.is_pending());
    }

    #[test]
    fn test_bots_level_up_on_their_own() {
        let mut state = empty_state();
        add_actor(&mut state, Vec2::new(1000.0, 1000.0), 20.0, true);
        let b = add_actor(&mut state, Vec2::new(4000.0, 4000.0), 50.0, false);
        tick(&mut state, &TickInput::default(), DT);
        assert!(!state.level_up_paused);
        // 50 clears level 1 (30) and 2 (45) but only one level per step
        assert_eq!(state.entities[b].skills.level(), 1);
        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.entities[b].skills.level(), 2);
    }

    #[test]
    fn test_death_then_delayed_result() {
        let mut state = empty_state();
        let h = add_actor(&mut state, Vec2::new(1000.0, 1000.0), 20.0, true);
        add_actor(&mut state, Vec2::new(3000.0, 3000.0), 20.0, false);
        add_actor(&mut state, Vec2::new(5000.0, 5000.0), 20.0, false);
        state.entities[h].kill();

        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.phase, MatchPhase::Spectating);
        let events = state.drain_events();
        assert!(events.contains(&SimEvent::PhaseChanged {
            from: MatchPhase::Playing,
            to: MatchPhase::Spectating,
        }));
        assert_eq!(state.death.map(|d| d.rank), Some(3));

        // 3 simulated seconds at 0.05 s
        for _ in 0..59 {
            tick(&mut state, &TickInput::default(), DT);
        }
        assert_eq!(state.phase, MatchPhase::Spectating);
        for _ in 0..2 {
            tick(&mut state, &TickInput::default(), DT);
        }
        assert_eq!(state.phase, MatchPhase::Result);
        let result = state.result.clone().expect("result");
        assert_eq!(result.rank, 3);
        assert!(!result.is_winner);
        assert!(!state.finished);

        let results = state
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, SimEvent::MatchResult(_)))
            .count();
        assert_eq!(results, 1);
    }

    #[test]
    fn test_stop_cancels_reveal() {
        let mut state = empty_state();
        let h = add_actor(&mut state, Vec2::new(1000.0, 1000.0), 20.0, true);
        add_actor(&mut state, Vec2::new(3000.0, 3000.0), 20.0, false);
        add_actor(&mut state, Vec2::new(5000.0, 5000.0), 20.0, false);
        state.entities[h].kill();
        tick(&mut state, &TickInput::default(), DT);
        assert!(state.pending_reveal.is_some());

        state.stop();
        for _ in 0..100 {
            tick(&mut state, &TickInput::default(), DT);
        }
        assert_eq!(state.phase, MatchPhase::Spectating);
        assert!(state.result.is_none());
    }

    #[test]
    fn test_stale_reveal_never_fires() {
        let mut state = empty_state();
        let h = add_actor(&mut state, Vec2::new(1000.0, 1000.0), 20.0, true);
        add_actor(&mut state, Vec2::new(3000.0, 3000.0), 20.0, false);
        add_actor(&mut state, Vec2::new(5000.0, 5000.0), 20.0, false);
        state.entities[h].kill();
        tick(&mut state, &TickInput::default(), DT);

        // Pretend the run was replaced underneath the pending reveal
        state.run_id += 1;
        tick(&mut state, &TickInput::default(), DT);
        assert!(state.pending_reveal.is_none());
        assert_eq!(state.phase, MatchPhase::Spectating);
    }

    #[test]
    fn test_last_human_standing_wins() {
        let mut state = empty_state();
        let h = add_actor(&mut state, Vec2::new(1000.0, 1000.0), 80.0, true);
        let b = add_actor(&mut state, Vec2::new(3000.0, 3000.0), 20.0, false);
        state.entities[h].kills = 4;
        state.entities[b].kill();

        let input = TickInput {
            autopilot: true,
            ..Default::default()
        };
        tick(&mut state, &input, DT);
        assert_eq!(state.phase, MatchPhase::Result);
        assert!(state.finished);
        let result = state.result.clone().expect("result");
        assert!(result.is_winner);
        assert_eq!(result.rank, 1);
        assert_eq!(result.kills, 4);

        // Finished runs ignore further steps
        let steps = state.steps;
        tick(&mut state, &input, DT);
        assert_eq!(state.steps, steps);
    }

    #[test]
    fn test_regen_adds_mass() {
        let mut state = empty_state();
        let h = add_actor(&mut state, Vec2::new(1000.0, 1000.0), 20.0, true);
        add_actor(&mut state, Vec2::new(5000.0, 5000.0), 20.0, false);
        let catalog = state.config.skills.clone();
        state.entities[h].skills.force_level(SkillId::Regen, 2, &catalog);
        let rate = state.entities[h].stats().regen_rate;
        assert!(rate > 0.0);

        tick(&mut state, &TickInput::default(), DT);
        assert!((state.entities[h].mass - (20.0 + rate * DT)).abs() < 1e-4);
    }

    fn arena_config() -> SimConfig {
        let mut cfg = SimConfig::default();
        cfg.world.width = 1200.0;
        cfg.world.height = 1200.0;
        cfg.world.obstacle_count = 0;
        cfg.world.spawn_margin = 100.0;
        cfg.bots.count = 7;
        cfg.food.target_count = 40;
        cfg.zone.phases = vec![
            ZonePhase {
                wait: 1.0,
                shrink: 4.0,
                target_radius: 300.0,
                damage_rate: 0.5,
                drift: 0.0,
            },
            ZonePhase {
                wait: 0.0,
                shrink: 2.0,
                target_radius: 0.0,
                damage_rate: 2.0,
                drift: 0.0,
            },
        ];
        cfg.skills.retain(|s| !matches!(s.id, SkillId::Regen | SkillId::StormShield));
        cfg
    }

    #[test]
    fn test_run_to_completion() {
        let mut state = GameState::new(Arc::new(arena_config()), 2024, "Demo");
        let input = TickInput {
            autopilot: true,
            ..Default::default()
        };
        let mut steps = 0;
        while !state.finished && steps < 20_000 {
            tick(&mut state, &input, DT);
            state.drain_events();
            steps += 1;
        }
        assert!(state.finished, "run did not finish");
        assert!(state.alive_count() <= 1);
        assert_eq!(state.phase, MatchPhase::Result);
        assert!(state.result.is_some());
    }

    #[test]
    fn test_determinism() {
        let config = Arc::new(arena_config());
        let mut a = GameState::new(Arc::clone(&config), 99, "Demo");
        let mut b = GameState::new(Arc::clone(&config), 99, "Demo");
        let input = TickInput {
            autopilot: true,
            ..Default::default()
        };
        for _ in 0..200 {
            tick(&mut a, &input, DT);
            tick(&mut b, &input, DT);
        }
        assert_eq!(a.steps, b.steps);
        assert_eq!(a.alive_count(), b.alive_count());
        for (x, y) in a.entities.iter().zip(&b.entities) {
            assert_eq!(x.pos, y.pos);
            assert_eq!(x.mass, y.mass);
        }
        assert_eq!(a.drain_events(), b.drain_events());
    }
}
