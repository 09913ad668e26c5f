//! Contact absorption: a clearly bigger entity swallows a smaller one whose
//! center lies inside its absorbing range.

use std::sync::Arc;

use super::events::{KillCause, SimEvent};
use super::state::{AbsorbCue, EntityId, GameState, pair_mut};

/// What happened when one attacker met one defender
#[derive(Debug)]
enum Outcome {
    /// Defender swallowed
    Absorbed { attacker: EntityId, defender: EntityId, cue: AbsorbCue },
    /// Attacker killed by the defender's thorns; defender survives
    Retaliated { attacker: EntityId, defender: EntityId },
}

/// Try attacker `a` against defender `b` (both indices into the entity list)
fn try_absorb(state: &mut GameState, a: usize, b: usize) -> Option<Outcome> {
    let cfg = Arc::clone(&state.config);
    let (attacker, defender) = pair_mut(&mut state.entities, a, b);
    if !attacker.alive || !defender.alive {
        return None;
    }
    if attacker.mass <= defender.mass * cfg.absorption.size_ratio {
        return None;
    }
    let range = attacker.radius(&cfg.entity) * cfg.absorption.overlap_ratio * attacker.stats().range_multiplier;
    if attacker.pos.distance(defender.pos) > range {
        return None;
    }

    let thorns = defender.stats().thorns_damage;
    if thorns > 0.0 {
        attacker.mass -= thorns;
        if attacker.below_floor(&cfg.entity) {
            attacker.kill();
            return Some(Outcome::Retaliated {
                attacker: attacker.id,
                defender: defender.id,
            });
        }
    }

    let gained = defender.mass * cfg.absorption.transfer_rate * attacker.stats().gain_multiplier;
    attacker.gain(gained);
    attacker.kills += 1;
    let cue = AbsorbCue {
        pos: defender.pos,
        radius: defender.radius(&cfg.entity),
        hue: defender.hue,
        ttl: cfg.absorption.cue_duration,
    };
    defender.kill();
    Some(Outcome::Absorbed {
        attacker: attacker.id,
        defender: defender.id,
        cue,
    })
}

/// Absorption pass. Attackers go in list order; each attacker's candidates
/// come from the spatial grid in ascending index order.
pub fn update(state: &mut GameState, dt: f32) {
    // Positions moved during collision response
    state.rebuild_grid();
    let cfg = Arc::clone(&state.config);

    for a in 0..state.entities.len() {
        let attacker = &state.entities[a];
        if !attacker.alive {
            continue;
        }
        let range = attacker.radius(&cfg.entity) * cfg.absorption.overlap_ratio * attacker.stats().range_multiplier;
        for b in state.grid.query_area(attacker.pos, range) {
            if b == a {
                continue;
            }
            if !state.entities[a].alive {
                break;
            }
            match try_absorb(state, a, b) {
                Some(Outcome::Absorbed { attacker, defender, cue }) => {
                    log::debug!("{} absorbed {}", attacker, defender);
                    state.cues.push(cue);
                    state.push_event(SimEvent::EntityKilled {
                        victim: defender,
                        killer: Some(attacker),
                        cause: KillCause::Absorbed,
                    });
                }
                Some(Outcome::Retaliated { attacker, defender }) => {
                    log::debug!("{} died to {}'s thorns", attacker, defender);
                    state.push_event(SimEvent::EntityKilled {
                        victim: attacker,
                        killer: Some(defender),
                        cause: KillCause::Thorns,
                    });
                }
                None => {}
            }
        }
    }

    for cue in &mut state.cues {
        cue.ttl -= dt;
    }
    state.cues.retain(|c| c.ttl > 0.0);
}
