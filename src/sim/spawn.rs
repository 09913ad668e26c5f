//! Run population and the food spawner

use std::sync::Arc;

use rand::Rng;

use super::bot::{BotBrain, Personality};
use super::state::{Control, Entity, Food, GameState, Obstacle};
use crate::config::SimConfig;
use crate::{random_point, random_range};

/// Name used when the player leaves theirs blank
pub const DEFAULT_HUMAN_NAME: &str = "Player";

/// Display name of the `index`-th bot. Names are reused with a numeric
/// suffix once the configured list runs out.
pub fn bot_name(cfg: &SimConfig, index: usize) -> String {
    let names = &cfg.bots.names;
    if names.is_empty() {
        return format!("Bot {}", index + 1);
    }
    let base = &names[index % names.len()];
    match index / names.len() {
        0 => base.clone(),
        round => format!("{} {}", base, round + 1),
    }
}

/// Human first, then bots, obstacles and the initial food field
pub fn populate(state: &mut GameState, human_name: &str) {
    let cfg = Arc::clone(&state.config);
    let size = cfg.world_size();
    let margin = cfg.world.spawn_margin;
    let mass = cfg.entity.initial_mass;

    let name = match human_name.trim() {
        "" => DEFAULT_HUMAN_NAME.to_string(),
        trimmed => trimmed.to_string(),
    };
    let pos = random_point(&mut state.rng, size, margin);
    let hue = state.rng.random_range(0..360);
    let id = state.next_entity_id();
    state.entities.push(Entity::new(id, name, hue, Control::Human, pos, mass));
    state.human = Some(state.entities.len() - 1);

    for i in 0..cfg.bots.count {
        let pos = random_point(&mut state.rng, size, margin);
        let hue = state.rng.random_range(0..360);
        let brain = BotBrain::new(Personality::random(&mut state.rng), pos);
        let id = state.next_entity_id();
        state
            .entities
            .push(Entity::new(id, bot_name(&cfg, i), hue, Control::Bot(brain), pos, mass));
    }

    for _ in 0..cfg.world.obstacle_count {
        let pos = random_point(&mut state.rng, size, margin);
        let radius = random_range(&mut state.rng, cfg.world.obstacle_min_radius, cfg.world.obstacle_max_radius);
        let id = state.next_id();
        state.obstacles.push(Obstacle {
            id,
            pos,
            radius,
            health: radius * 2.0,
        });
    }

    for _ in 0..cfg.food.target_count {
        spawn_food(state);
    }
}

/// Drop one food item at a random point
pub fn spawn_food(state: &mut GameState) {
    let cfg = &state.config.food;
    let pos = random_point(&mut state.rng, state.config.world_size(), cfg.margin);
    let large = state.rng.random::<f32>() < cfg.large_chance;
    let (nutrition, radius) = if large {
        (cfg.large_nutrition, cfg.large_radius)
    } else {
        (cfg.small_nutrition, cfg.small_radius)
    };
    let hue = state.rng.random_range(0..360);
    let id = state.next_id();
    state.food.push(Food {
        id,
        pos,
        radius,
        nutrition,
        hue,
        alive: true,
    });
}

/// Top the food field up towards its target population
pub fn update_food(state: &mut GameState, dt: f32) {
    let cfg = Arc::clone(&state.config);
    let live = state.food.iter().filter(|f| f.alive).count();
    if live >= cfg.food.target_count {
        return;
    }
    state.spawners.food_accumulator += dt * cfg.food.respawn_rate;
    let mut spawned = 0;
    while state.spawners.food_accumulator >= 1.0 && spawned < cfg.food.max_spawn_per_step {
        spawn_food(state);
        state.spawners.food_accumulator -= 1.0;
        spawned += 1;
    }
    if state.spawners.food_accumulator >= 1.0 {
        log::warn!(
            "Food spawner fell behind by {:.0} items; dropping the backlog",
            state.spawners.food_accumulator
        );
        state.spawners.food_accumulator = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::testutil::empty_state;

    #[test]
    fn test_populate_layout() {
        let config = Arc::new(SimConfig::default());
        let state = GameState::new(Arc::clone(&config), 42, "  Hero ");

        assert_eq!(state.entities.len(), 1 + config.bots.count);
        assert_eq!(state.human, Some(0));
        assert_eq!(state.entities[0].name, "Hero");
        assert!(state.entities[0].is_human());
        assert!(state.entities[1..].iter().all(|e| e.brain().is_some()));
        assert!(state.entities.iter().all(|e| e.mass == config.entity.initial_mass));

        assert_eq!(state.obstacles.len(), 30);
        for obstacle in &state.obstacles {
            assert!((25.0..=60.0).contains(&obstacle.radius));
            assert_eq!(obstacle.health, obstacle.radius * 2.0);
        }
        assert_eq!(state.food.len(), config.food.target_count);
    }

    #[test]
    fn test_blank_name_gets_default() {
        let config = Arc::new(SimConfig::default());
        let state = GameState::new(config, 1, "   ");
        assert_eq!(state.entities[0].name, DEFAULT_HUMAN_NAME);
    }

    #[test]
    fn test_bot_names_wrap_with_suffix() {
        let mut cfg = SimConfig::default();
        cfg.bots.names = vec!["Ann".into(), "Bo".into()];
        assert_eq!(bot_name(&cfg, 0), "Ann");
        assert_eq!(bot_name(&cfg, 1), "Bo");
        assert_eq!(bot_name(&cfg, 2), "Ann 2");
        assert_eq!(bot_name(&cfg, 5), "Bo 3");
        cfg.bots.names.clear();
        assert_eq!(bot_name(&cfg, 3), "Bot 4");
    }

    #[test]
    fn test_food_kinds() {
        let mut state = empty_state();
        for _ in 0..2000 {
            spawn_food(&mut state);
        }
        let large = state.food.iter().filter(|f| f.nutrition == 5.0).count();
        assert!(state.food.iter().all(|f| (f.nutrition == 5.0) == (f.radius == 8.0)));
        assert!((50..=160).contains(&large), "{large} large food");
    }

    #[test]
    fn test_food_accumulator() {
        let mut state = empty_state();
        let target = state.config.food.target_count;
        assert!(target > 0);

        // 4 per second: nothing after 0.2 s, one after 0.3 s
        update_food(&mut state, 0.2);
        assert_eq!(state.food.len(), 0);
        update_food(&mut state, 0.1);
        assert_eq!(state.food.len(), 1);
    }

    #[test]
    fn test_food_catch_up_is_capped() {
        let mut state = empty_state();
        update_food(&mut state, 1000.0);
        assert_eq!(state.food.len(), 100);
        assert_eq!(state.spawners.food_accumulator, 0.0);
    }
}
