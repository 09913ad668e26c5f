//! Storm Arena headless runner
//!
//! Runs one match with the human slot on autopilot and prints the result.

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::time::{SystemTime, UNIX_EPOCH};

    use clap::Parser;
    use storm_arena::consts::{MAX_FRAME_DT, MAX_SUBSTEPS, SIM_DT};
    use storm_arena::sim::{GameState, SimEvent, Snapshot, TickInput, tick};
    use storm_arena::{ConfigError, SimConfig};

    /// Storm Arena: shrinking-zone mass arena simulation
    #[derive(Parser, Debug)]
    #[command(version, about)]
    pub struct Cli {
        /// Run seed (defaults to the current time)
        #[arg(long)]
        seed: Option<u64>,

        /// Override the number of bots
        #[arg(long)]
        bots: Option<usize>,

        /// JSON config file; missing fields keep their defaults
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Stop after this many simulated seconds
        #[arg(long, default_value_t = 900.0)]
        max_seconds: f32,

        /// Print the result (and final snapshot) as JSON
        #[arg(long)]
        json: bool,

        /// Display name of the autopiloted player
        #[arg(long, default_value = "Player")]
        name: String,
    }

    /// Fixed-timestep driver: frames feed an accumulator that is drained in
    /// `SIM_DT` substeps
    struct Runner {
        state: GameState,
        accumulator: f32,
        input: TickInput,
    }

    impl Runner {
        fn new(state: GameState) -> Self {
            Self {
                state,
                accumulator: 0.0,
                input: TickInput {
                    autopilot: true,
                    ..Default::default()
                },
            }
        }

        fn update(&mut self, dt: f32) {
            self.accumulator += dt.min(MAX_FRAME_DT);

            let mut substeps = 0;
            while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                tick(&mut self.state, &self.input, SIM_DT);
                self.accumulator -= SIM_DT;
                substeps += 1;

                for event in self.state.drain_events() {
                    report(&event);
                }
            }
        }

        fn done(&self) -> bool {
            self.state.finished || self.state.stopped
        }
    }

    fn report(event: &SimEvent) {
        match event {
            SimEvent::EntityKilled { victim, killer, cause } => {
                log::debug!("{} killed by {:?} ({:?})", victim, killer, cause)
            }
            SimEvent::PhaseChanged { from, to } => log::info!("Match phase {:?} -> {:?}", from, to),
            _ => {}
        }
    }

    fn load_config(cli: &Cli) -> Result<SimConfig, String> {
        let mut config = match &cli.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
                SimConfig::from_json(&text).map_err(|e: ConfigError| e.to_string())?
            }
            None => SimConfig::default(),
        };
        if let Some(bots) = cli.bots {
            config.bots.count = bots;
        }
        config.validate().map_err(|e| e.to_string())?;
        Ok(config)
    }

    pub fn run() {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
        let cli = Cli::parse();

        let config = match load_config(&cli) {
            Ok(config) => Arc::new(config),
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        };
        let seed = cli.seed.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0)
        });

        let mut runner = Runner::new(GameState::new(config, seed, &cli.name));
        // Simulated frames at 30 Hz
        let frame_dt = 1.0 / 30.0;
        let mut next_report = 10.0;
        while !runner.done() {
            runner.update(frame_dt);

            let state = &runner.state;
            if state.time >= next_report {
                next_report += 10.0;
                let top: Vec<String> = state
                    .leaderboard
                    .top(3)
                    .iter()
                    .map(|e| format!("{} ({})", e.name, e.mass))
                    .collect();
                log::info!(
                    "t={:.0}s alive={} top=[{}] zone: {}",
                    state.time,
                    state.alive_count(),
                    top.join(", "),
                    state.zone.label()
                );
                log::debug!("Spatial grid: {} occupied cells", state.grid.occupied_cells());
            }
            if state.time >= cli.max_seconds {
                log::warn!("Time limit of {:.0}s reached, stopping", cli.max_seconds);
                runner.state.stop();
            }
        }

        let state = &runner.state;
        if let Some(leader) = state.leaderboard.leader() {
            log::info!("Leader at finish: {} ({} mass, {} kills)", leader.name, leader.mass, leader.kills);
        }
        if cli.json {
            let output = serde_json::json!({
                "seed": state.seed,
                "result": state.result,
                "snapshot": Snapshot::capture(state),
            });
            println!("{output}");
            return;
        }
        match &state.result {
            Some(result) => println!(
                "{}: rank #{}, {} kills, max mass {}, survived {:.1}s{}",
                result.name,
                result.rank,
                result.kills,
                result.max_mass,
                result.survival_time,
                if result.is_winner { " - WINNER" } else { "" }
            ),
            None => println!("No result after {:.1}s ({} alive)", state.time, state.alive_count()),
        }
        println!("Seed: {}", state.seed);
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    headless::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The simulation is embedded by a host on wasm; there is no CLI
}
