//! Arcade Sims entry point
//!
//! The browser build is driven from JS through the `web` bindings. Natively
//! this runs both games headless in attract mode and logs what happens
//! (`RUST_LOG=debug` for spawns and light phases).

#[cfg(not(target_arch = "wasm32"))]
mod attract {
    use arcade_sims::sim::driving::{self, DriveInput, DrivingEvent, DrivingState};
    use arcade_sims::sim::runner::{self, RunnerEvent, RunnerInput, RunnerState};
    use arcade_sims::{
        DrivingTuning, KeyValueStore, MemoryStore, PhysicsMode, RunnerTuning, Settings,
    };

    /// 60 Hz frame time
    const FRAME_MS: f64 = 1000.0 / 60.0;

    pub fn run_runner(store: &mut MemoryStore, seed: u64, seconds: u32) {
        let mut state = RunnerState::new(seed, RunnerTuning::default());
        state.load_highscore(&*store);
        let input = RunnerInput {
            idle_mode: true,
            ..Default::default()
        };
        let restart = RunnerInput {
            restart: true,
            ..input.clone()
        };

        let mut runs = 0;
        for _ in 0..(seconds as f64 * 1000.0 / FRAME_MS) as u32 {
            let frame_input = if state.game_active { &input } else { &restart };
            runner::tick(&mut state, frame_input, FRAME_MS, store);
            for event in state.drain_events() {
                match event {
                    RunnerEvent::GameOver {
                        score,
                        best,
                        new_record,
                    } => {
                        runs += 1;
                        log::info!(
                            "Run {} over: {} points (best {}{})",
                            runs,
                            score,
                            best,
                            if new_record { ", new record" } else { "" }
                        );
                    }
                    RunnerEvent::DragonDefeated => log::info!("Dragon defeated"),
                    _ => {}
                }
            }
        }
        state.teardown();
        log::info!(
            "Runner demo done: {} finished runs, best {}",
            runs,
            state.highscore.best()
        );
    }

    pub fn run_driving(mode: PhysicsMode, seconds: u32) {
        let mut state = DrivingState::new(mode, DrivingTuning::default());
        let input = DriveInput {
            idle_mode: true,
            ..Default::default()
        };

        for _ in 0..(seconds as f64 * 1000.0 / FRAME_MS) as u32 {
            driving::tick(&mut state, &input, FRAME_MS);
            for event in state.drain_events() {
                if let DrivingEvent::LightChanged { phase } = event {
                    log::debug!("t={:.0}ms light {:?}", state.clock_ms(), phase);
                }
            }
        }
        state.teardown();
        log::info!(
            "Driving demo ({}) done: {} passed, {} failed, score {}",
            mode.as_str(),
            state.passes,
            state.fails,
            state.score
        );
    }

    pub fn main() {
        env_logger::init();
        log::info!("Arcade Sims (native) starting attract mode...");

        let mut store = MemoryStore::new();
        let settings = Settings::load(&store);
        settings.save(&mut store);
        log::debug!("Settings store has {:?}", store.get(Settings::STORAGE_KEY));

        run_runner(&mut store, 0x5EED, 120);
        run_driving(settings.physics_mode, 60);
        run_driving(PhysicsMode::RigidBody, 60);
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    attract::main();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is `web::start`, this is just to satisfy the compiler
}
