//! Browser host bindings
//!
//! Thin wasm-bindgen wrappers: the page drives `tick` from its
//! requestAnimationFrame loop and reads JSON snapshots/events back for
//! rendering. Persistence goes to LocalStorage, cues to Web Audio.

use wasm_bindgen::prelude::*;

use crate::audio::AudioManager;
use crate::persistence::LocalStorageStore;
use crate::settings::{PhysicsMode, Settings};
use crate::sim::driving::{self, DriveInput, DrivingEvent, DrivingState};
use crate::sim::runner::{self, RunnerEvent, RunnerInput, RunnerState};
use crate::tuning::{DrivingTuning, RunnerTuning};

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    // Already initialized when the module is instantiated twice
    let _ = console_log::init_with_level(log::Level::Info);
    log::info!("Arcade sims loaded");
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Current settings as JSON
#[wasm_bindgen]
pub fn load_settings() -> Result<String, JsValue> {
    to_json(&Settings::load(&LocalStorageStore))
}

fn store_settings(json: &str) -> Result<Settings, JsValue> {
    let settings: Settings =
        serde_json::from_str(json).map_err(|e| JsValue::from_str(&e.to_string()))?;
    settings.save(&mut LocalStorageStore);
    Ok(settings)
}

/// Persist settings from JSON; takes effect on the next session
#[wasm_bindgen]
pub fn save_settings(json: &str) -> Result<(), JsValue> {
    store_settings(json).map(|_| ())
}

#[wasm_bindgen]
pub struct WebRunner {
    state: RunnerState,
    store: LocalStorageStore,
    audio: AudioManager,
    events: Vec<RunnerEvent>,
}

#[wasm_bindgen]
impl WebRunner {
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u32, tuning_json: Option<String>) -> WebRunner {
        let tuning = match tuning_json.as_deref().map(RunnerTuning::from_json) {
            Some(Ok(tuning)) => tuning,
            Some(Err(e)) => {
                log::warn!("Runner tuning ignored: {:#}", e);
                RunnerTuning::default()
            }
            None => RunnerTuning::default(),
        };
        let store = LocalStorageStore;
        let settings = Settings::load(&store);
        let mut state = RunnerState::new(seed as u64, tuning);
        state.load_highscore(&store);
        log::info!("Runner session started (best {})", state.highscore.best());

        WebRunner {
            state,
            store,
            audio: AudioManager::new(&settings),
            events: Vec::new(),
        }
    }

    pub fn tick(&mut self, dt_ms: f64, jump: bool, pause: bool, restart: bool, idle: bool) {
        let input = RunnerInput {
            jump,
            pause,
            restart,
            idle_mode: idle,
        };
        runner::tick(&mut self.state, &input, dt_ms, &mut self.store);

        let fresh = self.state.drain_events();
        self.audio.play_runner(&fresh);
        self.events.extend(fresh);
    }

    /// Render view as JSON
    pub fn snapshot(&self) -> Result<String, JsValue> {
        to_json(&self.state.snapshot())
    }

    /// Events since the last call, as a JSON array
    pub fn take_events(&mut self) -> Result<String, JsValue> {
        to_json(&std::mem::take(&mut self.events))
    }

    pub fn best_score(&self) -> f64 {
        self.state.highscore.best() as f64
    }

    pub fn resume_audio(&self) {
        self.audio.resume();
    }

    /// Persist settings and apply the volume to this session right away
    pub fn apply_settings(&mut self, json: &str) -> Result<(), JsValue> {
        let settings = store_settings(json)?;
        self.audio.apply_settings(&settings);
        Ok(())
    }

    /// Stop every timer (page is leaving the game)
    pub fn teardown(&mut self) {
        self.state.teardown();
    }
}

#[wasm_bindgen]
pub struct WebDriving {
    state: DrivingState,
    audio: AudioManager,
    events: Vec<DrivingEvent>,
}

#[wasm_bindgen]
impl WebDriving {
    /// `mode` overrides the saved physics mode ("kinematic" / "rigid")
    #[wasm_bindgen(constructor)]
    pub fn new(mode: Option<String>, tuning_json: Option<String>) -> WebDriving {
        let tuning = match tuning_json.as_deref().map(DrivingTuning::from_json) {
            Some(Ok(tuning)) => tuning,
            Some(Err(e)) => {
                log::warn!("Driving tuning ignored: {:#}", e);
                DrivingTuning::default()
            }
            None => DrivingTuning::default(),
        };
        let settings = Settings::load(&LocalStorageStore);
        let mode = mode
            .as_deref()
            .and_then(|m| m.parse::<PhysicsMode>().ok())
            .unwrap_or(settings.physics_mode);
        log::info!("Driving session started ({})", mode.as_str());

        WebDriving {
            state: DrivingState::new(mode, tuning),
            audio: AudioManager::new(&settings),
            events: Vec::new(),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn tick(
        &mut self,
        dt_ms: f64,
        up: bool,
        down: bool,
        left: bool,
        right: bool,
        pause: bool,
        reset: bool,
        idle: bool,
    ) {
        let input = DriveInput {
            up,
            down,
            left,
            right,
            pause,
            reset,
            barrier_contact: false,
            idle_mode: idle,
        };
        self.step(&input, dt_ms);
    }

    /// Barrier contact from a host-side physics engine
    pub fn report_barrier_contact(&mut self) {
        let input = DriveInput {
            barrier_contact: true,
            ..Default::default()
        };
        self.step(&input, 0.0);
    }

    pub fn snapshot(&self) -> Result<String, JsValue> {
        to_json(&self.state.snapshot())
    }

    pub fn take_events(&mut self) -> Result<String, JsValue> {
        // Speed updates arrive every frame and are already in the snapshot
        let events: Vec<_> = std::mem::take(&mut self.events)
            .into_iter()
            .filter(|e| !matches!(e, DrivingEvent::SpeedChanged { .. }))
            .collect();
        to_json(&events)
    }

    pub fn physics_mode(&self) -> String {
        self.state.physics_mode().as_str().to_string()
    }

    pub fn resume_audio(&self) {
        self.audio.resume();
    }

    /// Volume applies now; a physics mode change waits for the next session
    pub fn apply_settings(&mut self, json: &str) -> Result<(), JsValue> {
        let settings = store_settings(json)?;
        self.audio.apply_settings(&settings);
        Ok(())
    }

    pub fn teardown(&mut self) {
        self.state.teardown();
    }
}

impl WebDriving {
    fn step(&mut self, input: &DriveInput, dt_ms: f64) {
        driving::tick(&mut self.state, input, dt_ms);

        let fresh = self.state.drain_events();
        self.audio.play_driving(&fresh);
        self.events.extend(fresh);
    }
}
