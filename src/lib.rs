//! Arcade Sims - simulation cores for two browser mini-games
//!
//! Core modules:
//! - `sim`: Deterministic simulation (runner core, driving core, timers)
//! - `audio`: Event sound cues (Web Audio on wasm)
//! - `persistence`: Durable key/value storage (LocalStorage on web)
//! - `highscores`: Best-score bookkeeping on top of the store
//! - `settings`: Player preferences
//! - `tuning`: Data-driven game balance

pub mod audio;
pub mod highscores;
pub mod persistence;
pub mod settings;
pub mod sim;
pub mod tuning;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use highscores::HighScore;
pub use persistence::{KeyValueStore, MemoryStore};
pub use settings::{PhysicsMode, Settings};
pub use tuning::{DrivingTuning, LightTiming, RunnerTuning};

/// World geometry constants
pub mod consts {
    /// Runner playfield (screen pixels, y grows downward)
    pub mod runner {
        /// Top surface of the ground strip
        pub const GROUND_Y: f32 = 520.0;

        pub const PLAYER_X: f32 = 120.0;
        pub const PLAYER_WIDTH: f32 = 40.0;
        pub const PLAYER_HEIGHT: f32 = 56.0;

        /// Obstacles enter just past the right edge
        pub const OBSTACLE_SPAWN_X: f32 = 850.0;
        pub const OBSTACLE_CULL_X: f32 = -100.0;
        pub const BARREL_SIZE: (f32, f32) = (36.0, 44.0);
        pub const BOX_SIZE: (f32, f32) = (48.0, 48.0);

        pub const DRAGON_SPAWN_X: f32 = 900.0;
        pub const DRAGON_CULL_X: f32 = -150.0;
        pub const DRAGON_WIDTH: f32 = 90.0;
        pub const DRAGON_HEIGHT: f32 = 60.0;
        /// Dragons glide low enough to be stomped from a full jump
        pub const DRAGON_Y: f32 = GROUND_Y - 70.0;
        /// Mouth offset from dragon center (fire origin)
        pub const DRAGON_MOUTH_OFFSET: (f32, f32) = (-DRAGON_WIDTH / 2.0, 8.0);

        pub const FIRE_SIZE: f32 = 12.0;
        pub const DUST_SIZE: f32 = 6.0;
    }

    /// Driving course (world units, forward is -z)
    pub mod driving {
        /// Barriers sit at x = ±BARRIER_X
        pub const BARRIER_X: f32 = 4.5;
        pub const STOP_LINE_Z: f32 = 0.0;
        /// Spawn pose: centred in the lane, behind the stop line, facing -z
        pub const SPAWN_X: f32 = 0.0;
        pub const SPAWN_Z: f32 = 12.0;
        pub const SPAWN_HEADING: f32 = 0.0;
        /// Kinematic controller step cap (seconds)
        pub const MAX_STEP: f32 = 0.05;
    }
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}
