//! Endless runner core
//!
//! The player runs in place while obstacles scroll in from the right. From
//! level 2 dragons join in; they breathe fire and can be stomped three times
//! for a bonus. Touching an obstacle or fire ends the run.

pub mod autopilot;
pub mod combat;
pub mod spawn;
pub mod state;
pub mod tick;

pub use combat::{Contact, ContactOutcome, detect_contacts, game_over, resolve_contact};
pub use spawn::{spawn_dragon, spawn_obstacle};
pub use state::{
    Dragon, EntityId, Obstacle, ObstacleKind, Particle, ParticleKind, Player, RunnerEvent,
    RunnerSnapshot, RunnerState,
};
pub use tick::{RunnerInput, tick};
