//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Time only advances through `tick(dt)`; timers run on a virtual clock
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod collision;
pub mod driving;
pub mod runner;
pub mod timer;

pub use collision::Aabb;
pub use driving::{DriveInput, DrivingEvent, DrivingSnapshot, DrivingState};
pub use runner::{RunnerEvent, RunnerInput, RunnerSnapshot, RunnerState};
pub use timer::{Fired, OwnerToken, Scheduler, TimerId};
