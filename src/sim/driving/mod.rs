//! Traffic-light driving core
//!
//! A car approaches a stop line under a cycling traffic light. Crossing on
//! red or touching a lane barrier fails the round, any other crossing scores.
//! Rounds reset automatically a few seconds after they end.

pub mod autopilot;
pub mod controller;
pub mod light;
pub mod state;
pub mod tick;

pub use controller::{
    DriveInput, KinematicController, RigidBody, RigidBodyController, StepReport,
    VehicleController, controller_for,
};
pub use light::{LightPhase, LightProgress, TrafficLight};
pub use state::{
    Car, DrivingEvent, DrivingSnapshot, DrivingState, FailReason, HitEffect, RoundStatus,
};
pub use tick::{advance_time, reset_round, tick};
