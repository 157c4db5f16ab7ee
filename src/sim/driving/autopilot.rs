//! Idle/demo mode driver
//!
//! Goes on green, stops short of the line on yellow or red, and steers back
//! toward the lane centre.

use super::controller::DriveInput;
use super::light::LightPhase;
use super::state::DrivingState;
use crate::consts::driving::STOP_LINE_Z;

/// Extra room kept before the stop line (units)
const STOP_MARGIN: f32 = 1.5;
/// Speed used to roll up to the line while waiting
const CREEP_SPEED: f32 = 4.0;
/// Rigid-body braking deceleration (18000 N on 1200 kg), doubled
const RIGID_BRAKE_TERM: f32 = 30.0;
const CENTRE_GAIN: f32 = 0.15;
const MAX_CORRECTION: f32 = 0.3;
const HEADING_DEADBAND: f32 = 0.02;

/// Held keys the autopilot wants this frame
pub fn drive(state: &DrivingState) -> DriveInput {
    let car = &state.car;
    let speed = car.speed();
    let distance = car.pos.y - STOP_LINE_Z;

    let go = state.crossed || distance <= 0.0 || state.light.phase() == LightPhase::Green;
    let (up, down) = if go {
        (true, false)
    } else {
        let stopping = (speed / state.tuning.brake_decay).max(speed * speed / RIGID_BRAKE_TERM);
        if distance <= stopping + STOP_MARGIN {
            (false, true)
        } else {
            (speed < CREEP_SPEED, false)
        }
    };

    let desired = (car.pos.x * CENTRE_GAIN).clamp(-MAX_CORRECTION, MAX_CORRECTION);
    let error = desired - car.heading;

    DriveInput {
        up,
        down,
        left: error > HEADING_DEADBAND,
        right: error < -HEADING_DEADBAND,
        idle_mode: true,
        ..Default::default()
    }
}
