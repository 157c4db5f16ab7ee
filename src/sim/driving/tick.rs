//! Per-frame driving update
//!
//! Timers run first on their own clock (light phases, display poll, hit
//! pruning, auto-reset), then the car integrates. Pausing only stops the car.

use glam::Vec2;

use super::autopilot;
use super::controller::DriveInput;
use super::light::LightPhase;
use super::state::{
    Car, DrivingEvent, DrivingState, DrivingTimer, FailReason, HitEffect, RoundStatus,
};
use crate::consts::driving::STOP_LINE_Z;

/// Advance the driving session by `dt_ms` milliseconds
pub fn tick(state: &mut DrivingState, input: &DriveInput, dt_ms: f64) {
    if state.is_torn_down() {
        return;
    }

    if input.reset {
        reset_round(state, false);
    }

    if input.pause {
        state.paused = !state.paused;
        log::debug!("Driving {}", if state.paused { "paused" } else { "resumed" });
    }

    let dt_ms = if dt_ms.is_finite() { dt_ms.max(0.0) } else { 0.0 };
    advance_time(state, dt_ms);

    let drive = if input.idle_mode {
        DriveInput {
            barrier_contact: input.barrier_contact,
            ..autopilot::drive(state)
        }
    } else {
        *input
    };
    update_vehicle(state, &drive, dt_ms);
}

/// Run every driving timer due within the next `dt_ms`
pub fn advance_time(state: &mut DrivingState, dt_ms: f64) {
    if state.is_torn_down() {
        return;
    }
    let until = state.timers.now_ms() + dt_ms;
    while let Some(fired) = state.timers.pop_due(until) {
        match fired.event {
            DrivingTimer::LightPhase => {
                let phase = state.light.advance(fired.at_ms);
                state
                    .timers
                    .schedule_once(state.light.dwell_ms(), DrivingTimer::LightPhase);
                state.light_display = state.light.progress(fired.at_ms);
                state.events.push(DrivingEvent::LightChanged { phase });
                log::debug!("Light {:?}", phase);
            }
            DrivingTimer::LightPoll => {
                state.light_display = state.light.progress(fired.at_ms);
            }
            DrivingTimer::PruneHit(id) => {
                state.hit_effects.retain(|h| h.id != id);
            }
            DrivingTimer::AutoReset => {
                state.auto_reset = None;
                if state.status.is_terminal() {
                    reset_round(state, true);
                }
            }
        }
    }
    state.timers.settle(until);
}

/// Integrate the car and resolve the round outcome
fn update_vehicle(state: &mut DrivingState, input: &DriveInput, dt_ms: f64) {
    if state.paused || state.status.is_terminal() {
        return;
    }

    let dt = (dt_ms / 1000.0) as f32;
    let prev_z = state.car.pos.y;
    let report = state
        .controller
        .step(&mut state.car, input, dt, &state.tuning);

    state.speed = state.car.speed();
    state.events.push(DrivingEvent::SpeedChanged { speed: state.speed });

    if report.barrier_contact || input.barrier_contact {
        let pos = state.car.pos;
        record_hit(state, pos);
        enter_terminal(state, RoundStatus::Failed, Some(FailReason::HitBarrier));
        return;
    }

    let new_z = state.car.pos.y;
    if !state.crossed && prev_z > STOP_LINE_Z && new_z <= STOP_LINE_Z {
        state.crossed = true;
        if state.light.phase() == LightPhase::Red {
            enter_terminal(state, RoundStatus::Failed, Some(FailReason::RanRedLight));
        } else {
            enter_terminal(state, RoundStatus::Passed, None);
        }
    }
}

fn record_hit(state: &mut DrivingState, pos: Vec2) {
    let id = state.alloc_hit_id();
    state.hit_effects.push(HitEffect {
        id,
        pos,
        at_ms: state.clock_ms(),
    });
    state
        .timers
        .schedule_once(state.tuning.hit_effect_ms, DrivingTimer::PruneHit(id));
    state.events.push(DrivingEvent::BarrierHit { pos });
}

fn enter_terminal(state: &mut DrivingState, status: RoundStatus, reason: Option<FailReason>) {
    state.status = status;
    match reason {
        Some(reason) => {
            state.fails += 1;
            state.events.push(DrivingEvent::Failed { reason });
            log::info!("Round failed: {:?}", reason);
        }
        None => {
            state.score += 1;
            state.passes += 1;
            state.events.push(DrivingEvent::Passed { score: state.score });
            log::info!("Round passed, score {}", state.score);
        }
    }

    if let Some(pending) = state.auto_reset.take() {
        state.timers.cancel(pending);
    }
    if !state.timers.is_shut_down() {
        let id = state
            .timers
            .schedule_once(state.tuning.auto_reset_ms, DrivingTimer::AutoReset);
        state.auto_reset = Some(id);
    }
}

/// Put the car back at the spawn pose and start a new round
pub fn reset_round(state: &mut DrivingState, automatic: bool) {
    if state.is_torn_down() {
        return;
    }
    if let Some(pending) = state.auto_reset.take() {
        state.timers.cancel(pending);
    }
    if state.status.is_terminal() {
        state.rounds_played += 1;
    }

    state.car = Car::spawn();
    state.controller.reset(&state.car);
    state.speed = 0.0;
    state.crossed = false;
    state.status = RoundStatus::Playing;
    state.events.push(DrivingEvent::RoundReset { automatic });
    log::info!("Round reset ({})", if automatic { "auto" } else { "manual" });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::PhysicsMode;
    use crate::tuning::DrivingTuning;
    use proptest::prelude::*;

    fn session(mode: PhysicsMode) -> DrivingState {
        DrivingState::new(mode, DrivingTuning::default())
    }

    /// Let time pass with the car idle at spawn
    fn wait(state: &mut DrivingState, total_ms: f64) {
        let mut left = total_ms;
        while left > 0.0 {
            let step = left.min(500.0);
            tick(state, &DriveInput::default(), step);
            left -= step;
        }
    }

    fn approach_line(state: &mut DrivingState) {
        state.place_car(Vec2::new(0.0, 0.2), Vec2::new(0.0, -10.0));
        tick(state, &DriveInput::default(), 50.0);
    }

    fn resets(events: &[DrivingEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, DrivingEvent::RoundReset { .. }))
            .count()
    }

    #[test]
    fn test_crossing_on_red_fails() {
        let mut state = session(PhysicsMode::Kinematic);
        wait(&mut state, 8000.0);
        assert_eq!(state.light_phase(), LightPhase::Red);

        approach_line(&mut state);
        assert_eq!(state.status, RoundStatus::Failed);
        assert_eq!(state.score, 0);
        assert!(state.crossed);
        assert!(state.drain_events().contains(&DrivingEvent::Failed {
            reason: FailReason::RanRedLight
        }));
    }

    #[test]
    fn test_crossing_on_green_passes_once() {
        let mut state = session(PhysicsMode::Kinematic);
        approach_line(&mut state);
        assert_eq!(state.status, RoundStatus::Passed);
        assert_eq!(state.score, 1);

        // Terminal: no more integration or scoring
        state.place_car(Vec2::new(0.0, 0.2), Vec2::new(0.0, -10.0));
        tick(&mut state, &DriveInput::default(), 50.0);
        assert_eq!(state.score, 1);
        assert_eq!(state.car.pos, Vec2::new(0.0, 0.2));
    }

    #[test]
    fn test_crossing_on_yellow_passes() {
        let mut state = session(PhysicsMode::Kinematic);
        wait(&mut state, 6500.0);
        assert_eq!(state.light_phase(), LightPhase::Yellow);
        approach_line(&mut state);
        assert_eq!(state.status, RoundStatus::Passed);
    }

    #[test]
    fn test_crossed_flag_blocks_second_crossing() {
        let mut state = session(PhysicsMode::Kinematic);
        approach_line(&mut state);
        assert_eq!(state.score, 1);

        // Force the round back open without clearing `crossed`
        state.status = RoundStatus::Playing;
        state.place_car(Vec2::new(0.0, 0.2), Vec2::new(0.0, -10.0));
        tick(&mut state, &DriveInput::default(), 50.0);
        assert_eq!(state.score, 1);
    }

    #[test]
    fn test_barrier_fails_on_green_and_hit_is_pruned() {
        let mut state = session(PhysicsMode::Kinematic);
        state.place_car(Vec2::new(4.4, 8.0), Vec2::new(10.0, 0.0));
        tick(&mut state, &DriveInput::default(), 16.0);

        assert_eq!(state.light_phase(), LightPhase::Green);
        assert_eq!(state.status, RoundStatus::Failed);
        assert_eq!(state.hit_effects.len(), 1);
        assert_eq!(state.car.vel, Vec2::ZERO);
        let events = state.drain_events();
        assert!(events.contains(&DrivingEvent::Failed {
            reason: FailReason::HitBarrier
        }));

        wait(&mut state, 999.0);
        assert_eq!(state.hit_effects.len(), 1);
        wait(&mut state, 1.0);
        assert!(state.hit_effects.is_empty());
    }

    #[test]
    fn test_barrier_fails_on_red_as_hit_barrier() {
        let mut state = session(PhysicsMode::Kinematic);
        wait(&mut state, 8000.0);
        assert_eq!(state.light_phase(), LightPhase::Red);
        state.drain_events();

        state.place_car(Vec2::new(4.4, 8.0), Vec2::new(10.0, 0.0));
        tick(&mut state, &DriveInput::default(), 16.0);
        assert_eq!(state.status, RoundStatus::Failed);
        assert!(state.drain_events().contains(&DrivingEvent::Failed {
            reason: FailReason::HitBarrier
        }));
    }

    #[test]
    fn test_injected_barrier_contact() {
        let mut state = session(PhysicsMode::RigidBody);
        let input = DriveInput {
            barrier_contact: true,
            ..Default::default()
        };
        tick(&mut state, &input, 16.0);
        assert_eq!(state.status, RoundStatus::Failed);
        assert_eq!(state.fails, 1);
    }

    #[test]
    fn test_auto_reset_fires_once_after_delay() {
        let mut state = session(PhysicsMode::Kinematic);
        approach_line(&mut state);
        state.drain_events();

        wait(&mut state, 3999.0);
        assert_eq!(state.status, RoundStatus::Passed);
        wait(&mut state, 1.0);
        assert_eq!(state.status, RoundStatus::Playing);
        assert_eq!(state.car, Car::spawn());
        assert!(!state.crossed);
        assert_eq!(state.rounds_played, 1);

        wait(&mut state, 10_000.0);
        let events = state.drain_events();
        assert_eq!(resets(&events), 1);
        assert!(events.contains(&DrivingEvent::RoundReset { automatic: true }));
    }

    #[test]
    fn test_manual_reset_cancels_auto_reset() {
        let mut state = session(PhysicsMode::Kinematic);
        approach_line(&mut state);
        wait(&mut state, 1000.0);
        state.drain_events();

        let reset = DriveInput {
            reset: true,
            ..Default::default()
        };
        tick(&mut state, &reset, 16.0);
        assert_eq!(state.status, RoundStatus::Playing);

        wait(&mut state, 10_000.0);
        let events = state.drain_events();
        assert_eq!(events.first(), Some(&DrivingEvent::RoundReset { automatic: false }));
        assert_eq!(resets(&events), 1);
        assert_eq!(state.status, RoundStatus::Playing);
    }

    #[test]
    fn test_pause_stops_car_not_light() {
        let mut state = session(PhysicsMode::Kinematic);
        let pause = DriveInput {
            pause: true,
            ..Default::default()
        };
        tick(&mut state, &pause, 16.0);
        assert!(state.paused);

        state.place_car(Vec2::new(0.0, 5.0), Vec2::new(0.0, -10.0));
        let held = DriveInput {
            up: true,
            ..Default::default()
        };
        for _ in 0..16 {
            tick(&mut state, &held, 500.0);
        }
        assert_eq!(state.car.pos, Vec2::new(0.0, 5.0));
        assert_eq!(state.light_phase(), LightPhase::Red);
    }

    #[test]
    fn test_light_display_poll() {
        let mut state = session(PhysicsMode::Kinematic);
        tick(&mut state, &DriveInput::default(), 1000.0);
        assert_eq!(state.light_display.phase, LightPhase::Green);
        assert_eq!(state.light_display.remaining_ms, 5000.0);
    }

    #[test]
    fn test_speed_event_every_tick() {
        let mut state = session(PhysicsMode::RigidBody);
        let held = DriveInput {
            up: true,
            ..Default::default()
        };
        for _ in 0..3 {
            tick(&mut state, &held, 16.0);
        }
        let speeds = state
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, DrivingEvent::SpeedChanged { .. }))
            .count();
        assert_eq!(speeds, 3);
        assert!(state.speed > 0.0);
    }

    #[test]
    fn test_rigid_body_crossing_on_red_fails() {
        let mut state = session(PhysicsMode::RigidBody);
        wait(&mut state, 8000.0);
        approach_line(&mut state);
        assert_eq!(state.status, RoundStatus::Failed);
    }

    #[test]
    fn test_teardown_stops_car_and_scoring() {
        let mut state = session(PhysicsMode::Kinematic);
        state.teardown();
        state.place_car(Vec2::new(0.0, 0.2), Vec2::new(0.0, -10.0));
        tick(&mut state, &DriveInput::default(), 50.0);

        assert_eq!(state.status, RoundStatus::Playing);
        assert_eq!(state.score, 0);
        assert_eq!(state.car.pos, Vec2::new(0.0, 0.2));
        assert!(state.drain_events().is_empty());

        let reset = DriveInput {
            reset: true,
            ..Default::default()
        };
        tick(&mut state, &reset, 16.0);
        reset_round(&mut state, false);
        assert_eq!(state.car.pos, Vec2::new(0.0, 0.2));
        assert_eq!(state.rounds_played, 0);
    }

    #[test]
    fn test_teardown_freezes_light() {
        let mut state = session(PhysicsMode::Kinematic);
        state.teardown();
        wait(&mut state, 20_000.0);
        assert_eq!(state.light_phase(), LightPhase::Green);
        let events = state.drain_events();
        assert!(!events
            .iter()
            .any(|e| matches!(e, DrivingEvent::LightChanged { .. })));
    }

    proptest! {
        #[test]
        fn prop_light_follows_cycle(chunks in prop::collection::vec(0u32..3000, 1..100)) {
            let mut state = session(PhysicsMode::Kinematic);
            for chunk in chunks {
                advance_time(&mut state, chunk as f64);
                let t = state.clock_ms() % 12_500.0;
                let expected = if t < 6000.0 {
                    LightPhase::Green
                } else if t < 7500.0 {
                    LightPhase::Yellow
                } else {
                    LightPhase::Red
                };
                prop_assert_eq!(state.light_phase(), expected);
            }
        }
    }
}
