//! Per-frame runner update
//!
//! One call per rendered frame with the elapsed time. The score clock and
//! level advance by the whole Δ. Timers, player physics, scrolling, particles
//! and collisions then run in sub-steps of at most 16 ms, so a long frame
//! plays out like the same time in short frames.

use super::autopilot;
use super::combat::{ContactOutcome, detect_contacts, resolve_contact};
use super::spawn::{run_timers_until, spawn_dust_burst, start_dragon_timer};
use super::state::{ParticleKind, RunnerEvent, RunnerState};
use crate::consts::runner::*;
use crate::persistence::KeyValueStore;

/// Dust settles under this gravity (px/s²)
const DUST_GRAVITY: f32 = 400.0;
/// Longest sub-step (ms); fire is the fastest mover at ~470 px/s
const MAX_SUBSTEP_MS: f64 = 16.0;
/// Frames longer than this many sub-steps use proportionally longer ones
const MAX_SUBSTEPS: u32 = 64;

/// Input snapshot for a single frame
#[derive(Debug, Clone, Default)]
pub struct RunnerInput {
    /// Jump held/pressed this frame
    pub jump: bool,
    /// Pause toggle
    pub pause: bool,
    /// Restart after game over
    pub restart: bool,
    /// Idle/demo mode - autopilot plays
    pub idle_mode: bool,
}

/// Add score and promote the level; the dragon cadence starts on reaching its level
pub(crate) fn add_score(state: &mut RunnerState, amount: f64) {
    if amount <= 0.0 {
        return;
    }
    state.score += amount;

    let level = state.tuning.level_for(state.score);
    if level > state.level {
        state.level = level;
        state.events.push(RunnerEvent::LevelUp { level });
        log::info!("Level {}", level);
        if level >= state.tuning.dragon_level {
            start_dragon_timer(state);
        }
    }
}

/// Advance the run by `dt_ms` milliseconds
pub fn tick(
    state: &mut RunnerState,
    input: &RunnerInput,
    dt_ms: f64,
    store: &mut dyn KeyValueStore,
) {
    if input.restart && !state.game_active {
        state.restart();
        return;
    }

    if input.pause && state.game_active {
        state.paused = !state.paused;
        if state.paused {
            return;
        }
    }

    if !state.game_active || state.paused {
        return;
    }

    let dt_ms = if dt_ms.is_finite() { dt_ms.max(0.0) } else { 0.0 };
    add_score(state, dt_ms * state.tuning.score_per_ms);

    // Long frames are split so nothing tunnels through the player
    let steps = ((dt_ms / MAX_SUBSTEP_MS).ceil() as u32).clamp(1, MAX_SUBSTEPS);
    let frame_start = state.timers.now_ms();
    for i in 1..=steps {
        let until = if i == steps {
            frame_start + dt_ms
        } else {
            frame_start + dt_ms * i as f64 / steps as f64
        };
        let step_ms = until - state.timers.now_ms();
        run_timers_until(state, until);
        step(state, input, (step_ms / 1000.0) as f32, store);
        if !state.game_active {
            break;
        }
    }
}

/// Move everything by one sub-step of `dt` seconds and resolve contacts
fn step(state: &mut RunnerState, input: &RunnerInput, dt: f32, store: &mut dyn KeyValueStore) {
    let jump = if input.idle_mode {
        autopilot::wants_jump(state)
    } else {
        input.jump
    };

    // Player
    if jump && state.player.jump(state.tuning.jump_velocity) {
        state.events.push(RunnerEvent::Jumped);
    }
    if state.player.integrate(state.tuning.gravity, dt) {
        let feet = state.player.feet();
        spawn_dust_burst(state, feet);
        state.events.push(RunnerEvent::Landed);
    }

    // Scroll at the current level's speeds
    let obstacle_speed = state.tuning.obstacle_speed(state.level);
    for obstacle in state.obstacles.iter_mut().filter(|o| o.alive) {
        obstacle.speed = obstacle_speed;
        obstacle.pos.x -= obstacle_speed * dt;
    }
    let dragon_speed = state.tuning.dragon_speed(state.level);
    for dragon in state.dragons.iter_mut().filter(|d| d.alive) {
        dragon.speed = dragon_speed;
        dragon.pos.x -= dragon_speed * dt;
    }

    // Particles
    for particle in state.particles.iter_mut().filter(|p| p.alive) {
        if particle.kind == ParticleKind::Dust {
            particle.vel.y += DUST_GRAVITY * dt;
        }
        particle.pos += particle.vel * dt;
        particle.life -= dt;
        if particle.life <= 0.0 {
            particle.alive = false;
        }
    }

    // Collisions (first terminal contact ends resolution)
    for contact in detect_contacts(state) {
        if resolve_contact(state, contact, store) == ContactOutcome::GameOver {
            break;
        }
    }

    cull(state);
}

/// Drop dead and off-screen entities
fn cull(state: &mut RunnerState) {
    for obstacle in &mut state.obstacles {
        if obstacle.pos.x < OBSTACLE_CULL_X {
            obstacle.alive = false;
        }
    }

    let escaped: Vec<_> = state
        .dragons
        .iter()
        .filter(|d| d.alive && d.pos.x < DRAGON_CULL_X)
        .map(|d| d.id)
        .collect();
    for id in escaped {
        log::debug!("Dragon #{} escaped", id.0);
        state.kill_dragon(id);
    }

    state.obstacles.retain(|o| o.alive);
    state.dragons.retain(|d| d.alive);
    state.particles.retain(|p| p.alive);
}
