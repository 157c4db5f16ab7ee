//! Spawning: obstacle cadence, dragons, fire breath and dust
//!
//! Timer handlers run inside the tick that advanced the clock past their due
//! time. Each handler re-checks that the run (and its dragon) is still alive.

use glam::Vec2;
use rand::Rng;

use super::state::{
    Dragon, EntityId, Obstacle, ObstacleKind, Particle, ParticleKind, RunnerEvent, RunnerState,
    RunnerTimer,
};
use crate::consts::runner::*;

/// Advance the runner clock by `dt_ms`, handling every timer that comes due
#[cfg(test)]
pub(crate) fn run_timers(state: &mut RunnerState, dt_ms: f64) {
    let until = state.timers.now_ms() + dt_ms;
    run_timers_until(state, until);
}

/// Advance the runner clock to `until` (absolute ms)
pub(crate) fn run_timers_until(state: &mut RunnerState, until: f64) {
    while let Some(fired) = state.timers.pop_due(until) {
        if !state.game_active {
            break;
        }
        match fired.event {
            RunnerTimer::SpawnObstacle => on_spawn_timer(state),
            RunnerTimer::SpawnDragon => on_dragon_timer(state),
            RunnerTimer::FireBreath(id) => on_breath_timer(state, id),
        }
    }
    state.timers.settle(until);
}

/// Start the dragon cadence (once per run)
pub(crate) fn start_dragon_timer(state: &mut RunnerState) {
    if state.dragon_timer_started {
        return;
    }
    state.dragon_timer_started = true;
    state.dragon_timer = Some(
        state
            .timers
            .schedule_repeating(state.tuning.dragon_interval_ms, RunnerTimer::SpawnDragon),
    );
    log::debug!("Dragon timer started at level {}", state.level);
}

fn on_spawn_timer(state: &mut RunnerState) {
    // A live dragon takes the obstacle's place
    if state.level >= state.tuning.dragon_level && state.live_dragon().is_some() {
        return;
    }
    let kind = roll_obstacle_kind(state);
    spawn_obstacle(state, kind);
}

fn roll_obstacle_kind(state: &mut RunnerState) -> ObstacleKind {
    let weight = state.tuning.barrel_weight.clamp(0.0, 1.0);
    if state.rng.random_bool(weight) {
        ObstacleKind::Barrel
    } else {
        ObstacleKind::Box
    }
}

pub fn spawn_obstacle(state: &mut RunnerState, kind: ObstacleKind) -> EntityId {
    let id = state.next_entity_id();
    let speed = state.tuning.obstacle_speed(state.level);
    state.obstacles.push(Obstacle::new(id, kind, speed));
    state.events.push(RunnerEvent::ObstacleSpawned { kind });
    log::debug!("Spawned {:?} #{}", kind, id.0);
    id
}

fn on_dragon_timer(state: &mut RunnerState) {
    if state.live_dragon().is_some() {
        return;
    }
    spawn_dragon(state);
}

/// Spawn a dragon with full health and its own breath timer
pub fn spawn_dragon(state: &mut RunnerState) -> EntityId {
    let id = state.next_entity_id();
    let token = state.timers.issue_token();
    state.timers.schedule_owned(
        token,
        state.tuning.breath_interval_ms,
        true,
        RunnerTimer::FireBreath(id),
    );
    state.dragons.push(Dragon {
        id,
        pos: Vec2::new(DRAGON_SPAWN_X, DRAGON_Y),
        health: state.tuning.dragon_health,
        speed: state.tuning.dragon_speed(state.level),
        alive: true,
        breath_token: token,
        breath_step: 0,
    });
    state.events.push(RunnerEvent::DragonSpawned);
    log::debug!("Spawned dragon #{}", id.0);
    id
}

fn on_breath_timer(state: &mut RunnerState, id: EntityId) {
    let volley = state.tuning.breath_volley.max(1);
    let cycle = volley + state.tuning.breath_rest;

    let (mouth, dragon_speed) = match state.dragon_mut(id) {
        Some(dragon) if dragon.alive => {
            let step = dragon.breath_step;
            dragon.breath_step += 1;
            if step % cycle >= volley {
                return;
            }
            (dragon.mouth(), dragon.speed)
        }
        // Owner gone: the token should already be revoked, but never act on it
        _ => return,
    };
    spawn_fire_burst(state, mouth, dragon_speed);
}

fn spawn_fire_burst(state: &mut RunnerState, mouth: Vec2, dragon_speed: f32) {
    let count = state.tuning.fire_particles_per_burst;
    let speed = dragon_speed + state.tuning.fire_speed;
    let life = state.tuning.fire_lifetime;
    for _ in 0..count {
        let id = state.next_entity_id();
        let jitter = Vec2::new(
            state.rng.random_range(-4.0..4.0),
            state.rng.random_range(-4.0..4.0),
        );
        let vel = Vec2::new(-speed, state.rng.random_range(-40.0..40.0));
        state.particles.push(Particle {
            id,
            kind: ParticleKind::Fire,
            pos: mouth + jitter,
            vel,
            life,
            max_life: life,
            alive: true,
        });
    }
    state.events.push(RunnerEvent::FireBreathed);
}

/// Puff of cosmetic dust at `at`
pub(crate) fn spawn_dust_burst(state: &mut RunnerState, at: Vec2) {
    let life = state.tuning.dust_lifetime;
    for _ in 0..state.tuning.dust_particles_per_burst {
        let id = state.next_entity_id();
        let vel = Vec2::new(
            state.rng.random_range(-90.0..90.0),
            state.rng.random_range(-140.0..-20.0),
        );
        state.particles.push(Particle {
            id,
            kind: ParticleKind::Dust,
            pos: at,
            vel,
            life,
            max_life: life,
            alive: true,
        });
    }
}
