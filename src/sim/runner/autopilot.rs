//! Idle/demo mode player for the runner
//!
//! Jumps over ground obstacles and incoming fire, and jumps early enough at
//! dragons to come down on top of them.

use super::state::{ParticleKind, RunnerState};
use crate::consts::runner::*;

/// Seconds of lead before an obstacle reaches the player
const OBSTACLE_LEAD: f32 = 0.15;
/// Dragons need a longer lead so the jump peaks above them
const DRAGON_LEAD: f32 = 0.35;

/// Should the autopilot jump this frame?
pub fn wants_jump(state: &RunnerState) -> bool {
    if !state.player.grounded {
        return false;
    }
    let front = state.player.pos.x + PLAYER_WIDTH / 2.0;

    let obstacle_ahead = state.obstacles.iter().filter(|o| o.alive).any(|o| {
        let gap = o.aabb().min().x - front;
        gap > 0.0 && gap < o.speed * OBSTACLE_LEAD + 4.0
    });

    let player_box = state.player.aabb();
    let fire_ahead = state
        .particles
        .iter()
        .filter(|p| p.alive && p.kind == ParticleKind::Fire)
        .any(|p| {
            let b = p.aabb();
            let in_lane = b.max().y >= player_box.min().y && b.min().y <= player_box.max().y;
            let gap = b.min().x - front;
            in_lane && gap > 0.0 && gap < -p.vel.x * OBSTACLE_LEAD + 4.0
        });

    let dragon_ahead = state.dragons.iter().filter(|d| d.alive).any(|d| {
        let gap = d.aabb().min().x - front;
        gap > 0.0 && gap < d.speed * DRAGON_LEAD
    });

    obstacle_ahead || fire_ahead || dragon_ahead
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::runner::spawn::spawn_obstacle;
    use crate::sim::runner::state::ObstacleKind;
    use crate::tuning::RunnerTuning;

    #[test]
    fn test_idle_when_clear() {
        let state = RunnerState::new(1, RunnerTuning::default());
        assert!(!wants_jump(&state));
    }

    #[test]
    fn test_jumps_for_close_obstacle() {
        let mut state = RunnerState::new(1, RunnerTuning::default());
        spawn_obstacle(&mut state, ObstacleKind::Barrel);
        assert!(!wants_jump(&state));

        state.obstacles[0].pos.x = PLAYER_X + 60.0;
        assert!(wants_jump(&state));

        state.player.grounded = false;
        assert!(!wants_jump(&state));
    }
}
