//! Driving game state

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::controller::{VehicleController, controller_for};
use super::light::{LightPhase, LightProgress, TrafficLight};
use crate::consts::driving::*;
use crate::settings::PhysicsMode;
use crate::sim::timer::{Scheduler, TimerId};
use crate::tuning::DrivingTuning;

/// Car pose and motion on the ground plane.
///
/// `pos` and `vel` hold (x, z). Heading 0 faces -z; positive heading turns left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Car {
    pub pos: Vec2,
    pub vel: Vec2,
    pub heading: f32,
    /// Yaw rate (rad/s)
    pub angular_vel: f32,
}

impl Car {
    /// Fixed spawn pose, at rest
    pub fn spawn() -> Self {
        Self {
            pos: Vec2::new(SPAWN_X, SPAWN_Z),
            vel: Vec2::ZERO,
            heading: SPAWN_HEADING,
            angular_vel: 0.0,
        }
    }

    /// Unit vector the car points along
    pub fn forward(&self) -> Vec2 {
        Vec2::new(-self.heading.sin(), -self.heading.cos())
    }

    pub fn speed(&self) -> f32 {
        self.vel.length()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundStatus {
    Playing,
    Passed,
    Failed,
}

impl RoundStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, RoundStatus::Playing)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailReason {
    RanRedLight,
    HitBarrier,
}

/// Transient barrier impact marker (for flashes/sparks)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitEffect {
    pub id: u32,
    pub pos: Vec2,
    pub at_ms: f64,
}

/// Timer payloads for the driving scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrivingTimer {
    /// Current light phase has run its dwell time
    LightPhase,
    /// Refresh the light countdown display
    LightPoll,
    PruneHit(u32),
    AutoReset,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DrivingEvent {
    SpeedChanged { speed: f32 },
    LightChanged { phase: LightPhase },
    Passed { score: u32 },
    Failed { reason: FailReason },
    BarrierHit { pos: Vec2 },
    RoundReset { automatic: bool },
}

/// Complete driving state
#[derive(Debug)]
pub struct DrivingState {
    pub tuning: DrivingTuning,
    pub car: Car,
    pub(crate) controller: Box<dyn VehicleController>,
    pub light: TrafficLight,
    /// Last countdown computed by the display poll
    pub light_display: LightProgress,
    pub status: RoundStatus,
    /// Stop line already crossed this round
    pub crossed: bool,
    pub score: u32,
    pub paused: bool,
    /// Scalar speed after the last physics step
    pub speed: f32,
    pub hit_effects: Vec<HitEffect>,
    pub passes: u32,
    pub fails: u32,
    /// Completed rounds (each reset after a result)
    pub rounds_played: u32,
    /// Set by teardown; the session no longer updates
    torn_down: bool,
    pub(crate) timers: Scheduler<DrivingTimer>,
    pub(crate) auto_reset: Option<TimerId>,
    pub(crate) events: Vec<DrivingEvent>,
    next_hit_id: u32,
}

impl DrivingState {
    pub fn new(mode: PhysicsMode, tuning: DrivingTuning) -> Self {
        let mut timers = Scheduler::new();
        let light = TrafficLight::new(tuning.light, timers.now_ms());
        timers.schedule_once(light.dwell_ms(), DrivingTimer::LightPhase);
        timers.schedule_repeating(tuning.light.poll_ms, DrivingTimer::LightPoll);
        let light_display = light.progress(timers.now_ms());

        let car = Car::spawn();
        let mut controller = controller_for(mode, &tuning);
        controller.reset(&car);

        Self {
            tuning,
            car,
            controller,
            light,
            light_display,
            status: RoundStatus::Playing,
            crossed: false,
            score: 0,
            paused: false,
            speed: 0.0,
            hit_effects: Vec::new(),
            passes: 0,
            fails: 0,
            rounds_played: 0,
            torn_down: false,
            timers,
            auto_reset: None,
            events: Vec::new(),
            next_hit_id: 1,
        }
    }

    pub fn physics_mode(&self) -> PhysicsMode {
        self.controller.mode()
    }

    /// Wall clock (ms since the session started)
    pub fn clock_ms(&self) -> f64 {
        self.timers.now_ms()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.pending()
    }

    pub fn light_phase(&self) -> LightPhase {
        self.light.phase()
    }

    /// Teleport the car (and its physics body) to a pose
    pub fn place_car(&mut self, pos: Vec2, vel: Vec2) {
        self.car.pos = pos;
        self.car.vel = vel;
        self.controller.reset(&self.car);
    }

    pub(crate) fn alloc_hit_id(&mut self) -> u32 {
        let id = self.next_hit_id;
        self.next_hit_id += 1;
        id
    }

    pub fn drain_events(&mut self) -> Vec<DrivingEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Cancel every timer and stop the session; later ticks are no-ops
    pub fn teardown(&mut self) {
        self.timers.shutdown();
        self.auto_reset = None;
        self.torn_down = true;
        log::debug!("Driving session torn down");
    }

    pub fn snapshot(&self) -> DrivingSnapshot {
        DrivingSnapshot {
            car: self.car,
            speed: self.speed,
            status: self.status,
            light: self.light_display,
            score: self.score,
            crossed: self.crossed,
            paused: self.paused,
            hit_effects: self.hit_effects.clone(),
            passes: self.passes,
            fails: self.fails,
            rounds_played: self.rounds_played,
        }
    }
}

/// Read-only view for rendering
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrivingSnapshot {
    pub car: Car,
    pub speed: f32,
    pub status: RoundStatus,
    pub light: LightProgress,
    pub score: u32,
    pub crossed: bool,
    pub paused: bool,
    pub hit_effects: Vec<HitEffect>,
    pub passes: u32,
    pub fails: u32,
    pub rounds_played: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session() {
        let state = DrivingState::new(PhysicsMode::Kinematic, DrivingTuning::default());
        assert_eq!(state.status, RoundStatus::Playing);
        assert_eq!(state.light_phase(), LightPhase::Green);
        assert_eq!(state.car, Car::spawn());
        assert_eq!(state.light_display.remaining_ms, 6000.0);
        // phase + poll
        assert_eq!(state.pending_timers(), 2);
    }

    #[test]
    fn test_forward_vector() {
        let mut car = Car::spawn();
        assert!((car.forward() - Vec2::new(0.0, -1.0)).length() < 1e-6);
        car.heading = std::f32::consts::FRAC_PI_2;
        assert!((car.forward() - Vec2::new(-1.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_teardown_cancels_timers() {
        let mut state = DrivingState::new(PhysicsMode::RigidBody, DrivingTuning::default());
        state.teardown();
        assert_eq!(state.pending_timers(), 0);
        assert!(state.is_torn_down());
    }
}
