//! Data-driven game balance
//!
//! Defaults are the shipped balance. A JSON document may override any subset
//! of fields; missing fields keep their defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Runner balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerTuning {
    /// Score gained per elapsed millisecond
    pub score_per_ms: f64,
    /// Score span of one level
    pub level_span: f64,

    /// Obstacle cadence (ms); not level-scaled
    pub spawn_interval_ms: f64,
    /// Probability that a spawned obstacle is a barrel (otherwise a box)
    pub barrel_weight: f64,
    pub obstacle_base_speed: f32,
    pub obstacle_speed_per_level: f32,

    /// Level at which the dragon timer starts
    pub dragon_level: u32,
    pub dragon_interval_ms: f64,
    pub dragon_health: u8,
    pub dragon_base_speed: f32,
    pub dragon_speed_per_level: f32,
    pub dragon_reward: f64,
    /// Horizontal shove applied to a dragon that survives a stomp
    pub dragon_knockback: f32,

    /// Fire-breath timer period (ms)
    pub breath_interval_ms: f64,
    /// Bursts per volley before the dragon rests
    pub breath_volley: u32,
    /// Timer periods the dragon rests after a volley
    pub breath_rest: u32,
    pub fire_particles_per_burst: u32,
    pub fire_speed: f32,
    pub fire_lifetime: f32,

    pub dust_particles_per_burst: u32,
    /// Dust bursts emitted when a dragon is defeated
    pub defeat_dust_bursts: u32,
    pub dust_lifetime: f32,

    /// Player physics (px/s, px/s²; negative is up)
    pub gravity: f32,
    pub jump_velocity: f32,
    pub stomp_bounce: f32,
}

impl Default for RunnerTuning {
    fn default() -> Self {
        Self {
            score_per_ms: 0.01,
            level_span: 250.0,

            spawn_interval_ms: 1200.0,
            barrel_weight: 0.75,
            obstacle_base_speed: 300.0,
            obstacle_speed_per_level: 30.0,

            dragon_level: 2,
            dragon_interval_ms: 6000.0,
            dragon_health: 3,
            dragon_base_speed: 250.0,
            dragon_speed_per_level: 20.0,
            dragon_reward: 50.0,
            dragon_knockback: -30.0,

            breath_interval_ms: 300.0,
            breath_volley: 3,
            breath_rest: 3,
            fire_particles_per_burst: 3,
            fire_speed: 220.0,
            fire_lifetime: 1.2,

            dust_particles_per_burst: 8,
            defeat_dust_bursts: 3,
            dust_lifetime: 0.5,

            gravity: 1500.0,
            jump_velocity: -650.0,
            stomp_bounce: -400.0,
        }
    }
}

impl RunnerTuning {
    /// Obstacle scroll speed at `level` (px/s)
    pub fn obstacle_speed(&self, level: u32) -> f32 {
        self.obstacle_base_speed + level.saturating_sub(1) as f32 * self.obstacle_speed_per_level
    }

    /// Dragon scroll speed at `level` (px/s)
    pub fn dragon_speed(&self, level: u32) -> f32 {
        self.dragon_base_speed + level.saturating_sub(1) as f32 * self.dragon_speed_per_level
    }

    /// Level for a score: floor(score / span) + 1
    pub fn level_for(&self, score: f64) -> u32 {
        (score.max(0.0) / self.level_span).floor() as u32 + 1
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("invalid runner tuning")
    }
}

/// Traffic light dwell durations (ms)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightTiming {
    pub green_ms: f64,
    pub yellow_ms: f64,
    pub red_ms: f64,
    /// Display poll resolution
    pub poll_ms: f64,
}

impl Default for LightTiming {
    fn default() -> Self {
        Self {
            green_ms: 6000.0,
            yellow_ms: 1500.0,
            red_ms: 5000.0,
            poll_ms: 100.0,
        }
    }
}

/// Driving balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrivingTuning {
    pub light: LightTiming,
    /// Delay before a finished round resets itself (ms)
    pub auto_reset_ms: f64,
    /// Lifetime of a barrier hit effect (ms)
    pub hit_effect_ms: f64,

    pub max_speed: f32,
    /// Steering is ignored below this speed
    pub steer_min_speed: f32,

    // Kinematic mode
    pub accel: f32,
    pub brake_decay: f32,
    pub coast_decay: f32,
    /// Turn rate gained per unit of speed (rad/s per u/s)
    pub turn_per_speed: f32,
    pub max_turn_rate: f32,

    // Rigid-body mode
    pub mass: f32,
    /// Engine force at the reference mass
    pub engine_force: f32,
    pub reference_mass: f32,
    pub max_brake_force: f32,
    pub idle_damping: f32,
    pub steer_torque_gain: f32,
    pub yaw_inertia: f32,
    pub angular_damping: f32,
    /// Sideways velocity removed per second by tyre grip
    pub lateral_grip: f32,
}

impl Default for DrivingTuning {
    fn default() -> Self {
        Self {
            light: LightTiming::default(),
            auto_reset_ms: 4000.0,
            hit_effect_ms: 1000.0,

            max_speed: 14.0,
            steer_min_speed: 0.2,

            accel: 18.0,
            brake_decay: 12.0,
            coast_decay: 3.0,
            turn_per_speed: 0.3,
            max_turn_rate: 2.2,

            mass: 1200.0,
            engine_force: 6000.0,
            reference_mass: 1200.0,
            max_brake_force: 18000.0,
            idle_damping: 120.0,
            steer_torque_gain: 80.0,
            yaw_inertia: 40.0,
            angular_damping: 2.0,
            lateral_grip: 8.0,
        }
    }
}

impl DrivingTuning {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("invalid driving tuning")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_law() {
        let t = RunnerTuning::default();
        assert_eq!(t.level_for(0.0), 1);
        assert_eq!(t.level_for(249.99), 1);
        assert_eq!(t.level_for(250.0), 2);
        assert_eq!(t.level_for(760.0), 4);
    }

    #[test]
    fn test_level_speeds() {
        let t = RunnerTuning::default();
        assert_eq!(t.obstacle_speed(1), 300.0);
        assert_eq!(t.obstacle_speed(3), 360.0);
        assert_eq!(t.dragon_speed(2), 270.0);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let t = RunnerTuning::from_json(r#"{ "spawn_interval_ms": 900.0 }"#).unwrap();
        assert_eq!(t.spawn_interval_ms, 900.0);
        assert_eq!(t.dragon_health, 3);

        let d = DrivingTuning::from_json(r#"{ "light": { "red_ms": 3000.0 } }"#).unwrap();
        assert_eq!(d.light.red_ms, 3000.0);
        assert_eq!(d.light.green_ms, 6000.0);
        assert_eq!(d.max_speed, 14.0);
    }

    #[test]
    fn test_bad_json_is_error() {
        assert!(RunnerTuning::from_json("{ not json").is_err());
    }
}
