//! Vehicle controllers
//!
//! Two physics strategies share one contract: read the held keys, move the
//! car, and report whether it touched a barrier. Both treat a barrier as a
//! hard stop (no rebound).

use glam::{Quat, Vec2, Vec3};

use super::state::Car;
use crate::consts::driving::*;
use crate::normalize_angle;
use crate::settings::PhysicsMode;
use crate::tuning::DrivingTuning;

/// Held-key snapshot for the car
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriveInput {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    /// Pause toggle (car physics only)
    pub pause: bool,
    /// Manual round reset
    pub reset: bool,
    /// Barrier contact reported by an external physics engine
    pub barrier_contact: bool,
    /// Idle/demo mode - autopilot drives
    pub idle_mode: bool,
}

impl DriveInput {
    /// +1 left, -1 right, 0 none/both
    pub fn steer(&self) -> f32 {
        match (self.left, self.right) {
            (true, false) => 1.0,
            (false, true) => -1.0,
            _ => 0.0,
        }
    }
}

/// Result of one physics step
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepReport {
    pub barrier_contact: bool,
}

pub trait VehicleController: std::fmt::Debug {
    fn mode(&self) -> PhysicsMode;

    /// Advance the car by `dt` seconds
    fn step(
        &mut self,
        car: &mut Car,
        input: &DriveInput,
        dt: f32,
        tuning: &DrivingTuning,
    ) -> StepReport;

    /// Resynchronize internal state with a teleported car
    fn reset(&mut self, car: &Car);
}

pub fn controller_for(mode: PhysicsMode, tuning: &DrivingTuning) -> Box<dyn VehicleController> {
    match mode {
        PhysicsMode::Kinematic => Box::new(KinematicController),
        PhysicsMode::RigidBody => Box::new(RigidBodyController::new(tuning)),
    }
}

/// Rescale `vel` uniformly so its length does not exceed `max`
fn clamp_speed(vel: Vec2, max: f32) -> Vec2 {
    let speed = vel.length();
    if speed > max && speed > 0.0 {
        vel * (max / speed)
    } else {
        vel
    }
}

/// Direct velocity integration
#[derive(Debug, Clone, Copy, Default)]
pub struct KinematicController;

impl VehicleController for KinematicController {
    fn mode(&self) -> PhysicsMode {
        PhysicsMode::Kinematic
    }

    fn step(
        &mut self,
        car: &mut Car,
        input: &DriveInput,
        dt: f32,
        tuning: &DrivingTuning,
    ) -> StepReport {
        // Frame hitches would otherwise overshoot
        let dt = dt.clamp(0.0, MAX_STEP);

        if input.up {
            car.vel += car.forward() * tuning.accel * dt;
        }
        if input.down {
            car.vel *= (1.0 - tuning.brake_decay * dt).max(0.0);
        } else if !input.up {
            car.vel *= (1.0 - tuning.coast_decay * dt).max(0.0);
        }

        let speed = car.speed();
        let steer = input.steer();
        car.angular_vel = 0.0;
        if speed > tuning.steer_min_speed && steer != 0.0 {
            let rate = (speed * tuning.turn_per_speed).min(tuning.max_turn_rate);
            car.angular_vel = steer * rate;
            let along = car.vel.dot(car.forward());
            car.heading = normalize_angle(car.heading + car.angular_vel * dt);
            car.vel = car.forward() * along;
        }

        car.vel = clamp_speed(car.vel, tuning.max_speed);
        car.pos += car.vel * dt;

        if car.pos.x.abs() >= BARRIER_X {
            car.pos.x = car.pos.x.clamp(-BARRIER_X, BARRIER_X);
            car.vel = Vec2::ZERO;
            car.angular_vel = 0.0;
            return StepReport {
                barrier_contact: true,
            };
        }
        StepReport::default()
    }

    fn reset(&mut self, _car: &Car) {}
}

/// Planar rigid body (y is up, the car stays on y = 0)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigidBody {
    pub position: Vec3,
    pub orientation: Quat,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
    pub mass: f32,
}

impl RigidBody {
    fn from_car(car: &Car, mass: f32) -> Self {
        Self {
            position: Vec3::new(car.pos.x, 0.0, car.pos.y),
            orientation: Quat::from_rotation_y(car.heading),
            linear_velocity: Vec3::new(car.vel.x, 0.0, car.vel.y),
            angular_velocity: Vec3::new(0.0, car.angular_vel, 0.0),
            mass,
        }
    }

    pub fn forward(&self) -> Vec3 {
        self.orientation * Vec3::NEG_Z
    }

    pub fn right(&self) -> Vec3 {
        self.orientation * Vec3::X
    }

    /// Yaw angle matching [`Car::heading`]
    pub fn heading(&self) -> f32 {
        let f = self.forward();
        (-f.x).atan2(-f.z)
    }

    /// Semi-implicit Euler step
    fn integrate(&mut self, force: Vec3, torque_y: f32, yaw_inertia: f32, dt: f32) {
        self.linear_velocity += force / self.mass * dt;
        self.linear_velocity.y = 0.0;
        self.angular_velocity.y += torque_y / yaw_inertia.max(f32::EPSILON) * dt;
        self.position += self.linear_velocity * dt;
        self.orientation =
            (Quat::from_rotation_y(self.angular_velocity.y * dt) * self.orientation).normalize();
    }
}

/// Static barrier plane: blocks motion past `x_face` along `normal_x`
#[derive(Debug, Clone, Copy, PartialEq)]
struct BarrierWall {
    x_face: f32,
    /// +1 for the left wall (pushes toward +x), -1 for the right wall
    normal_x: f32,
}

impl BarrierWall {
    fn penetrates(&self, body: &RigidBody) -> bool {
        (self.x_face - body.position.x) * self.normal_x >= 0.0
    }
}

/// Force/torque driven car
#[derive(Debug, Clone)]
pub struct RigidBodyController {
    body: RigidBody,
    walls: [BarrierWall; 2],
}

impl RigidBodyController {
    pub fn new(tuning: &DrivingTuning) -> Self {
        Self {
            body: RigidBody::from_car(&Car::spawn(), tuning.mass),
            walls: [
                BarrierWall {
                    x_face: -BARRIER_X,
                    normal_x: 1.0,
                },
                BarrierWall {
                    x_face: BARRIER_X,
                    normal_x: -1.0,
                },
            ],
        }
    }

    /// Net force from engine, brakes, idle drag and tyre grip
    fn drive_force(&self, input: &DriveInput, dt: f32, tuning: &DrivingTuning) -> Vec3 {
        let body = &self.body;
        let v = body.linear_velocity;
        let mut force = Vec3::ZERO;

        if input.up {
            force += body.forward() * tuning.engine_force * (body.mass / tuning.reference_mass);
        }
        if input.down {
            let speed = v.length();
            if speed > 1e-4 {
                // Never more than what stops the car this step
                let stopping = speed * body.mass / dt.max(f32::EPSILON);
                force -= v / speed * tuning.max_brake_force.min(stopping);
            }
        } else if !input.up {
            force -= v * tuning.idle_damping;
        }

        let lateral = v.dot(body.right());
        let grip = tuning.lateral_grip.min(1.0 / dt.max(f32::EPSILON));
        force -= body.right() * lateral * body.mass * grip;
        force
    }

    /// Contact step: report and resolve barrier penetration
    fn resolve_contacts(&mut self) -> bool {
        let mut touched = false;
        for wall in self.walls {
            if wall.penetrates(&self.body) {
                self.body.position.x = wall.x_face;
                self.body.linear_velocity = Vec3::ZERO;
                self.body.angular_velocity = Vec3::ZERO;
                touched = true;
            }
        }
        touched
    }

    fn write_car(&self, car: &mut Car) {
        car.pos = Vec2::new(self.body.position.x, self.body.position.z);
        car.vel = Vec2::new(self.body.linear_velocity.x, self.body.linear_velocity.z);
        car.heading = self.body.heading();
        car.angular_vel = self.body.angular_velocity.y;
    }
}

impl VehicleController for RigidBodyController {
    fn mode(&self) -> PhysicsMode {
        PhysicsMode::RigidBody
    }

    fn step(
        &mut self,
        car: &mut Car,
        input: &DriveInput,
        dt: f32,
        tuning: &DrivingTuning,
    ) -> StepReport {
        let dt = dt.clamp(0.0, MAX_STEP);
        if dt == 0.0 {
            self.write_car(car);
            return StepReport::default();
        }

        let force = self.drive_force(input, dt, tuning);
        let speed = self.body.linear_velocity.length();
        let torque = if speed > tuning.steer_min_speed {
            tuning.steer_torque_gain * input.steer()
        } else {
            0.0
        };

        self.body.integrate(force, torque, tuning.yaw_inertia, dt);
        self.body.angular_velocity *= (1.0 - tuning.angular_damping * dt).max(0.0);

        let v = Vec2::new(self.body.linear_velocity.x, self.body.linear_velocity.z);
        let v = clamp_speed(v, tuning.max_speed);
        self.body.linear_velocity = Vec3::new(v.x, 0.0, v.y);

        let barrier_contact = self.resolve_contacts();
        self.write_car(car);
        StepReport { barrier_contact }
    }

    fn reset(&mut self, car: &Car) {
        self.body = RigidBody::from_car(car, self.body.mass);
    }
}
