//! Runner game state and entity types
//!
//! Every entity carries a stable id and an explicit `alive` flag. Dead
//! entities are culled at the end of the tick that killed them.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::runner::*;
use crate::highscores::{HighScore, RUNNER_HIGHSCORE_KEY};
use crate::persistence::KeyValueStore;
use crate::sim::collision::Aabb;
use crate::sim::timer::{OwnerToken, Scheduler, TimerId};
use crate::tuning::RunnerTuning;

/// Stable entity handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// The running character
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Box centre
    pub pos: Vec2,
    /// Vertical velocity (px/s, positive is down)
    pub vel_y: f32,
    pub grounded: bool,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            pos: Vec2::new(PLAYER_X, Self::ground_center_y()),
            vel_y: 0.0,
            grounded: true,
        }
    }
}

impl Player {
    fn ground_center_y() -> f32 {
        GROUND_Y - PLAYER_HEIGHT / 2.0
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::new(self.pos, Vec2::new(PLAYER_WIDTH, PLAYER_HEIGHT))
    }

    /// Moving down (falling or landing on something)
    pub fn is_descending(&self) -> bool {
        self.vel_y > 0.0
    }

    /// Start a jump. Only possible from the ground.
    pub fn jump(&mut self, velocity: f32) -> bool {
        if !self.grounded {
            return false;
        }
        self.vel_y = velocity;
        self.grounded = false;
        true
    }

    /// Apply gravity and move. Returns true on the tick the player lands.
    pub fn integrate(&mut self, gravity: f32, dt: f32) -> bool {
        if self.grounded {
            return false;
        }
        self.vel_y += gravity * dt;
        self.pos.y += self.vel_y * dt;

        let ground = Self::ground_center_y();
        if self.pos.y >= ground {
            self.pos.y = ground;
            self.vel_y = 0.0;
            self.grounded = true;
            return true;
        }
        false
    }

    /// Feet position (for dust)
    pub fn feet(&self) -> Vec2 {
        Vec2::new(self.pos.x, self.pos.y + PLAYER_HEIGHT / 2.0)
    }
}

/// Ground obstacle variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObstacleKind {
    Barrel,
    Box,
}

impl ObstacleKind {
    pub fn size(&self) -> Vec2 {
        let (w, h) = match self {
            ObstacleKind::Barrel => BARREL_SIZE,
            ObstacleKind::Box => BOX_SIZE,
        };
        Vec2::new(w, h)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: EntityId,
    pub kind: ObstacleKind,
    pub pos: Vec2,
    /// Leftward speed (px/s)
    pub speed: f32,
    pub alive: bool,
}

impl Obstacle {
    pub fn new(id: EntityId, kind: ObstacleKind, speed: f32) -> Self {
        let size = kind.size();
        Self {
            id,
            kind,
            pos: Vec2::new(OBSTACLE_SPAWN_X, GROUND_Y - size.y / 2.0),
            speed,
            alive: true,
        }
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::new(self.pos, self.kind.size())
    }
}

#[derive(Debug, Clone)]
pub struct Dragon {
    pub id: EntityId,
    pub pos: Vec2,
    pub health: u8,
    /// Leftward speed (px/s)
    pub speed: f32,
    pub alive: bool,
    /// Owns the fire-breath timer
    pub breath_token: OwnerToken,
    /// Breath timer fires seen so far (drives the volley/rest cadence)
    pub breath_step: u32,
}

impl Dragon {
    pub fn aabb(&self) -> Aabb {
        Aabb::new(self.pos, Vec2::new(DRAGON_WIDTH, DRAGON_HEIGHT))
    }

    pub fn mouth(&self) -> Vec2 {
        self.pos + Vec2::new(DRAGON_MOUTH_OFFSET.0, DRAGON_MOUTH_OFFSET.1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticleKind {
    /// Dragon breath; lethal to the player
    Fire,
    /// Cosmetic
    Dust,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub id: EntityId,
    pub kind: ParticleKind,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Remaining lifetime (s)
    pub life: f32,
    pub max_life: f32,
    pub alive: bool,
}

impl Particle {
    /// Opacity, proportional to remaining life
    pub fn alpha(&self) -> f32 {
        if self.max_life <= 0.0 {
            return 0.0;
        }
        (self.life / self.max_life).clamp(0.0, 1.0)
    }

    pub fn aabb(&self) -> Aabb {
        let size = match self.kind {
            ParticleKind::Fire => FIRE_SIZE,
            ParticleKind::Dust => DUST_SIZE,
        };
        Aabb::new(self.pos, Vec2::splat(size))
    }
}

/// Timer payloads for the runner scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerTimer {
    SpawnObstacle,
    SpawnDragon,
    FireBreath(EntityId),
}

/// Gameplay events for presentation and audio (drained by the host)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RunnerEvent {
    Jumped,
    Landed,
    ObstacleSpawned { kind: ObstacleKind },
    DragonSpawned,
    FireBreathed,
    DragonHit { remaining: u8 },
    DragonDefeated,
    LevelUp { level: u32 },
    GameOver { score: u64, best: u64, new_record: bool },
    Restarted,
}

/// Complete runner state
#[derive(Debug, Clone)]
pub struct RunnerState {
    pub seed: u64,
    pub tuning: RunnerTuning,
    pub(crate) rng: Pcg32,
    /// Continuous score
    pub score: f64,
    pub level: u32,
    /// Gates all physics and spawning
    pub game_active: bool,
    pub paused: bool,
    pub player: Player,
    pub obstacles: Vec<Obstacle>,
    pub dragons: Vec<Dragon>,
    pub particles: Vec<Particle>,
    pub highscore: HighScore,
    pub(crate) timers: Scheduler<RunnerTimer>,
    pub(crate) spawn_timer: Option<TimerId>,
    pub(crate) dragon_timer: Option<TimerId>,
    /// Set once the dragon timer has been started this run
    pub dragon_timer_started: bool,
    pub(crate) events: Vec<RunnerEvent>,
    next_id: u32,
}

impl RunnerState {
    /// Create a new run with the given seed
    pub fn new(seed: u64, tuning: RunnerTuning) -> Self {
        let mut timers = Scheduler::new();
        let spawn_timer = Some(timers.schedule_repeating(
            tuning.spawn_interval_ms,
            RunnerTimer::SpawnObstacle,
        ));
        Self {
            seed,
            tuning,
            rng: Pcg32::seed_from_u64(seed),
            score: 0.0,
            level: 1,
            game_active: true,
            paused: false,
            player: Player::default(),
            obstacles: Vec::new(),
            dragons: Vec::new(),
            particles: Vec::new(),
            highscore: HighScore::empty(RUNNER_HIGHSCORE_KEY),
            timers,
            spawn_timer,
            dragon_timer: None,
            dragon_timer_started: false,
            events: Vec::new(),
            next_id: 1,
        }
    }

    /// Read the persisted best score
    pub fn load_highscore(&mut self, store: &dyn KeyValueStore) {
        self.highscore = HighScore::load(store, RUNNER_HIGHSCORE_KEY);
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Whole points (what the HUD shows and what gets persisted)
    pub fn display_score(&self) -> u64 {
        self.score.max(0.0).floor() as u64
    }

    pub fn live_dragon(&self) -> Option<&Dragon> {
        self.dragons.iter().find(|d| d.alive)
    }

    pub fn dragon_mut(&mut self, id: EntityId) -> Option<&mut Dragon> {
        self.dragons.iter_mut().find(|d| d.id == id)
    }

    /// Simulation clock (ms since the run started)
    pub fn clock_ms(&self) -> f64 {
        self.timers.now_ms()
    }

    /// Outstanding timers (spawn cadence, dragon cadence, breath timers)
    pub fn pending_timers(&self) -> usize {
        self.timers.pending()
    }

    /// Take the events emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<RunnerEvent> {
        std::mem::take(&mut self.events)
    }

    /// Mark a dragon dead and cancel its breath timer
    pub(crate) fn kill_dragon(&mut self, id: EntityId) {
        let token = match self.dragon_mut(id) {
            Some(dragon) if dragon.alive => {
                dragon.alive = false;
                dragon.breath_token
            }
            _ => return,
        };
        self.timers.revoke(token);
    }

    /// Stop every runner timer
    pub(crate) fn cancel_timers(&mut self) {
        if let Some(id) = self.spawn_timer.take() {
            self.timers.cancel(id);
        }
        if let Some(id) = self.dragon_timer.take() {
            self.timers.cancel(id);
        }
        let tokens: Vec<_> = self.dragons.iter().map(|d| d.breath_token).collect();
        for token in tokens {
            self.timers.revoke(token);
        }
    }

    /// Reinitialize every entity and timer; keeps tuning, RNG stream and best score
    pub fn restart(&mut self) {
        self.teardown();
        let fresh = Self::new(self.seed, self.tuning.clone());
        let rng = self.rng.clone();
        let highscore = self.highscore.clone();
        let next_id = self.next_id;
        *self = Self {
            rng,
            highscore,
            next_id,
            ..fresh
        };
        self.events.push(RunnerEvent::Restarted);
        log::info!("Runner restarted");
    }

    /// Cancel all timers synchronously; nothing fires afterwards
    pub fn teardown(&mut self) {
        self.cancel_timers();
        self.timers.shutdown();
        self.game_active = false;
    }

    /// Presentation view of the state
    pub fn snapshot(&self) -> RunnerSnapshot {
        RunnerSnapshot::from(self)
    }
}

/// Read-only view for rendering
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerSnapshot {
    pub score: u64,
    pub level: u32,
    pub best: u64,
    pub game_active: bool,
    pub paused: bool,
    pub player: Player,
    pub obstacles: Vec<(ObstacleKind, Vec2)>,
    /// (position, health)
    pub dragons: Vec<(Vec2, u8)>,
    /// (kind, position, alpha)
    pub particles: Vec<(ParticleKind, Vec2, f32)>,
}

impl From<&RunnerState> for RunnerSnapshot {
    fn from(state: &RunnerState) -> Self {
        Self {
            score: state.display_score(),
            level: state.level,
            best: state.highscore.best(),
            game_active: state.game_active,
            paused: state.paused,
            player: state.player.clone(),
            obstacles: state
                .obstacles
                .iter()
                .filter(|o| o.alive)
                .map(|o| (o.kind, o.pos))
                .collect(),
            dragons: state
                .dragons
                .iter()
                .filter(|d| d.alive)
                .map(|d| (d.pos, d.health))
                .collect(),
            particles: state
                .particles
                .iter()
                .filter(|p| p.alive)
                .map(|p| (p.kind, p.pos, p.alpha()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_run() {
        let state = RunnerState::new(1, RunnerTuning::default());
        assert!(state.game_active);
        assert_eq!(state.level, 1);
        assert_eq!(state.pending_timers(), 1);
        assert!(state.player.grounded);
    }

    #[test]
    fn test_player_jump_and_land() {
        let mut player = Player::default();
        assert!(player.jump(-650.0));
        assert!(!player.jump(-650.0));

        let mut landed = false;
        for _ in 0..200 {
            if player.integrate(1500.0, 1.0 / 60.0) {
                landed = true;
                break;
            }
        }
        assert!(landed);
        assert!(player.grounded);
        assert_eq!(player.pos.y, GROUND_Y - PLAYER_HEIGHT / 2.0);
    }

    #[test]
    fn test_particle_alpha() {
        let p = Particle {
            id: EntityId(1),
            kind: ParticleKind::Dust,
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            life: 0.25,
            max_life: 0.5,
            alive: true,
        };
        assert!((p.alpha() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_restart_reinitializes() {
        let mut state = RunnerState::new(7, RunnerTuning::default());
        state.score = 400.0;
        state.level = 2;
        state.game_active = false;
        let id = state.next_entity_id();
        state.obstacles.push(Obstacle::new(id, ObstacleKind::Box, 300.0));

        state.restart();
        assert_eq!(state.score, 0.0);
        assert_eq!(state.level, 1);
        assert!(state.game_active);
        assert!(state.obstacles.is_empty());
        assert!(!state.dragon_timer_started);
        assert_eq!(state.pending_timers(), 1);
        assert_eq!(state.drain_events(), vec![RunnerEvent::Restarted]);
    }
}
