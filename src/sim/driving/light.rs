//! Traffic light phase machine
//!
//! Phases cycle green → yellow → red forever. The light only changes when its
//! phase timer fires; everything else reads it.

use serde::{Deserialize, Serialize};

use crate::tuning::LightTiming;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LightPhase {
    Green,
    Yellow,
    Red,
}

impl LightPhase {
    pub fn next(self) -> Self {
        match self {
            LightPhase::Green => LightPhase::Yellow,
            LightPhase::Yellow => LightPhase::Red,
            LightPhase::Red => LightPhase::Green,
        }
    }

    /// Dwell time of this phase (ms)
    pub fn dwell_ms(self, timing: &LightTiming) -> f64 {
        match self {
            LightPhase::Green => timing.green_ms,
            LightPhase::Yellow => timing.yellow_ms,
            LightPhase::Red => timing.red_ms,
        }
    }
}

/// Display snapshot of the current phase
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightProgress {
    pub phase: LightPhase,
    pub remaining_ms: f64,
    pub duration_ms: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrafficLight {
    phase: LightPhase,
    phase_started_ms: f64,
    timing: LightTiming,
}

impl TrafficLight {
    /// Start green at `now_ms`
    pub fn new(timing: LightTiming, now_ms: f64) -> Self {
        Self {
            phase: LightPhase::Green,
            phase_started_ms: now_ms,
            timing,
        }
    }

    pub fn phase(&self) -> LightPhase {
        self.phase
    }

    pub fn dwell_ms(&self) -> f64 {
        self.phase.dwell_ms(&self.timing)
    }

    /// Time left in the current phase, never negative
    pub fn remaining_ms(&self, now_ms: f64) -> f64 {
        (self.dwell_ms() - (now_ms - self.phase_started_ms)).max(0.0)
    }

    pub fn progress(&self, now_ms: f64) -> LightProgress {
        LightProgress {
            phase: self.phase,
            remaining_ms: self.remaining_ms(now_ms),
            duration_ms: self.dwell_ms(),
        }
    }

    /// Move to the next phase, started at `at_ms`. Returns the new phase.
    pub(crate) fn advance(&mut self, at_ms: f64) -> LightPhase {
        self.phase = self.phase.next();
        self.phase_started_ms = at_ms;
        self.phase
    }
}
