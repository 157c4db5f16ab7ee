//! Audio cues using the Web Audio API
//!
//! Procedurally generated sound effects - no external files needed!
//! Playback is best-effort: a missing context or a failed node call just
//! means silence, the simulation never notices.

use crate::sim::driving::{DrivingEvent, LightPhase};
use crate::sim::runner::RunnerEvent;

#[cfg(target_arch = "wasm32")]
use crate::settings::Settings;
#[cfg(target_arch = "wasm32")]
use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    Jump,
    /// Dragon stomped but still alive
    Stomp,
    DragonDefeated,
    /// Dragon breath volley
    FireBreath,
    LevelUp,
    GameOver,
    /// Game over with a new best
    HighScore,
    LightChange,
    Pass,
    Fail,
    BarrierHit,
}

impl SoundEffect {
    /// Cue for a runner event, if it has one
    pub fn for_runner(event: &RunnerEvent) -> Option<Self> {
        match event {
            RunnerEvent::Jumped => Some(SoundEffect::Jump),
            RunnerEvent::DragonHit { .. } => Some(SoundEffect::Stomp),
            RunnerEvent::DragonDefeated => Some(SoundEffect::DragonDefeated),
            RunnerEvent::FireBreathed => Some(SoundEffect::FireBreath),
            RunnerEvent::LevelUp { .. } => Some(SoundEffect::LevelUp),
            RunnerEvent::GameOver { new_record: true, .. } => Some(SoundEffect::HighScore),
            RunnerEvent::GameOver { .. } => Some(SoundEffect::GameOver),
            _ => None,
        }
    }

    /// Cue for a driving event, if it has one
    pub fn for_driving(event: &DrivingEvent) -> Option<Self> {
        match event {
            // Going green is silent
            DrivingEvent::LightChanged { phase } if *phase != LightPhase::Green => {
                Some(SoundEffect::LightChange)
            }
            DrivingEvent::Passed { .. } => Some(SoundEffect::Pass),
            DrivingEvent::Failed { .. } => Some(SoundEffect::Fail),
            DrivingEvent::BarrierHit { .. } => Some(SoundEffect::BarrierHit),
            _ => None,
        }
    }
}

/// Audio manager shared by both games
#[cfg(target_arch = "wasm32")]
pub struct AudioManager {
    ctx: Option<AudioContext>,
    volume: f32,
}

#[cfg(target_arch = "wasm32")]
impl AudioManager {
    pub fn new(settings: &Settings) -> Self {
        // May fail outside a secure context
        let ctx = AudioContext::new().ok();
        if ctx.is_none() {
            log::warn!("Failed to create AudioContext - audio disabled");
        }
        Self {
            ctx,
            volume: settings.effective_volume(),
        }
    }

    /// Resume audio context (required after user gesture)
    pub fn resume(&self) {
        if let Some(ctx) = &self.ctx {
            let _ = ctx.resume();
        }
    }

    /// Pick up a changed volume or mute without recreating the context
    pub fn apply_settings(&mut self, settings: &Settings) {
        self.volume = settings.effective_volume();
    }

    pub fn play_runner(&self, events: &[RunnerEvent]) {
        for effect in events.iter().filter_map(SoundEffect::for_runner) {
            self.play(effect);
        }
    }

    pub fn play_driving(&self, events: &[DrivingEvent]) {
        for effect in events.iter().filter_map(SoundEffect::for_driving) {
            self.play(effect);
        }
    }

    /// Play a sound effect
    pub fn play(&self, effect: SoundEffect) {
        let vol = self.volume;
        if vol <= 0.0 {
            return;
        }

        let Some(ctx) = &self.ctx else { return };

        // Browsers suspend the context until a user gesture
        if ctx.state() == web_sys::AudioContextState::Suspended {
            let _ = ctx.resume();
        }

        match effect {
            SoundEffect::Jump => {
                self.sweep(ctx, vol * 0.3, 220.0, 520.0, 0.12, OscillatorType::Triangle)
            }
            SoundEffect::Stomp => {
                self.sweep(ctx, vol * 0.6, 160.0, 60.0, 0.12, OscillatorType::Sine)
            }
            SoundEffect::FireBreath => self.play_fire(ctx, vol),
            SoundEffect::BarrierHit => self.play_crunch(ctx, vol),
            SoundEffect::LightChange => {
                self.sweep(ctx, vol * 0.25, 880.0, 880.0, 0.1, OscillatorType::Sine)
            }
            SoundEffect::DragonDefeated => {
                self.arpeggio(ctx, vol * 0.3, &[300.0, 450.0, 600.0, 900.0], 0.07, 0.3)
            }
            SoundEffect::LevelUp | SoundEffect::Pass => {
                self.arpeggio(ctx, vol * 0.3, &[400.0, 500.0, 600.0, 800.0], 0.1, 0.4)
            }
            SoundEffect::HighScore => {
                self.arpeggio(ctx, vol * 0.25, &[500.0, 600.0, 700.0, 800.0, 1000.0], 0.08, 0.25)
            }
            SoundEffect::GameOver | SoundEffect::Fail => {
                self.arpeggio(ctx, vol * 0.3, &[400.0, 350.0, 300.0, 200.0], 0.2, 0.3)
            }
        }
    }

    // === Sound generators ===

    /// Create an oscillator with gain envelope
    fn create_osc(
        &self,
        ctx: &AudioContext,
        freq: f32,
        osc_type: OscillatorType,
    ) -> Option<(OscillatorNode, GainNode)> {
        let osc = ctx.create_oscillator().ok()?;
        let gain = ctx.create_gain().ok()?;

        osc.set_type(osc_type);
        osc.frequency().set_value(freq);
        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(&ctx.destination()).ok()?;

        Some((osc, gain))
    }

    /// Single tone gliding from `from` to `to` Hz
    fn sweep(
        &self,
        ctx: &AudioContext,
        level: f32,
        from: f32,
        to: f32,
        length: f64,
        osc_type: OscillatorType,
    ) {
        let Some((osc, gain)) = self.create_osc(ctx, from, osc_type) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(level, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + length)
            .ok();
        osc.frequency().set_value_at_time(from, t).ok();
        osc.frequency()
            .exponential_ramp_to_value_at_time(to, t + length)
            .ok();

        osc.start().ok();
        osc.stop_with_when(t + length + 0.05).ok();
    }

    /// Notes played one after another
    fn arpeggio(&self, ctx: &AudioContext, level: f32, notes: &[f32], spacing: f64, length: f64) {
        for (i, freq) in notes.iter().enumerate() {
            let delay = i as f64 * spacing;
            if let Some((osc, gain)) = self.create_osc(ctx, *freq, OscillatorType::Triangle) {
                let t = ctx.current_time() + delay;
                gain.gain().set_value_at_time(level, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + length)
                    .ok();
                osc.start_with_when(t).ok();
                osc.stop_with_when(t + length + 0.1).ok();
            }
        }
    }

    /// Fire breath - low sawtooth roar
    fn play_fire(&self, ctx: &AudioContext, vol: f32) {
        let Some((osc, gain)) = self.create_osc(ctx, 90.0, OscillatorType::Sawtooth) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(0.01, t).ok();
        gain.gain().linear_ramp_to_value_at_time(vol * 0.15, t + 0.03).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + 0.2)
            .ok();
        osc.frequency().set_value_at_time(90.0, t).ok();
        osc.frequency()
            .exponential_ramp_to_value_at_time(50.0, t + 0.2)
            .ok();

        osc.start().ok();
        osc.stop_with_when(t + 0.25).ok();
    }

    /// Barrier hit - square thud plus a short high scrape
    fn play_crunch(&self, ctx: &AudioContext, vol: f32) {
        self.sweep(ctx, vol * 0.5, 120.0, 40.0, 0.2, OscillatorType::Square);

        if let Some((osc, gain)) = self.create_osc(ctx, 1800.0, OscillatorType::Sawtooth) {
            let t = ctx.current_time();
            gain.gain().set_value_at_time(vol * 0.08, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.12)
                .ok();
            osc.start().ok();
            osc.stop_with_when(t + 0.15).ok();
        }
    }
}
