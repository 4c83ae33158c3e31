//! Audio system using Web Audio API
//!
//! Procedurally generated sound effects, driven by simulation events.

use crate::sim::GameEvent;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SoundEffect {
    /// First contact with a peg; `rate` rises with each peg in a shot
    PegHit { rate: f32 },
    /// Same, for a fast impact
    PegHitHard { rate: f32 },
    /// Ball leaves the cannon
    Launch,
    /// Bucket caught the ball
    ExtraBall,
    /// Every special peg cleared
    Won,
    GameOver,
}

impl SoundEffect {
    /// Cue for a simulation event, if it has one
    pub fn for_event(event: &GameEvent) -> Option<Self> {
        match *event {
            GameEvent::PegHit { pitch, hard, .. } => Some(if hard {
                SoundEffect::PegHitHard { rate: pitch }
            } else {
                SoundEffect::PegHit { rate: pitch }
            }),
            GameEvent::BallLaunched => Some(SoundEffect::Launch),
            GameEvent::BucketCatch => Some(SoundEffect::ExtraBall),
            GameEvent::Won => Some(SoundEffect::Won),
            GameEvent::GameOver => Some(SoundEffect::GameOver),
            GameEvent::BallStocked { .. }
            | GameEvent::PegsCleared { .. }
            | GameEvent::BallLost
            | GameEvent::StuckCleared => None,
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::AudioManager;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{AudioContext, OscillatorNode, OscillatorType};

    use super::SoundEffect;
    use crate::settings::Settings;

    /// Base pitch of the peg chime before the per-shot rise
    const PEG_BASE_FREQ: f32 = 520.0;

    /// Audio manager for the game
    pub struct AudioManager {
        ctx: Option<AudioContext>,
        volume: f32,
        /// Muted because the window lost focus
        blurred: bool,
    }

    impl AudioManager {
        pub fn new(settings: &Settings) -> Self {
            // Try to create audio context (may fail if not in secure context)
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self {
                ctx,
                volume: settings.effective_sfx_volume(),
                blurred: false,
            }
        }

        /// Resume audio context (required after user gesture)
        pub fn resume(&self) {
            if let Some(ctx) = &self.ctx {
                let _ = ctx.resume();
            }
        }

        pub fn apply_settings(&mut self, settings: &Settings) {
            self.volume = settings.effective_sfx_volume();
        }

        pub fn set_blurred(&mut self, blurred: bool) {
            self.blurred = blurred;
        }

        /// Play a sound effect
        pub fn play(&self, effect: SoundEffect) {
            let vol = if self.blurred { 0.0 } else { self.volume };
            if vol <= 0.0 {
                return;
            }

            let Some(ctx) = &self.ctx else { return };

            // Resume context if suspended (browsers require user gesture)
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            match effect {
                SoundEffect::PegHit { rate } => self.play_peg_hit(ctx, vol * 0.6, rate),
                SoundEffect::PegHitHard { rate } => self.play_peg_hit(ctx, vol, rate),
                SoundEffect::Launch => self.play_launch(ctx, vol),
                SoundEffect::ExtraBall => self.play_extra_ball(ctx, vol),
                SoundEffect::Won => self.play_won(ctx, vol),
                SoundEffect::GameOver => self.play_game_over(ctx, vol),
            }
        }

        // === Sound generators ===

        /// One enveloped note starting at `start`; returns the oscillator so
        /// callers can bend its pitch
        fn tone(
            &self,
            ctx: &AudioContext,
            freq: f32,
            wave: OscillatorType,
            start: f64,
            peak: f32,
            decay: f64,
        ) -> Option<OscillatorNode> {
            let osc = ctx.create_oscillator().ok()?;
            let env = ctx.create_gain().ok()?;
            osc.set_type(wave);
            osc.frequency().set_value_at_time(freq, start).ok()?;
            osc.connect_with_audio_node(&env).ok()?;
            env.connect_with_audio_node(&ctx.destination()).ok()?;

            let gain = env.gain();
            gain.set_value_at_time(peak, start).ok()?;
            gain.exponential_ramp_to_value_at_time(0.001, start + decay).ok()?;
            osc.start_with_when(start).ok()?;
            osc.stop_with_when(start + decay + 0.02).ok()?;
            Some(osc)
        }

        /// Sine body plus a short inharmonic overtone, like a struck brass pin
        fn chime(&self, ctx: &AudioContext, freq: f32, start: f64, vol: f32, decay: f64) {
            self.tone(ctx, freq, OscillatorType::Sine, start, vol * 0.4, decay);
            self.tone(ctx, freq * 2.7, OscillatorType::Triangle, start, vol * 0.12, decay / 3.0);
        }

        /// Peg chime, transposed by playback rate
        fn play_peg_hit(&self, ctx: &AudioContext, vol: f32, rate: f32) {
            self.chime(ctx, PEG_BASE_FREQ * rate, ctx.current_time(), vol, 0.18);
        }

        /// Launch - short pop that drops in pitch
        fn play_launch(&self, ctx: &AudioContext, vol: f32) {
            let t = ctx.current_time();
            if let Some(osc) = self.tone(ctx, 220.0, OscillatorType::Triangle, t, vol * 0.3, 0.12) {
                osc.frequency()
                    .exponential_ramp_to_value_at_time(90.0, t + 0.1)
                    .ok();
            }
        }

        /// Extra ball - three quick chimes upward
        fn play_extra_ball(&self, ctx: &AudioContext, vol: f32) {
            let t = ctx.current_time();
            for (i, ratio) in [1.25, 1.75, 2.5].into_iter().enumerate() {
                self.chime(ctx, PEG_BASE_FREQ * ratio, t + i as f64 * 0.07, vol * 0.8, 0.15);
            }
        }

        /// Won - chime cascade up the peg scale, last note held
        fn play_won(&self, ctx: &AudioContext, vol: f32) {
            let t = ctx.current_time();
            let steps = [1.0, 1.25, 1.5, 2.0, 2.5, 3.0];
            for (i, ratio) in steps.into_iter().enumerate() {
                let decay = if i + 1 == steps.len() { 0.8 } else { 0.2 };
                self.chime(ctx, PEG_BASE_FREQ * ratio, t + i as f64 * 0.09, vol, decay);
            }
        }

        /// Game over - slow downward glide, then a low thud
        fn play_game_over(&self, ctx: &AudioContext, vol: f32) {
            let t = ctx.current_time();
            if let Some(osc) = self.tone(ctx, 330.0, OscillatorType::Sawtooth, t, vol * 0.15, 0.9) {
                osc.frequency()
                    .exponential_ramp_to_value_at_time(110.0, t + 0.85)
                    .ok();
            }
            self.tone(ctx, 70.0, OscillatorType::Triangle, t + 0.85, vol * 0.35, 0.3);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peg_hit_cue_carries_pitch() {
        let soft = GameEvent::PegHit {
            peg_id: 3,
            special: false,
            pitch: 1.3,
            hard: false,
        };
        assert_eq!(
            SoundEffect::for_event(&soft),
            Some(SoundEffect::PegHit { rate: 1.3 })
        );

        let hard = GameEvent::PegHit {
            peg_id: 3,
            special: true,
            pitch: 1.0,
            hard: true,
        };
        assert_eq!(
            SoundEffect::for_event(&hard),
            Some(SoundEffect::PegHitHard { rate: 1.0 })
        );
    }

    #[test]
    fn test_silent_events() {
        assert_eq!(SoundEffect::for_event(&GameEvent::BallLost), None);
        assert_eq!(
            SoundEffect::for_event(&GameEvent::BallStocked { stock: 2 }),
            None
        );
        assert_eq!(
            SoundEffect::for_event(&GameEvent::BucketCatch),
            Some(SoundEffect::ExtraBall)
        );
    }
}
