//! Fire-and-forget sound
//!
//! Effects are synthesized from oscillator patches, so there are no asset
//! files. The engine only talks to [`AudioSink`]; the Web Audio
//! implementation lives behind `cfg(target_arch = "wasm32")`.

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundEffect {
    /// Player fired
    Shoot,
    /// Hazard destroyed
    HazardHit,
    /// Player rammed or shot
    PlayerHit,
    /// Multiplier collected
    Bonus,
    LevelComplete,
    GameOver,
    /// Snake ate food
    SnakeEat,
    /// New best score
    HighScore,
}

/// Oscillator waveform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wave {
    Sine,
    Square,
    Triangle,
    Sawtooth,
}

/// One oscillator voice of an effect
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub wave: Wave,
    pub freq: f32,
    /// Frequency glided to over the tone, if any
    pub glide_to: Option<f32>,
    /// Peak gain before volume scaling
    pub gain: f32,
    /// Seconds after the trigger
    pub delay: f64,
    pub duration: f64,
}

const fn tone(wave: Wave, freq: f32, gain: f32, delay: f64, duration: f64) -> Tone {
    Tone {
        wave,
        freq,
        glide_to: None,
        gain,
        delay,
        duration,
    }
}

const fn glide(wave: Wave, freq: f32, to: f32, gain: f32, duration: f64) -> Tone {
    Tone {
        wave,
        freq,
        glide_to: Some(to),
        gain,
        delay: 0.0,
        duration,
    }
}

const SHOOT: &[Tone] = &[glide(Wave::Square, 900.0, 300.0, 0.15, 0.08)];
const HAZARD_HIT: &[Tone] = &[
    glide(Wave::Sawtooth, 120.0, 30.0, 0.45, 0.35),
    glide(Wave::Sine, 80.0, 40.0, 0.3, 0.2),
];
const PLAYER_HIT: &[Tone] = &[glide(Wave::Sine, 300.0, 20.0, 0.4, 0.8)];
const BONUS: &[Tone] = &[
    tone(Wave::Sine, 600.0, 0.25, 0.0, 0.15),
    tone(Wave::Sine, 800.0, 0.25, 0.08, 0.15),
    tone(Wave::Sine, 1000.0, 0.25, 0.16, 0.15),
];
const LEVEL_COMPLETE: &[Tone] = &[
    tone(Wave::Triangle, 400.0, 0.3, 0.0, 0.4),
    tone(Wave::Triangle, 500.0, 0.3, 0.1, 0.4),
    tone(Wave::Triangle, 600.0, 0.3, 0.2, 0.4),
    tone(Wave::Triangle, 800.0, 0.3, 0.3, 0.4),
];
const GAME_OVER: &[Tone] = &[
    tone(Wave::Sine, 400.0, 0.3, 0.0, 0.3),
    tone(Wave::Sine, 350.0, 0.3, 0.2, 0.3),
    tone(Wave::Sine, 300.0, 0.3, 0.4, 0.3),
    tone(Wave::Sine, 200.0, 0.3, 0.6, 0.3),
];
const SNAKE_EAT: &[Tone] = &[tone(Wave::Square, 800.0, 0.1, 0.0, 0.1)];
const HIGH_SCORE: &[Tone] = &[
    tone(Wave::Triangle, 500.0, 0.25, 0.0, 0.25),
    tone(Wave::Triangle, 600.0, 0.25, 0.08, 0.25),
    tone(Wave::Triangle, 700.0, 0.25, 0.16, 0.25),
    tone(Wave::Triangle, 800.0, 0.25, 0.24, 0.25),
    tone(Wave::Triangle, 1000.0, 0.25, 0.32, 0.25),
];

impl SoundEffect {
    /// Voices making up the effect
    pub fn patch(self) -> &'static [Tone] {
        match self {
            SoundEffect::Shoot => SHOOT,
            SoundEffect::HazardHit => HAZARD_HIT,
            SoundEffect::PlayerHit => PLAYER_HIT,
            SoundEffect::Bonus => BONUS,
            SoundEffect::LevelComplete => LEVEL_COMPLETE,
            SoundEffect::GameOver => GAME_OVER,
            SoundEffect::SnakeEat => SNAKE_EAT,
            SoundEffect::HighScore => HIGH_SCORE,
        }
    }
}

/// Audio collaborator. Calls never block and never fail the caller; a sink
/// that cannot play logs and moves on.
pub trait AudioSink {
    fn play(&mut self, effect: SoundEffect);
    fn start_music(&mut self);
    fn stop_music(&mut self);
}

/// Sink that discards everything (headless runs)
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play(&mut self, _effect: SoundEffect) {}
    fn start_music(&mut self) {}
    fn stop_music(&mut self) {}
}

/// Volume state shared by real sinks
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mixer {
    pub master: f32,
    pub sfx: f32,
    pub music: f32,
    pub muted: bool,
}

impl Default for Mixer {
    fn default() -> Self {
        Self {
            master: 0.8,
            sfx: 1.0,
            music: 0.5,
            muted: false,
        }
    }
}

impl Mixer {
    pub fn from_settings(settings: &crate::Settings) -> Self {
        Self {
            master: settings.master_volume.clamp(0.0, 1.0),
            sfx: settings.sfx_volume.clamp(0.0, 1.0),
            music: settings.music_volume.clamp(0.0, 1.0),
            muted: settings.muted,
        }
    }

    pub fn sfx_volume(&self) -> f32 {
        if self.muted { 0.0 } else { self.master * self.sfx }
    }

    pub fn music_volume(&self) -> f32 {
        if self.muted { 0.0 } else { self.master * self.music }
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::WebAudio;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{AudioContext, AudioContextState, GainNode, OscillatorNode, OscillatorType};

    use super::{AudioSink, Mixer, SoundEffect, Tone, Wave};

    /// Web Audio sink
    pub struct WebAudio {
        ctx: Option<AudioContext>,
        pub mixer: Mixer,
        /// Drone voices while music plays
        music: Vec<(OscillatorNode, GainNode)>,
    }

    impl WebAudio {
        pub fn new(mixer: Mixer) -> Self {
            // May fail outside a secure context
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self {
                ctx,
                mixer,
                music: Vec::new(),
            }
        }

        /// Browsers keep the context suspended until a user gesture
        fn wake(ctx: &AudioContext) {
            if ctx.state() == AudioContextState::Suspended {
                let _ = ctx.resume();
            }
        }

        fn voice(ctx: &AudioContext, wave: Wave, freq: f32) -> Option<(OscillatorNode, GainNode)> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;
            osc.set_type(match wave {
                Wave::Sine => OscillatorType::Sine,
                Wave::Square => OscillatorType::Square,
                Wave::Triangle => OscillatorType::Triangle,
                Wave::Sawtooth => OscillatorType::Sawtooth,
            });
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;
            Some((osc, gain))
        }

        fn schedule(ctx: &AudioContext, tone: &Tone, vol: f32) -> Option<()> {
            let (osc, gain) = Self::voice(ctx, tone.wave, tone.freq)?;
            let t = ctx.current_time() + tone.delay;
            let end = t + tone.duration;
            gain.gain().set_value_at_time(vol * tone.gain, t).ok()?;
            gain.gain().exponential_ramp_to_value_at_time(0.01, end).ok()?;
            if let Some(to) = tone.glide_to {
                osc.frequency().set_value_at_time(tone.freq, t).ok()?;
                osc.frequency().exponential_ramp_to_value_at_time(to, end).ok()?;
            }
            osc.start_with_when(t).ok()?;
            osc.stop_with_when(end + 0.05).ok()?;
            Some(())
        }
    }

    impl AudioSink for WebAudio {
        fn play(&mut self, effect: SoundEffect) {
            let vol = self.mixer.sfx_volume();
            let Some(ctx) = &self.ctx else { return };
            if vol <= 0.0 {
                return;
            }
            Self::wake(ctx);
            for tone in effect.patch() {
                if Self::schedule(ctx, tone, vol).is_none() {
                    log::warn!("Could not schedule {:?}", effect);
                    return;
                }
            }
        }

        fn start_music(&mut self) {
            self.stop_music();
            let vol = self.mixer.music_volume();
            let Some(ctx) = &self.ctx else { return };
            if vol <= 0.0 {
                return;
            }
            Self::wake(ctx);
            // Low fifth drone
            for (wave, freq, level) in [(Wave::Triangle, 55.0, 0.06), (Wave::Sine, 82.5, 0.04)] {
                if let Some((osc, gain)) = Self::voice(ctx, wave, freq) {
                    gain.gain().set_value(vol * level);
                    if osc.start().is_ok() {
                        self.music.push((osc, gain));
                    }
                }
            }
        }

        fn stop_music(&mut self) {
            for (osc, _gain) in self.music.drain(..) {
                let _ = osc.stop();
            }
        }
    }
}
