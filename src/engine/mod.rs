//! Audio Engine
//!
//! A small sample-accurate mixing engine standing in for a native audio graph:
//! gain nodes with scheduled automation, buffer-source voices routed through
//! them, and an optional LFO-swept low-pass filter per voice.
//!
//! The [`AudioContext`] is a cheap cloneable handle. The control side
//! (sounds, dispatch) and the render side (output device or offline export)
//! share it; every operation takes the lock briefly.

pub mod clock;
pub mod filter;
pub mod param;
pub mod voice;

pub use clock::AudioClock;
pub use filter::{BiquadLowpass, Lfo, VcfChain, VcfSettings};
pub use param::AudioParam;
pub use voice::{VoiceId, VoiceSpec};

use crate::{AudioError, Result};
use parking_lot::Mutex;
use std::sync::Arc;
use voice::Voice;

/// Handle to a gain node owned by an [`AudioContext`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GainId(pub(crate) usize);

/// Mutable engine state behind the context lock
struct ContextState {
    clock: AudioClock,
    channels: u16,
    master_gain: f32,
    gains: Vec<AudioParam>,
    voices: Vec<Voice>,
    next_voice: u64,
    /// Per-voice frame scratch (one slot per output channel)
    scratch: Vec<f32>,
}

impl ContextState {
    fn gain_mut(&mut self, id: GainId) -> Result<&mut AudioParam> {
        self.gains
            .get_mut(id.0)
            .ok_or_else(|| AudioError::Other(format!("Unknown gain node {}", id.0)))
    }
}

/// Shared handle to the mixing engine
#[derive(Clone)]
pub struct AudioContext {
    inner: Arc<Mutex<ContextState>>,
}

impl AudioContext {
    /// Create a context rendering `channels` interleaved channels at `sample_rate`
    pub fn new(sample_rate: u32, channels: u16) -> Result<Self> {
        if sample_rate == 0 {
            return Err(AudioError::ConfigError(
                "Sample rate must be greater than zero".into(),
            ));
        }
        if channels == 0 {
            return Err(AudioError::ConfigError(
                "Channel count must be greater than zero".into(),
            ));
        }

        let state = ContextState {
            clock: AudioClock::new(sample_rate),
            channels,
            master_gain: 1.0,
            gains: Vec::new(),
            voices: Vec::new(),
            next_voice: 0,
            scratch: vec![0.0; channels as usize],
        };
        Ok(AudioContext {
            inner: Arc::new(Mutex::new(state)),
        })
    }

    /// Current time in seconds
    pub fn current_time(&self) -> f64 {
        self.inner.lock().clock.current_time()
    }

    /// Output sample rate
    pub fn sample_rate(&self) -> u32 {
        self.inner.lock().clock.sample_rate()
    }

    /// Output channel count
    pub fn channels(&self) -> u16 {
        self.inner.lock().channels
    }

    /// Set the gain applied to the final mix
    pub fn set_master_gain(&self, gain: f32) {
        self.inner.lock().master_gain = gain.max(0.0);
    }

    /// Gain applied to the final mix
    pub fn master_gain(&self) -> f32 {
        self.inner.lock().master_gain
    }

    /// Create a gain node with an initial value
    pub fn create_gain(&self, initial: f32) -> GainId {
        let mut state = self.inner.lock();
        state.gains.push(AudioParam::new(initial));
        GainId(state.gains.len() - 1)
    }

    /// Schedule automation on a gain node
    ///
    /// The closure receives the parameter and the current time.
    pub fn with_gain<R>(&self, id: GainId, f: impl FnOnce(&mut AudioParam, f64) -> R) -> Result<R> {
        let mut state = self.inner.lock();
        let now = state.clock.current_time();
        let param = state.gain_mut(id)?;
        Ok(f(param, now))
    }

    /// Current value of a gain node
    pub fn gain_value(&self, id: GainId) -> Result<f32> {
        self.with_gain(id, |param, now| param.value_at(now))
    }

    /// Start a voice at the current time
    ///
    /// The rate must be positive and finite.
    pub fn start(&self, spec: VoiceSpec) -> Result<VoiceId> {
        if !(spec.rate.is_finite() && spec.rate > 0.0) {
            return Err(AudioError::InvalidSound(format!(
                "Voice '{}' has invalid rate {}",
                spec.name, spec.rate
            )));
        }
        let mut state = self.inner.lock();
        state.gain_mut(spec.gain)?;

        let id = VoiceId(state.next_voice);
        state.next_voice += 1;
        let sample_rate = state.clock.sample_rate();
        let channels = state.channels;
        state
            .voices
            .push(Voice::new(id, spec, sample_rate, channels));
        Ok(id)
    }

    /// Stop a voice now, or at an absolute time in seconds
    ///
    /// Returns false when the voice is unknown or already finished.
    pub fn stop_voice(&self, id: VoiceId, at: Option<f64>) -> bool {
        let mut state = self.inner.lock();
        let frame = Self::stop_frame(&state.clock, at);
        match state.voices.iter_mut().find(|v| v.id == id) {
            Some(voice) if !voice.is_finished() => {
                voice.stop_at(frame);
                true
            }
            _ => false,
        }
    }

    /// Stop every voice routed through `gain`, now or at an absolute time
    ///
    /// Returns the number of voices affected.
    pub fn stop_gain_voices(&self, gain: GainId, at: Option<f64>) -> usize {
        let mut state = self.inner.lock();
        let frame = Self::stop_frame(&state.clock, at);
        let mut stopped = 0;
        for voice in state
            .voices
            .iter_mut()
            .filter(|v| v.gain == gain && !v.is_finished())
        {
            voice.stop_at(frame);
            stopped += 1;
        }
        stopped
    }

    /// Drop every voice immediately
    pub fn stop_all(&self) {
        self.inner.lock().voices.clear();
    }

    /// Whether any unfinished voice is routed through `gain`
    pub fn is_gain_active(&self, gain: GainId) -> bool {
        self.inner
            .lock()
            .voices
            .iter()
            .any(|v| v.gain == gain && !v.is_finished())
    }

    /// Names of voices that have not finished, in start order
    pub fn active_voices(&self) -> Vec<String> {
        self.inner
            .lock()
            .voices
            .iter()
            .filter(|v| !v.is_finished())
            .map(|v| v.name.to_string())
            .collect()
    }

    /// Render the next block into an interleaved buffer, advancing the clock
    ///
    /// A trailing partial frame is zero-filled and does not advance time.
    pub fn render(&self, out: &mut [f32]) {
        let mut state = self.inner.lock();
        let ContextState {
            clock,
            channels,
            master_gain,
            gains,
            voices,
            scratch,
            ..
        } = &mut *state;

        let channels = *channels as usize;
        let frames = out.len() / channels;
        out.fill(0.0);

        for (i, frame_out) in out.chunks_exact_mut(channels).enumerate() {
            let frame = clock.frame() + i as u64;
            let time = clock.time_of(frame);

            for voice in voices.iter_mut() {
                if !voice.next_frame(frame, scratch) {
                    continue;
                }
                let gain = gains
                    .get(voice.gain.0)
                    .map_or(1.0, |param| param.value_at(time));
                for (acc, sample) in frame_out.iter_mut().zip(scratch.iter()) {
                    *acc += sample * gain;
                }
            }

            for sample in frame_out.iter_mut() {
                let mixed = *sample * *master_gain;
                *sample = if mixed.is_finite() { mixed } else { 0.0 };
            }
        }

        clock.advance(frames as u64);
        voices.retain(|v| !v.is_finished());
        let now = clock.current_time();
        for param in gains.iter_mut() {
            param.prune(now);
        }
    }

    /// Render `frames` frames into a new interleaved buffer
    pub fn render_frames(&self, frames: usize) -> Vec<f32> {
        let mut out = vec![0.0; frames * self.channels() as usize];
        self.render(&mut out);
        out
    }

    fn stop_frame(clock: &AudioClock, at: Option<f64>) -> u64 {
        match at {
            Some(time) => clock.frame_at(time).max(clock.frame()),
            None => clock.frame(),
        }
    }
}

impl std::fmt::Debug for AudioContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.lock();
        f.debug_struct("AudioContext")
            .field("sample_rate", &state.clock.sample_rate())
            .field("channels", &state.channels)
            .field("time", &state.clock.current_time())
            .field("voices", &state.voices.len())
            .field("gains", &state.gains.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::SoundBuffer;
    use approx::assert_abs_diff_eq;

    fn constant_buffer(frames: usize, value: f32) -> Arc<SoundBuffer> {
        Arc::new(SoundBuffer::new(vec![value; frames], 1000, 1).unwrap())
    }

    #[test]
    fn test_rejects_invalid_format() {
        assert!(AudioContext::new(0, 2).is_err());
        assert!(AudioContext::new(44_100, 0).is_err());
    }

    #[test]
    fn test_render_applies_gain() {
        let ctx = AudioContext::new(1000, 1).unwrap();
        let gain = ctx.create_gain(0.5);
        ctx.start(VoiceSpec::new("tone", constant_buffer(100, 1.0), gain))
            .unwrap();

        let out = ctx.render_frames(10);
        assert!(out.iter().all(|&s| (s - 0.5).abs() < 1e-6));
        assert_abs_diff_eq!(ctx.current_time(), 0.01);
    }

    #[test]
    fn test_render_follows_ramp() {
        let ctx = AudioContext::new(1000, 1).unwrap();
        let gain = ctx.create_gain(1.0);
        ctx.with_gain(gain, |param, now| {
            param.set_value_at_time(0.0, now);
            param.linear_ramp_to_value_at_time(1.0, now + 1.0, now);
        })
        .unwrap();
        ctx.start(VoiceSpec::new("tone", constant_buffer(2000, 1.0), gain))
            .unwrap();

        let out = ctx.render_frames(1000);
        assert_abs_diff_eq!(out[0], 0.0);
        assert_abs_diff_eq!(out[500], 0.5, epsilon = 1e-3);
        assert_abs_diff_eq!(ctx.gain_value(gain).unwrap(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_finished_voices_are_dropped() {
        let ctx = AudioContext::new(1000, 2).unwrap();
        let gain = ctx.create_gain(1.0);
        ctx.start(VoiceSpec::new("blip", constant_buffer(5, 1.0), gain))
            .unwrap();
        assert_eq!(ctx.active_voices(), vec!["blip".to_string()]);

        ctx.render_frames(10);
        assert!(ctx.active_voices().is_empty());
        assert!(!ctx.is_gain_active(gain));
    }

    #[test]
    fn test_scheduled_stop() {
        let ctx = AudioContext::new(1000, 1).unwrap();
        let gain = ctx.create_gain(1.0);
        let mut spec = VoiceSpec::new("loop", constant_buffer(10, 1.0), gain);
        spec.looping = true;
        ctx.start(spec).unwrap();

        assert_eq!(ctx.stop_gain_voices(gain, Some(0.005)), 1);
        let out = ctx.render_frames(10);
        assert_eq!(&out[..5], &[1.0; 5]);
        assert_eq!(&out[5..], &[0.0; 5]);
        assert!(ctx.active_voices().is_empty());
    }

    #[test]
    fn test_stop_voice_unknown() {
        let ctx = AudioContext::new(1000, 1).unwrap();
        assert!(!ctx.stop_voice(VoiceId(42), None));
    }

    #[test]
    fn test_stop_all_and_master_gain() {
        let ctx = AudioContext::new(1000, 1).unwrap();
        let gain = ctx.create_gain(1.0);
        ctx.set_master_gain(0.25);
        ctx.start(VoiceSpec::new("a", constant_buffer(10, 1.0), gain))
            .unwrap();
        let out = ctx.render_frames(1);
        assert_abs_diff_eq!(out[0], 0.25);

        ctx.stop_all();
        assert!(ctx.active_voices().is_empty());
        assert_eq!(ctx.render_frames(1), vec![0.0]);
    }

    #[test]
    fn test_unknown_gain_is_error() {
        let ctx = AudioContext::new(1000, 1).unwrap();
        let other = AudioContext::new(1000, 1).unwrap();
        let foreign = other.create_gain(1.0);
        assert!(ctx.gain_value(foreign).is_err());
        assert!(ctx
            .start(VoiceSpec::new("x", constant_buffer(1, 0.0), foreign))
            .is_err());
    }

    #[test]
    fn test_non_positive_rate_is_rejected() {
        let ctx = AudioContext::new(1000, 1).unwrap();
        let gain = ctx.create_gain(1.0);
        for rate in [0.0, -1.0, f32::NAN] {
            let spec = VoiceSpec {
                rate,
                ..VoiceSpec::new("x", constant_buffer(10, 1.0), gain)
            };
            assert!(matches!(ctx.start(spec), Err(AudioError::InvalidSound(_))));
        }
        assert!(ctx.active_voices().is_empty());
    }
}
