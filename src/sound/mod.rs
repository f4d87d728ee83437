//! Sound Primitives
//!
//! A [`Sound`] owns one decoded asset and one gain node in the
//! [`AudioContext`]. Play, stop and fade operations schedule automation on
//! that gain node and start or stop voices routed through it. Voices of the
//! same sound may overlap; they share the sound's gain.

pub mod params;
pub mod vcf;

pub use params::{SoundOverrides, SoundParams};
pub use vcf::VcfSound;

use crate::asset::{self, AssetLoader, SoundBuffer};
use crate::engine::{AudioContext, GainId, VcfSettings, VoiceId, VoiceSpec};
use crate::{AudioError, Result};
use log::debug;
use std::sync::Arc;

/// A loadable, playable sound asset
#[derive(Debug)]
pub struct Sound {
    ctx: AudioContext,
    url: String,
    name: Arc<str>,
    params: SoundParams,
    gain: GainId,
    buffer: Option<Arc<SoundBuffer>>,
}

impl Sound {
    /// Create an unloaded sound for `url`
    ///
    /// The name defaults to the url's basename without a `.wav` suffix.
    pub fn new(ctx: &AudioContext, url: impl Into<String>, params: SoundParams) -> Result<Self> {
        let url = url.into();
        if url.is_empty() {
            return Err(AudioError::InvalidSound("Sound url must not be empty".into()));
        }

        let name: Arc<str> = default_name(&url).into();
        let gain = ctx.create_gain(params.gain);
        Ok(Sound {
            ctx: ctx.clone(),
            url,
            name,
            params,
            gain,
            buffer: None,
        })
    }

    /// Override the display name
    pub fn with_name(mut self, name: impl Into<Arc<str>>) -> Self {
        self.name = name.into();
        self
    }

    /// Fetch and decode the asset
    pub fn load(&mut self, loader: &dyn AssetLoader) -> Result<()> {
        let buffer = asset::load_buffer(loader, &self.url)?;
        debug!(
            "Decoded {} ({} frames, {} Hz, {} ch)",
            self.url,
            buffer.frames(),
            buffer.sample_rate(),
            buffer.channels()
        );
        self.buffer = Some(Arc::new(buffer));
        Ok(())
    }

    /// Use an already decoded buffer
    pub fn set_buffer(&mut self, buffer: Arc<SoundBuffer>) {
        self.buffer = Some(buffer);
    }

    /// Whether the asset has been decoded
    pub fn is_loaded(&self) -> bool {
        self.buffer.is_some()
    }

    /// Start playback with the sound's parameters
    pub fn play(&self) -> Result<VoiceId> {
        self.play_with(&SoundOverrides::none())
    }

    /// Start playback with per-call overrides
    pub fn play_with(&self, overrides: &SoundOverrides) -> Result<VoiceId> {
        let params = self.params.merged(overrides);
        self.trigger(&params, None)
    }

    /// Stop playback, fading out if the sound has a fade-out
    pub fn stop(&self) -> Result<()> {
        self.stop_with(&SoundOverrides::none())
    }

    /// Stop playback with per-call overrides
    ///
    /// The fade-out duration scales with the current gain, so a half-faded
    /// sound finishes in half the time.
    pub fn stop_with(&self, overrides: &SoundOverrides) -> Result<()> {
        let params = self.params.merged(overrides);
        if params.fade_out > 0.0 {
            let end = self.ctx.with_gain(self.gain, |gain, now| {
                let volume = gain.value_at(now);
                let end = now + volume.max(0.0) as f64 * params.fade_out as f64;
                gain.cancel_scheduled_values(now);
                gain.set_value_at_time(volume, now);
                gain.linear_ramp_to_value_at_time(0.0, end, now);
                gain.set_value_at_time(params.gain, end);
                end
            })?;
            let stopped = self.ctx.stop_gain_voices(self.gain, Some(end));
            debug!("stop {} at {:.3}s ({} voices)", self.name, end, stopped);
        } else {
            let stopped = self.ctx.stop_gain_voices(self.gain, None);
            debug!("stop {} ({} voices)", self.name, stopped);
        }
        Ok(())
    }

    /// Fade back up to the resting gain (the sound must already be playing)
    pub fn fade_in(&self) -> Result<()> {
        let params = self.params;
        self.ctx.with_gain(self.gain, |gain, now| {
            if params.fade_in > 0.0 {
                let volume = gain.value_at(now);
                gain.cancel_scheduled_values(now);
                gain.set_value_at_time(volume, now);
                gain.linear_ramp_to_value_at_time(params.gain, now + params.fade_in as f64, now);
            } else {
                gain.set_value(params.gain, now);
            }
        })
    }

    /// Fade to silence after `delay` seconds, leaving voices running
    pub fn fade_out(&self, delay: f64) -> Result<()> {
        let params = self.params;
        let delay = delay.max(0.0);
        self.ctx.with_gain(self.gain, |gain, now| {
            if params.fade_out > 0.0 {
                let volume = gain.value_at(now);
                let start = now + delay;
                gain.cancel_scheduled_values(now);
                gain.set_value_at_time(volume, now);
                gain.set_value_at_time(volume, start);
                gain.linear_ramp_to_value_at_time(
                    0.0,
                    start + volume.max(0.0) as f64 * params.fade_out as f64,
                    now,
                );
            } else {
                gain.set_value(0.0, now);
            }
        })
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Asset url
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Default playback parameters
    pub fn params(&self) -> &SoundParams {
        &self.params
    }

    /// Gain node handle
    pub fn gain_id(&self) -> GainId {
        self.gain
    }

    /// Current gain value
    pub fn gain_value(&self) -> Result<f32> {
        self.ctx.gain_value(self.gain)
    }

    /// Whether any voice of this sound is still sounding
    pub fn is_playing(&self) -> bool {
        self.ctx.is_gain_active(self.gain)
    }

    /// Schedule the gain envelope and start a voice
    pub(crate) fn trigger(&self, params: &SoundParams, vcf: Option<VcfSettings>) -> Result<VoiceId> {
        let buffer = self
            .buffer
            .clone()
            .ok_or_else(|| AudioError::NotLoaded(self.name.to_string()))?;
        if !(params.rate.is_finite() && params.rate > 0.0) {
            return Err(AudioError::InvalidSound(format!(
                "Sound '{}' has invalid rate {}",
                self.name, params.rate
            )));
        }

        self.ctx.with_gain(self.gain, |gain, now| {
            if params.fade_in > 0.0 {
                gain.cancel_scheduled_values(now);
                gain.set_value_at_time(0.0, now);
                gain.linear_ramp_to_value_at_time(params.gain, now + params.fade_in as f64, now);
            } else {
                gain.set_value(params.gain, now);
            }
        })?;

        let spec = VoiceSpec {
            name: Arc::clone(&self.name),
            buffer,
            gain: self.gain,
            rate: params.rate,
            looping: params.looping,
            loop_end: params.loop_end(),
            vcf,
        };
        let voice = self.ctx.start(spec)?;
        debug!("play {} ({:?})", self.name, voice);
        Ok(voice)
    }
}

fn default_name(url: &str) -> &str {
    let base = url.rsplit('/').next().unwrap_or(url);
    base.strip_suffix(".wav").unwrap_or(base)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::asset::MemoryLoader;
    use approx::assert_abs_diff_eq;

    pub(crate) const RATE: u32 = 1000;

    /// Loader answering every url with one second of full-scale DC
    pub(crate) fn dc_loader() -> MemoryLoader {
        let bytes = crate::asset::decode::tests::wav_bytes(&vec![1.0; RATE as usize], RATE, 1);
        MemoryLoader::with_fallback(bytes)
    }

    fn loaded(ctx: &AudioContext, params: SoundParams) -> Sound {
        let mut sound = Sound::new(ctx, "sounds/Game_01/G01_Success_01.wav", params).unwrap();
        sound.load(&dc_loader()).unwrap();
        sound
    }

    #[test]
    fn test_default_name_strips_wav() {
        assert_eq!(default_name("sounds/Alone_Mode/Hand_Shake_01.wav"), "Hand_Shake_01");
        assert_eq!(default_name("clip.ogg"), "clip.ogg");
    }

    #[test]
    fn test_empty_url_rejected() {
        let ctx = AudioContext::new(RATE, 1).unwrap();
        assert!(matches!(
            Sound::new(&ctx, "", SoundParams::new()),
            Err(AudioError::InvalidSound(_))
        ));
    }

    #[test]
    fn test_play_unloaded_is_error() {
        let ctx = AudioContext::new(RATE, 1).unwrap();
        let sound = Sound::new(&ctx, "a.wav", SoundParams::new()).unwrap();
        assert!(matches!(sound.play(), Err(AudioError::NotLoaded(name)) if name == "a"));
    }

    #[test]
    fn test_play_starts_voice() {
        let ctx = AudioContext::new(RATE, 1).unwrap();
        let sound = loaded(&ctx, SoundParams::new().gain(0.5));
        sound.play().unwrap();

        assert!(sound.is_playing());
        assert_eq!(ctx.active_voices(), vec!["G01_Success_01".to_string()]);
        let out = ctx.render_frames(10);
        assert_abs_diff_eq!(out[5], 0.5, epsilon = 1e-3);
    }

    #[test]
    fn test_fade_in_ramps_from_silence() {
        let ctx = AudioContext::new(RATE, 1).unwrap();
        let sound = loaded(&ctx, SoundParams::new().looping(true).fade_in(1.0));
        sound.play().unwrap();

        let out = ctx.render_frames(1000);
        assert_abs_diff_eq!(out[0], 0.0, epsilon = 1e-3);
        assert_abs_diff_eq!(out[500], 0.5, epsilon = 1e-2);
        assert_abs_diff_eq!(sound.gain_value().unwrap(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_stop_without_fade_is_immediate() {
        let ctx = AudioContext::new(RATE, 1).unwrap();
        let sound = loaded(&ctx, SoundParams::new().looping(true));
        sound.play().unwrap();
        ctx.render_frames(10);

        sound.stop().unwrap();
        let out = ctx.render_frames(10);
        assert!(out.iter().all(|&s| s == 0.0));
        assert!(!sound.is_playing());
    }

    #[test]
    fn test_stop_fade_scales_with_volume() {
        let ctx = AudioContext::new(RATE, 1).unwrap();
        let sound = loaded(&ctx, SoundParams::new().looping(true).gain(0.5).fade_out(1.0));
        sound.play().unwrap();
        ctx.render_frames(10);

        // Gain 0.5 with a 1s fade-out takes 0.5s
        sound.stop().unwrap();
        let out = ctx.render_frames(600);
        assert_abs_diff_eq!(out[250], 0.25, epsilon = 1e-2);
        assert!(out[500..].iter().all(|&s| s == 0.0));
        assert!(!sound.is_playing());
        // Resting gain restored after the fade
        assert_abs_diff_eq!(sound.gain_value().unwrap(), 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_stop_override_skips_fade() {
        let ctx = AudioContext::new(RATE, 1).unwrap();
        let sound = loaded(&ctx, SoundParams::new().looping(true).fade_out(2.0));
        sound.play().unwrap();
        sound
            .stop_with(&SoundOverrides::none().fade_out(0.0))
            .unwrap();
        assert!(ctx.render_frames(4).iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_fade_out_with_delay_keeps_voice() {
        let ctx = AudioContext::new(RATE, 1).unwrap();
        let sound = loaded(&ctx, SoundParams::new().looping(true).fade_in(1.0));
        sound.play().unwrap();
        ctx.render_frames(1000);

        sound.fade_out(0.5).unwrap();
        let out = ctx.render_frames(2000);
        assert_abs_diff_eq!(out[250], 1.0, epsilon = 1e-2);
        assert_abs_diff_eq!(out[1000], 0.5, epsilon = 1e-2);
        assert!(out[1600..].iter().all(|&s| s.abs() < 1e-6));
        assert!(sound.is_playing());

        sound.fade_in().unwrap();
        let out = ctx.render_frames(1000);
        assert_abs_diff_eq!(out[999], 1.0, epsilon = 1e-2);
    }

    #[test]
    fn test_fade_without_durations_steps() {
        let ctx = AudioContext::new(RATE, 1).unwrap();
        let sound = loaded(&ctx, SoundParams::new().looping(true).gain(0.8));
        sound.play().unwrap();

        sound.fade_out(0.0).unwrap();
        assert_eq!(sound.gain_value().unwrap(), 0.0);
        sound.fade_in().unwrap();
        assert_abs_diff_eq!(sound.gain_value().unwrap(), 0.8);
    }

    #[test]
    fn test_rate_override() {
        let ctx = AudioContext::new(RATE, 1).unwrap();
        let sound = loaded(&ctx, SoundParams::new());
        sound.play_with(&SoundOverrides::none().rate(2.0)).unwrap();

        // One second of audio at double rate lasts half a second
        let out = ctx.render_frames(1000);
        assert!(out[400] > 0.9);
        assert!(out[600..].iter().all(|&s| s == 0.0));
    }
}
