//! Filtered Loop
//!
//! A looping sound played through a resonant low-pass filter whose cutoff is
//! swept by a slow sine LFO. Filter settings are fixed; only the LFO rate is
//! configurable.

use super::{Sound, SoundParams};
use crate::asset::AssetLoader;
use crate::engine::{AudioContext, VcfSettings, VoiceId};
use crate::Result;
use std::ops::Deref;

/// Looping sound with a voltage-controlled filter
#[derive(Debug)]
pub struct VcfSound {
    sound: Sound,
    lfo_freq: f32,
}

impl VcfSound {
    /// Create an unloaded filtered loop; looping is always enabled
    pub fn new(ctx: &AudioContext, url: impl Into<String>, params: SoundParams) -> Result<Self> {
        Ok(VcfSound {
            sound: Sound::new(ctx, url, params.looping(true))?,
            lfo_freq: VcfSettings::DEFAULT_LFO_FREQ,
        })
    }

    /// Set the LFO rate in Hz
    pub fn with_lfo_freq(mut self, hz: f32) -> Self {
        self.lfo_freq = hz.max(0.0);
        self
    }

    /// LFO rate in Hz
    pub fn lfo_freq(&self) -> f32 {
        self.lfo_freq
    }

    /// Filter settings applied on every play
    pub fn settings(&self) -> VcfSettings {
        VcfSettings::with_lfo_freq(self.lfo_freq)
    }

    /// Fetch and decode the asset
    pub fn load(&mut self, loader: &dyn AssetLoader) -> Result<()> {
        self.sound.load(loader)
    }

    /// Start the loop through a fresh filter chain
    pub fn play(&self) -> Result<VoiceId> {
        let params = *self.sound.params();
        self.sound.trigger(&params, Some(self.settings()))
    }

    /// Stop the loop, fading out if configured
    pub fn stop(&self) -> Result<()> {
        self.sound.stop()
    }

    /// The underlying sound
    pub fn sound(&self) -> &Sound {
        &self.sound
    }

    /// The underlying sound, mutably
    pub fn sound_mut(&mut self) -> &mut Sound {
        &mut self.sound
    }
}

impl Deref for VcfSound {
    type Target = Sound;

    fn deref(&self) -> &Sound {
        &self.sound
    }
}
