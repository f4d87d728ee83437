//! Playback Parameters

/// Playback parameters of a sound
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoundParams {
    /// Loop until stopped
    pub looping: bool,
    /// Fade-in duration in seconds (0 = start at full gain)
    pub fade_in: f32,
    /// Fade-out duration in seconds at full gain (0 = stop abruptly)
    pub fade_out: f32,
    /// Playback rate multiplier
    pub rate: f32,
    /// Loop frequency in Hz; the loop end is `1 / loop_freq` seconds (0 = whole buffer)
    pub loop_freq: f32,
    /// Resting gain
    pub gain: f32,
}

impl SoundParams {
    /// Default parameters: one-shot, no fades, unity rate and gain
    pub fn new() -> Self {
        SoundParams {
            looping: false,
            fade_in: 0.0,
            fade_out: 0.0,
            rate: 1.0,
            loop_freq: 0.0,
            gain: 1.0,
        }
    }

    /// Enable or disable looping
    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    /// Set the fade-in duration; the fade-out follows unless set afterwards
    pub fn fade_in(mut self, seconds: f32) -> Self {
        self.fade_in = seconds.max(0.0);
        self.fade_out = self.fade_in;
        self
    }

    /// Set the fade-out duration
    pub fn fade_out(mut self, seconds: f32) -> Self {
        self.fade_out = seconds.max(0.0);
        self
    }

    /// Set the playback rate
    pub fn rate(mut self, rate: f32) -> Self {
        self.rate = rate;
        self
    }

    /// Set the loop frequency
    pub fn loop_freq(mut self, hz: f32) -> Self {
        self.loop_freq = hz.max(0.0);
        self
    }

    /// Set the resting gain
    pub fn gain(mut self, gain: f32) -> Self {
        self.gain = gain;
        self
    }

    /// Loop end in seconds (0 = whole buffer)
    pub fn loop_end(&self) -> f64 {
        if self.loop_freq > 0.0 {
            1.0 / self.loop_freq as f64
        } else {
            0.0
        }
    }

    /// These parameters with per-call overrides applied
    pub fn merged(&self, overrides: &SoundOverrides) -> SoundParams {
        SoundParams {
            looping: overrides.looping.unwrap_or(self.looping),
            fade_in: overrides.fade_in.unwrap_or(self.fade_in),
            fade_out: overrides.fade_out.unwrap_or(self.fade_out),
            rate: overrides.rate.unwrap_or(self.rate),
            loop_freq: overrides.loop_freq.unwrap_or(self.loop_freq),
            gain: overrides.gain.unwrap_or(self.gain),
        }
    }
}

impl Default for SoundParams {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-call parameter overrides for play/stop
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SoundOverrides {
    /// Override looping
    pub looping: Option<bool>,
    /// Override fade-in duration
    pub fade_in: Option<f32>,
    /// Override fade-out duration
    pub fade_out: Option<f32>,
    /// Override playback rate
    pub rate: Option<f32>,
    /// Override loop frequency
    pub loop_freq: Option<f32>,
    /// Override gain
    pub gain: Option<f32>,
}

impl SoundOverrides {
    /// No overrides
    pub fn none() -> Self {
        Self::default()
    }

    /// Override the fade-out duration
    pub fn fade_out(mut self, seconds: f32) -> Self {
        self.fade_out = Some(seconds);
        self
    }

    /// Override the fade-in duration
    pub fn fade_in(mut self, seconds: f32) -> Self {
        self.fade_in = Some(seconds);
        self
    }

    /// Override the gain
    pub fn gain(mut self, gain: f32) -> Self {
        self.gain = Some(gain);
        self
    }

    /// Override the playback rate
    pub fn rate(mut self, rate: f32) -> Self {
        self.rate = Some(rate);
        self
    }
}
