//! Voltage-Controlled Filter
//!
//! Resonant low-pass biquad whose cutoff is swept by a sine LFO.

use std::f32::consts::PI;

/// Frames between cutoff coefficient updates
const CONTROL_INTERVAL: u32 = 32;

/// Lowest cutoff the LFO may sweep down to
const MIN_CUTOFF_HZ: f32 = 20.0;

/// Filter and LFO settings for a modulated voice
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VcfSettings {
    /// Centre cutoff frequency in Hz
    pub cutoff_hz: f32,
    /// Resonance in dB
    pub resonance_db: f32,
    /// LFO rate in Hz
    pub lfo_freq: f32,
    /// LFO sweep depth in Hz added to the cutoff
    pub lfo_depth_hz: f32,
}

impl VcfSettings {
    /// Default cutoff frequency
    pub const DEFAULT_CUTOFF_HZ: f32 = 2200.0;
    /// Default resonance
    pub const DEFAULT_RESONANCE_DB: f32 = 2.0;
    /// Default LFO rate
    pub const DEFAULT_LFO_FREQ: f32 = 0.333;
    /// Default LFO depth
    pub const DEFAULT_LFO_DEPTH_HZ: f32 = 2000.0;

    /// Default settings with a custom LFO rate
    pub fn with_lfo_freq(lfo_freq: f32) -> Self {
        VcfSettings {
            lfo_freq,
            ..Self::default()
        }
    }
}

impl Default for VcfSettings {
    fn default() -> Self {
        VcfSettings {
            cutoff_hz: Self::DEFAULT_CUTOFF_HZ,
            resonance_db: Self::DEFAULT_RESONANCE_DB,
            lfo_freq: Self::DEFAULT_LFO_FREQ,
            lfo_depth_hz: Self::DEFAULT_LFO_DEPTH_HZ,
        }
    }
}

/// RBJ low-pass biquad (direct form I)
#[derive(Debug, Clone, Copy)]
pub struct BiquadLowpass {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl BiquadLowpass {
    /// Create a pass-through filter; call [`set_lowpass`](Self::set_lowpass) to configure
    pub fn new() -> Self {
        BiquadLowpass {
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    /// Configure as low-pass at `cutoff` Hz with resonance in dB
    pub fn set_lowpass(&mut self, cutoff: f32, resonance_db: f32, sample_rate: f32) {
        let nyquist = sample_rate * 0.5;
        let cutoff = cutoff.clamp(MIN_CUTOFF_HZ, (nyquist * 0.99).max(MIN_CUTOFF_HZ));
        let q = 10f32.powf(resonance_db / 20.0);

        let w0 = 2.0 * PI * (cutoff / sample_rate);
        let (sin_w0, cos_w0) = w0.sin_cos();
        let alpha = sin_w0 / (2.0 * q.max(0.1));
        let b0 = (1.0 - cos_w0) * 0.5;
        let b1 = 1.0 - cos_w0;
        let b2 = (1.0 - cos_w0) * 0.5;
        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cos_w0;
        let a2 = 1.0 - alpha;
        self.b0 = b0 / a0;
        self.b1 = b1 / a0;
        self.b2 = b2 / a0;
        self.a1 = a1 / a0;
        self.a2 = a2 / a0;
    }

    /// Filter one sample
    #[inline]
    pub fn process(&mut self, x: f32) -> f32 {
        let y = self.b0 * x + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = x;
        self.y2 = self.y1;
        self.y1 = y;
        y
    }
}

impl Default for BiquadLowpass {
    fn default() -> Self {
        Self::new()
    }
}

/// Sine low-frequency oscillator
#[derive(Debug, Clone, Copy)]
pub struct Lfo {
    phase: f32,
    phase_inc: f32,
}

impl Lfo {
    /// Create an LFO at `freq` Hz advanced once per frame
    pub fn new(freq: f32, sample_rate: f32) -> Self {
        Lfo {
            phase: 0.0,
            phase_inc: 2.0 * PI * freq.max(0.0) / sample_rate,
        }
    }

    /// Current output in [-1, 1]
    #[inline]
    pub fn value(&self) -> f32 {
        self.phase.sin()
    }

    /// Advance by `frames`
    #[inline]
    pub fn advance(&mut self, frames: u32) {
        self.phase += self.phase_inc * frames as f32;
        if self.phase > 2.0 * PI {
            self.phase %= 2.0 * PI;
        }
    }
}

/// Per-voice filter chain: one biquad per output channel sharing an LFO
#[derive(Debug, Clone)]
pub struct VcfChain {
    settings: VcfSettings,
    sample_rate: f32,
    lfo: Lfo,
    filters: Vec<BiquadLowpass>,
    countdown: u32,
}

impl VcfChain {
    /// Build a fresh chain for `channels` output channels
    pub fn new(settings: VcfSettings, sample_rate: u32, channels: u16) -> Self {
        let sample_rate = sample_rate as f32;
        VcfChain {
            settings,
            sample_rate,
            lfo: Lfo::new(settings.lfo_freq, sample_rate),
            filters: vec![BiquadLowpass::new(); channels.max(1) as usize],
            countdown: 0,
        }
    }

    /// Filter one interleaved frame in place
    pub fn process_frame(&mut self, frame: &mut [f32]) {
        if self.countdown == 0 {
            let cutoff = self.settings.cutoff_hz + self.settings.lfo_depth_hz * self.lfo.value();
            for filter in &mut self.filters {
                filter.set_lowpass(cutoff, self.settings.resonance_db, self.sample_rate);
            }
            self.lfo.advance(CONTROL_INTERVAL);
            self.countdown = CONTROL_INTERVAL;
        }
        self.countdown -= 1;

        for (sample, filter) in frame.iter_mut().zip(self.filters.iter_mut()) {
            *sample = filter.process(*sample);
        }
    }

    /// Settings this chain was built from
    pub fn settings(&self) -> &VcfSettings {
        &self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rms(samples: &[f32]) -> f32 {
        (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
    }

    fn sine(freq: f32, sample_rate: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|n| (2.0 * PI * freq * n as f32 / sample_rate).sin())
            .collect()
    }

    #[test]
    fn test_lowpass_passes_low_frequencies() {
        let mut filter = BiquadLowpass::new();
        filter.set_lowpass(2200.0, 0.0, 44_100.0);
        let input = sine(100.0, 44_100.0, 8192);
        let output: Vec<f32> = input.iter().map(|&x| filter.process(x)).collect();

        let ratio = rms(&output[4096..]) / rms(&input[4096..]);
        assert!(ratio > 0.9, "100Hz should pass, ratio = {}", ratio);
    }

    #[test]
    fn test_lowpass_attenuates_high_frequencies() {
        let mut filter = BiquadLowpass::new();
        filter.set_lowpass(500.0, 0.0, 44_100.0);
        let input = sine(10_000.0, 44_100.0, 8192);
        let output: Vec<f32> = input.iter().map(|&x| filter.process(x)).collect();

        let ratio = rms(&output[4096..]) / rms(&input[4096..]);
        assert!(ratio < 0.05, "10kHz should be cut, ratio = {}", ratio);
    }

    #[test]
    fn test_lfo_range() {
        let mut lfo = Lfo::new(5.0, 1000.0);
        for _ in 0..1000 {
            let v = lfo.value();
            assert!((-1.0..=1.0).contains(&v));
            lfo.advance(1);
        }
    }

    #[test]
    fn test_chain_stays_finite() {
        let mut chain = VcfChain::new(VcfSettings::default(), 44_100, 2);
        let mut peak = 0.0f32;
        for n in 0..44_100 {
            let x = if n % 100 < 50 { 1.0 } else { -1.0 };
            let mut frame = [x, x];
            chain.process_frame(&mut frame);
            assert!(frame.iter().all(|s| s.is_finite()));
            peak = peak.max(frame[0].abs());
        }
        assert!(peak > 0.0 && peak < 4.0, "peak = {}", peak);
    }

    #[test]
    fn test_default_settings() {
        let settings = VcfSettings::with_lfo_freq(1.0);
        assert_eq!(settings.cutoff_hz, 2200.0);
        assert_eq!(settings.resonance_db, 2.0);
        assert_eq!(settings.lfo_depth_hz, 2000.0);
        assert_eq!(settings.lfo_freq, 1.0);
    }
}
