//! Buffer-Source Voices
//!
//! A voice plays one decoded buffer through a gain node, optionally looping
//! and optionally through a VCF chain.

use super::filter::{VcfChain, VcfSettings};
use super::GainId;
use crate::asset::SoundBuffer;
use std::sync::Arc;

/// Handle to a started voice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VoiceId(pub(crate) u64);

/// Everything needed to start a voice
#[derive(Debug, Clone)]
pub struct VoiceSpec {
    /// Sound name, for diagnostics
    pub name: Arc<str>,
    /// Decoded sample data
    pub buffer: Arc<SoundBuffer>,
    /// Gain node the voice is routed through
    pub gain: GainId,
    /// Playback rate multiplier
    pub rate: f32,
    /// Loop until stopped
    pub looping: bool,
    /// Loop end in seconds (0 = whole buffer)
    pub loop_end: f64,
    /// Optional modulated low-pass filter
    pub vcf: Option<VcfSettings>,
}

impl VoiceSpec {
    /// One-shot voice at unity rate
    pub fn new(name: impl Into<Arc<str>>, buffer: Arc<SoundBuffer>, gain: GainId) -> Self {
        VoiceSpec {
            name: name.into(),
            buffer,
            gain,
            rate: 1.0,
            looping: false,
            loop_end: 0.0,
            vcf: None,
        }
    }
}

/// A playing voice
#[derive(Debug)]
pub(crate) struct Voice {
    pub(crate) id: VoiceId,
    pub(crate) name: Arc<str>,
    pub(crate) gain: GainId,
    buffer: Arc<SoundBuffer>,
    /// Read position in buffer frames
    position: f64,
    /// Buffer frames advanced per output frame
    step: f64,
    looping: bool,
    /// Exclusive loop end in buffer frames
    loop_end: f64,
    /// Output frame at which the voice goes silent for good
    pub(crate) stop_at: Option<u64>,
    vcf: Option<VcfChain>,
    finished: bool,
}

impl Voice {
    pub(crate) fn new(id: VoiceId, spec: VoiceSpec, sample_rate: u32, channels: u16) -> Self {
        let frames = spec.buffer.frames() as f64;
        let step = spec.rate as f64 * spec.buffer.sample_rate() as f64
            / sample_rate as f64;
        let loop_end = if spec.loop_end > 0.0 {
            (spec.loop_end * spec.buffer.sample_rate() as f64).min(frames)
        } else {
            frames
        };
        Voice {
            id,
            name: spec.name,
            gain: spec.gain,
            buffer: spec.buffer,
            position: 0.0,
            step,
            looping: spec.looping,
            loop_end,
            stop_at: None,
            vcf: spec
                .vcf
                .map(|settings| VcfChain::new(settings, sample_rate, channels)),
            finished: frames == 0.0,
        }
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.finished
    }

    /// Schedule the stop frame; an earlier stop always wins
    pub(crate) fn stop_at(&mut self, frame: u64) {
        self.stop_at = Some(self.stop_at.map_or(frame, |f| f.min(frame)));
    }

    /// Render the voice's next frame into `out` (overwritten, not mixed)
    ///
    /// Returns false once the voice has finished; `out` is then left silent.
    pub(crate) fn next_frame(&mut self, frame: u64, out: &mut [f32]) -> bool {
        out.fill(0.0);
        if self.finished {
            return false;
        }
        if self.stop_at.is_some_and(|stop| frame >= stop) {
            self.finished = true;
            return false;
        }
        if self.position >= self.loop_end {
            if self.looping && self.loop_end > 0.0 {
                self.position %= self.loop_end;
            } else if self.position >= self.buffer.frames() as f64 {
                self.finished = true;
                return false;
            }
        }

        let index = self.position.floor() as usize;
        let frac = (self.position - index as f64) as f32;
        let wrap = if self.looping {
            self.loop_end as usize
        } else {
            self.buffer.frames()
        };
        let next_index = if index + 1 < wrap {
            index + 1
        } else if self.looping {
            0
        } else {
            index
        };

        let buffer_channels = self.buffer.channels() as usize;
        for (channel, sample) in out.iter_mut().enumerate() {
            let source = channel.min(buffer_channels - 1);
            let a = self.buffer.sample(index, source);
            let b = self.buffer.sample(next_index, source);
            *sample = a + (b - a) * frac;
        }

        if let Some(vcf) = self.vcf.as_mut() {
            vcf.process_frame(out);
        }

        self.position += self.step;
        true
    }
}
