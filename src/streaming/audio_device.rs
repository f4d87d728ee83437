//! Audio device integration using rodio
//!
//! Plays the audio context on the system output device. The rodio mixer
//! thread pulls blocks from the context, which advances its clock in real
//! time.

use crate::config::StreamConfig;
use crate::engine::AudioContext;
use crate::Result;
use rodio::{OutputStream, Sink, Source};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Audio source that renders blocks from the context
struct ContextSource {
    ctx: AudioContext,
    sample_rate: u32,
    channels: u16,
    finished: Arc<AtomicBool>,
    /// Internal block buffer (one lock acquisition per block)
    buffer: Vec<f32>,
    /// Current position in the internal buffer
    buffer_pos: usize,
}

impl ContextSource {
    fn new(ctx: AudioContext, block_frames: usize, finished: Arc<AtomicBool>) -> Self {
        let sample_rate = ctx.sample_rate();
        let channels = ctx.channels();
        let len = block_frames.max(1) * channels as usize;
        ContextSource {
            ctx,
            sample_rate,
            channels,
            finished,
            buffer: vec![0.0f32; len],
            buffer_pos: len, // Start by rendering a new block
        }
    }
}

impl Source for ContextSource {
    fn current_frame_len(&self) -> Option<usize> {
        let remaining = self.buffer.len().saturating_sub(self.buffer_pos);
        if remaining > 0 {
            Some(remaining)
        } else {
            Some(self.buffer.len())
        }
    }

    fn channels(&self) -> u16 {
        self.channels
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        // Runs until finished
        None
    }
}

impl Iterator for ContextSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.finished.load(Ordering::Relaxed) {
            return None;
        }

        if self.buffer_pos >= self.buffer.len() {
            self.ctx.render(&mut self.buffer);
            self.buffer_pos = 0;
        }

        let sample = self.buffer[self.buffer_pos];
        self.buffer_pos += 1;
        Some(sample.clamp(-1.0, 1.0))
    }
}

/// Audio playback device using rodio
pub struct AudioDevice {
    _stream: OutputStream,
    sink: Sink,
    finished: Arc<AtomicBool>,
}

impl AudioDevice {
    /// Open the default output device and start pulling from `ctx`
    pub fn new(ctx: AudioContext, config: &StreamConfig) -> Result<Self> {
        let (stream, stream_handle) = OutputStream::try_default().map_err(|e| {
            crate::AudioError::AudioDeviceError(format!("Failed to create audio stream: {}", e))
        })?;

        let sink = Sink::try_new(&stream_handle).map_err(|e| {
            crate::AudioError::AudioDeviceError(format!("Failed to create audio sink: {}", e))
        })?;

        let finished = Arc::new(AtomicBool::new(false));
        let source = ContextSource::new(ctx, config.block_frames, Arc::clone(&finished));
        sink.append(source);

        Ok(AudioDevice {
            _stream: stream,
            sink,
            finished,
        })
    }

    /// Pause playback (the context clock stops too)
    pub fn pause(&self) {
        self.sink.pause();
    }

    /// Resume playback
    pub fn play(&self) {
        self.sink.play();
    }

    /// Whether the device is pulling from the context (not paused or finished)
    pub fn is_running(&self) -> bool {
        !self.sink.is_paused() && !self.finished.load(Ordering::Relaxed)
    }

    /// Stop pulling from the context; the stream ends after the current block
    pub fn finish(&self) {
        self.finished.store(true, Ordering::Relaxed);
    }

    /// Block until the sink is drained (only returns after [`finish`](Self::finish))
    pub fn wait_for_finish(&self) {
        self.sink.sleep_until_end();
    }
}

impl Drop for AudioDevice {
    fn drop(&mut self) {
        self.finish();
        self.pause();
    }
}
