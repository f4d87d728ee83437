//! Sample Clock
//!
//! Tracks rendered frames for sample-accurate scheduling. All scheduled
//! times in the engine are absolute seconds on this clock.

/// Audio clock driven by rendered frames
#[derive(Debug, Clone, Copy)]
pub struct AudioClock {
    /// Frames rendered since creation (or last reset)
    frame: u64,
    /// Output sample rate in Hz
    sample_rate: u32,
}

impl AudioClock {
    /// Create a new clock at frame zero
    pub fn new(sample_rate: u32) -> Self {
        AudioClock {
            frame: 0,
            sample_rate,
        }
    }

    /// Advance the clock by `frames`
    pub fn advance(&mut self, frames: u64) {
        self.frame += frames;
    }

    /// Current frame position
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Current time in seconds
    pub fn current_time(&self) -> f64 {
        self.time_of(self.frame)
    }

    /// Absolute time in seconds of a given frame
    #[inline]
    pub fn time_of(&self, frame: u64) -> f64 {
        frame as f64 / self.sample_rate as f64
    }

    /// Absolute frame for a time in seconds (negative times clamp to zero)
    pub fn frame_at(&self, seconds: f64) -> u64 {
        (seconds.max(0.0) * self.sample_rate as f64).round() as u64
    }

    /// Number of frames spanned by a duration in seconds
    pub fn frames_for(&self, seconds: f64) -> u64 {
        self.frame_at(seconds)
    }

    /// Reset to frame zero
    pub fn reset(&mut self) {
        self.frame = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_advances() {
        let mut clock = AudioClock::new(48_000);
        assert_eq!(clock.frame(), 0);

        clock.advance(24_000);
        assert_eq!(clock.frame(), 24_000);
        assert!((clock.current_time() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_frame_at_clamps_negative() {
        let clock = AudioClock::new(44_100);
        assert_eq!(clock.frame_at(-1.0), 0);
        assert_eq!(clock.frames_for(1.0), 44_100);
    }

    #[test]
    fn test_reset() {
        let mut clock = AudioClock::new(44_100);
        clock.advance(100);
        clock.reset();
        assert_eq!(clock.frame(), 0);
    }
}
