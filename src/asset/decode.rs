//! WAV Decoding
//!
//! Decodes RIFF/WAVE data into interleaved `f32` PCM using `hound`.

use crate::{AudioError, Result};
use std::io::Cursor;
use std::time::Duration;

/// Decoded, interleaved PCM sample data
#[derive(Debug, Clone, PartialEq)]
pub struct SoundBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
}

impl SoundBuffer {
    /// Wrap interleaved samples
    ///
    /// The sample count must be a multiple of the channel count.
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Result<Self> {
        if channels == 0 {
            return Err(AudioError::Decode("Buffer has zero channels".into()));
        }
        if sample_rate == 0 {
            return Err(AudioError::Decode("Buffer has zero sample rate".into()));
        }
        if samples.len() % channels as usize != 0 {
            return Err(AudioError::Decode(format!(
                "Sample count {} is not a multiple of {} channels",
                samples.len(),
                channels
            )));
        }
        Ok(SoundBuffer {
            samples,
            sample_rate,
            channels,
        })
    }

    /// Number of frames
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Channel count
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Playback duration at unity rate
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.frames() as f64 / self.sample_rate as f64)
    }

    /// Sample at `frame` on `channel` (silence when out of range)
    #[inline]
    pub fn sample(&self, frame: usize, channel: usize) -> f32 {
        self.samples
            .get(frame * self.channels as usize + channel)
            .copied()
            .unwrap_or(0.0)
    }

    /// Interleaved samples
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }
}

/// Decode a WAV file held in memory
pub fn decode_wav(bytes: &[u8]) -> Result<SoundBuffer> {
    if bytes.is_empty() {
        return Err(AudioError::Decode("Buffer error: empty input".into()));
    }

    let mut reader = hound::WavReader::new(Cursor::new(bytes))
        .map_err(|e| AudioError::Decode(format!("Invalid WAV data: {}", e)))?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| AudioError::Decode(format!("Failed to read samples: {}", e)))?,
        hound::SampleFormat::Int => {
            if spec.bits_per_sample == 0 || spec.bits_per_sample > 32 {
                return Err(AudioError::Decode(format!(
                    "Unsupported bit depth: {}",
                    spec.bits_per_sample
                )));
            }
            let scale = 1.0 / (1u64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<std::result::Result<_, _>>()
                .map_err(|e| AudioError::Decode(format!("Failed to read samples: {}", e)))?
        }
    };

    SoundBuffer::new(samples, spec.sample_rate, spec.channels)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    /// Encode 16-bit PCM samples as an in-memory WAV file
    pub(crate) fn wav_bytes(samples: &[f32], sample_rate: u32, channels: u16) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for &sample in samples {
                writer
                    .write_sample((sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
                    .unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn test_decode_pcm16() {
        let bytes = wav_bytes(&[0.0, 0.5, -0.5, 1.0], 22_050, 1);
        let buffer = decode_wav(&bytes).unwrap();

        assert_eq!(buffer.frames(), 4);
        assert_eq!(buffer.sample_rate(), 22_050);
        assert_eq!(buffer.channels(), 1);
        assert_abs_diff_eq!(buffer.sample(1, 0), 0.5, epsilon = 1e-3);
        assert_abs_diff_eq!(buffer.sample(2, 0), -0.5, epsilon = 1e-3);
    }

    #[test]
    fn test_decode_stereo_frames() {
        let bytes = wav_bytes(&[0.1, 0.2, 0.3, 0.4], 44_100, 2);
        let buffer = decode_wav(&bytes).unwrap();

        assert_eq!(buffer.frames(), 2);
        assert_abs_diff_eq!(buffer.sample(1, 1), 0.4, epsilon = 1e-3);
        assert_eq!(buffer.sample(5, 0), 0.0);
    }

    #[test]
    fn test_decode_float() {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            writer.write_sample(0.25f32).unwrap();
            writer.finalize().unwrap();
        }
        let buffer = decode_wav(cursor.get_ref()).unwrap();
        assert_eq!(buffer.sample(0, 0), 0.25);
    }

    #[test]
    fn test_decode_empty_is_error() {
        assert!(matches!(decode_wav(&[]), Err(AudioError::Decode(_))));
    }

    #[test]
    fn test_decode_garbage_is_error() {
        assert!(decode_wav(b"definitely not a wav file").is_err());
    }

    #[test]
    fn test_duration() {
        let buffer = SoundBuffer::new(vec![0.0; 44_100], 44_100, 1).unwrap();
        assert_eq!(buffer.duration(), Duration::from_secs(1));
    }

    #[test]
    fn test_rejects_ragged_samples() {
        assert!(SoundBuffer::new(vec![0.0; 3], 44_100, 2).is_err());
    }
}
