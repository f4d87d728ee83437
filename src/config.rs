//! Configuration
//!
//! Runtime settings for the audio layer, loadable from a JSON file. Every
//! field has a default, so a partial file (or `{}`) is valid.

use crate::{AudioError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Output stream settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Number of interleaved output channels
    pub channels: u16,

    /// Frames rendered per block pulled from the engine
    /// Larger blocks = more latency but fewer lock acquisitions
    pub block_frames: usize,
}

impl StreamConfig {
    /// Stream configuration optimized for low latency
    /// Block = 512 frames ≈ 12ms @ 44.1kHz
    pub fn low_latency(sample_rate: u32) -> Self {
        StreamConfig {
            sample_rate,
            channels: 2,
            block_frames: 512,
        }
    }

    /// Stream configuration optimized for stability
    /// Block = 4096 frames ≈ 93ms @ 44.1kHz
    pub fn stable(sample_rate: u32) -> Self {
        StreamConfig {
            sample_rate,
            channels: 2,
            block_frames: 4096,
        }
    }

    /// Block latency in milliseconds
    pub fn latency_ms(&self) -> f32 {
        (self.block_frames as f32 / self.sample_rate as f32) * 1000.0
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self::low_latency(44_100)
    }
}

/// Audio layer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Name of this sculpture; handshakes addressed to it trigger sounds
    pub username: String,

    /// Directory the sound urls are resolved against
    pub sounds_root: PathBuf,

    /// Gain applied to the final mix
    pub master_gain: f32,

    /// Output stream settings
    pub stream: StreamConfig,
}

impl AudioConfig {
    /// Read a JSON configuration file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            AudioError::ConfigError(format!("Failed to read '{}': {}", path.display(), e))
        })?;
        let config: AudioConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.stream.sample_rate == 0 {
            return Err(AudioError::ConfigError("sample_rate must be > 0".into()));
        }
        if self.stream.channels == 0 {
            return Err(AudioError::ConfigError("channels must be > 0".into()));
        }
        if self.stream.block_frames == 0 {
            return Err(AudioError::ConfigError("block_frames must be > 0".into()));
        }
        if !self.master_gain.is_finite() || self.master_gain < 0.0 {
            return Err(AudioError::ConfigError(format!(
                "master_gain must be a non-negative number, got {}",
                self.master_gain
            )));
        }
        Ok(())
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        AudioConfig {
            username: "sculpture0".to_string(),
            sounds_root: PathBuf::from("."),
            master_gain: 1.0,
            stream: StreamConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_stream_config_latency() {
        let config = StreamConfig::stable(44_100);
        let latency = config.latency_ms();
        assert!(latency > 90.0 && latency < 95.0);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"username": "sculpture2", "stream": {{"sample_rate": 48000}}}}"#
        )
        .unwrap();

        let config = AudioConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.username, "sculpture2");
        assert_eq!(config.stream.sample_rate, 48_000);
        assert_eq!(config.stream.channels, 2);
        assert_eq!(config.master_gain, 1.0);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"stream": {{"channels": 0}}}}"#).unwrap();
        assert!(matches!(
            AudioConfig::from_json_file(file.path()),
            Err(AudioError::ConfigError(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(AudioConfig::from_json_file("/nonexistent/audio.json").is_err());
    }

    #[test]
    fn test_malformed_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(matches!(
            AudioConfig::from_json_file(file.path()),
            Err(AudioError::Json(_))
        ));
    }
}
