//! Sculpture Audio
//!
//! Event-reactive sound layer for an interactive light sculpture. Loads a fixed
//! set of WAV assets, exposes play/stop/fade primitives on top of a small
//! sample-accurate mixing engine, and maps game-state changes (panel touches,
//! game transitions, status updates) to sound triggers.
//!
//! # Features
//! - Sample-accurate [`AudioContext`] with scheduled gain automation
//! - Looping, rate and loop-frequency control per sound
//! - Linear fade-in/fade-out envelopes
//! - LFO-modulated resonant low-pass filter ([`VcfSound`])
//! - Change-driven dispatch ([`AudioView`]) over a [`StateChanges`] diff
//! - Offline WAV rendering and optional real-time output
//!
//! # Crate feature flags
//! - `streaming` (opt-in): Real-time audio output (enables optional `rodio` dep)
//!
//! # Quick start
//! ```no_run
//! use sculpture_audio::{AudioConfig, AudioContext, AudioView, FsLoader, SculptureSnapshot, StateChanges};
//!
//! let config = AudioConfig::default();
//! let ctx = AudioContext::new(44_100, 2).unwrap();
//! let mut view = AudioView::new(ctx.clone(), config.clone());
//! view.load(&FsLoader::new(&config.sounds_root)).unwrap();
//!
//! let mut store = SculptureSnapshot::default();
//! let changes: StateChanges = serde_json::from_str(r#"{"currentGame":"handshake"}"#).unwrap();
//! store.apply(&changes);
//! view.handle_changes(&store, &changes);
//!
//! let mut block = vec![0.0f32; 1024];
//! ctx.render(&mut block);
//! ```

#![warn(missing_docs)]

pub mod asset; // Asset fetching and WAV decoding
pub mod catalog; // Fixed sound asset tree
pub mod config; // Configuration
pub mod engine; // Mixing engine (clock, params, voices, filter)
pub mod export; // Offline WAV rendering
pub mod game; // Game-state model and change diffs
pub mod sound; // Sound and VcfSound primitives
#[cfg(feature = "streaming")]
pub mod streaming; // Real-time audio output
pub mod view; // Change-driven sound dispatch

/// Error types for audio layer operations
#[derive(thiserror::Error, Debug)]
pub enum AudioError {
    /// Asset could not be fetched
    #[error("Failed to load '{url}': {reason}")]
    Load {
        /// Asset url as requested
        url: String,
        /// Underlying failure
        reason: String,
    },

    /// Error while decoding audio data
    #[error("Decode error: {0}")]
    Decode(String),

    /// Sound was triggered before its buffer was loaded
    #[error("Sound '{0}' is not loaded")]
    NotLoaded(String),

    /// Sound definition is invalid
    #[error("Invalid sound: {0}")]
    InvalidSound(String),

    /// Audio device error
    #[error("Audio device error: {0}")]
    AudioDeviceError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// IO error from filesystem or device
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<String> for AudioError {
    /// Converts a String into `AudioError::Other`.
    ///
    /// Prefer the specific variants (`Decode`, `ConfigError`, ...) where the
    /// failure has a known category.
    fn from(msg: String) -> Self {
        AudioError::Other(msg)
    }
}

impl From<&str> for AudioError {
    fn from(msg: &str) -> Self {
        AudioError::Other(msg.to_string())
    }
}

/// Result type for audio layer operations
pub type Result<T> = std::result::Result<T, AudioError>;

// Public API exports
pub use asset::{decode_wav, AssetLoader, FsLoader, MemoryLoader, SoundBuffer};
pub use catalog::SoundCatalog;
pub use config::{AudioConfig, StreamConfig};
pub use engine::{AudioContext, GainId, VcfSettings, VoiceId, VoiceSpec};
pub use export::{render_into, render_to_wav, write_wav};
pub use game::{
    parse_event_script, Game, GameState, MoleChanges, PanelChange, PanelKey, PanelState,
    SculptureSnapshot, StateChanges, Status, StripChange, TimedChanges,
};
pub use sound::{Sound, SoundOverrides, SoundParams, VcfSound};
#[cfg(feature = "streaming")]
pub use streaming::AudioDevice;
pub use view::AudioView;
