//! Real-time Output
//!
//! Streams the audio context to the system output device.

pub mod audio_device;

pub use audio_device::AudioDevice;
