//! Sound Assets
//!
//! Fetching raw asset bytes (from disk or memory) and decoding them into
//! playable buffers.

pub mod decode;
pub mod loader;

pub use decode::{decode_wav, SoundBuffer};
pub use loader::{AssetLoader, FsLoader, MemoryLoader};

use crate::Result;

/// Fetch and decode a WAV asset
pub fn load_buffer(loader: &dyn AssetLoader, url: &str) -> Result<SoundBuffer> {
    let bytes = loader.fetch(url)?;
    decode_wav(&bytes)
}
