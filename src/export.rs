//! WAV Export
//!
//! Offline rendering of the audio context to a 16-bit PCM WAV file.

use crate::engine::AudioContext;
use crate::Result;
use std::path::Path;

/// Render `seconds` of audio from `ctx` and append it to `samples`
///
/// Rendering happens in blocks of `block_frames` so the context lock is
/// released between blocks.
pub fn render_into(ctx: &AudioContext, seconds: f64, block_frames: usize, samples: &mut Vec<f32>) {
    let channels = ctx.channels() as usize;
    let total_frames = (seconds.max(0.0) * ctx.sample_rate() as f64).round() as usize;
    let block_frames = block_frames.max(1);

    let mut remaining = total_frames;
    let mut block = vec![0.0f32; block_frames * channels];
    while remaining > 0 {
        let frames = remaining.min(block_frames);
        let block = &mut block[..frames * channels];
        ctx.render(block);
        samples.extend_from_slice(block);
        remaining -= frames;
    }
}

/// Render `seconds` of audio and write it to a WAV file
pub fn render_to_wav(ctx: &AudioContext, seconds: f64, path: impl AsRef<Path>) -> Result<()> {
    let mut samples = Vec::new();
    render_into(ctx, seconds, 4096, &mut samples);
    write_wav(path.as_ref(), &samples, ctx.sample_rate(), ctx.channels())
}

/// Write interleaved samples to a 16-bit PCM WAV file
pub fn write_wav(
    path: impl AsRef<Path>,
    samples: &[f32],
    sample_rate: u32,
    channels: u16,
) -> Result<()> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path.as_ref(), spec)
        .map_err(|e| format!("Failed to create WAV file: {}", e))?;

    // Convert f32 samples to i16
    for &sample in samples {
        let sample_i16 = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer
            .write_sample(sample_i16)
            .map_err(|e| format!("Failed to write sample: {}", e))?;
    }

    writer
        .finalize()
        .map_err(|e| format!("Failed to finalize WAV file: {}", e))?;

    Ok(())
}
