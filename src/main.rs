//! Command-line front end for the sculpture sound layer.
//!
//! Renders scripted change events offline, triggers single sounds, lists the
//! sound catalog and, with the `streaming` feature, plays change events read
//! from stdin on the default output device.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

use sculpture_audio::{
    parse_event_script, render_into, write_wav, AudioConfig, AudioContext, AudioView, FsLoader,
    SculptureSnapshot, SoundCatalog,
};

/// Frames rendered per lock acquisition when rendering offline
const RENDER_BLOCK_FRAMES: usize = 4096;

#[derive(Parser)]
#[command(name = "sculpture-audio")]
#[command(about = "Event-reactive sound layer for an interactive light sculpture")]
struct Args {
    /// Configuration file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory the sound urls are resolved against
    #[arg(short, long, global = true)]
    sounds: Option<PathBuf>,

    /// Sculpture username handshakes are matched against
    #[arg(short, long, global = true)]
    username: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a JSON-lines event script to a WAV file
    Render {
        /// Event script, one `{"at": seconds, "changes": {...}}` per line
        #[arg(short, long)]
        events: PathBuf,

        /// Output WAV file
        #[arg(short, long)]
        output: PathBuf,

        /// Seconds rendered after the last event
        #[arg(long, default_value_t = 3.0)]
        tail: f64,
    },

    /// Play one sound by catalog path (e.g. `mole/success`) into a WAV file
    Trigger {
        /// Logical sound path
        path: String,

        /// Seconds to render
        #[arg(long, default_value_t = 5.0)]
        seconds: f64,

        /// Output WAV file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// List every catalog sound with its asset url
    List,

    /// Play change events read from stdin on the output device
    #[cfg(feature = "streaming")]
    Play {
        /// Use larger blocks for glitch-free output on busy machines
        #[arg(long)]
        stable: bool,

        /// Seconds to keep playing after stdin closes
        #[arg(long, default_value_t = 3.0)]
        tail: f64,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = load_config(&args)?;

    match args.command {
        Command::Render {
            events,
            output,
            tail,
        } => render(&config, &events, &output, tail),
        Command::Trigger {
            path,
            seconds,
            output,
        } => trigger(&config, &path, seconds, &output),
        Command::List => list(&config),
        #[cfg(feature = "streaming")]
        Command::Play { stable, tail } => live::play(config, stable, tail),
    }
}

fn load_config(args: &Args) -> Result<AudioConfig> {
    let mut config = match &args.config {
        Some(path) => AudioConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => AudioConfig::default(),
    };
    if let Some(root) = &args.sounds {
        config.sounds_root = root.clone();
    }
    if let Some(username) = &args.username {
        config.username = username.clone();
    }
    config.validate()?;
    Ok(config)
}

fn create_context(config: &AudioConfig) -> Result<AudioContext> {
    let ctx = AudioContext::new(config.stream.sample_rate, config.stream.channels)?;
    ctx.set_master_gain(config.master_gain);
    Ok(ctx)
}

fn load_view(config: &AudioConfig) -> Result<(AudioContext, AudioView)> {
    let ctx = create_context(config)?;
    let mut view = AudioView::new(ctx.clone(), config.clone());
    view.load(&FsLoader::new(&config.sounds_root))
        .with_context(|| format!("Failed to load sounds from {}", config.sounds_root.display()))?;
    Ok((ctx, view))
}

fn render(config: &AudioConfig, events: &Path, output: &Path, tail: f64) -> Result<()> {
    let script = fs::read_to_string(events)
        .with_context(|| format!("Failed to read {}", events.display()))?;
    let events = parse_event_script(&script)?;
    let (ctx, view) = load_view(config)?;

    let mut store = SculptureSnapshot::new();
    let mut samples = Vec::new();
    for event in &events {
        render_into(
            &ctx,
            event.at - ctx.current_time(),
            RENDER_BLOCK_FRAMES,
            &mut samples,
        );
        store.apply(&event.changes);
        view.handle_changes(&store, &event.changes);
    }
    render_into(&ctx, tail, RENDER_BLOCK_FRAMES, &mut samples);

    write_wav(output, &samples, ctx.sample_rate(), ctx.channels())?;
    info!(
        "Rendered {} events ({:.2}s) to {}",
        events.len(),
        ctx.current_time(),
        output.display()
    );
    Ok(())
}

fn trigger(config: &AudioConfig, path: &str, seconds: f64, output: &Path) -> Result<()> {
    let (ctx, view) = load_view(config)?;
    let catalog = view.catalog().context("Sound catalog is not loaded")?;
    catalog.play(path)?;

    let mut samples = Vec::new();
    render_into(&ctx, seconds, RENDER_BLOCK_FRAMES, &mut samples);
    write_wav(output, &samples, ctx.sample_rate(), ctx.channels())?;
    info!("Rendered '{}' ({:.2}s) to {}", path, seconds, output.display());
    Ok(())
}

fn list(config: &AudioConfig) -> Result<()> {
    let ctx = create_context(config)?;
    let catalog = SoundCatalog::new(&ctx)?;
    for (path, sound) in catalog.sounds() {
        println!("{:<24} {}", path, sound.url());
    }
    Ok(())
}

#[cfg(feature = "streaming")]
mod live {
    use super::load_view;
    use anyhow::{Context, Result};
    use log::info;
    use std::io::{self, BufRead};
    use std::thread;
    use std::time::Duration;

    use sculpture_audio::{
        AudioConfig, AudioContext, AudioDevice, SculptureSnapshot, StreamConfig, TimedChanges,
    };

    const POLL_INTERVAL: Duration = Duration::from_millis(5);

    fn wait_until(ctx: &AudioContext, time: f64) {
        while ctx.current_time() < time {
            thread::sleep(POLL_INTERVAL);
        }
    }

    pub fn play(mut config: AudioConfig, stable: bool, tail: f64) -> Result<()> {
        if stable {
            config.stream.block_frames = StreamConfig::stable(config.stream.sample_rate).block_frames;
        }
        let (ctx, view) = load_view(&config)?;
        let device = AudioDevice::new(ctx.clone(), &config.stream)?;
        info!(
            "Streaming at {} Hz, {:.1} ms latency",
            config.stream.sample_rate,
            config.stream.latency_ms()
        );

        let mut store = SculptureSnapshot::new();
        for (index, line) in io::stdin().lock().lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let event: TimedChanges = serde_json::from_str(line)
                .with_context(|| format!("Invalid event on stdin line {}", index + 1))?;
            wait_until(&ctx, event.at);
            store.apply(&event.changes);
            view.handle_changes(&store, &event.changes);
        }

        wait_until(&ctx, ctx.current_time() + tail);
        device.finish();
        device.wait_for_finish();
        Ok(())
    }
}
