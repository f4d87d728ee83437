//! Audio View
//!
//! Reacts to sculpture state changes by triggering sounds from the catalog.
//!
//! | Game event                          | Sound                   |
//! |-------------------------------------|-------------------------|
//! | Enter handshake mode                | alone/ambient (loop)    |
//! | Handshake addressed to this sculpture | alone/handshake       |
//! | Mole: panel lit                     | mole/panels/s/p         |
//! | Mole: active panel touched          | mole/success            |
//! | Mole: inactive panel touched        | mole/failure            |
//! | Mole/Simon: status success/failure  | game success/failure    |
//! | Simon: panel lit or touched         | simon/panels/s/p        |

use crate::asset::AssetLoader;
use crate::catalog::SoundCatalog;
use crate::config::AudioConfig;
use crate::engine::AudioContext;
use crate::game::{
    Game, GameState, PanelKey, PanelState, StateChanges, Status, PANEL_TONE_INTENSITY,
};
use crate::sound::Sound;
use crate::Result;
use log::{debug, info, warn};

/// Change-driven sound dispatcher
pub struct AudioView {
    ctx: AudioContext,
    config: AudioConfig,
    catalog: Option<SoundCatalog>,
}

impl AudioView {
    /// Create a view; nothing plays until [`load`](Self::load) succeeds
    pub fn new(ctx: AudioContext, config: AudioConfig) -> Self {
        AudioView {
            ctx,
            config,
            catalog: None,
        }
    }

    /// Build and load the sound catalog
    ///
    /// Changes are only acted upon once every sound has loaded.
    pub fn load(&mut self, loader: &dyn AssetLoader) -> Result<()> {
        let mut catalog = SoundCatalog::new(&self.ctx)?;
        let count = catalog.load_all(loader)?;
        info!("Audio view ready ({} sounds)", count);
        self.catalog = Some(catalog);
        Ok(())
    }

    /// Whether the catalog has loaded
    pub fn is_loaded(&self) -> bool {
        self.catalog.is_some()
    }

    /// Loaded catalog, if any
    pub fn catalog(&self) -> Option<&SoundCatalog> {
        self.catalog.as_ref()
    }

    /// Configuration in use
    pub fn config(&self) -> &AudioConfig {
        &self.config
    }

    /// Silence everything
    pub fn reset(&mut self) {
        self.ctx.stop_all();
    }

    /// Dispatch one change notification
    ///
    /// `store` must already reflect `changes`.
    pub fn handle_changes(&self, store: &dyn GameState, changes: &StateChanges) {
        let Some(catalog) = self.catalog.as_ref() else {
            debug!("Ignoring changes before sounds are loaded");
            return;
        };

        if changes.current_game == Some(Game::Handshake) {
            report(catalog.alone.ambient.play().map(drop), "alone/ambient");
        }

        self.handle_handshake_changes(catalog, changes);
        Self::handle_status_changes(catalog, store, changes);
        Self::handle_light_changes(catalog, store, changes);
    }

    fn handle_handshake_changes(&self, catalog: &SoundCatalog, changes: &StateChanges) {
        let Some(handshakes) = changes.handshakes.as_ref() else {
            return;
        };
        if handshakes.get(&self.config.username).copied() == Some(true) {
            report(catalog.alone.ambient.stop(), "alone/ambient");
            play(&catalog.alone.handshake);
        }
    }

    fn handle_status_changes(catalog: &SoundCatalog, store: &dyn GameState, changes: &StateChanges) {
        let Some(status) = changes.status else {
            return;
        };

        let (success, failure) = if store.is_playing(Game::Mole) {
            (&catalog.mole.success, &catalog.mole.failure)
        } else if store.is_playing(Game::Simon) {
            (&catalog.simon.success, &catalog.simon.failure)
        } else {
            return;
        };

        match status {
            Status::Success => play(success),
            Status::Failure => play(failure),
            _ => {}
        }
    }

    fn handle_light_changes(catalog: &SoundCatalog, store: &dyn GameState, changes: &StateChanges) {
        if changes.lights.is_none() || !store.is_ready() {
            return;
        }

        if store.is_playing(Game::Mole) {
            for (strip, panel, change) in changes.panel_changes() {
                let key = PanelKey::new(strip, panel);
                if change.active == Some(true) {
                    match changes.mole_panels() {
                        // The touch turned the target: success
                        Some(panels) => {
                            if panels.get(&key) == Some(&PanelState::Ignored) {
                                play(&catalog.mole.success);
                            }
                        }
                        None => {
                            let state = store.mole_panel_state(key);
                            if matches!(state, None | Some(PanelState::Off)) {
                                play(&catalog.mole.failure);
                            }
                        }
                    }
                } else if change.intensity.is_some_and(|i| i > PANEL_TONE_INTENSITY) {
                    match catalog.mole_panel(key) {
                        Some(sound) => play(sound),
                        None => warn!("No mole tone for panel {}", key),
                    }
                }
            }
        }

        if store.is_playing(Game::Simon) {
            for (strip, panel, change) in changes.panel_changes() {
                let key = PanelKey::new(strip, panel);
                let lit = change.intensity.is_some_and(|i| i > PANEL_TONE_INTENSITY);
                if change.active == Some(true) || lit {
                    match catalog.simon_panel(key) {
                        Some(sound) => play(sound),
                        None => warn!("No simon tone for panel {}", key),
                    }
                }
            }
        }
    }
}

fn play(sound: &Sound) {
    report(sound.play().map(drop), sound.name());
}

fn report(result: Result<()>, what: &str) {
    if let Err(e) = result {
        warn!("Sound trigger '{}' failed: {}", what, e);
    }
}
