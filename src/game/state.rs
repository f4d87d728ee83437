//! Game State Queries
//!
//! The dispatch logic reads a few facts from the current sculpture state in
//! addition to the change diff. [`GameState`] is that seam;
//! [`SculptureSnapshot`] is an in-memory implementation that folds diffs.

use super::changes::{Game, PanelKey, PanelState, StateChanges, Status};
use std::collections::HashMap;

/// Read access to the current sculpture state
pub trait GameState {
    /// Game mode currently running
    fn current_game(&self) -> Option<Game>;

    /// Current status
    fn status(&self) -> Option<Status>;

    /// Tracked state of a mole-game panel
    fn mole_panel_state(&self, key: PanelKey) -> Option<PanelState>;

    /// Whether the sculpture accepts input
    fn is_ready(&self) -> bool {
        self.status() == Some(Status::Ready)
    }

    /// Whether `game` is the running game
    fn is_playing(&self, game: Game) -> bool {
        self.current_game() == Some(game)
    }
}

/// Sculpture state rebuilt from change diffs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SculptureSnapshot {
    current_game: Option<Game>,
    status: Option<Status>,
    mole_panels: HashMap<PanelKey, PanelState>,
}

impl SculptureSnapshot {
    /// Empty snapshot: no game, no status
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a diff into the snapshot
    ///
    /// Switching games forgets the previous game's tracked panels.
    pub fn apply(&mut self, changes: &StateChanges) {
        if let Some(game) = changes.current_game {
            if self.current_game != Some(game) {
                self.mole_panels.clear();
            }
            self.current_game = Some(game);
        }
        if let Some(status) = changes.status {
            self.status = Some(status);
        }
        if let Some(panels) = changes.mole_panels() {
            self.mole_panels.extend(panels.iter().map(|(k, v)| (*k, *v)));
        }
    }

    /// Set the running game
    pub fn set_current_game(&mut self, game: Option<Game>) {
        self.current_game = game;
    }

    /// Set the status
    pub fn set_status(&mut self, status: Option<Status>) {
        self.status = status;
    }

    /// Set a tracked mole panel state
    pub fn set_mole_panel(&mut self, key: PanelKey, state: PanelState) {
        self.mole_panels.insert(key, state);
    }
}

impl GameState for SculptureSnapshot {
    fn current_game(&self) -> Option<Game> {
        self.current_game
    }

    fn status(&self) -> Option<Status> {
        self.status
    }

    fn mole_panel_state(&self, key: PanelKey) -> Option<PanelState> {
        self.mole_panels.get(&key).copied()
    }
}
