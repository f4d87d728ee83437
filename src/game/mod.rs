//! Game State Model
//!
//! Change diffs emitted by the sculpture game logic and the state queries the
//! audio dispatch needs.

pub mod changes;
pub mod state;

pub use changes::{
    parse_event_script, Game, MoleChanges, PanelChange, PanelKey, PanelState, StateChanges,
    Status, StripChange, TimedChanges,
};
pub use state::{GameState, SculptureSnapshot};

/// Light strips on the sculpture
pub const STRIP_COUNT: usize = 3;

/// Panels per light strip
pub const PANELS_PER_STRIP: usize = 10;

/// Intensity above which a lit panel triggers its tone
pub const PANEL_TONE_INTENSITY: u8 = 90;
