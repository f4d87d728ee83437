//! State-Change Diffs
//!
//! A [`StateChanges`] carries only what changed in the sculpture state since
//! the previous notification. Every field is optional; absent means
//! "unchanged". The JSON shape mirrors the game logic's change events.

use crate::AudioError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

/// Game modes of the sculpture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Game {
    /// Idle "alone" mode waiting for a handshake
    Handshake,
    /// Whack-a-mole panel game
    Mole,
    /// Rotating disk game
    Disk,
    /// Simon-says pattern game
    Simon,
    /// Any mode this layer does not react to
    #[serde(other)]
    Other,
}

/// Sculpture status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Accepting input
    Ready,
    /// Not accepting input (animations, transitions)
    Locked,
    /// Player succeeded
    Success,
    /// Player failed
    Failure,
    /// Any status this layer does not react to
    #[serde(other)]
    Other,
}

/// Tracked state of a mole-game panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelState {
    /// Not a target
    Off,
    /// Current target
    On,
    /// Target already hit
    Ignored,
    /// Any state this layer does not react to
    #[serde(other)]
    Other,
}

/// Panel address, written `"strip,panel"` in change events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PanelKey {
    /// Strip index
    pub strip: usize,
    /// Panel index within the strip
    pub panel: usize,
}

impl PanelKey {
    /// Address a panel
    pub fn new(strip: usize, panel: usize) -> Self {
        PanelKey { strip, panel }
    }
}

impl fmt::Display for PanelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.strip, self.panel)
    }
}

impl FromStr for PanelKey {
    type Err = AudioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AudioError::Other(format!("Invalid panel key '{}'", s));
        let (strip, panel) = s.split_once(',').ok_or_else(invalid)?;
        Ok(PanelKey {
            strip: strip.trim().parse().map_err(|_| invalid())?,
            panel: panel.trim().parse().map_err(|_| invalid())?,
        })
    }
}

impl TryFrom<String> for PanelKey {
    type Error = AudioError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PanelKey> for String {
    fn from(key: PanelKey) -> String {
        key.to_string()
    }
}

/// Changed attributes of one light panel
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PanelChange {
    /// Panel touched (`true`) or released (`false`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    /// New light intensity (0-100)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intensity: Option<u8>,
}

/// Changed panels of one light strip
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StripChange {
    /// Changes keyed by panel index
    #[serde(default)]
    pub panels: BTreeMap<usize, PanelChange>,
}

/// Changes to the mole game's tracked panels
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MoleChanges {
    /// New panel states keyed by panel address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub panels: Option<HashMap<PanelKey, PanelState>>,
}

/// Diff of the sculpture state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StateChanges {
    /// New game mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_game: Option<Game>,
    /// Handshake flags keyed by sculpture username
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handshakes: Option<HashMap<String, bool>>,
    /// New status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    /// Light changes keyed by strip index
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lights: Option<BTreeMap<usize, StripChange>>,
    /// Mole game changes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mole: Option<MoleChanges>,
}

impl StateChanges {
    /// Parse a JSON change event
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// True when nothing changed
    pub fn is_empty(&self) -> bool {
        self.current_game.is_none()
            && self.handshakes.is_none()
            && self.status.is_none()
            && self.lights.is_none()
            && self.mole.is_none()
    }

    /// Changed mole panels, if the diff carries any
    pub fn mole_panels(&self) -> Option<&HashMap<PanelKey, PanelState>> {
        self.mole.as_ref().and_then(|m| m.panels.as_ref())
    }

    /// Iterate over every changed panel as `(strip, panel, change)`
    pub fn panel_changes(&self) -> impl Iterator<Item = (usize, usize, &PanelChange)> {
        self.lights.iter().flat_map(|strips| {
            strips.iter().flat_map(|(&strip, change)| {
                change
                    .panels
                    .iter()
                    .map(move |(&panel, panel_change)| (strip, panel, panel_change))
            })
        })
    }
}

/// A change diff scheduled at an absolute time, one line of an event script
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimedChanges {
    /// Seconds since the start of the script
    #[serde(default)]
    pub at: f64,
    /// The diff to dispatch
    pub changes: StateChanges,
}

/// Parse a JSON-lines event script
///
/// Blank lines and lines starting with `#` are skipped. Times must not go
/// backwards.
pub fn parse_event_script(text: &str) -> crate::Result<Vec<TimedChanges>> {
    let mut events: Vec<TimedChanges> = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let event: TimedChanges = serde_json::from_str(line).map_err(|e| {
            AudioError::Other(format!("Event script line {}: {}", index + 1, e))
        })?;
        if let Some(previous) = events.last() {
            if event.at < previous.at {
                return Err(AudioError::Other(format!(
                    "Event script line {}: time {} is before {}",
                    index + 1,
                    event.at,
                    previous.at
                )));
            }
        }
        events.push(event);
    }
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_event() {
        let changes = StateChanges::from_json(
            r#"{
                "currentGame": "mole",
                "status": "success",
                "handshakes": {"sculpture1": true},
                "lights": {"0": {"panels": {"3": {"active": true}, "4": {"intensity": 100}}}},
                "mole": {"panels": {"0,3": "ignored"}}
            }"#,
        )
        .unwrap();

        assert_eq!(changes.current_game, Some(Game::Mole));
        assert_eq!(changes.status, Some(Status::Success));
        assert_eq!(changes.handshakes.as_ref().unwrap()["sculpture1"], true);
        assert_eq!(
            changes.mole_panels().unwrap()[&PanelKey::new(0, 3)],
            PanelState::Ignored
        );

        let panels: Vec<_> = changes.panel_changes().collect();
        assert_eq!(panels.len(), 2);
        assert_eq!(panels[0].0, 0);
        assert_eq!(panels[0].1, 3);
        assert_eq!(panels[0].2.active, Some(true));
        assert_eq!(panels[1].2.intensity, Some(100));
    }

    #[test]
    fn test_unknown_status_maps_to_other() {
        let changes = StateChanges::from_json(r#"{"status": "timeout"}"#).unwrap();
        assert_eq!(changes.status, Some(Status::Other));
    }

    #[test]
    fn test_unknown_game_keeps_rest_of_diff() {
        let changes = StateChanges::from_json(
            r#"{"currentGame": "init", "handshakes": {"sculpture0": true}, "mole": {"panels": {"1,1": "blinking"}}}"#,
        )
        .unwrap();
        assert_eq!(changes.current_game, Some(Game::Other));
        assert_eq!(changes.handshakes.as_ref().unwrap()["sculpture0"], true);
        assert_eq!(
            changes.mole_panels().unwrap()[&PanelKey::new(1, 1)],
            PanelState::Other
        );
    }

    #[test]
    fn test_empty_event() {
        let changes = StateChanges::from_json("{}").unwrap();
        assert!(changes.is_empty());
        assert_eq!(changes.panel_changes().count(), 0);
    }

    #[test]
    fn test_panel_key_round_trip() {
        let key: PanelKey = "2, 9".parse().unwrap();
        assert_eq!(key, PanelKey::new(2, 9));
        assert_eq!(key.to_string(), "2,9");
        assert!("2".parse::<PanelKey>().is_err());
        assert!("a,b".parse::<PanelKey>().is_err());
    }

    #[test]
    fn test_serialize_skips_unchanged() {
        let changes = StateChanges {
            current_game: Some(Game::Simon),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_string(&changes).unwrap(),
            r#"{"currentGame":"simon"}"#
        );
    }

    #[test]
    fn test_parse_event_script() {
        let script = r#"
            # enter handshake mode
            {"at": 0.5, "changes": {"currentGame": "handshake"}}

            {"at": 2.0, "changes": {"handshakes": {"sculpture0": true}}}
        "#;
        let events = parse_event_script(script).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].at, 0.5);
        assert_eq!(events[0].changes.current_game, Some(Game::Handshake));
    }

    #[test]
    fn test_event_script_rejects_time_travel() {
        let script = "{\"at\": 2.0, \"changes\": {}}\n{\"at\": 1.0, \"changes\": {}}";
        let err = parse_event_script(script).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
