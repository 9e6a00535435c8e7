//! Commanded panel and group state
//!
//! The store remembers the last colour, brightness and on/off flag this
//! process asked for, per panel and per group. Because every custom
//! animation written to the device is a full snapshot, a single-panel update
//! reads every other panel's entry here to avoid switching them off.
//!
//! Unknown keys read as on / 255 / white; only [`StateStore::set`] inserts.
//! Each read or write takes the lock for a single map operation. Two
//! concurrent updates to different panels may each snapshot a stale view of
//! the other; the last write wins per field.

use std::collections::HashMap;
use std::fmt;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::color::Rgb;
use crate::panel::PanelId;

/// Identity of the device session that owns a state entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a state entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Target {
    Panel(PanelId),
    Group(usize),
}

/// Composite key: session + panel or session + group index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateKey {
    pub session: SessionId,
    pub target: Target,
}

impl StateKey {
    pub fn panel(session: &SessionId, id: PanelId) -> Self {
        Self {
            session: session.clone(),
            target: Target::Panel(id),
        }
    }

    pub fn group(session: &SessionId, index: usize) -> Self {
        Self {
            session: session.clone(),
            target: Target::Group(index),
        }
    }
}

/// Last commanded values for one panel or group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandedState {
    pub is_on: bool,
    pub brightness: u8,
    pub rgb_color: Rgb,
}

impl Default for CommandedState {
    fn default() -> Self {
        Self {
            is_on: true,
            brightness: 255,
            rgb_color: Rgb::WHITE,
        }
    }
}

impl CommandedState {
    /// Colour the device should show: brightness-scaled, black when off.
    pub fn visible_color(&self) -> Rgb {
        if self.is_on {
            self.rgb_color.scaled(self.brightness)
        } else {
            Rgb::BLACK
        }
    }
}

/// Partial update; `None` fields keep their current value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatePatch {
    pub is_on: Option<bool>,
    pub brightness: Option<u8>,
    pub rgb_color: Option<Rgb>,
}

impl StatePatch {
    pub fn on() -> Self {
        Self {
            is_on: Some(true),
            ..Self::default()
        }
    }

    pub fn off() -> Self {
        Self {
            is_on: Some(false),
            ..Self::default()
        }
    }

    pub fn with_brightness(mut self, brightness: Option<u8>) -> Self {
        if brightness.is_some() {
            self.brightness = brightness;
        }
        self
    }

    pub fn with_color(mut self, rgb: Option<Rgb>) -> Self {
        if rgb.is_some() {
            self.rgb_color = rgb;
        }
        self
    }

    pub fn apply(&self, state: &mut CommandedState) {
        if let Some(is_on) = self.is_on {
            state.is_on = is_on;
        }
        if let Some(brightness) = self.brightness {
            state.brightness = brightness;
        }
        if let Some(rgb) = self.rgb_color {
            state.rgb_color = rgb;
        }
    }
}

/// Keyed store of commanded state.
#[derive(Debug, Default)]
pub struct StateStore {
    entries: RwLock<HashMap<StateKey, CommandedState>>,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state for `key`, or the default when never set.
    pub fn get(&self, key: &StateKey) -> CommandedState {
        self.entries.read().get(key).copied().unwrap_or_default()
    }

    /// Applies `patch` on top of the current state and returns the result.
    pub fn set(&self, key: StateKey, patch: &StatePatch) -> CommandedState {
        let mut entries = self.entries.write();
        let state = entries.entry(key).or_default();
        patch.apply(state);
        *state
    }

    pub fn contains(&self, key: &StateKey) -> bool {
        self.entries.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_key_reads_default_without_inserting() {
        let store = StateStore::new();
        let key = StateKey::panel(&SessionId::new("a"), 7);

        assert_eq!(store.get(&key), CommandedState::default());
        assert!(!store.contains(&key));
        assert!(store.is_empty());
    }

    #[test]
    fn test_partial_update_keeps_other_fields() {
        let store = StateStore::new();
        let key = StateKey::group(&SessionId::new("a"), 0);

        store.set(key.clone(), &StatePatch::on().with_color(Some(Rgb::new(255, 0, 0))));
        let state = store.set(key.clone(), &StatePatch::default().with_brightness(Some(10)));

        assert!(state.is_on);
        assert_eq!(state.brightness, 10);
        assert_eq!(state.rgb_color, Rgb::new(255, 0, 0));
        assert_eq!(store.get(&key), state);
    }

    #[test]
    fn test_sessions_do_not_share_entries() {
        let store = StateStore::new();
        let a = StateKey::panel(&SessionId::new("a"), 1);
        let b = StateKey::panel(&SessionId::new("b"), 1);

        store.set(a.clone(), &StatePatch::off());
        assert!(!store.get(&a).is_on);
        assert!(store.get(&b).is_on);
    }

    #[test]
    fn test_panel_and_group_keys_are_distinct() {
        let session = SessionId::new("a");
        let store = StateStore::new();
        store.set(StateKey::panel(&session, 0), &StatePatch::off());
        assert!(store.get(&StateKey::group(&session, 0)).is_on);
    }

    #[test]
    fn test_off_state_is_black_regardless_of_color() {
        let state = CommandedState {
            is_on: false,
            brightness: 255,
            rgb_color: Rgb::new(10, 20, 30),
        };
        assert_eq!(state.visible_color(), Rgb::BLACK);
    }

    #[test]
    fn test_visible_color_applies_brightness() {
        let state = CommandedState {
            is_on: true,
            brightness: 128,
            rgb_color: Rgb::new(255, 0, 100),
        };
        assert_eq!(state.visible_color(), Rgb::new(128, 0, 50));
    }
}
