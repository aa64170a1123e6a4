//! Keybinding system for remappable controls
//!
//! Every ability slot is driven by one action (`Ability1` .. `Ability5`);
//! the rest control simulation speed. Bindings are saved with the settings.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::slots::constants::NUM_SLOTS;

/// All possible actions that can be bound to keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameAction {
    // Ability slots
    Ability1,
    Ability2,
    Ability3,
    Ability4,
    Ability5,

    // Simulation
    PausePlay,
    SpeedSlow,
    SpeedNormal,
    SpeedFast,
    SpeedVeryFast,
}

impl GameAction {
    /// Action driving the given slot, if there is one
    pub fn ability(slot_index: usize) -> Option<GameAction> {
        match slot_index {
            0 => Some(GameAction::Ability1),
            1 => Some(GameAction::Ability2),
            2 => Some(GameAction::Ability3),
            3 => Some(GameAction::Ability4),
            4 => Some(GameAction::Ability5),
            _ => None,
        }
    }
}

/// Keys that can be stored in the settings file: (key, stored name, display name)
const KNOWN_KEYS: &[(KeyCode, &str, &str)] = &[
    (KeyCode::Escape, "Escape", "ESC"),
    (KeyCode::Enter, "Enter", "ENTER"),
    (KeyCode::Space, "Space", "SPACE"),
    (KeyCode::Tab, "Tab", "TAB"),
    (KeyCode::KeyQ, "KeyQ", "Q"),
    (KeyCode::KeyW, "KeyW", "W"),
    (KeyCode::KeyE, "KeyE", "E"),
    (KeyCode::KeyR, "KeyR", "R"),
    (KeyCode::KeyT, "KeyT", "T"),
    (KeyCode::KeyA, "KeyA", "A"),
    (KeyCode::KeyS, "KeyS", "S"),
    (KeyCode::KeyD, "KeyD", "D"),
    (KeyCode::KeyF, "KeyF", "F"),
    (KeyCode::KeyG, "KeyG", "G"),
    (KeyCode::KeyZ, "KeyZ", "Z"),
    (KeyCode::KeyX, "KeyX", "X"),
    (KeyCode::KeyC, "KeyC", "C"),
    (KeyCode::KeyV, "KeyV", "V"),
    (KeyCode::Digit1, "Digit1", "1"),
    (KeyCode::Digit2, "Digit2", "2"),
    (KeyCode::Digit3, "Digit3", "3"),
    (KeyCode::Digit4, "Digit4", "4"),
    (KeyCode::Digit5, "Digit5", "5"),
    (KeyCode::Digit6, "Digit6", "6"),
    (KeyCode::Digit7, "Digit7", "7"),
    (KeyCode::Digit8, "Digit8", "8"),
    (KeyCode::Digit9, "Digit9", "9"),
    (KeyCode::Digit0, "Digit0", "0"),
    (KeyCode::F1, "F1", "F1"),
    (KeyCode::F2, "F2", "F2"),
    (KeyCode::F3, "F3", "F3"),
    (KeyCode::F4, "F4", "F4"),
    (KeyCode::F5, "F5", "F5"),
    (KeyCode::Minus, "Minus", "-"),
    (KeyCode::Equal, "Equal", "="),
    (KeyCode::Numpad1, "Numpad1", "NUM1"),
    (KeyCode::Numpad2, "Numpad2", "NUM2"),
    (KeyCode::Numpad3, "Numpad3", "NUM3"),
    (KeyCode::Numpad4, "Numpad4", "NUM4"),
    (KeyCode::Numpad5, "Numpad5", "NUM5"),
];

/// Serializable wrapper for KeyCode (stores as string)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct SerializableKeyCode(String);

impl From<KeyCode> for SerializableKeyCode {
    fn from(key: KeyCode) -> Self {
        Self(format!("{:?}", key))
    }
}

impl TryFrom<SerializableKeyCode> for KeyCode {
    type Error = String;

    fn try_from(sk: SerializableKeyCode) -> Result<Self, Self::Error> {
        KNOWN_KEYS
            .iter()
            .find(|(_, stored, _)| *stored == sk.0)
            .map(|(key, _, _)| *key)
            .ok_or_else(|| format!("unsupported key '{}'", sk.0))
    }
}

/// Key binding with primary and optional secondary key
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KeyBinding {
    #[serde(with = "keycode_serde")]
    pub primary: KeyCode,
    #[serde(with = "option_keycode_serde", default)]
    pub secondary: Option<KeyCode>,
}

mod keycode_serde {
    use super::*;
    use serde::{de::Error, Deserializer, Serializer};

    pub fn serialize<S>(key: &KeyCode, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let sk: SerializableKeyCode = (*key).into();
        sk.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<KeyCode, D::Error>
    where
        D: Deserializer<'de>,
    {
        let sk = SerializableKeyCode::deserialize(deserializer)?;
        KeyCode::try_from(sk).map_err(D::Error::custom)
    }
}

mod option_keycode_serde {
    use super::*;
    use serde::{de::Error, Deserializer, Serializer};

    pub fn serialize<S>(key: &Option<KeyCode>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match key {
            Some(k) => {
                let sk: SerializableKeyCode = (*k).into();
                serializer.serialize_some(&sk)
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<KeyCode>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let opt_sk: Option<SerializableKeyCode> = Option::deserialize(deserializer)?;
        opt_sk
            .map(|sk| KeyCode::try_from(sk).map_err(D::Error::custom))
            .transpose()
    }
}

impl KeyBinding {
    pub fn new(primary: KeyCode) -> Self {
        Self {
            primary,
            secondary: None,
        }
    }

    pub fn with_secondary(primary: KeyCode, secondary: KeyCode) -> Self {
        Self {
            primary,
            secondary: Some(secondary),
        }
    }

    fn keys(&self) -> impl Iterator<Item = KeyCode> {
        std::iter::once(self.primary).chain(self.secondary)
    }
}

/// Complete keybindings configuration
#[derive(Debug, Clone, Resource, Serialize, Deserialize)]
pub struct Keybindings {
    bindings: HashMap<GameAction, KeyBinding>,
}

impl Default for Keybindings {
    fn default() -> Self {
        Self::create_defaults()
    }
}

impl Keybindings {
    /// Create default keybindings
    pub fn create_defaults() -> Self {
        let mut bindings = HashMap::new();

        // Ability slots on the number row, numpad as a fallback
        bindings.insert(GameAction::Ability1, KeyBinding::with_secondary(KeyCode::Digit1, KeyCode::Numpad1));
        bindings.insert(GameAction::Ability2, KeyBinding::with_secondary(KeyCode::Digit2, KeyCode::Numpad2));
        bindings.insert(GameAction::Ability3, KeyBinding::with_secondary(KeyCode::Digit3, KeyCode::Numpad3));
        bindings.insert(GameAction::Ability4, KeyBinding::with_secondary(KeyCode::Digit4, KeyCode::Numpad4));
        bindings.insert(GameAction::Ability5, KeyBinding::with_secondary(KeyCode::Digit5, KeyCode::Numpad5));

        // Simulation
        bindings.insert(GameAction::PausePlay, KeyBinding::new(KeyCode::Space));
        bindings.insert(GameAction::SpeedSlow, KeyBinding::new(KeyCode::F1));
        bindings.insert(GameAction::SpeedNormal, KeyBinding::new(KeyCode::F2));
        bindings.insert(GameAction::SpeedFast, KeyBinding::new(KeyCode::F3));
        bindings.insert(GameAction::SpeedVeryFast, KeyBinding::new(KeyCode::F4));

        Self { bindings }
    }

    /// Get the binding for an action
    pub fn get(&self, action: GameAction) -> Option<&KeyBinding> {
        self.bindings.get(&action)
    }

    /// Check if an action is currently pressed
    pub fn action_pressed(&self, action: GameAction, keyboard: &ButtonInput<KeyCode>) -> bool {
        self.get(action)
            .is_some_and(|binding| binding.keys().any(|key| keyboard.pressed(key)))
    }

    /// Check if an action was just pressed this frame
    pub fn action_just_pressed(&self, action: GameAction, keyboard: &ButtonInput<KeyCode>) -> bool {
        self.get(action)
            .is_some_and(|binding| binding.keys().any(|key| keyboard.just_pressed(key)))
    }

    /// Check if an action was released this frame and no other key for it is still down
    pub fn action_just_released(&self, action: GameAction, keyboard: &ButtonInput<KeyCode>) -> bool {
        self.get(action).is_some_and(|binding| {
            binding.keys().any(|key| keyboard.just_released(key))
                && !binding.keys().any(|key| keyboard.pressed(key))
        })
    }

    /// Get a human-readable string for a key
    pub fn key_name(key: KeyCode) -> &'static str {
        KNOWN_KEYS
            .iter()
            .find(|(known, _, _)| *known == key)
            .map_or("???", |(_, _, display)| *display)
    }

    /// Get display string for a binding
    pub fn binding_display(&self, action: GameAction) -> String {
        match self.get(action) {
            Some(binding) => match binding.secondary {
                Some(secondary) => format!(
                    "{} / {}",
                    Self::key_name(binding.primary),
                    Self::key_name(secondary)
                ),
                None => Self::key_name(binding.primary).to_string(),
            },
            None => "Unbound".to_string(),
        }
    }
}
