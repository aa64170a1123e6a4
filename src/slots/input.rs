//! Per-frame slot input
//!
//! Slots only see two booleans per frame: whether their key is down and
//! whether it was released this frame. The keyboard system fills them from
//! [`Keybindings`]; the headless runner fills them from its script.

use bevy::prelude::*;

use crate::keybindings::{GameAction, Keybindings};

/// State of one slot's key for the current frame
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SlotButtons {
    /// Key is down
    pub held: bool,
    /// Key went up this frame
    pub released: bool,
}

/// Input for the player-controlled slot set, one entry per slot
#[derive(Resource, Clone, Debug, Default)]
pub struct SlotInputState {
    pub buttons: Vec<SlotButtons>,
}

impl SlotInputState {
    /// Buttons for `slot`, released/up if nothing was recorded
    pub fn get(&self, slot: usize) -> SlotButtons {
        self.buttons.get(slot).copied().unwrap_or_default()
    }

    /// Overwrite the buttons for `slot`, growing the table as needed
    pub fn set(&mut self, slot: usize, buttons: SlotButtons) {
        if self.buttons.len() <= slot {
            self.buttons.resize(slot + 1, SlotButtons::default());
        }
        self.buttons[slot] = buttons;
    }

    pub fn clear(&mut self) {
        self.buttons.clear();
    }
}

/// Read the ability keys into [`SlotInputState`]
pub fn read_keyboard_input(
    keyboard: Res<ButtonInput<KeyCode>>,
    keybindings: Res<Keybindings>,
    mut input: ResMut<SlotInputState>,
) {
    input.clear();
    let mut slot = 0;
    while let Some(action) = GameAction::ability(slot) {
        input.set(
            slot,
            SlotButtons {
                held: keybindings.action_pressed(action, &keyboard),
                released: keybindings.action_just_released(action, &keyboard),
            },
        );
        slot += 1;
    }
}
