//! Ability slots
//!
//! Implements the slot mechanics:
//! - Slot state machine (Idle / AwaitingTarget / Active) and its two cooldowns
//! - Slot sets with tap-to-activate and hold-to-shuffle input
//! - Targeting sessions with stale-resolution protection
//! - Refilling empty slots from the weighted deck
//! - Slot event logging

use bevy::prelude::*;

pub mod components;
pub mod constants;
pub mod events;
pub mod input;
pub mod log;
pub mod slot;
pub mod slot_set;
pub mod systems;
pub mod targeting;
pub mod tuning;

pub use components::{
    spawn_player, AbilitySlots, CommandsTargeting, GameRng, GridPosition, PlayerControlled,
    SimulationSpeed, TargetingMarker,
};
pub use events::{AbilityEffectEvent, SlotEvent, SlotEventKind, TargetResolved};
pub use input::{SlotButtons, SlotInputState};
pub use log::{SlotLog, SlotLogEntry, SlotLogEventType};
pub use slot::{AbilitySlot, SlotState, SlotTick};
pub use slot_set::{AbilitySlotSet, SlotEnv};
pub use systems::SlotSystemPhase;
pub use targeting::{SessionId, SessionShape, TargetingHost};
pub use tuning::SlotTuning;

use crate::abilities::deck::GridBounds;

/// Plugin for the slot simulation.
///
/// Needs an [`AbilityDeck`](crate::abilities::deck::AbilityDeck) resource
/// (see [`DeckConfigPlugin`](crate::abilities::deck_config::DeckConfigPlugin)).
/// Input is left to the caller: add [`input::read_keyboard_input`] in
/// [`SlotSystemPhase::Input`] for keyboard play.
pub struct SlotsPlugin;

impl Plugin for SlotsPlugin {
    fn build(&self, app: &mut App) {
        app
            // Slot events
            .add_event::<TargetResolved>()
            .add_event::<AbilityEffectEvent>()
            .add_event::<SlotEvent>()
            // Resources
            .init_resource::<SlotLog>()
            .init_resource::<SlotInputState>()
            .init_resource::<SimulationSpeed>()
            .init_resource::<GameRng>()
            .init_resource::<GridBounds>()
            .init_resource::<SlotTuning>();

        systems::configure_slot_system_ordering(app);
        systems::add_core_slot_systems(app);
    }
}
