//! AbilitySlots - ability slot sandbox
//!
//! A fixed set of ability slots per entity, refilled from a weighted deck.
//! Slots cool down after use, shuffle on a long press, and park targeted
//! abilities in targeting sessions until the host supplies a target.
//!
//! This library exposes the core modules for testing and reuse.

pub mod abilities;
pub mod cli;
pub mod headless;
pub mod keybindings;
pub mod settings;
pub mod slots;
pub mod ui;

// Re-export commonly used types
pub use abilities::{AbilityCapability, AbilityDeck, AbilityEffect, AbilityTarget, TargetingKind};
pub use headless::HeadlessRunConfig;
pub use slots::{AbilitySlot, AbilitySlotSet, SlotLog, SlotLogEventType, SlotState, SlotsPlugin};
