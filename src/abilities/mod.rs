//! Abilities
//!
//! The ability side of the slot system:
//! - The capability contract every ability implements
//! - The weighted deck slots are refilled from
//! - The built-in catalogue and its RON configuration

pub mod capability;
pub mod catalogue;
pub mod deck;
pub mod deck_config;

pub use capability::{AbilityCapability, AbilityContext, AbilityEffect, AbilityTarget, TargetingKind};
pub use catalogue::{AbilityKind, CatalogueEntry};
pub use deck::{AbilityDeck, AbilityFactory, DeckError, DrawContext, GridBounds};
pub use deck_config::{load_deck, ConfigError, DeckConfig, DeckConfigPlugin};
