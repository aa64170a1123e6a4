//! Slot events
//!
//! Defines the events the slot system sends and receives.

use bevy::prelude::*;

use super::targeting::SessionId;
use crate::abilities::capability::{AbilityEffect, AbilityTarget, TargetingKind};

/// Sent by the host when a targeting session has a result.
///
/// Delivered to whichever of `owner`'s slots currently owns `session`;
/// unknown or stale sessions are ignored.
#[derive(Event, Clone, Copy, Debug, PartialEq)]
pub struct TargetResolved {
    pub owner: Entity,
    pub session: SessionId,
    pub target: AbilityTarget,
}

/// An effect emitted by an ability, for the game to resolve
#[derive(Event, Clone, Debug, PartialEq)]
pub struct AbilityEffectEvent {
    /// Entity owning the slot that ran the ability
    pub owner: Option<Entity>,
    /// Slot that ran the ability
    pub slot: usize,
    pub effect: AbilityEffect,
}

/// Something notable happened to a slot
#[derive(Event, Clone, Debug, PartialEq)]
pub struct SlotEvent {
    pub owner: Option<Entity>,
    pub slot: usize,
    pub kind: SlotEventKind,
}

/// What happened to the slot
#[derive(Clone, Debug, PartialEq)]
pub enum SlotEventKind {
    /// A new ability was dealt into the slot
    Drawn { ability: String },
    /// The deck had nothing to deal
    DrawFailed { reason: String },
    /// The held ability started running
    Activated { ability: String },
    /// Activation is parked until a target arrives
    TargetRequested {
        session: SessionId,
        targeting: TargetingKind,
    },
    /// A targeting session was resolved and handed to the ability
    TargetAccepted { session: SessionId },
    /// The held ability (if any) was discarded for the shuffle cooldown
    Shuffled { discarded: Option<String> },
    /// A running ability finished by itself
    Concluded,
    /// The slot's cooldown reached zero
    CooldownEnded,
}
