//! Slot logging
//!
//! Records every slot event with the simulation time it happened at, for the
//! slot bar tooltip and the headless summary.

use bevy::prelude::*;
use serde::Serialize;

use super::events::{SlotEvent, SlotEventKind};

/// A single entry in the slot log
#[derive(Debug, Clone, Serialize)]
pub struct SlotLogEntry {
    /// Simulation time in seconds
    pub timestamp: f32,
    /// Slot the entry is about
    pub slot: usize,
    pub event_type: SlotLogEventType,
    /// Human-readable description of the event
    pub message: String,
}

/// Types of slot log events for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SlotLogEventType {
    Drawn,
    DrawFailed,
    Activated,
    Targeting,
    Shuffled,
    Concluded,
    CooldownEnded,
}

/// The slot log resource
#[derive(Resource, Default, Debug, Serialize)]
pub struct SlotLog {
    /// All log entries in chronological order
    pub entries: Vec<SlotLogEntry>,
    /// Current simulation time
    pub elapsed: f32,
}

impl SlotLog {
    pub fn clear(&mut self) {
        self.entries.clear();
        self.elapsed = 0.0;
    }

    pub fn log(&mut self, slot: usize, event_type: SlotLogEventType, message: String) {
        self.entries.push(SlotLogEntry {
            timestamp: self.elapsed,
            slot,
            event_type,
            message,
        });
    }

    /// Record a slot event using its standard wording
    pub fn record(&mut self, event: &SlotEvent) {
        let slot = event.slot;
        let label = slot + 1;
        let (event_type, message) = match &event.kind {
            SlotEventKind::Drawn { ability } => {
                (SlotLogEventType::Drawn, format!("Slot {} drew {}", label, ability))
            }
            SlotEventKind::DrawFailed { reason } => (
                SlotLogEventType::DrawFailed,
                format!("Slot {} could not draw: {}", label, reason),
            ),
            SlotEventKind::Activated { ability } => (
                SlotLogEventType::Activated,
                format!("Slot {} activated {}", label, ability),
            ),
            SlotEventKind::TargetRequested { session, targeting } => (
                SlotLogEventType::Targeting,
                format!(
                    "Slot {} awaiting {} target (session {})",
                    label,
                    targeting.as_str(),
                    session.0
                ),
            ),
            SlotEventKind::TargetAccepted { session } => (
                SlotLogEventType::Targeting,
                format!("Slot {} target accepted (session {})", label, session.0),
            ),
            SlotEventKind::Shuffled { discarded } => (
                SlotLogEventType::Shuffled,
                match discarded {
                    Some(ability) => format!("Slot {} shuffled away {}", label, ability),
                    None => format!("Slot {} shuffled while empty", label),
                },
            ),
            SlotEventKind::Concluded => (
                SlotLogEventType::Concluded,
                format!("Slot {} ability concluded", label),
            ),
            SlotEventKind::CooldownEnded => (
                SlotLogEventType::CooldownEnded,
                format!("Slot {} cooldown ended", label),
            ),
        };
        self.log(slot, event_type, message);
    }

    /// Get entries filtered by event type
    pub fn filter_by_type(&self, event_type: SlotLogEventType) -> Vec<&SlotLogEntry> {
        self.entries
            .iter()
            .filter(|e| e.event_type == event_type)
            .collect()
    }

    /// Get entries for one slot
    pub fn for_slot(&self, slot: usize) -> Vec<&SlotLogEntry> {
        self.entries.iter().filter(|e| e.slot == slot).collect()
    }

    /// Get the last N entries
    pub fn recent(&self, count: usize) -> Vec<&SlotLogEntry> {
        self.entries.iter().rev().take(count).rev().collect()
    }
}
