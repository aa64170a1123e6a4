//! Slot timing configuration

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::constants::{COOLDOWN_TIME, HOLD_TO_SHUFFLE_TIME, NUM_SLOTS, SHUFFLE_COOLDOWN_TIME};

/// Tunable slot timings, stored in `settings.ron`.
#[derive(Resource, Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SlotTuning {
    /// Number of slots per owner (fixed once the set is built)
    #[serde(default = "default_slot_count")]
    pub slot_count: usize,
    /// Cooldown after use in seconds
    #[serde(default = "default_cooldown_time")]
    pub cooldown_time: f64,
    /// Cooldown after a shuffle in seconds
    #[serde(default = "default_shuffle_cooldown_time")]
    pub shuffle_cooldown_time: f64,
    /// Hold duration that turns a press into a shuffle
    #[serde(default = "default_hold_to_shuffle_time")]
    pub hold_to_shuffle_time: f64,
}

fn default_slot_count() -> usize {
    NUM_SLOTS
}

fn default_cooldown_time() -> f64 {
    COOLDOWN_TIME
}

fn default_shuffle_cooldown_time() -> f64 {
    SHUFFLE_COOLDOWN_TIME
}

fn default_hold_to_shuffle_time() -> f64 {
    HOLD_TO_SHUFFLE_TIME
}

impl Default for SlotTuning {
    fn default() -> Self {
        Self {
            slot_count: NUM_SLOTS,
            cooldown_time: COOLDOWN_TIME,
            shuffle_cooldown_time: SHUFFLE_COOLDOWN_TIME,
            hold_to_shuffle_time: HOLD_TO_SHUFFLE_TIME,
        }
    }
}

impl SlotTuning {
    /// Cooldowns must be positive so progress can be computed from them
    pub fn validate(&self) -> Result<(), String> {
        if self.slot_count == 0 {
            return Err("slot_count must be at least 1".to_string());
        }
        if !(self.cooldown_time > 0.0) {
            return Err(format!("cooldown_time must be positive, got {}", self.cooldown_time));
        }
        if !(self.shuffle_cooldown_time > 0.0) {
            return Err(format!(
                "shuffle_cooldown_time must be positive, got {}",
                self.shuffle_cooldown_time
            ));
        }
        if !(self.hold_to_shuffle_time >= 0.0) {
            return Err(format!(
                "hold_to_shuffle_time must not be negative, got {}",
                self.hold_to_shuffle_time
            ));
        }
        Ok(())
    }
}
