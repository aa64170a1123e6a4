//! Slot Constants
//!
//! Default timings and sizes. Everything here can be overridden through
//! [`SlotTuning`](super::tuning::SlotTuning) in `settings.ron`.

// ============================================================================
// Cooldowns
// ============================================================================

/// Cooldown after an ability was used (or concluded) in seconds.
pub const COOLDOWN_TIME: f64 = 2.5;

/// Cooldown after an unused ability was discarded with a shuffle.
/// Shorter than the normal cooldown so discarding is worth it.
pub const SHUFFLE_COOLDOWN_TIME: f64 = 0.5;

// ============================================================================
// Input
// ============================================================================

/// How long a slot key must be held to shuffle instead of activate.
pub const HOLD_TO_SHUFFLE_TIME: f64 = 0.5;

/// Number of slots a player gets.
pub const NUM_SLOTS: usize = 5;

// ============================================================================
// Grid
// ============================================================================

pub const DEFAULT_GRID_COLUMNS: i32 = 8;

pub const DEFAULT_GRID_ROWS: i32 = 8;
