//! JSON configuration parsing for headless mode
//!
//! A headless run is a scripted sequence of key presses against one player's
//! slots. Targeting sessions are answered automatically.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::slots::tuning::SlotTuning;

/// One scripted key press
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptedPress {
    /// Time the key goes down, in seconds since the run started
    pub at: f32,
    /// Slot index (0-based)
    pub slot: usize,
    /// How long the key stays down. 0 is a one-frame tap.
    #[serde(default)]
    pub hold_secs: f32,
}

/// Headless run configuration loaded from JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadlessRunConfig {
    /// Slot timings (default: built-in timings)
    #[serde(default)]
    pub slots: SlotTuning,
    /// Deck file to load (default: assets/config/deck.ron)
    #[serde(default)]
    pub deck_path: Option<String>,
    /// Custom output path for the run summary (optional)
    #[serde(default)]
    pub output_path: Option<String>,
    /// Run duration in seconds (default: 30)
    #[serde(default = "default_max_duration")]
    pub max_duration_secs: f32,
    /// Random seed for deterministic deck draws
    #[serde(default)]
    pub random_seed: Option<u64>,
    /// Player start cell (default: grid centre)
    #[serde(default)]
    pub start_position: Option<[i32; 2]>,
    /// Answer for spatial sessions: the aim for Line and Cone, the grid
    /// point for Area. Unit sessions get the training dummy.
    #[serde(default = "default_target_point")]
    pub target_point: [f32; 2],
    /// Answer targeting sessions automatically (default: true)
    #[serde(default = "default_auto_resolve")]
    pub auto_resolve: bool,
    /// Key presses, in any order
    #[serde(default)]
    pub script: Vec<ScriptedPress>,
}

fn default_max_duration() -> f32 {
    30.0
}

fn default_target_point() -> [f32; 2] {
    [6.0, 4.0]
}

fn default_auto_resolve() -> bool {
    true
}

impl Default for HeadlessRunConfig {
    fn default() -> Self {
        Self {
            slots: SlotTuning::default(),
            deck_path: None,
            output_path: None,
            max_duration_secs: default_max_duration(),
            random_seed: None,
            start_position: None,
            target_point: default_target_point(),
            auto_resolve: default_auto_resolve(),
            script: Vec::new(),
        }
    }
}

impl HeadlessRunConfig {
    /// Load configuration from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, String> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        Self::from_json(&contents)
    }

    /// Parse and validate configuration from a JSON string
    pub fn from_json(contents: &str) -> Result<Self, String> {
        let config: HeadlessRunConfig = serde_json::from_str(contents)
            .map_err(|e| format!("Failed to parse JSON: {}", e))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        self.slots.validate()?;

        if !(self.max_duration_secs > 0.0) {
            return Err("max_duration_secs must be positive".to_string());
        }

        for (i, press) in self.script.iter().enumerate() {
            if press.slot >= self.slots.slot_count {
                return Err(format!(
                    "script[{}]: slot {} is out of range ({} slots)",
                    i, press.slot, self.slots.slot_count
                ));
            }
            if !(press.at >= 0.0) || !(press.hold_secs >= 0.0) {
                return Err(format!("script[{}]: times must not be negative", i));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = HeadlessRunConfig::from_json("{}").unwrap();
        assert_eq!(config.max_duration_secs, 30.0);
        assert!(config.auto_resolve);
        assert_eq!(config.slots, SlotTuning::default());
        assert!(config.script.is_empty());
    }

    #[test]
    fn test_script_slot_out_of_range() {
        let json = r#"{ "script": [ { "at": 1.0, "slot": 5 } ] }"#;
        let err = HeadlessRunConfig::from_json(json).unwrap_err();
        assert!(err.contains("out of range"), "{}", err);
    }

    #[test]
    fn test_bad_slot_timings_rejected() {
        let json = r#"{ "slots": { "shuffle_cooldown_time": 0.0 } }"#;
        assert!(HeadlessRunConfig::from_json(json).is_err());
    }
}
