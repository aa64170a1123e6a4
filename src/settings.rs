//! Game settings and configuration
//!
//! Persists slot timings and keybindings to `settings.ron`.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::keybindings::Keybindings;
use crate::slots::tuning::SlotTuning;

/// Default location of the settings file
pub const SETTINGS_PATH: &str = "settings.ron";

/// User-configurable game settings
#[derive(Resource, Clone, Debug, Default, Serialize, Deserialize)]
pub struct GameSettings {
    #[serde(default)]
    pub slots: SlotTuning,
    #[serde(default)]
    pub keybindings: Keybindings,
}

impl GameSettings {
    /// Load settings from the default path
    pub fn load() -> Self {
        Self::load_from(Path::new(SETTINGS_PATH))
    }

    /// Load settings from `path`, or return defaults if the file is missing,
    /// unreadable or holds invalid slot timings
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            info!("No settings file found, using defaults");
            return Self::default();
        }

        let settings: GameSettings = match fs::read_to_string(path) {
            Ok(contents) => match ron::from_str(&contents) {
                Ok(settings) => settings,
                Err(e) => {
                    warn!("Failed to parse settings file: {}", e);
                    return Self::default();
                }
            },
            Err(e) => {
                warn!("Failed to read settings file: {}", e);
                return Self::default();
            }
        };

        if let Err(e) = settings.slots.validate() {
            warn!("Invalid slot settings ({}), using default timings", e);
            return Self {
                slots: SlotTuning::default(),
                ..settings
            };
        }

        info!("Loaded settings from {:?}", path);
        settings
    }

    /// Save settings to the default path
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.save_to(&PathBuf::from(SETTINGS_PATH))
    }

    /// Save settings to `path`
    pub fn save_to(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let contents = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
        fs::write(path, contents)?;
        info!("Saved settings to {:?}", path);
        Ok(())
    }
}

/// Plugin for managing game settings
pub struct SettingsPlugin;

impl Plugin for SettingsPlugin {
    fn build(&self, app: &mut App) {
        let settings = GameSettings::load();

        // Keybindings and slot timings are separate resources for easy access
        app.insert_resource(settings.keybindings.clone())
            .insert_resource(settings.slots)
            .insert_resource(settings)
            .add_systems(Update, (save_settings_on_change, sync_settings_resources));
    }
}

/// System to save settings when they change
fn save_settings_on_change(settings: Res<GameSettings>) {
    if settings.is_changed() && !settings.is_added() {
        if let Err(e) = settings.save() {
            error!("Failed to save settings: {}", e);
        }
    }
}

/// System to keep the Keybindings and SlotTuning resources in sync with GameSettings.
///
/// New slot timings only apply to slot sets built afterwards.
fn sync_settings_resources(
    settings: Res<GameSettings>,
    mut keybindings: ResMut<Keybindings>,
    mut tuning: ResMut<SlotTuning>,
) {
    if settings.is_changed() && !settings.is_added() {
        *keybindings = settings.keybindings.clone();
        if *tuning != settings.slots {
            *tuning = settings.slots;
            info!("Slot timings changed; existing slots keep their old timings");
        }
    }
}
