//! Data-driven deck configuration
//!
//! The deck is described in `assets/config/deck.ron` as a list of catalogue
//! entries with draw weights. Balance changes don't require recompilation.
//!
//! ```ron
//! (
//!     entries: [
//!         (ability: (name: "Heal", icon: "heal", kind: Heal(amount: 35.0)), weight: 3.0),
//!     ],
//! )
//! ```

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::catalogue::{default_catalogue, CatalogueEntry};
use super::deck::{AbilityDeck, DeckError};

/// Default location of the deck file
pub const DEFAULT_DECK_PATH: &str = "assets/config/deck.ron";

fn default_weight() -> f32 {
    1.0
}

/// One deck line: a catalogue template and its draw weight.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeckEntryConfig {
    pub ability: CatalogueEntry,
    #[serde(default = "default_weight")]
    pub weight: f32,
}

/// Root structure of the deck file
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeckConfig {
    pub entries: Vec<DeckEntryConfig>,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            entries: default_catalogue()
                .into_iter()
                .map(|(ability, weight)| DeckEntryConfig { ability, weight })
                .collect(),
        }
    }
}

/// Errors loading a deck file
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: ron::error::SpannedError,
    },

    #[error("deck config has no entries")]
    NoEntries,

    #[error(transparent)]
    Deck(#[from] DeckError),
}

impl DeckConfig {
    pub fn from_ron_str(contents: &str, path: &str) -> Result<Self, ConfigError> {
        let config: DeckConfig = ron::from_str(contents).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_ron_str(&contents, &path.display().to_string())
    }

    /// The deck must be drawable: at least one entry with a positive weight,
    /// and no negative weights.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.entries.is_empty() {
            return Err(ConfigError::NoEntries);
        }
        for entry in &self.entries {
            if !entry.weight.is_finite() || entry.weight < 0.0 {
                return Err(DeckError::InvalidWeight {
                    name: entry.ability.name.clone(),
                    weight: entry.weight,
                }
                .into());
            }
        }
        if !self.entries.iter().any(|entry| entry.weight > 0.0) {
            return Err(DeckError::NoEligibleWeight {
                entries: self.entries.len(),
            }
            .into());
        }
        Ok(())
    }

    pub fn build_deck(&self) -> Result<AbilityDeck, DeckError> {
        let mut deck = AbilityDeck::new();
        for entry in &self.entries {
            deck.add(entry.ability.clone(), entry.weight)?;
        }
        Ok(deck)
    }
}

/// Load the deck from `path`, falling back to the built-in catalogue when the
/// file is missing or invalid.
pub fn load_deck(path: &Path) -> AbilityDeck {
    let config = if path.exists() {
        match DeckConfig::load_from_file(path) {
            Ok(config) => {
                info!("Loaded {} deck entries from {:?}", config.entries.len(), path);
                config
            }
            Err(e) => {
                warn!("Invalid deck config, using built-in deck: {}", e);
                DeckConfig::default()
            }
        }
    } else {
        info!("No deck file at {:?}, using built-in deck", path);
        DeckConfig::default()
    };

    match config.build_deck() {
        Ok(deck) => deck,
        Err(e) => {
            error!("Failed to build ability deck: {}", e);
            AbilityDeck::new()
        }
    }
}

/// Bevy plugin inserting the [`AbilityDeck`] resource at startup
pub struct DeckConfigPlugin {
    pub path: PathBuf,
}

impl Default for DeckConfigPlugin {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DECK_PATH),
        }
    }
}

impl Plugin for DeckConfigPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(load_deck(&self.path));
    }
}
