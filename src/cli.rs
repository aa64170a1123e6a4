//! Command-line interface for AbilitySlots
//!
//! Supports both graphical (default) and headless modes.

use clap::Parser;
use std::path::PathBuf;

/// Ability slot sandbox
#[derive(Parser, Debug)]
#[command(name = "abilityslots")]
#[command(about = "Ability slot sandbox with a weighted deck and targeting")]
#[command(version)]
pub struct Args {
    /// Run in headless mode with the specified JSON config file
    #[arg(long, value_name = "CONFIG_FILE")]
    pub headless: Option<PathBuf>,

    /// Output path for the run summary (headless mode only)
    #[arg(long, value_name = "OUTPUT_PATH")]
    pub output: Option<PathBuf>,

    /// Maximum run duration in seconds (headless mode only)
    #[arg(long)]
    pub max_duration: Option<f32>,

    /// Seed for deck draws; overrides the config file's seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Deck file to load
    #[arg(long, value_name = "DECK_FILE", default_value = "assets/config/deck.ron")]
    pub deck: PathBuf,
}

pub fn parse_args() -> Args {
    Args::parse()
}
