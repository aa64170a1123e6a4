//! AbilitySlots - ability slot sandbox
//!
//! Five ability slots refilled from a weighted deck. Tap a slot key to use
//! its ability, hold it to shuffle. Targeted abilities wait for a click on
//! the grid.

use bevy::prelude::*;
use bevy_egui::EguiPlugin;

use abilityslots::abilities::deck::GridBounds;
use abilityslots::abilities::deck_config::DeckConfigPlugin;
use abilityslots::cli;
use abilityslots::headless::{run_headless, HeadlessRunConfig};
use abilityslots::settings::SettingsPlugin;
use abilityslots::slots::input::read_keyboard_input;
use abilityslots::slots::systems::handle_speed_keys;
use abilityslots::slots::{
    spawn_player, GameRng, GridPosition, SlotSystemPhase, SlotTuning, SlotsPlugin,
};
use abilityslots::ui::UiPlugin;

fn main() {
    let args = cli::parse_args();

    if let Some(config_path) = &args.headless {
        let mut config = match HeadlessRunConfig::load_from_file(config_path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(1);
            }
        };
        // Command-line flags win over the config file
        if let Some(output) = &args.output {
            config.output_path = Some(output.to_string_lossy().into_owned());
        }
        if let Some(max_duration) = args.max_duration {
            config.max_duration_secs = max_duration;
        }
        if args.seed.is_some() {
            config.random_seed = args.seed;
        }
        if config.deck_path.is_none() {
            config.deck_path = Some(args.deck.to_string_lossy().into_owned());
        }

        if let Err(e) = run_headless(config) {
            eprintln!("Headless run failed: {}", e);
            std::process::exit(1);
        }
        return;
    }

    let mut app = App::new();
    app
        // Bevy default plugins with custom window settings
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "AbilitySlots".to_string(),
                resolution: (1280.0, 720.0).into(),
                resizable: true,
                ..default()
            }),
            ..default()
        }))
        // Our game plugins
        .add_plugins((
            EguiPlugin,
            DeckConfigPlugin { path: args.deck.clone() },
            SlotsPlugin,
            SettingsPlugin,
            UiPlugin,
        ))
        .add_systems(Startup, setup_sandbox)
        .add_systems(
            Update,
            (handle_speed_keys, read_keyboard_input).in_set(SlotSystemPhase::Input),
        );

    if let Some(seed) = args.seed {
        app.insert_resource(GameRng::from_seed(seed));
    }

    app.run();
}

/// Spawn the camera, the player and a target to mark
fn setup_sandbox(mut commands: Commands, tuning: Res<SlotTuning>, bounds: Res<GridBounds>) {
    commands.spawn(Camera2d);

    let start = bounds.center();
    spawn_player(&mut commands, &tuning, start);
    commands.spawn((
        Name::new("Training Dummy"),
        GridPosition(bounds.clamp(start + IVec2::new(2, 1))),
    ));
    info!("Sandbox ready: {} slots", tuning.slot_count);
}
