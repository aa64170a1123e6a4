//! Headless run execution
//!
//! Plays a key-press script against one player's slots without any graphical
//! output, answering targeting sessions automatically.

use bevy::app::ScheduleRunnerPlugin;
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::abilities::capability::AbilityTarget;
use crate::abilities::deck::GridBounds;
use crate::abilities::deck_config::{DeckConfigPlugin, DEFAULT_DECK_PATH};
use crate::slots::components::{spawn_player, AbilitySlots, GameRng, GridPosition, TargetingMarker};
use crate::slots::events::{AbilityEffectEvent, TargetResolved};
use crate::slots::input::{SlotButtons, SlotInputState};
use crate::slots::log::{SlotLog, SlotLogEntry, SlotLogEventType};
use crate::slots::slot_set::AbilitySlotSet;
use crate::slots::targeting::SessionShape;
use crate::slots::tuning::SlotTuning;
use crate::slots::{SlotSystemPhase, SlotsPlugin};

use super::config::{HeadlessRunConfig, ScriptedPress};

/// Simulated frame length. Every update advances time by exactly this much.
pub const FRAME_TIME: f64 = 1.0 / 60.0;

/// Final state of one slot
#[derive(Debug, Clone, Serialize)]
pub struct SlotSummary {
    pub index: usize,
    pub input_key: String,
    pub ability: Option<String>,
    pub state: String,
    pub cooldown_progress: f32,
}

/// Result of a completed headless run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Simulated run time in seconds
    pub duration: f32,
    /// Random seed used (if deterministic mode)
    pub random_seed: Option<u64>,
    pub final_position: [i32; 2],
    pub draws: usize,
    pub activations: usize,
    pub shuffles: usize,
    pub effects: usize,
    pub slots: Vec<SlotSummary>,
    pub log: Vec<SlotLogEntry>,
}

/// Resource to track headless run state
#[derive(Resource)]
pub struct HeadlessRunState {
    /// Run length in seconds
    pub max_duration: f32,
    pub elapsed_time: f32,
    /// Custom output path for the summary
    pub output_path: Option<String>,
    pub run_complete: bool,
    /// Random seed for deterministic draws (if provided)
    pub random_seed: Option<u64>,
    pub start_position: Option<IVec2>,
    pub player: Option<Entity>,
    /// Answer to Unit targeting sessions
    pub dummy: Option<Entity>,
    pub effects_seen: usize,
    /// Populated when the run completes
    pub summary: Option<RunSummary>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PressPhase {
    Pending,
    Down,
    Done,
}

/// Key presses still to be played
#[derive(Resource, Debug, Default)]
pub struct ScriptedInput {
    presses: Vec<ScriptedPress>,
    phases: Vec<PressPhase>,
}

impl ScriptedInput {
    pub fn new(presses: Vec<ScriptedPress>) -> Self {
        let phases = vec![PressPhase::Pending; presses.len()];
        Self { presses, phases }
    }

    /// Buttons for every slot at time `now`. A press is held from `at` until
    /// `at + hold_secs` and reports its release on the first frame after.
    pub fn advance(&mut self, now: f32, slot_count: usize) -> Vec<SlotButtons> {
        let mut buttons = vec![SlotButtons::default(); slot_count];
        for (press, phase) in self.presses.iter().zip(self.phases.iter_mut()) {
            let Some(slot) = buttons.get_mut(press.slot) else {
                continue;
            };
            match *phase {
                PressPhase::Pending if now >= press.at => {
                    *phase = PressPhase::Down;
                    slot.held = true;
                }
                PressPhase::Down if now >= press.at + press.hold_secs => {
                    *phase = PressPhase::Done;
                    slot.released = true;
                }
                PressPhase::Down => slot.held = true,
                _ => {}
            }
        }
        buttons
    }

    pub fn finished(&self) -> bool {
        self.phases.iter().all(|phase| *phase == PressPhase::Done)
    }
}

/// How open sessions are answered
#[derive(Resource, Clone, Copy, Debug)]
struct AutoTargeting {
    enabled: bool,
    point: Vec2,
}

/// Plugin for headless run execution
pub struct HeadlessPlugin {
    pub config: HeadlessRunConfig,
}

impl Plugin for HeadlessPlugin {
    fn build(&self, app: &mut App) {
        let deck_path = self
            .config
            .deck_path
            .as_deref()
            .unwrap_or(DEFAULT_DECK_PATH);

        app.add_plugins((
            DeckConfigPlugin {
                path: PathBuf::from(deck_path),
            },
            SlotsPlugin,
        ))
        .insert_resource(self.config.slots)
        .insert_resource(HeadlessRunState {
            max_duration: self.config.max_duration_secs,
            elapsed_time: 0.0,
            output_path: self.config.output_path.clone(),
            run_complete: false,
            random_seed: self.config.random_seed,
            start_position: self.config.start_position.map(IVec2::from),
            player: None,
            dummy: None,
            effects_seen: 0,
            summary: None,
        })
        .insert_resource(ScriptedInput::new(self.config.script.clone()))
        .insert_resource(AutoTargeting {
            enabled: self.config.auto_resolve,
            point: Vec2::from(self.config.target_point),
        })
        // Fixed frame length so seeded runs are reproducible
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(
            FRAME_TIME,
        )));

        app.add_systems(Startup, headless_setup_run)
            .add_systems(
                Update,
                (headless_track_time, feed_scripted_input, auto_resolve_targets)
                    .chain()
                    .in_set(SlotSystemPhase::Input),
            )
            .add_systems(
                Update,
                (count_effects, headless_check_run_end)
                    .chain()
                    .after(SlotSystemPhase::Resolve),
            )
            .add_systems(PostUpdate, headless_exit_on_complete);
    }
}

/// Setup system for a headless run
fn headless_setup_run(
    mut commands: Commands,
    tuning: Res<SlotTuning>,
    bounds: Res<GridBounds>,
    mut state: ResMut<HeadlessRunState>,
    mut log: ResMut<SlotLog>,
) {
    log.clear();

    let game_rng = match state.random_seed {
        Some(seed) => {
            info!("Using deterministic RNG with seed: {}", seed);
            GameRng::from_seed(seed)
        }
        None => {
            info!("Using non-deterministic RNG (no seed provided)");
            GameRng::from_entropy()
        }
    };
    commands.insert_resource(game_rng);

    let start = bounds.clamp(state.start_position.unwrap_or_else(|| bounds.center()));
    let player = spawn_player(&mut commands, &tuning, start);
    let dummy = commands
        .spawn((
            Name::new("Training Dummy"),
            GridPosition(bounds.clamp(start + IVec2::new(2, 0))),
        ))
        .id();

    state.player = Some(player);
    state.dummy = Some(dummy);
    info!("Headless run setup complete: {} slots at {}", tuning.slot_count, start);
}

/// Track elapsed run time (used for the script and timeout)
fn headless_track_time(time: Res<Time>, mut state: ResMut<HeadlessRunState>) {
    state.elapsed_time += time.delta_secs();
}

/// Play the script into the slot input
fn feed_scripted_input(
    state: Res<HeadlessRunState>,
    tuning: Res<SlotTuning>,
    mut script: ResMut<ScriptedInput>,
    mut input: ResMut<SlotInputState>,
) {
    input.buttons = script.advance(state.elapsed_time, tuning.slot_count);
}

/// Answer every open targeting session
fn auto_resolve_targets(
    auto: Res<AutoTargeting>,
    state: Res<HeadlessRunState>,
    markers: Query<&TargetingMarker>,
    mut resolved: EventWriter<TargetResolved>,
) {
    if !auto.enabled {
        return;
    }
    for marker in &markers {
        let Some(owner) = marker.owner else {
            continue;
        };
        let target = match marker.shape {
            SessionShape::Unit => state.dummy.map(AbilityTarget::Unit),
            SessionShape::Direction | SessionShape::Position => Some(AbilityTarget::Point(auto.point)),
        };
        if let Some(target) = target {
            resolved.send(TargetResolved {
                owner,
                session: marker.session,
                target,
            });
        }
    }
}

fn count_effects(mut effects: EventReader<AbilityEffectEvent>, mut state: ResMut<HeadlessRunState>) {
    state.effects_seen += effects.read().count();
}

/// Finish the run once the duration is reached
fn headless_check_run_end(
    owners: Query<(&AbilitySlots, &GridPosition)>,
    log: Res<SlotLog>,
    mut state: ResMut<HeadlessRunState>,
) {
    if state.run_complete || state.elapsed_time < state.max_duration {
        return;
    }

    let Some((slots, position)) = state.player.and_then(|player| owners.get(player).ok()) else {
        warn!("Headless run ended without a player");
        state.run_complete = true;
        return;
    };

    let summary = build_run_summary(slots, position.0, &log, &state);
    info!(
        "Run complete after {:.1}s: {} draws, {} activations, {} shuffles",
        summary.duration, summary.draws, summary.activations, summary.shuffles
    );
    save_run_summary(&summary, state.output_path.as_deref());
    state.summary = Some(summary);
    state.run_complete = true;
}

/// Build the RunSummary from the player's slots and the log
fn build_run_summary(
    slots: &AbilitySlotSet,
    position: IVec2,
    log: &SlotLog,
    state: &HeadlessRunState,
) -> RunSummary {
    let slot_summaries = slots
        .slots()
        .map(|slot| SlotSummary {
            index: slot.index(),
            input_key: AbilitySlotSet::input_key(slot.index()),
            ability: slot.ability().map(|ability| ability.name().to_string()),
            state: slot.state().as_str().to_string(),
            cooldown_progress: slot.cooldown_progress(),
        })
        .collect();

    RunSummary {
        duration: state.elapsed_time,
        random_seed: state.random_seed,
        final_position: position.to_array(),
        draws: log.filter_by_type(SlotLogEventType::Drawn).len(),
        activations: log.filter_by_type(SlotLogEventType::Activated).len(),
        shuffles: log.filter_by_type(SlotLogEventType::Shuffled).len(),
        effects: state.effects_seen,
        slots: slot_summaries,
        log: log.entries.clone(),
    }
}

/// Write the summary as JSON, to stdout when no path was given
fn save_run_summary(summary: &RunSummary, output_path: Option<&str>) {
    let json = match serde_json::to_string_pretty(summary) {
        Ok(json) => json,
        Err(e) => {
            eprintln!("Failed to serialize run summary: {}", e);
            return;
        }
    };

    match output_path {
        Some(path) => match std::fs::write(path, json) {
            Ok(()) => println!("Run complete. Summary saved to: {}", path),
            Err(e) => eprintln!("Failed to save run summary: {}", e),
        },
        None => println!("{}", json),
    }
}

/// Exit the app when the run is complete
fn headless_exit_on_complete(state: Res<HeadlessRunState>, mut exit: EventWriter<AppExit>) {
    if state.run_complete {
        exit.send(AppExit::Success);
    }
}

/// Build the headless app without running it
pub fn build_headless_app(config: HeadlessRunConfig) -> Result<App, String> {
    config.validate()?;

    let mut app = App::new();
    app
        // Minimal plugins - no window, no rendering
        .add_plugins(
            MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_secs_f64(
                FRAME_TIME,
            ))),
        )
        .add_plugins(HierarchyPlugin)
        .add_plugins(HeadlessPlugin { config });
    Ok(app)
}

/// Run a headless session with the given configuration
pub fn run_headless(config: HeadlessRunConfig) -> Result<(), String> {
    println!("Starting headless slot run...");
    println!("  Slots: {}", config.slots.slot_count);
    println!("  Scripted presses: {}", config.script.len());
    println!("  Duration: {:.1}s", config.max_duration_secs);

    build_headless_app(config)?.run();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(at: f32, slot: usize, hold_secs: f32) -> ScriptedPress {
        ScriptedPress { at, slot, hold_secs }
    }

    #[test]
    fn test_tap_is_one_frame_down_then_released() {
        let mut script = ScriptedInput::new(vec![press(0.5, 1, 0.0)]);
        assert_eq!(script.advance(0.4, 5)[1], SlotButtons::default());

        let down = script.advance(0.5, 5);
        assert!(down[1].held && !down[1].released);

        let up = script.advance(0.52, 5);
        assert!(!up[1].held && up[1].released);
        assert!(script.finished());
    }

    #[test]
    fn test_hold_stays_down_for_its_duration() {
        let mut script = ScriptedInput::new(vec![press(0.0, 0, 1.0)]);
        for frame in 0..59 {
            let buttons = script.advance(frame as f32 / 60.0, 5);
            assert!(buttons[0].held, "frame {}", frame);
        }
        let buttons = script.advance(1.0, 5);
        assert!(buttons[0].released);
    }

    #[test]
    fn test_out_of_range_press_is_skipped() {
        let mut script = ScriptedInput::new(vec![press(0.0, 9, 0.0)]);
        let buttons = script.advance(1.0, 5);
        assert!(buttons.iter().all(|b| *b == SlotButtons::default()));
    }
}
