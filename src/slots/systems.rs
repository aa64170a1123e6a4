//! Slot systems
//!
//! Systems run in three ordered phases each frame:
//!
//! 1. **Input** - keyboard (or script) into [`SlotInputState`], speed keys
//! 2. **Tick** - slot sets tick and process input, target resolutions are routed
//! 3. **Resolve** - effects and slot events are published, moves applied, log updated

use bevy::prelude::*;

use super::components::{AbilitySlots, CommandsTargeting, GameRng, GridPosition, PlayerControlled, SimulationSpeed};
use super::events::{AbilityEffectEvent, SlotEvent, TargetResolved};
use super::input::{SlotButtons, SlotInputState};
use super::log::SlotLog;
use super::slot_set::SlotEnv;
use crate::abilities::capability::AbilityEffect;
use crate::abilities::deck::{AbilityDeck, GridBounds};
use crate::keybindings::{GameAction, Keybindings};

/// System set labels for slot system ordering.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum SlotSystemPhase {
    /// Phase 1: read input
    Input,
    /// Phase 2: tick slots, route target resolutions
    Tick,
    /// Phase 3: publish effects and events
    Resolve,
}

/// Configures the ordering between slot system phases.
pub fn configure_slot_system_ordering(app: &mut App) {
    app.configure_sets(
        Update,
        (SlotSystemPhase::Input, SlotSystemPhase::Tick, SlotSystemPhase::Resolve).chain(),
    );
}

/// Adds the slot simulation systems shared by windowed and headless mode.
///
/// Input systems are not included; each mode feeds [`SlotInputState`] its own way.
pub fn add_core_slot_systems(app: &mut App) {
    app.add_systems(
        Update,
        (update_ability_slots, route_target_resolutions)
            .chain()
            .in_set(SlotSystemPhase::Tick),
    );

    app.add_systems(
        Update,
        (publish_slot_output, apply_move_effects, record_slot_log)
            .chain()
            .in_set(SlotSystemPhase::Resolve),
    );
}

/// Tick every slot set and feed it input.
///
/// Only [`PlayerControlled`] owners read [`SlotInputState`]; other owners
/// just tick. Hold-to-shuffle uses real time, cooldowns use scaled time.
pub fn update_ability_slots(
    mut commands: Commands,
    time: Res<Time>,
    speed: Res<SimulationSpeed>,
    deck: Res<AbilityDeck>,
    bounds: Res<GridBounds>,
    input: Res<SlotInputState>,
    mut rng: ResMut<GameRng>,
    mut owners: Query<(&mut AbilitySlots, Option<&GridPosition>, Has<PlayerControlled>)>,
) {
    let dt = time.delta_secs_f64();
    let mut targeting = CommandsTargeting::new(&mut commands);

    for (mut slots, position, player) in &mut owners {
        let buttons: &[SlotButtons] = if player { &input.buttons } else { &[] };
        let mut env = SlotEnv {
            deck: &deck,
            rng: rng.rng_mut(),
            targeting: &mut targeting,
            position: position.map_or(bounds.center(), |p| p.0),
            bounds: *bounds,
        };
        slots.update(dt, f64::from(speed.multiplier), buttons, &mut env);
    }
}

/// Deliver target resolutions to their owner's slots
pub fn route_target_resolutions(
    mut commands: Commands,
    mut resolutions: EventReader<TargetResolved>,
    mut owners: Query<&mut AbilitySlots>,
) {
    let mut targeting = CommandsTargeting::new(&mut commands);
    for resolved in resolutions.read() {
        let Ok(mut slots) = owners.get_mut(resolved.owner) else {
            debug!("Target resolution for {:?} has no slot owner", resolved.owner);
            continue;
        };
        slots.resolve_target(resolved.session, resolved.target, &mut targeting);
    }
}

/// Drain every slot set's effects and events into Bevy events
pub fn publish_slot_output(
    mut owners: Query<&mut AbilitySlots>,
    mut effect_events: EventWriter<AbilityEffectEvent>,
    mut slot_events: EventWriter<SlotEvent>,
) {
    for mut slots in &mut owners {
        let owner = slots.owner();
        for (slot, effect) in slots.drain_effects() {
            effect_events.send(AbilityEffectEvent { owner, slot, effect });
        }
        slot_events.send_batch(slots.drain_events());
    }
}

/// Move owners for Move and Teleport effects, staying on the grid
pub fn apply_move_effects(
    mut effects: EventReader<AbilityEffectEvent>,
    bounds: Res<GridBounds>,
    mut positions: Query<&mut GridPosition>,
) {
    for event in effects.read() {
        let Some(mut position) = event.owner.and_then(|owner| positions.get_mut(owner).ok()) else {
            continue;
        };
        match event.effect {
            AbilityEffect::Move { offset } => {
                position.0 = bounds.clamp(position.0 + offset);
            }
            AbilityEffect::Teleport { destination } => {
                position.0 = bounds.clamp(destination.round().as_ivec2());
            }
            _ => {}
        }
    }
}

/// Advance the log clock and record slot events
pub fn record_slot_log(
    time: Res<Time>,
    speed: Res<SimulationSpeed>,
    mut log: ResMut<SlotLog>,
    mut events: EventReader<SlotEvent>,
) {
    log.elapsed += time.delta_secs() * speed.multiplier;
    for event in events.read() {
        log.record(event);
    }
}

/// Pause and speed controls
pub fn handle_speed_keys(
    keyboard: Res<ButtonInput<KeyCode>>,
    keybindings: Res<Keybindings>,
    mut speed: ResMut<SimulationSpeed>,
) {
    if keybindings.action_just_pressed(GameAction::PausePlay, &keyboard) {
        speed.toggle_pause();
    } else if keybindings.action_just_pressed(GameAction::SpeedSlow, &keyboard) {
        speed.half_speed();
    } else if keybindings.action_just_pressed(GameAction::SpeedNormal, &keyboard) {
        speed.normal_speed();
    } else if keybindings.action_just_pressed(GameAction::SpeedFast, &keyboard) {
        speed.double_speed();
    } else if keybindings.action_just_pressed(GameAction::SpeedVeryFast, &keyboard) {
        speed.triple_speed();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abilities::capability::AbilityTarget;
    use crate::abilities::catalogue::{AbilityKind, CatalogueEntry};
    use crate::slots::components::TargetingMarker;
    use crate::slots::log::SlotLogEventType;
    use crate::slots::tuning::SlotTuning;
    use crate::slots::SlotsPlugin;
    use bevy::time::TimeUpdateStrategy;
    use std::time::Duration;

    fn quick_tuning() -> SlotTuning {
        SlotTuning {
            cooldown_time: 0.1,
            shuffle_cooldown_time: 0.1,
            hold_to_shuffle_time: 0.2,
            ..default()
        }
    }

    /// App with a Blink-only deck and one player whose slots are already dealt
    fn blink_app() -> (App, Entity) {
        let mut deck = AbilityDeck::new();
        deck.add(CatalogueEntry::new("Blink", "blink", AbilityKind::Blink), 1.0)
            .unwrap();

        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .add_plugins(SlotsPlugin)
            .insert_resource(deck)
            .insert_resource(quick_tuning())
            .insert_resource(GameRng::from_seed(3))
            .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(100)));

        let player = app
            .world_mut()
            .spawn((PlayerControlled, GridPosition(IVec2::new(3, 3))))
            .id();
        app.world_mut()
            .entity_mut(player)
            .insert(AbilitySlots::new(player, &quick_tuning()));

        for _ in 0..10 {
            app.update();
        }
        let slots = app.world().get::<AbilitySlots>(player).unwrap();
        assert_eq!(slots.ability_name(0), Some("Blink"));
        (app, player)
    }

    /// One frame with the given buttons on slot 0, then the key state is dropped
    fn press(app: &mut App, buttons: SlotButtons) {
        app.world_mut().resource_mut::<SlotInputState>().set(0, buttons);
        app.update();
        app.world_mut().resource_mut::<SlotInputState>().clear();
    }

    fn markers(app: &mut App) -> Vec<TargetingMarker> {
        let world = app.world_mut();
        world.query::<&TargetingMarker>().iter(world).copied().collect()
    }

    fn activate_slot_zero(app: &mut App) -> TargetingMarker {
        press(app, SlotButtons { held: true, released: false });
        press(app, SlotButtons { held: false, released: true });
        let open = markers(app);
        assert_eq!(open.len(), 1, "activation spawns one marker");
        open[0]
    }

    #[test]
    fn test_resolution_reaches_slot_and_despawns_marker() {
        let (mut app, player) = blink_app();
        let marker = activate_slot_zero(&mut app);
        assert_eq!(marker.owner, Some(player));
        assert_eq!(marker.slot, 0);

        app.world_mut().send_event(TargetResolved {
            owner: player,
            session: marker.session,
            target: AbilityTarget::Point(Vec2::new(1.0, 5.0)),
        });
        app.update();

        assert!(markers(&mut app).is_empty(), "resolved session leaves no marker");
        let slots = app.world().get::<AbilitySlots>(player).unwrap();
        assert!(slots.slot(0).unwrap().is_on_cooldown());
        assert_eq!(app.world().get::<GridPosition>(player).unwrap().0, IVec2::new(1, 5));
    }

    #[test]
    fn test_shuffle_while_awaiting_despawns_marker() {
        let (mut app, player) = blink_app();
        let marker = activate_slot_zero(&mut app);

        app.world_mut()
            .resource_mut::<SlotInputState>()
            .set(0, SlotButtons { held: true, released: false });
        for _ in 0..4 {
            app.update();
        }
        app.world_mut().resource_mut::<SlotInputState>().clear();

        assert!(markers(&mut app).is_empty(), "shuffle closes the session's marker");
        assert_eq!(
            app.world()
                .resource::<SlotLog>()
                .filter_by_type(SlotLogEventType::Shuffled)
                .len(),
            1
        );

        // A late answer to the cancelled session changes nothing
        app.world_mut().send_event(TargetResolved {
            owner: player,
            session: marker.session,
            target: AbilityTarget::Point(Vec2::ZERO),
        });
        app.update();
        assert_eq!(app.world().get::<GridPosition>(player).unwrap().0, IVec2::new(3, 3));
    }

    #[test]
    fn test_resolution_for_unknown_owner_is_dropped() {
        let (mut app, player) = blink_app();
        let marker = activate_slot_zero(&mut app);
        let stranger = app.world_mut().spawn_empty().id();

        app.world_mut().send_event(TargetResolved {
            owner: stranger,
            session: marker.session,
            target: AbilityTarget::Point(Vec2::ONE),
        });
        app.update();

        assert_eq!(markers(&mut app), vec![marker]);
        let slots = app.world().get::<AbilitySlots>(player).unwrap();
        assert_eq!(slots.slot(0).unwrap().state(), crate::slots::slot::SlotState::AwaitingTarget);
    }
}
