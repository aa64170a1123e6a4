//! UI System
//!
//! egui panels for the windowed sandbox:
//! - Slot bar (ability, state, cooldown and hold-to-shuffle progress per slot)
//! - Grid view that also answers targeting sessions with mouse clicks
//! - Time controls

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

use crate::abilities::capability::AbilityTarget;
use crate::abilities::deck::GridBounds;
use crate::keybindings::{GameAction, Keybindings};
use crate::slots::components::{AbilitySlots, GridPosition, PlayerControlled, SimulationSpeed, TargetingMarker};
use crate::slots::events::TargetResolved;
use crate::slots::log::SlotLog;
use crate::slots::slot::SlotState;
use crate::slots::targeting::SessionShape;
use crate::slots::tuning::SlotTuning;
use crate::slots::SlotSystemPhase;

/// Plugin for UI management
pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (render_slot_bar, render_grid, render_time_controls, render_slot_log)
                .in_set(SlotSystemPhase::Input),
        );
    }
}

/// Common colors used throughout the UI
pub mod colors {
    use bevy_egui::egui::Color32;

    pub const PANEL: Color32 = Color32::from_rgba_premultiplied(20, 20, 28, 220);
    pub const READY: Color32 = Color32::from_rgb(100, 220, 120);
    pub const TARGETING: Color32 = Color32::from_rgb(240, 200, 80);
    pub const ACTIVE: Color32 = Color32::from_rgb(120, 170, 255);
    pub const COOLDOWN: Color32 = Color32::from_rgb(150, 150, 160);
    pub const SHUFFLE: Color32 = Color32::from_rgb(200, 120, 220);
    pub const GRID_CELL: Color32 = Color32::from_rgb(45, 45, 55);
    pub const GRID_LINE: Color32 = Color32::from_rgb(70, 70, 85);
    pub const PLAYER: Color32 = Color32::from_rgb(80, 160, 255);
    pub const OTHER: Color32 = Color32::from_rgb(230, 90, 90);
}

/// Font sizes used throughout the UI
pub mod fonts {
    pub const BODY: f32 = 14.0;
    pub const SMALL: f32 = 11.0;
}

/// Grid cell size in points
const CELL_SIZE: f32 = 40.0;

/// Bottom bar with one card per slot of the player
fn render_slot_bar(
    mut contexts: EguiContexts,
    players: Query<&AbilitySlots, With<PlayerControlled>>,
    keybindings: Res<Keybindings>,
    tuning: Res<SlotTuning>,
) {
    let Some(ctx) = contexts.try_ctx_mut() else { return; };
    let Ok(slots) = players.get_single() else { return; };

    egui::TopBottomPanel::bottom("slot_bar")
        .frame(egui::Frame::none().fill(colors::PANEL).inner_margin(8.0))
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                for slot in slots.slots() {
                    let index = slot.index();
                    let key = GameAction::ability(index)
                        .map(|action| keybindings.binding_display(action))
                        .unwrap_or_default();

                    ui.group(|ui| {
                        ui.set_width(150.0);
                        ui.vertical(|ui| {
                            ui.label(egui::RichText::new(format!("[{}]", key)).size(fonts::SMALL));

                            let (text, color) = match (slot.ability(), slot.state()) {
                                (Some(ability), SlotState::AwaitingTarget) => (
                                    format!("{} ({})", ability.name(), ability.targeting().as_str()),
                                    colors::TARGETING,
                                ),
                                (Some(ability), SlotState::Active) => (ability.name().to_string(), colors::ACTIVE),
                                (Some(ability), SlotState::Idle) => (ability.name().to_string(), colors::READY),
                                (None, _) if slot.just_shuffled() => ("Shuffling".to_string(), colors::SHUFFLE),
                                (None, _) => ("Empty".to_string(), colors::COOLDOWN),
                            };
                            ui.label(egui::RichText::new(text).size(fonts::BODY).color(color).strong());

                            ui.add(
                                egui::ProgressBar::new(slot.cooldown_progress())
                                    .desired_width(140.0)
                                    .text(slot.state().as_str()),
                            );

                            let held = slots.held_time(index);
                            if held > 0.0 && !slots.needs_key_lift(index) && tuning.hold_to_shuffle_time > 0.0 {
                                ui.add(
                                    egui::ProgressBar::new((held / tuning.hold_to_shuffle_time) as f32)
                                        .desired_width(140.0)
                                        .fill(colors::SHUFFLE)
                                        .text("Hold to shuffle"),
                                );
                            }
                        });
                    });
                }
            });
        });
}

/// Grid view. Clicking a cell answers the player's open targeting sessions:
/// Line and Cone sessions get the aim from the player to the cell, Area
/// sessions get the cell, Unit sessions get whatever stands on it.
fn render_grid(
    mut contexts: EguiContexts,
    bounds: Res<GridBounds>,
    players: Query<(Entity, &GridPosition), With<PlayerControlled>>,
    others: Query<(Entity, &GridPosition), Without<PlayerControlled>>,
    markers: Query<&TargetingMarker>,
    mut resolved: EventWriter<TargetResolved>,
) {
    let Some(ctx) = contexts.try_ctx_mut() else { return; };
    let Ok((player, player_pos)) = players.get_single() else { return; };

    let open: Vec<&TargetingMarker> = markers
        .iter()
        .filter(|marker| marker.owner == Some(player))
        .collect();

    let title = if open.is_empty() {
        "Grid".to_string()
    } else {
        "Grid - click to target".to_string()
    };

    egui::Window::new(title)
        .id(egui::Id::new("grid_window"))
        .resizable(false)
        .collapsible(false)
        .show(ctx, |ui| {
            let size = egui::vec2(bounds.columns as f32 * CELL_SIZE, bounds.rows as f32 * CELL_SIZE);
            let (response, painter) = ui.allocate_painter(size, egui::Sense::click());
            let origin = response.rect.min;

            let cell_rect = |cell: IVec2| {
                let min = origin
                    + egui::vec2(
                        cell.x as f32 * CELL_SIZE,
                        (bounds.rows - 1 - cell.y) as f32 * CELL_SIZE,
                    );
                egui::Rect::from_min_size(min, egui::vec2(CELL_SIZE, CELL_SIZE))
            };

            for x in 0..bounds.columns {
                for y in 0..bounds.rows {
                    let rect = cell_rect(IVec2::new(x, y)).shrink(1.0);
                    painter.rect_filled(rect, 2.0, colors::GRID_CELL);
                }
            }
            painter.rect_stroke(response.rect, 0.0, egui::Stroke::new(1.0, colors::GRID_LINE));

            for (_, position) in &others {
                painter.circle_filled(cell_rect(position.0).center(), CELL_SIZE * 0.3, colors::OTHER);
            }
            painter.circle_filled(cell_rect(player_pos.0).center(), CELL_SIZE * 0.35, colors::PLAYER);

            if !response.clicked() || open.is_empty() {
                return;
            }
            let Some(pointer) = response.interact_pointer_pos() else { return; };
            let local = pointer - origin;
            let cell = IVec2::new(
                (local.x / CELL_SIZE).floor() as i32,
                bounds.rows - 1 - (local.y / CELL_SIZE).floor() as i32,
            );
            if !bounds.contains(cell) {
                return;
            }

            for marker in &open {
                let target = match marker.shape {
                    SessionShape::Direction => Some(AbilityTarget::Point((cell - player_pos.0).as_vec2())),
                    SessionShape::Position => Some(AbilityTarget::Point(cell.as_vec2())),
                    SessionShape::Unit => others
                        .iter()
                        .find(|(_, position)| position.0 == cell)
                        .map(|(entity, _)| AbilityTarget::Unit(entity)),
                };
                if let Some(target) = target {
                    resolved.send(TargetResolved {
                        owner: player,
                        session: marker.session,
                        target,
                    });
                }
            }
        });
}

/// Render time controls panel with pause/speed buttons.
fn render_time_controls(mut contexts: EguiContexts, mut sim_speed: ResMut<SimulationSpeed>) {
    let Some(ctx) = contexts.try_ctx_mut() else { return; };

    egui::Window::new("Time Controls")
        .anchor(egui::Align2::RIGHT_TOP, egui::vec2(-10.0, 10.0))
        .resizable(false)
        .collapsible(false)
        .title_bar(false)
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                let pause_label = if sim_speed.is_paused() { "▶" } else { "⏸" };
                if ui.button(pause_label).clicked() {
                    sim_speed.toggle_pause();
                }
                for &speed in &[0.5, 1.0, 2.0, 3.0] {
                    let is_active = !sim_speed.is_paused() && (sim_speed.multiplier - speed).abs() < 0.01;
                    if ui.selectable_label(is_active, format!("{}x", speed)).clicked() {
                        sim_speed.multiplier = speed;
                    }
                }
            });
            ui.label(egui::RichText::new("Space=Pause F1-F4=Speed").size(fonts::SMALL));
        });
}

/// Most recent slot log lines
fn render_slot_log(mut contexts: EguiContexts, log: Res<SlotLog>) {
    let Some(ctx) = contexts.try_ctx_mut() else { return; };

    egui::Window::new("Slot Log")
        .anchor(egui::Align2::RIGHT_TOP, egui::vec2(-10.0, 80.0))
        .default_width(260.0)
        .show(ctx, |ui| {
            for entry in log.recent(12) {
                ui.label(
                    egui::RichText::new(format!("[{:>6.2}] {}", entry.timestamp, entry.message))
                        .size(fonts::SMALL),
                );
            }
        });
}
