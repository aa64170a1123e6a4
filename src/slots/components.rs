//! Slot components and resources
//!
//! ECS-facing wrappers around the slot core: the per-entity slot set, grid
//! position, targeting markers, plus the shared RNG and simulation speed.

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::slot_set::AbilitySlotSet;
use super::targeting::{SessionId, SessionRequest, SessionShape, TargetingHost, TargetingSession};
use super::tuning::SlotTuning;

// ============================================================================
// Components
// ============================================================================

/// The ability slots of one entity
#[derive(Component, Deref, DerefMut)]
pub struct AbilitySlots(pub AbilitySlotSet);

impl AbilitySlots {
    pub fn new(owner: Entity, tuning: &SlotTuning) -> Self {
        Self(AbilitySlotSet::new(Some(owner), tuning))
    }
}

/// Marks the entity whose slots read keyboard (or scripted) input
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct PlayerControlled;

/// Cell on the movement grid
#[derive(Component, Clone, Copy, Debug, Default, PartialEq, Eq, Deref, DerefMut)]
pub struct GridPosition(pub IVec2);

/// A live targeting session. Despawned when the session closes.
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct TargetingMarker {
    pub session: SessionId,
    pub owner: Option<Entity>,
    pub slot: usize,
    pub shape: SessionShape,
}

/// Spawn an entity with slots, a grid position and player control
pub fn spawn_player(commands: &mut Commands, tuning: &SlotTuning, position: IVec2) -> Entity {
    let entity = commands
        .spawn((Name::new("Player"), GridPosition(position), PlayerControlled))
        .id();
    commands.entity(entity).insert(AbilitySlots::new(entity, tuning));
    entity
}

/// [`TargetingHost`] backed by entity commands.
///
/// Each session becomes an entity with a [`TargetingMarker`]; the UI (or the
/// headless runner) finds markers and answers them with `TargetResolved`.
pub struct CommandsTargeting<'a, 'w, 's> {
    commands: &'a mut Commands<'w, 's>,
}

impl<'a, 'w, 's> CommandsTargeting<'a, 'w, 's> {
    pub fn new(commands: &'a mut Commands<'w, 's>) -> Self {
        Self { commands }
    }
}

impl TargetingHost for CommandsTargeting<'_, '_, '_> {
    fn open(&mut self, request: &SessionRequest) -> Option<Entity> {
        let marker = TargetingMarker {
            session: request.id,
            owner: request.owner,
            slot: request.slot_index,
            shape: request.shape,
        };
        let name = Name::new(format!("Targeting slot {}", request.slot_index + 1));
        Some(self.commands.spawn((marker, name)).id())
    }

    fn close(&mut self, session: TargetingSession) {
        if let Some(entity) = session.handle().and_then(|handle| self.commands.get_entity(handle)) {
            entity.despawn_recursive();
        }
    }
}

// ============================================================================
// Resources
// ============================================================================

/// Seeded random number generator for deterministic deck draws.
///
/// When a seed is provided (e.g., via headless config), the same seed and
/// input script always deal the same abilities. Without a seed, uses system
/// entropy.
#[derive(Resource)]
pub struct GameRng {
    rng: StdRng,
    /// The seed used to initialize this RNG (if deterministic)
    pub seed: Option<u64>,
}

impl GameRng {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed: Some(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            seed: None,
        }
    }

    pub fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}

impl Default for GameRng {
    fn default() -> Self {
        Self::from_entropy()
    }
}

/// Controls the speed of the slot simulation
#[derive(Resource)]
pub struct SimulationSpeed {
    /// Speed multiplier (0.0 = paused, 0.5 = half speed, 1.0 = normal, 2.0 = double, 3.0 = triple)
    pub multiplier: f32,
}

impl Default for SimulationSpeed {
    fn default() -> Self {
        Self { multiplier: 1.0 }
    }
}

impl SimulationSpeed {
    pub fn pause(&mut self) {
        self.multiplier = 0.0;
    }

    pub fn half_speed(&mut self) {
        self.multiplier = 0.5;
    }

    pub fn normal_speed(&mut self) {
        self.multiplier = 1.0;
    }

    pub fn double_speed(&mut self) {
        self.multiplier = 2.0;
    }

    pub fn triple_speed(&mut self) {
        self.multiplier = 3.0;
    }

    pub fn is_paused(&self) -> bool {
        self.multiplier == 0.0
    }

    pub fn toggle_pause(&mut self) {
        if self.is_paused() {
            self.normal_speed();
        } else {
            self.pause();
        }
    }
}
