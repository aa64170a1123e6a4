//! Ability capability contract
//!
//! Every ability a slot can hold implements [`AbilityCapability`]. A slot only
//! cares about three things: which input the ability needs before it can run,
//! what happens when it is activated, and whether it keeps running afterwards.
//!
//! Abilities never touch the world directly. They describe what they want done
//! as [`AbilityEffect`]s pushed into the [`AbilityContext`], and the host turns
//! those into gameplay.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Classification of the input an ability needs before it can execute.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetingKind {
    /// Executes immediately on activation
    #[default]
    None,
    /// Directional line (needs a point)
    Line,
    /// Directional cone (needs a point)
    Cone,
    /// Ground area (needs a point)
    Area,
    /// A specific unit (needs an entity)
    Unit,
}

impl TargetingKind {
    /// True if activation has to wait for a target
    pub fn requires_target(self) -> bool {
        self != TargetingKind::None
    }

    /// True if `target` has the shape this kind expects.
    ///
    /// Line, Cone and Area take a point; Unit takes an entity. `None` takes nothing.
    pub fn accepts(self, target: &AbilityTarget) -> bool {
        matches!(
            (self, target),
            (
                TargetingKind::Line | TargetingKind::Cone | TargetingKind::Area,
                AbilityTarget::Point(_)
            ) | (TargetingKind::Unit, AbilityTarget::Unit(_))
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TargetingKind::None => "None",
            TargetingKind::Line => "Line",
            TargetingKind::Cone => "Cone",
            TargetingKind::Area => "Area",
            TargetingKind::Unit => "Unit",
        }
    }
}

/// A resolved target: a spatial point or an entity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AbilityTarget {
    Point(Vec2),
    Unit(Entity),
}

/// Something an ability asks the world to do on its behalf.
#[derive(Clone, Debug, PartialEq)]
pub enum AbilityEffect {
    /// Step the owner by a grid offset
    Move { offset: IVec2 },
    /// Restore health on the owner
    Heal { amount: f32 },
    /// Fire a projectile from the owner along `direction`
    Projectile { direction: Vec2 },
    /// Place the owner at a world point
    Teleport { destination: Vec2 },
    /// Apply a timed mark to another unit
    Mark { target: Entity, duration: f32 },
}

/// What a capability can see of the slot running it, plus its effect outbox.
pub struct AbilityContext<'a> {
    /// Entity owning the slot (weak: it may already be gone)
    pub owner: Option<Entity>,
    /// Index of the slot running the ability
    pub slot_index: usize,
    effects: &'a mut Vec<AbilityEffect>,
}

impl<'a> AbilityContext<'a> {
    pub fn new(owner: Option<Entity>, slot_index: usize, effects: &'a mut Vec<AbilityEffect>) -> Self {
        Self {
            owner,
            slot_index,
            effects,
        }
    }

    /// Queue an effect for the host to resolve
    pub fn emit(&mut self, effect: AbilityEffect) {
        self.effects.push(effect);
    }
}

/// Contract every ability type satisfies.
///
/// `activate` and `tick` return whether the ability is still running. A
/// `false` result is not an error: it is the ability saying its effect has
/// concluded (or could not start), and the slot goes on cooldown.
pub trait AbilityCapability: Send + Sync + 'static {
    /// Display name
    fn name(&self) -> &str;

    /// Icon reference for the UI
    fn icon(&self) -> &str;

    /// Input required before activation
    fn targeting(&self) -> TargetingKind;

    /// Run the ability. `target` is `None` for [`TargetingKind::None`] abilities
    /// and otherwise matches [`Self::targeting`].
    fn activate(&mut self, ctx: &mut AbilityContext, target: Option<AbilityTarget>) -> bool;

    /// Continue a running ability. `dt` is already time-scaled.
    fn tick(&mut self, _ctx: &mut AbilityContext, _dt: f32) -> bool {
        false
    }
}
