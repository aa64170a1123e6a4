//! Built-in ability catalogue
//!
//! A small closed set of ability kinds used by the default deck. Each kind maps
//! to one targeting kind; the behaviour only emits [`AbilityEffect`]s and never
//! resolves them.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::capability::{AbilityCapability, AbilityContext, AbilityEffect, AbilityTarget, TargetingKind};
use super::deck::{AbilityFactory, DrawContext};

/// Behaviour of a catalogue ability, as written in the deck config.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum AbilityKind {
    /// Step one grid offset (instant)
    Move { dx: i32, dy: i32 },
    /// Heal the owner (instant)
    Heal { amount: f32 },
    /// Fan of projectiles fired over several ticks
    SpreadShot {
        shots: u32,
        spread_degrees: f32,
        interval: f32,
    },
    /// Teleport to a chosen point (instant)
    Blink,
    /// Mark a unit and hold the slot until the mark expires
    Mark { duration: f32 },
}

impl AbilityKind {
    pub fn targeting(&self) -> TargetingKind {
        match self {
            AbilityKind::Move { .. } | AbilityKind::Heal { .. } => TargetingKind::None,
            AbilityKind::SpreadShot { .. } => TargetingKind::Cone,
            AbilityKind::Blink => TargetingKind::Area,
            AbilityKind::Mark { .. } => TargetingKind::Unit,
        }
    }
}

/// A named, iconed catalogue template.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogueEntry {
    pub name: String,
    pub icon: String,
    pub kind: AbilityKind,
    /// Not drawn while another slot of the same owner holds it
    #[serde(default)]
    pub unique: bool,
}

impl CatalogueEntry {
    pub fn new(name: &str, icon: &str, kind: AbilityKind) -> Self {
        Self {
            name: name.to_string(),
            icon: icon.to_string(),
            kind,
            unique: false,
        }
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

impl AbilityFactory for CatalogueEntry {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_eligible(&self, ctx: &DrawContext) -> bool {
        if self.unique && ctx.holds(&self.name) {
            return false;
        }
        match self.kind {
            // Don't deal a move that would walk off the grid
            AbilityKind::Move { dx, dy } => ctx.bounds.contains(ctx.position + IVec2::new(dx, dy)),
            _ => true,
        }
    }

    fn create(&self, _ctx: &DrawContext) -> Box<dyn AbilityCapability> {
        let behaviour = match self.kind {
            AbilityKind::Move { dx, dy } => Behaviour::Move {
                offset: IVec2::new(dx, dy),
            },
            AbilityKind::Heal { amount } => Behaviour::Heal { amount },
            AbilityKind::SpreadShot {
                shots,
                spread_degrees,
                interval,
            } => Behaviour::SpreadShot(SpreadShot {
                shots,
                spread: spread_degrees.to_radians(),
                interval,
                fired: 0,
                timer: 0.0,
                direction: Vec2::ZERO,
            }),
            AbilityKind::Blink => Behaviour::Blink,
            AbilityKind::Mark { duration } => Behaviour::Mark { remaining: duration },
        };

        Box::new(CatalogueAbility {
            name: self.name.clone(),
            icon: self.icon.clone(),
            targeting: self.kind.targeting(),
            behaviour,
        })
    }
}

/// Running state of a spread shot
#[derive(Clone, Debug)]
struct SpreadShot {
    shots: u32,
    spread: f32,
    interval: f32,
    fired: u32,
    timer: f32,
    direction: Vec2,
}

impl SpreadShot {
    fn fire_next(&mut self, ctx: &mut AbilityContext) {
        let angle = if self.shots > 1 {
            -self.spread / 2.0 + self.spread * self.fired as f32 / (self.shots - 1) as f32
        } else {
            0.0
        };
        ctx.emit(AbilityEffect::Projectile {
            direction: Vec2::from_angle(angle).rotate(self.direction),
        });
        self.fired += 1;
    }

    fn finished(&self) -> bool {
        self.fired >= self.shots
    }
}

#[derive(Clone, Debug)]
enum Behaviour {
    Move { offset: IVec2 },
    Heal { amount: f32 },
    SpreadShot(SpreadShot),
    Blink,
    Mark { remaining: f32 },
}

/// Capability built from a [`CatalogueEntry`].
pub struct CatalogueAbility {
    name: String,
    icon: String,
    targeting: TargetingKind,
    behaviour: Behaviour,
}

impl AbilityCapability for CatalogueAbility {
    fn name(&self) -> &str {
        &self.name
    }

    fn icon(&self) -> &str {
        &self.icon
    }

    fn targeting(&self) -> TargetingKind {
        self.targeting
    }

    fn activate(&mut self, ctx: &mut AbilityContext, target: Option<AbilityTarget>) -> bool {
        match (&mut self.behaviour, target) {
            (Behaviour::Move { offset }, _) => {
                ctx.emit(AbilityEffect::Move { offset: *offset });
                false
            }
            (Behaviour::Heal { amount }, _) => {
                ctx.emit(AbilityEffect::Heal { amount: *amount });
                false
            }
            (Behaviour::SpreadShot(shot), Some(AbilityTarget::Point(aim))) => {
                // A zero aim has no direction to fire along
                let Some(direction) = aim.try_normalize() else {
                    return false;
                };
                shot.direction = direction;
                shot.fire_next(ctx);
                !shot.finished()
            }
            (Behaviour::Blink, Some(AbilityTarget::Point(destination))) => {
                ctx.emit(AbilityEffect::Teleport { destination });
                false
            }
            (Behaviour::Mark { remaining }, Some(AbilityTarget::Unit(target))) => {
                ctx.emit(AbilityEffect::Mark {
                    target,
                    duration: *remaining,
                });
                *remaining > 0.0
            }
            _ => false,
        }
    }

    fn tick(&mut self, ctx: &mut AbilityContext, dt: f32) -> bool {
        match &mut self.behaviour {
            Behaviour::SpreadShot(shot) => {
                shot.timer += dt;
                while shot.timer >= shot.interval && !shot.finished() {
                    shot.timer -= shot.interval;
                    shot.fire_next(ctx);
                }
                !shot.finished()
            }
            Behaviour::Mark { remaining } => {
                *remaining -= dt;
                *remaining > 0.0
            }
            _ => false,
        }
    }
}

/// The deck the prototype ships with: four moves, a heal and a spread shot,
/// plus one area and one unit ability so every targeting kind gets dealt.
pub fn default_catalogue() -> Vec<(CatalogueEntry, f32)> {
    vec![
        (CatalogueEntry::new("Move Left", "move_left", AbilityKind::Move { dx: -1, dy: 0 }), 5.0),
        (CatalogueEntry::new("Move Right", "move_right", AbilityKind::Move { dx: 1, dy: 0 }), 5.0),
        (CatalogueEntry::new("Move Forward", "move_forward", AbilityKind::Move { dx: 0, dy: 1 }), 1.0),
        (CatalogueEntry::new("Move Back", "move_back", AbilityKind::Move { dx: 0, dy: -1 }), 1.0),
        (CatalogueEntry::new("Heal", "heal", AbilityKind::Heal { amount: 35.0 }), 3.0),
        (
            CatalogueEntry::new(
                "Spread Shot",
                "spread_shot",
                AbilityKind::SpreadShot {
                    shots: 5,
                    spread_degrees: 60.0,
                    interval: 0.1,
                },
            ),
            4.0,
        ),
        (CatalogueEntry::new("Blink", "blink", AbilityKind::Blink).unique(), 2.0),
        (CatalogueEntry::new("Mark", "mark", AbilityKind::Mark { duration: 3.0 }).unique(), 2.0),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context_at(position: IVec2) -> DrawContext {
        DrawContext {
            position,
            ..default()
        }
    }

    #[test]
    fn test_move_off_grid_is_not_eligible() {
        let left = CatalogueEntry::new("Move Left", "l", AbilityKind::Move { dx: -1, dy: 0 });
        assert!(!left.is_eligible(&context_at(IVec2::new(0, 3))));
        assert!(left.is_eligible(&context_at(IVec2::new(1, 3))));
    }

    #[test]
    fn test_unique_entry_not_dealt_twice() {
        let blink = CatalogueEntry::new("Blink", "b", AbilityKind::Blink).unique();
        let mut ctx = context_at(IVec2::ZERO);
        assert!(blink.is_eligible(&ctx));
        ctx.held.push("Blink".to_string());
        assert!(!blink.is_eligible(&ctx));
    }

    #[test]
    fn test_spread_shot_fires_over_ticks() {
        let entry = CatalogueEntry::new(
            "Spread Shot",
            "s",
            AbilityKind::SpreadShot {
                shots: 3,
                spread_degrees: 90.0,
                interval: 0.1,
            },
        );
        let mut ability = entry.create(&DrawContext::default());
        assert_eq!(ability.targeting(), TargetingKind::Cone);

        let mut effects = Vec::new();
        let mut ctx = AbilityContext::new(None, 0, &mut effects);
        assert!(ability.activate(&mut ctx, Some(AbilityTarget::Point(Vec2::new(2.0, 0.0)))));
        assert!(!ability.tick(&mut ctx, 0.25));
        assert_eq!(effects.len(), 3);

        let AbilityEffect::Projectile { direction } = effects[1] else {
            panic!("expected a projectile, got {:?}", effects[1]);
        };
        assert!((direction - Vec2::X).length() < 1e-5, "middle shot should fly straight");
    }

    #[test]
    fn test_spread_shot_with_zero_aim_fails_to_start() {
        let entry = CatalogueEntry::new(
            "Spread Shot",
            "s",
            AbilityKind::SpreadShot {
                shots: 3,
                spread_degrees: 90.0,
                interval: 0.1,
            },
        );
        let mut ability = entry.create(&DrawContext::default());
        let mut effects = Vec::new();
        let mut ctx = AbilityContext::new(None, 0, &mut effects);
        assert!(!ability.activate(&mut ctx, Some(AbilityTarget::Point(Vec2::ZERO))));
        assert!(effects.is_empty());
    }

    #[test]
    fn test_mark_holds_until_expired() {
        let entry = CatalogueEntry::new("Mark", "m", AbilityKind::Mark { duration: 1.0 });
        let mut ability = entry.create(&DrawContext::default());
        let mut effects = Vec::new();
        let mut ctx = AbilityContext::new(None, 0, &mut effects);
        let target = Entity::from_raw(4);
        assert!(ability.activate(&mut ctx, Some(AbilityTarget::Unit(target))));
        assert!(ability.tick(&mut ctx, 0.5));
        assert!(!ability.tick(&mut ctx, 0.6));
        assert_eq!(effects, vec![AbilityEffect::Mark { target, duration: 1.0 }]);
    }

    #[test]
    fn test_default_catalogue_covers_every_targeting_kind() {
        let kinds: Vec<_> = default_catalogue()
            .iter()
            .map(|(entry, _)| entry.kind.targeting())
            .collect();
        for kind in [
            TargetingKind::None,
            TargetingKind::Cone,
            TargetingKind::Area,
            TargetingKind::Unit,
        ] {
            assert!(kinds.contains(&kind), "missing {:?}", kind);
        }
    }
}
