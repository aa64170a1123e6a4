//! Slot set
//!
//! Owns a fixed number of [`AbilitySlot`]s for one entity and drives them:
//!
//! 1. Every slot ticks (cooldowns, running abilities). A slot whose cooldown
//!    ends is dealt a new ability from the deck.
//! 2. Input is processed for every slot. A release activates, a long hold
//!    shuffles.
//!
//! Ticking always happens before input within one update, so a slot refilled
//! this frame can already be activated by this frame's input.
//!
//! Targeting sessions are opened here when an activation needs a target, and
//! resolutions are routed back to the slot that owns the session.

use bevy::prelude::*;
use rand::RngCore;
use smallvec::SmallVec;

use super::constants::NUM_SLOTS;
use super::events::{SlotEvent, SlotEventKind};
use super::input::SlotButtons;
use super::slot::{AbilitySlot, SlotIo, SlotState, SlotTick};
use super::targeting::{
    NoTargeting, SessionId, SessionRequest, SessionShape, TargetingHost, TargetingSession,
};
use super::tuning::SlotTuning;
use crate::abilities::capability::{AbilityEffect, AbilityTarget, TargetingKind};
use crate::abilities::deck::{AbilityDeck, DrawContext, GridBounds};

/// Everything a set needs from its surroundings to tick and refill.
pub struct SlotEnv<'a> {
    pub deck: &'a AbilityDeck,
    pub rng: &'a mut dyn RngCore,
    pub targeting: &'a mut dyn TargetingHost,
    /// Grid cell of the owner, used as draw context
    pub position: IVec2,
    pub bounds: GridBounds,
}

/// The slots of one owner, with their hold-to-shuffle bookkeeping.
pub struct AbilitySlotSet {
    owner: Option<Entity>,
    slots: SmallVec<[AbilitySlot; NUM_SLOTS]>,
    held_time: SmallVec<[f64; NUM_SLOTS]>,
    needs_key_lift: SmallVec<[bool; NUM_SLOTS]>,
    hold_to_shuffle_time: f64,
    next_session: u64,
    /// Effects tagged with the slot that emitted them
    effects: Vec<(usize, AbilityEffect)>,
    events: Vec<SlotEvent>,
}

impl AbilitySlotSet {
    /// Build `tuning.slot_count` slots. Every slot starts empty on a full
    /// cooldown and is dealt its first ability when that cooldown ends.
    pub fn new(owner: Option<Entity>, tuning: &SlotTuning) -> Self {
        let count = tuning.slot_count;
        let mut set = Self {
            owner,
            slots: (0..count)
                .map(|index| AbilitySlot::new(index, owner, tuning))
                .collect(),
            held_time: SmallVec::from_elem(0.0, count),
            needs_key_lift: SmallVec::from_elem(false, count),
            hold_to_shuffle_time: tuning.hold_to_shuffle_time,
            next_session: 0,
            effects: Vec::new(),
            events: Vec::new(),
        };
        for index in 0..count {
            set.with_slot(index, &mut NoTargeting, |slot, io| slot.clear(true, io));
        }
        set
    }

    /// Input identifier for a slot (`"Ability1"` for slot 0)
    pub fn input_key(slot_index: usize) -> String {
        format!("Ability{}", slot_index + 1)
    }

    pub fn owner(&self) -> Option<Entity> {
        self.owner
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slot(&self, index: usize) -> Option<&AbilitySlot> {
        self.slots.get(index)
    }

    pub fn slots(&self) -> impl Iterator<Item = &AbilitySlot> {
        self.slots.iter()
    }

    // === Per-tick driver ===

    /// Tick every slot, then process each slot's input.
    pub fn update(&mut self, dt: f64, time_scale: f64, input: &[SlotButtons], env: &mut SlotEnv) {
        self.tick_slots(dt, time_scale, env);
        for index in 0..self.slots.len() {
            let buttons = input.get(index).copied().unwrap_or_default();
            self.process_input(index, buttons, dt, &mut *env.targeting);
        }
    }

    /// Tick every slot and refill the ones whose cooldown just ended.
    pub fn tick_slots(&mut self, dt: f64, time_scale: f64, env: &mut SlotEnv) {
        for index in 0..self.slots.len() {
            let tick = self.with_slot(index, &mut *env.targeting, |slot, io| {
                slot.tick(dt, time_scale, io)
            });
            match tick {
                Some(SlotTick::Concluded) => self.push_event(index, SlotEventKind::Concluded),
                Some(SlotTick::CooldownEnded) => {
                    self.push_event(index, SlotEventKind::CooldownEnded);
                    self.draw_ability(index, env);
                }
                _ => {}
            }
        }
    }

    /// Handle one frame of input for a slot.
    ///
    /// A release activates unless the key still has to be lifted after a
    /// shuffle. Holding accumulates unscaled time; once it reaches the
    /// hold-to-shuffle threshold the slot is shuffled and the key has to be
    /// lifted before it does anything else.
    pub fn process_input(
        &mut self,
        index: usize,
        buttons: SlotButtons,
        dt: f64,
        targeting: &mut dyn TargetingHost,
    ) {
        if index >= self.slots.len() {
            return;
        }

        if !self.needs_key_lift[index] && buttons.released {
            self.activate_ability(index, targeting);
        }

        if buttons.held {
            if !self.needs_key_lift[index] {
                self.held_time[index] += dt;
                if self.held_time[index] >= self.hold_to_shuffle_time {
                    self.shuffle_ability(index, targeting);
                    self.needs_key_lift[index] = true;
                }
            }
        } else if self.needs_key_lift[index] {
            self.held_time[index] = 0.0;
            self.needs_key_lift[index] = false;
        }
    }

    // === Slot operations ===

    /// Activate the ability in a slot and return the targeting it now waits on.
    ///
    /// When a target is needed a session is opened through `targeting`. Calling
    /// this again while the slot is already waiting re-opens the session; the
    /// previous one is closed first.
    pub fn activate_ability(&mut self, index: usize, targeting: &mut dyn TargetingHost) -> TargetingKind {
        let Some(held) = self.held_time.get_mut(index) else {
            return TargetingKind::None;
        };
        *held = 0.0;

        let outcome = self.with_slot(index, &mut *targeting, |slot, io| {
            let starting = match slot.state() {
                SlotState::Idle => slot.ability().map(|ability| ability.name().to_string()),
                _ => None,
            };
            slot.activate(io);
            (starting, slot.pending_targeting())
        });
        let Some((starting, pending)) = outcome else {
            return TargetingKind::None;
        };

        if pending.requires_target() {
            self.open_session(index, pending, targeting);
        } else if let Some(ability) = starting {
            self.push_event(index, SlotEventKind::Activated { ability });
        }
        pending
    }

    /// Discard whatever the slot holds and put it on the shuffle cooldown.
    ///
    /// Applies to empty slots too: the hold threshold is all it takes.
    pub fn shuffle_ability(&mut self, index: usize, targeting: &mut dyn TargetingHost) {
        let Some(held) = self.held_time.get_mut(index) else {
            return;
        };
        *held = 0.0;

        let discarded = self.with_slot(index, targeting, |slot, io| {
            let discarded = slot.ability().map(|ability| ability.name().to_string());
            slot.clear_for_shuffle(io);
            discarded
        });
        if let Some(discarded) = discarded {
            self.push_event(index, SlotEventKind::Shuffled { discarded });
        }
    }

    /// Deal a new ability into an empty slot. Returns whether one was dealt.
    ///
    /// A failed draw leaves the slot empty and off cooldown.
    pub fn draw_ability(&mut self, index: usize, env: &mut SlotEnv) -> bool {
        let Some(slot) = self.slots.get(index) else {
            return false;
        };
        if slot.has_ability() {
            return false;
        }

        let ctx = DrawContext {
            position: env.position,
            bounds: env.bounds,
            held: self
                .slots
                .iter()
                .filter(|other| other.index() != index)
                .filter_map(|other| other.ability().map(|ability| ability.name().to_string()))
                .collect(),
        };

        match env.deck.draw(&ctx, &mut *env.rng) {
            Ok(ability) => {
                let name = ability.name().to_string();
                let assigned = self
                    .with_slot(index, &mut *env.targeting, |slot, io| slot.assign(ability, io))
                    .unwrap_or(false);
                if assigned {
                    debug!("Slot {} dealt {}", index + 1, name);
                    self.push_event(index, SlotEventKind::Drawn { ability: name });
                }
                assigned
            }
            Err(e) => {
                warn!("Slot {} could not be refilled: {}", index + 1, e);
                self.push_event(
                    index,
                    SlotEventKind::DrawFailed {
                        reason: e.to_string(),
                    },
                );
                false
            }
        }
    }

    /// Hand a session result to the slot that owns the session.
    ///
    /// Returns false for stale sessions and for targets of the wrong shape.
    pub fn resolve_target(
        &mut self,
        session: SessionId,
        target: AbilityTarget,
        targeting: &mut dyn TargetingHost,
    ) -> bool {
        let Some(index) = self.slots.iter().position(|slot| slot.matches_session(session)) else {
            debug!("Dropping resolution for unknown session {:?}", session);
            return false;
        };

        let outcome = self.with_slot(index, targeting, |slot, io| {
            let name = slot.ability().map(|ability| ability.name().to_string());
            (slot.set_target(target, io), name)
        });
        let Some((true, name)) = outcome else {
            return false;
        };

        self.push_event(index, SlotEventKind::TargetAccepted { session });
        if let Some(ability) = name {
            self.push_event(index, SlotEventKind::Activated { ability });
        }
        true
    }

    /// Force a slot empty, cancelling any pending session
    pub fn clear_slot(&mut self, index: usize, on_cooldown: bool, targeting: &mut dyn TargetingHost) {
        self.with_slot(index, targeting, |slot, io| slot.clear(on_cooldown, io));
    }

    // === Queries ===

    pub fn ability_name(&self, index: usize) -> Option<&str> {
        self.slot(index)?.ability().map(|ability| ability.name())
    }

    pub fn ability_icon(&self, index: usize) -> Option<&str> {
        self.slot(index)?.ability().map(|ability| ability.icon())
    }

    /// Targeting a slot is waiting on (`None` when not waiting or invalid)
    pub fn targeting_for(&self, index: usize) -> TargetingKind {
        self.slot(index)
            .map(|slot| slot.pending_targeting())
            .unwrap_or_default()
    }

    /// Cooldown progress from 0 (just started) to 1 (ready). 1 for invalid slots.
    pub fn cooldown_progress(&self, index: usize) -> f32 {
        self.slot(index).map_or(1.0, |slot| slot.cooldown_progress())
    }

    pub fn needs_key_lift(&self, index: usize) -> bool {
        self.needs_key_lift.get(index).copied().unwrap_or(false)
    }

    pub fn held_time(&self, index: usize) -> f64 {
        self.held_time.get(index).copied().unwrap_or(0.0)
    }

    /// Take the effects emitted since the last drain, with their slot index
    pub fn drain_effects(&mut self) -> Vec<(usize, AbilityEffect)> {
        std::mem::take(&mut self.effects)
    }

    /// Take the slot events recorded since the last drain
    pub fn drain_events(&mut self) -> Vec<SlotEvent> {
        std::mem::take(&mut self.events)
    }

    fn open_session(&mut self, index: usize, kind: TargetingKind, targeting: &mut dyn TargetingHost) {
        let Some(shape) = SessionShape::for_kind(kind) else {
            return;
        };
        let id = SessionId(self.next_session);
        self.next_session += 1;

        let request = SessionRequest {
            id,
            owner: self.owner,
            slot_index: index,
            shape,
        };
        let handle = targeting.open(&request);
        self.with_slot(index, targeting, |slot, io| {
            slot.attach_session(TargetingSession::new(id, shape, handle), io)
        });
        self.push_event(
            index,
            SlotEventKind::TargetRequested {
                session: id,
                targeting: kind,
            },
        );
    }

    /// Run `f` on one slot, tagging whatever it emits with the slot index.
    /// `None` for an invalid index.
    fn with_slot<R>(
        &mut self,
        index: usize,
        targeting: &mut dyn TargetingHost,
        f: impl FnOnce(&mut AbilitySlot, &mut SlotIo) -> R,
    ) -> Option<R> {
        let slot = self.slots.get_mut(index)?;
        let mut emitted = Vec::new();
        let result = f(
            slot,
            &mut SlotIo {
                effects: &mut emitted,
                targeting,
            },
        );
        self.effects
            .extend(emitted.into_iter().map(|effect| (index, effect)));
        Some(result)
    }

    fn push_event(&mut self, slot: usize, kind: SlotEventKind) {
        self.events.push(SlotEvent {
            owner: self.owner,
            slot,
            kind,
        });
    }
}
