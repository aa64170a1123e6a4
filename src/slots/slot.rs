//! Ability slot state machine
//!
//! A slot holds at most one ability and is always in exactly one of three
//! states:
//!
//! - **Idle**: nothing running. May hold an ability ready to activate, or be
//!   empty and counting down a cooldown.
//! - **AwaitingTarget**: the held ability needs a point or a unit and a
//!   [`TargetingSession`] is pending.
//! - **Active**: the ability is running and is ticked every frame.
//!
//! Invariants: an empty slot is Idle, and a slot on cooldown is empty.
//!
//! There are two cooldowns. Using an ability (or the ability ending by
//! itself) puts the slot on the full cooldown; discarding an unused ability
//! with a shuffle puts it on the shorter shuffle cooldown and sets
//! `just_shuffled` so progress can be shown against the right duration.

use bevy::prelude::*;

use super::targeting::{SessionId, TargetingHost, TargetingSession};
use super::tuning::SlotTuning;
use crate::abilities::capability::{
    AbilityCapability, AbilityContext, AbilityEffect, AbilityTarget, TargetingKind,
};

/// Current state of a slot
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SlotState {
    #[default]
    Idle,
    AwaitingTarget,
    Active,
}

impl SlotState {
    pub fn as_str(self) -> &'static str {
        match self {
            SlotState::Idle => "Idle",
            SlotState::AwaitingTarget => "Awaiting target",
            SlotState::Active => "Active",
        }
    }
}

/// Outcome of a slot tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotTick {
    /// Nothing running
    Inactive,
    /// The ability ran and wants to keep running
    Active,
    /// The ability ran and concluded; the slot is now on cooldown
    Concluded,
    /// The cooldown just reached zero. Reported once per cooldown.
    CooldownEnded,
}

/// Outbound channels a slot writes to while transitioning.
pub struct SlotIo<'a> {
    /// Effects emitted by the held ability
    pub effects: &'a mut Vec<AbilityEffect>,
    /// Where pending sessions are closed
    pub targeting: &'a mut dyn TargetingHost,
}

/// One ability container.
pub struct AbilitySlot {
    index: usize,
    owner: Option<Entity>,
    state: SlotState,
    ability: Option<Box<dyn AbilityCapability>>,
    cooldown_remaining: f64,
    just_shuffled: bool,
    session: Option<TargetingSession>,
    cooldown_time: f64,
    shuffle_cooldown_time: f64,
}

impl AbilitySlot {
    /// A new empty slot, off cooldown
    pub fn new(index: usize, owner: Option<Entity>, tuning: &SlotTuning) -> Self {
        Self {
            index,
            owner,
            state: SlotState::Idle,
            ability: None,
            cooldown_remaining: 0.0,
            just_shuffled: false,
            session: None,
            cooldown_time: tuning.cooldown_time,
            shuffle_cooldown_time: tuning.shuffle_cooldown_time,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn owner(&self) -> Option<Entity> {
        self.owner
    }

    pub fn state(&self) -> SlotState {
        self.state
    }

    pub fn ability(&self) -> Option<&dyn AbilityCapability> {
        self.ability.as_deref()
    }

    pub fn has_ability(&self) -> bool {
        self.ability.is_some()
    }

    pub fn cooldown_remaining(&self) -> f64 {
        self.cooldown_remaining
    }

    pub fn is_on_cooldown(&self) -> bool {
        self.cooldown_remaining > 0.0
    }

    pub fn just_shuffled(&self) -> bool {
        self.just_shuffled
    }

    pub fn session(&self) -> Option<&TargetingSession> {
        self.session.as_ref()
    }

    /// Targeting the slot is currently waiting on, `None` unless awaiting a target
    pub fn pending_targeting(&self) -> TargetingKind {
        match (&self.ability, self.state) {
            (Some(ability), SlotState::AwaitingTarget) => ability.targeting(),
            _ => TargetingKind::None,
        }
    }

    /// Cooldown progress in [0, 1]: 0 right after the cooldown started, 1 when ready.
    pub fn cooldown_progress(&self) -> f32 {
        let duration = if self.just_shuffled {
            self.shuffle_cooldown_time
        } else {
            self.cooldown_time
        };
        (1.0 - self.cooldown_remaining / duration).clamp(0.0, 1.0) as f32
    }

    /// Put an ability in the slot.
    ///
    /// Rejected (and dropped) while the slot is on cooldown. Otherwise always
    /// accepted: any previous ability and pending session are discarded and
    /// the slot returns to Idle.
    pub fn assign(&mut self, ability: Box<dyn AbilityCapability>, io: &mut SlotIo) -> bool {
        if self.is_on_cooldown() {
            return false;
        }
        self.replace_session(None, io);
        self.ability = Some(ability);
        self.state = SlotState::Idle;
        true
    }

    /// Activate the held ability.
    ///
    /// Only valid from Idle with an ability. Abilities without targeting run
    /// immediately; the rest move the slot to AwaitingTarget and the returned
    /// kind tells the caller which session to open.
    pub fn activate(&mut self, io: &mut SlotIo) -> TargetingKind {
        if self.state != SlotState::Idle {
            return TargetingKind::None;
        }
        let Some(ability) = self.ability.as_mut() else {
            return TargetingKind::None;
        };

        let targeting = ability.targeting();
        if targeting.requires_target() {
            self.state = SlotState::AwaitingTarget;
            return targeting;
        }

        self.state = SlotState::Active;
        self.just_shuffled = false;
        let mut ctx = AbilityContext::new(self.owner, self.index, io.effects);
        if !ability.activate(&mut ctx, None) {
            self.clear(true, io);
        }
        TargetingKind::None
    }

    /// Deliver a target to an ability waiting for one.
    ///
    /// Ignored unless the slot is awaiting a target and `target` has the
    /// shape the ability asked for. On a match the pending session is closed
    /// and the ability runs. Returns whether the target was taken.
    pub fn set_target(&mut self, target: AbilityTarget, io: &mut SlotIo) -> bool {
        if self.state != SlotState::AwaitingTarget {
            return false;
        }
        let accepted = self
            .ability
            .as_ref()
            .is_some_and(|ability| ability.targeting().accepts(&target));
        if !accepted {
            return false;
        }

        self.replace_session(None, io);
        self.state = SlotState::Active;
        self.just_shuffled = false;

        let persists = match self.ability.as_mut() {
            Some(ability) => {
                let mut ctx = AbilityContext::new(self.owner, self.index, io.effects);
                ability.activate(&mut ctx, Some(target))
            }
            None => false,
        };
        if !persists {
            self.clear(true, io);
        }
        true
    }

    /// Attach the session opened for the current target request.
    ///
    /// Any previous session is closed first. A session offered while the slot
    /// is not awaiting a target is closed straight away.
    pub fn attach_session(&mut self, session: TargetingSession, io: &mut SlotIo) {
        if self.state == SlotState::AwaitingTarget {
            self.replace_session(Some(session), io);
        } else {
            io.targeting.close(session);
        }
    }

    /// Advance the slot by `dt` seconds scaled by `time_scale`.
    pub fn tick(&mut self, dt: f64, time_scale: f64, io: &mut SlotIo) -> SlotTick {
        let dt = dt * time_scale;
        match self.state {
            SlotState::Idle if self.ability.is_none() && self.cooldown_remaining > 0.0 => {
                self.cooldown_remaining -= dt;
                if self.cooldown_remaining <= 0.0 {
                    self.cooldown_remaining = 0.0;
                    self.just_shuffled = false;
                    return SlotTick::CooldownEnded;
                }
                SlotTick::Inactive
            }
            SlotState::Active => {
                let running = match self.ability.as_mut() {
                    Some(ability) => {
                        let mut ctx = AbilityContext::new(self.owner, self.index, io.effects);
                        ability.tick(&mut ctx, dt as f32)
                    }
                    None => return SlotTick::Inactive,
                };
                if running {
                    SlotTick::Active
                } else {
                    self.clear(true, io);
                    SlotTick::Concluded
                }
            }
            _ => SlotTick::Inactive,
        }
    }

    /// Empty the slot, optionally starting the full cooldown.
    pub fn clear(&mut self, on_cooldown: bool, io: &mut SlotIo) {
        self.replace_session(None, io);
        self.ability = None;
        self.state = SlotState::Idle;
        self.just_shuffled = false;
        self.cooldown_remaining = if on_cooldown { self.cooldown_time } else { 0.0 };
    }

    /// Discard the held ability (if any) and start the shuffle cooldown.
    pub fn clear_for_shuffle(&mut self, io: &mut SlotIo) {
        self.replace_session(None, io);
        self.ability = None;
        self.state = SlotState::Idle;
        self.cooldown_remaining = self.shuffle_cooldown_time;
        self.just_shuffled = true;
    }

    /// True if the pending session has the given id
    pub(crate) fn matches_session(&self, id: SessionId) -> bool {
        self.session.as_ref().is_some_and(|session| session.id() == id)
    }

    // The old session is always closed before the field is overwritten
    fn replace_session(&mut self, session: Option<TargetingSession>, io: &mut SlotIo) {
        if let Some(old) = std::mem::replace(&mut self.session, session) {
            io.targeting.close(old);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slots::targeting::{RecordingTargeting, SessionShape};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Scriptable ability for exercising the state machine
    struct Counting {
        targeting: TargetingKind,
        persists: bool,
        ticks_left: u32,
        activations: Arc<AtomicUsize>,
    }

    impl Counting {
        fn boxed(targeting: TargetingKind, persists: bool, ticks: u32) -> (Box<dyn AbilityCapability>, Arc<AtomicUsize>) {
            let activations = Arc::new(AtomicUsize::new(0));
            let ability = Counting {
                targeting,
                persists,
                ticks_left: ticks,
                activations: activations.clone(),
            };
            (Box::new(ability), activations)
        }
    }

    impl AbilityCapability for Counting {
        fn name(&self) -> &str {
            "Counting"
        }
        fn icon(&self) -> &str {
            "counting"
        }
        fn targeting(&self) -> TargetingKind {
            self.targeting
        }
        fn activate(&mut self, ctx: &mut AbilityContext, _target: Option<AbilityTarget>) -> bool {
            self.activations.fetch_add(1, Ordering::SeqCst);
            ctx.emit(AbilityEffect::Heal { amount: 1.0 });
            self.persists
        }
        fn tick(&mut self, _ctx: &mut AbilityContext, _dt: f32) -> bool {
            self.ticks_left = self.ticks_left.saturating_sub(1);
            self.ticks_left > 0
        }
    }

    /// Runs forever and records every dt it is ticked with
    struct DtRecorder {
        seen: Arc<std::sync::Mutex<Vec<f32>>>,
    }

    impl AbilityCapability for DtRecorder {
        fn name(&self) -> &str {
            "Recorder"
        }
        fn icon(&self) -> &str {
            "recorder"
        }
        fn targeting(&self) -> TargetingKind {
            TargetingKind::None
        }
        fn activate(&mut self, _ctx: &mut AbilityContext, _target: Option<AbilityTarget>) -> bool {
            true
        }
        fn tick(&mut self, _ctx: &mut AbilityContext, dt: f32) -> bool {
            if let Ok(mut seen) = self.seen.lock() {
                seen.push(dt);
            }
            true
        }
    }

    struct Harness {
        effects: Vec<AbilityEffect>,
        targeting: RecordingTargeting,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                effects: Vec::new(),
                targeting: RecordingTargeting::default(),
            }
        }

        fn io(&mut self) -> SlotIo<'_> {
            SlotIo {
                effects: &mut self.effects,
                targeting: &mut self.targeting,
            }
        }
    }

    fn slot() -> AbilitySlot {
        AbilitySlot::new(0, None, &SlotTuning::default())
    }

    fn assert_invariants(slot: &AbilitySlot) {
        if !slot.has_ability() {
            assert_eq!(slot.state(), SlotState::Idle);
        }
        if slot.is_on_cooldown() {
            assert!(!slot.has_ability());
        }
        assert!(slot.cooldown_remaining() >= 0.0);
    }

    #[test]
    fn test_instant_ability_goes_on_full_cooldown() {
        let mut h = Harness::new();
        let mut slot = slot();
        let (ability, activations) = Counting::boxed(TargetingKind::None, false, 0);
        assert!(slot.assign(ability, &mut h.io()));

        assert_eq!(slot.activate(&mut h.io()), TargetingKind::None);
        assert_eq!(activations.load(Ordering::SeqCst), 1);
        assert_eq!(slot.state(), SlotState::Idle);
        assert_eq!(slot.cooldown_remaining(), SlotTuning::default().cooldown_time);
        assert!(!slot.just_shuffled());
        assert_eq!(h.effects.len(), 1);
        assert_invariants(&slot);
    }

    #[test]
    fn test_persistent_ability_stays_active_until_it_concludes() {
        let mut h = Harness::new();
        let mut slot = slot();
        let (ability, _) = Counting::boxed(TargetingKind::None, true, 2);
        slot.assign(ability, &mut h.io());

        slot.activate(&mut h.io());
        assert_eq!(slot.state(), SlotState::Active);
        assert_eq!(slot.tick(0.1, 1.0, &mut h.io()), SlotTick::Active);
        assert_eq!(slot.tick(0.1, 1.0, &mut h.io()), SlotTick::Concluded);
        assert_eq!(slot.state(), SlotState::Idle);
        assert!(slot.is_on_cooldown());
        assert_invariants(&slot);
    }

    #[test]
    fn test_targeted_ability_waits_for_target() {
        let mut h = Harness::new();
        let mut slot = slot();
        let (ability, activations) = Counting::boxed(TargetingKind::Area, true, 5);
        slot.assign(ability, &mut h.io());

        assert_eq!(slot.activate(&mut h.io()), TargetingKind::Area);
        assert_eq!(slot.state(), SlotState::AwaitingTarget);
        assert_eq!(slot.pending_targeting(), TargetingKind::Area);
        assert_eq!(activations.load(Ordering::SeqCst), 0);

        // Waiting does not tick
        assert_eq!(slot.tick(1.0, 1.0, &mut h.io()), SlotTick::Inactive);

        assert!(slot.set_target(AbilityTarget::Point(Vec2::new(2.0, 3.0)), &mut h.io()));
        assert_eq!(slot.state(), SlotState::Active);
        assert_eq!(activations.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_mismatched_target_is_ignored() {
        let mut h = Harness::new();
        let mut slot = slot();
        let (ability, activations) = Counting::boxed(TargetingKind::Unit, true, 5);
        slot.assign(ability, &mut h.io());
        slot.activate(&mut h.io());

        assert!(!slot.set_target(AbilityTarget::Point(Vec2::ONE), &mut h.io()));
        assert_eq!(slot.state(), SlotState::AwaitingTarget);
        assert_eq!(activations.load(Ordering::SeqCst), 0);

        assert!(slot.set_target(AbilityTarget::Unit(Entity::from_raw(3)), &mut h.io()));
        assert_eq!(slot.state(), SlotState::Active);
    }

    #[test]
    fn test_set_target_outside_awaiting_is_ignored() {
        let mut h = Harness::new();
        let mut slot = slot();
        let (ability, activations) = Counting::boxed(TargetingKind::Area, true, 5);
        slot.assign(ability, &mut h.io());

        assert!(!slot.set_target(AbilityTarget::Point(Vec2::ONE), &mut h.io()));
        assert_eq!(slot.state(), SlotState::Idle);
        assert_eq!(activations.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_target_that_fails_to_start_clears_slot() {
        let mut h = Harness::new();
        let mut slot = slot();
        let (ability, _) = Counting::boxed(TargetingKind::Cone, false, 0);
        slot.assign(ability, &mut h.io());
        slot.activate(&mut h.io());
        slot.set_target(AbilityTarget::Point(Vec2::X), &mut h.io());
        assert_eq!(slot.state(), SlotState::Idle);
        assert!(!slot.has_ability());
        assert_eq!(slot.cooldown_remaining(), SlotTuning::default().cooldown_time);
    }

    #[test]
    fn test_assign_rejected_while_on_cooldown() {
        let mut h = Harness::new();
        let mut slot = slot();
        slot.clear(true, &mut h.io());

        let (ability, _) = Counting::boxed(TargetingKind::None, false, 0);
        assert!(!slot.assign(ability, &mut h.io()));
        assert!(!slot.has_ability());
        assert_invariants(&slot);
    }

    #[test]
    fn test_cooldown_ends_exactly_once() {
        let mut h = Harness::new();
        let mut slot = slot();
        slot.clear(true, &mut h.io());

        let mut ended = 0;
        for _ in 0..100 {
            if slot.tick(0.1, 1.0, &mut h.io()) == SlotTick::CooldownEnded {
                ended += 1;
            }
            assert_invariants(&slot);
        }
        assert_eq!(ended, 1);
        assert_eq!(slot.cooldown_remaining(), 0.0);
    }

    #[test]
    fn test_time_scale_applies_to_cooldown() {
        let mut h = Harness::new();
        let mut slot = slot();
        slot.clear(true, &mut h.io());
        slot.tick(0.5, 2.0, &mut h.io());
        assert!((slot.cooldown_remaining() - 1.5).abs() < 1e-5);
        assert_eq!(slot.tick(1.0, 0.0, &mut h.io()), SlotTick::Inactive, "paused time stands still");
        assert!((slot.cooldown_remaining() - 1.5).abs() < 1e-5);
    }

    #[test]
    fn test_time_scale_applies_to_running_ability() {
        let mut h = Harness::new();
        let mut slot = slot();
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        slot.assign(Box::new(DtRecorder { seen: seen.clone() }), &mut h.io());
        slot.activate(&mut h.io());
        assert_eq!(slot.state(), SlotState::Active);

        assert_eq!(slot.tick(0.25, 2.0, &mut h.io()), SlotTick::Active);
        assert_eq!(slot.tick(0.25, 0.0, &mut h.io()), SlotTick::Active);
        assert_eq!(*seen.lock().unwrap(), vec![0.5, 0.0], "paused time hands the ability no time");
        assert_eq!(slot.state(), SlotState::Active);
    }

    #[test]
    fn test_shuffle_uses_short_cooldown() {
        let mut h = Harness::new();
        let mut slot = slot();
        let (ability, _) = Counting::boxed(TargetingKind::None, false, 0);
        slot.assign(ability, &mut h.io());

        slot.clear_for_shuffle(&mut h.io());
        let tuning = SlotTuning::default();
        assert_eq!(slot.cooldown_remaining(), tuning.shuffle_cooldown_time);
        assert!(slot.just_shuffled());
        assert!(!slot.has_ability());
        assert_eq!(slot.cooldown_progress(), 0.0);

        slot.tick(tuning.shuffle_cooldown_time / 2.0, 1.0, &mut h.io());
        assert!((slot.cooldown_progress() - 0.5).abs() < 1e-5);

        assert_eq!(slot.tick(1.0, 1.0, &mut h.io()), SlotTick::CooldownEnded);
        assert!(!slot.just_shuffled());
        assert_eq!(slot.cooldown_progress(), 1.0);
    }

    #[test]
    fn test_clear_without_cooldown_resets_timer() {
        let mut h = Harness::new();
        let mut slot = slot();
        slot.clear_for_shuffle(&mut h.io());
        slot.clear(false, &mut h.io());
        assert_eq!(slot.cooldown_remaining(), 0.0);
        assert!(!slot.just_shuffled());
    }

    #[test]
    fn test_clearing_closes_pending_session() {
        let mut h = Harness::new();
        let mut slot = slot();
        let (ability, activations) = Counting::boxed(TargetingKind::Line, true, 5);
        slot.assign(ability, &mut h.io());
        slot.activate(&mut h.io());
        slot.attach_session(
            TargetingSession::new(SessionId(7), SessionShape::Direction, None),
            &mut h.io(),
        );
        assert!(slot.matches_session(SessionId(7)));

        slot.clear_for_shuffle(&mut h.io());
        assert_eq!(h.targeting.closed, vec![SessionId(7)]);
        assert!(slot.session().is_none());
        assert!(!slot.matches_session(SessionId(7)));
        assert_eq!(activations.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_replacing_session_closes_old_one() {
        let mut h = Harness::new();
        let mut slot = slot();
        let (ability, _) = Counting::boxed(TargetingKind::Area, true, 5);
        slot.assign(ability, &mut h.io());
        slot.activate(&mut h.io());

        slot.attach_session(TargetingSession::new(SessionId(1), SessionShape::Position, None), &mut h.io());
        slot.attach_session(TargetingSession::new(SessionId(2), SessionShape::Position, None), &mut h.io());
        assert_eq!(h.targeting.closed, vec![SessionId(1)]);
        assert!(slot.matches_session(SessionId(2)));
    }

    #[test]
    fn test_session_offered_to_idle_slot_is_closed() {
        let mut h = Harness::new();
        let mut slot = slot();
        slot.attach_session(TargetingSession::new(SessionId(4), SessionShape::Unit, None), &mut h.io());
        assert!(slot.session().is_none());
        assert_eq!(h.targeting.closed, vec![SessionId(4)]);
    }

    #[test]
    fn test_activate_on_empty_slot_does_nothing() {
        let mut h = Harness::new();
        let mut slot = slot();
        assert_eq!(slot.activate(&mut h.io()), TargetingKind::None);
        assert_eq!(slot.state(), SlotState::Idle);
        assert!(!slot.is_on_cooldown());
    }
}
