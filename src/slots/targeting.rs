//! Targeting sessions
//!
//! A targeting session is a parked activation: the slot holds an ability that
//! needs a point or a unit, and waits until the host reports one. Sessions are
//! identified by a [`SessionId`]; a resolution is only delivered to the slot
//! whose current session carries that id, so a resolution arriving after the
//! slot was cleared or re-targeted is simply dropped.
//!
//! The host supplies the visuals through [`TargetingHost`]: it opens one per
//! request (direction, position or unit picker) and closes it when the slot
//! lets go of the session.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::abilities::capability::TargetingKind;

/// Unique id of a targeting session within one slot set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub u64);

/// Kind of picker a session needs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionShape {
    /// Aim a direction (Line and Cone abilities)
    Direction,
    /// Pick a ground position (Area abilities)
    Position,
    /// Pick a unit
    Unit,
}

impl SessionShape {
    pub fn for_kind(kind: TargetingKind) -> Option<Self> {
        match kind {
            TargetingKind::None => None,
            TargetingKind::Line | TargetingKind::Cone => Some(SessionShape::Direction),
            TargetingKind::Area => Some(SessionShape::Position),
            TargetingKind::Unit => Some(SessionShape::Unit),
        }
    }
}

/// What the host needs to open a session.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SessionRequest {
    pub id: SessionId,
    pub owner: Option<Entity>,
    pub slot_index: usize,
    pub shape: SessionShape,
}

/// A pending target request owned by one slot.
#[derive(Debug, PartialEq)]
pub struct TargetingSession {
    id: SessionId,
    shape: SessionShape,
    handle: Option<Entity>,
}

impl TargetingSession {
    pub fn new(id: SessionId, shape: SessionShape, handle: Option<Entity>) -> Self {
        Self { id, shape, handle }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn shape(&self) -> SessionShape {
        self.shape
    }

    /// Host-side visual for this session, if the host made one
    pub fn handle(&self) -> Option<Entity> {
        self.handle
    }
}

/// Host-side factory for targeting visuals.
///
/// `open` is called once per session; `close` is called exactly once for
/// every session, whether it resolved or was cancelled.
pub trait TargetingHost {
    /// Create the picker for `request`. Returning `None` is allowed (no
    /// visual for that shape); the session still waits for a resolution.
    fn open(&mut self, request: &SessionRequest) -> Option<Entity>;

    /// Tear down a session's picker
    fn close(&mut self, session: TargetingSession);
}

/// Host with no visuals at all
#[derive(Clone, Copy, Debug, Default)]
pub struct NoTargeting;

impl TargetingHost for NoTargeting {
    fn open(&mut self, _request: &SessionRequest) -> Option<Entity> {
        None
    }

    fn close(&mut self, _session: TargetingSession) {}
}

/// Host that records what it was asked to do. Handy for headless runs and tests.
#[derive(Clone, Debug, Default)]
pub struct RecordingTargeting {
    pub opened: Vec<SessionRequest>,
    pub closed: Vec<SessionId>,
}

impl RecordingTargeting {
    /// Sessions opened but not closed yet
    pub fn open_sessions(&self) -> Vec<SessionRequest> {
        self.opened
            .iter()
            .filter(|request| !self.closed.contains(&request.id))
            .copied()
            .collect()
    }
}

impl TargetingHost for RecordingTargeting {
    fn open(&mut self, request: &SessionRequest) -> Option<Entity> {
        self.opened.push(*request);
        None
    }

    fn close(&mut self, session: TargetingSession) {
        self.closed.push(session.id());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_for_kind() {
        assert_eq!(SessionShape::for_kind(TargetingKind::None), None);
        assert_eq!(SessionShape::for_kind(TargetingKind::Line), Some(SessionShape::Direction));
        assert_eq!(SessionShape::for_kind(TargetingKind::Cone), Some(SessionShape::Direction));
        assert_eq!(SessionShape::for_kind(TargetingKind::Area), Some(SessionShape::Position));
        assert_eq!(SessionShape::for_kind(TargetingKind::Unit), Some(SessionShape::Unit));
    }

    #[test]
    fn test_recording_host_tracks_open_sessions() {
        let mut host = RecordingTargeting::default();
        for id in 0..2 {
            host.open(&SessionRequest {
                id: SessionId(id),
                owner: None,
                slot_index: 0,
                shape: SessionShape::Unit,
            });
        }
        host.close(TargetingSession::new(SessionId(0), SessionShape::Unit, None));
        let open = host.open_sessions();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].id, SessionId(1));
    }
}
