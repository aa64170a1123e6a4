//! Unit tests for slot log recording and queries
//!
//! These tests verify that the SlotLog correctly:
//! - Words every slot event consistently
//! - Stamps entries with the simulation time
//! - Filters by event type and by slot

use abilityslots::abilities::capability::TargetingKind;
use abilityslots::slots::events::{SlotEvent, SlotEventKind};
use abilityslots::slots::log::{SlotLog, SlotLogEventType};
use abilityslots::slots::targeting::SessionId;
use regex::Regex;

fn event(slot: usize, kind: SlotEventKind) -> SlotEvent {
    SlotEvent {
        owner: None,
        slot,
        kind,
    }
}

fn drawn(slot: usize, ability: &str) -> SlotEvent {
    event(
        slot,
        SlotEventKind::Drawn {
            ability: ability.to_string(),
        },
    )
}

fn create_test_log() -> SlotLog {
    let mut log = SlotLog::default();
    log.record(&drawn(0, "Heal"));
    log.elapsed = 1.5;
    log.record(&event(
        0,
        SlotEventKind::Activated {
            ability: "Heal".to_string(),
        },
    ));
    log.record(&drawn(3, "Blink"));
    log.elapsed = 2.0;
    log.record(&event(
        3,
        SlotEventKind::TargetRequested {
            session: SessionId(4),
            targeting: TargetingKind::Area,
        },
    ));
    log.record(&event(
        1,
        SlotEventKind::Shuffled {
            discarded: Some("Move Left".to_string()),
        },
    ));
    log
}

// =============================================================================
// Message Wording
// =============================================================================

#[test]
fn test_messages_name_slot_from_one() {
    let log = create_test_log();
    let pattern = Regex::new(r"^Slot [1-5] ").unwrap();
    for entry in &log.entries {
        assert!(pattern.is_match(&entry.message), "unexpected wording: {}", entry.message);
    }
    assert_eq!(log.entries[0].message, "Slot 1 drew Heal");
}

#[test]
fn test_targeting_message_names_kind_and_session() {
    let log = create_test_log();
    let targeting = log.filter_by_type(SlotLogEventType::Targeting);
    assert_eq!(targeting.len(), 1);

    let pattern = Regex::new(r"^Slot 4 awaiting (\w+) target \(session (\d+)\)$").unwrap();
    let captures = pattern
        .captures(&targeting[0].message)
        .expect("targeting message should match");
    assert_eq!(&captures[1], TargetingKind::Area.as_str());
    assert_eq!(&captures[2], "4");
}

#[test]
fn test_shuffle_messages() {
    let mut log = SlotLog::default();
    log.record(&event(
        2,
        SlotEventKind::Shuffled {
            discarded: Some("Spread Shot".to_string()),
        },
    ));
    log.record(&event(2, SlotEventKind::Shuffled { discarded: None }));

    assert_eq!(log.entries[0].message, "Slot 3 shuffled away Spread Shot");
    assert_eq!(log.entries[1].message, "Slot 3 shuffled while empty");
}

#[test]
fn test_draw_failure_carries_reason() {
    let mut log = SlotLog::default();
    log.record(&event(
        4,
        SlotEventKind::DrawFailed {
            reason: "no eligible abilities".to_string(),
        },
    ));

    let pattern = Regex::new(r"^Slot 5 could not draw: .+$").unwrap();
    assert!(pattern.is_match(&log.entries[0].message));
    assert_eq!(log.entries[0].event_type, SlotLogEventType::DrawFailed);
}

// =============================================================================
// Queries
// =============================================================================

#[test]
fn test_entries_stamped_with_elapsed_time() {
    let log = create_test_log();
    let timestamps: Vec<f32> = log.entries.iter().map(|e| e.timestamp).collect();
    assert_eq!(timestamps, vec![0.0, 1.5, 1.5, 2.0, 2.0]);
}

#[test]
fn test_filter_by_type() {
    let log = create_test_log();
    assert_eq!(log.filter_by_type(SlotLogEventType::Drawn).len(), 2);
    assert_eq!(log.filter_by_type(SlotLogEventType::Activated).len(), 1);
    assert!(log.filter_by_type(SlotLogEventType::Concluded).is_empty());
}

#[test]
fn test_for_slot() {
    let log = create_test_log();
    let slot_four: Vec<_> = log.for_slot(3).iter().map(|e| e.event_type).collect();
    assert_eq!(
        slot_four,
        vec![SlotLogEventType::Drawn, SlotLogEventType::Targeting]
    );
    assert!(log.for_slot(4).is_empty());
}

#[test]
fn test_recent_keeps_chronological_order() {
    let log = create_test_log();
    let recent: Vec<_> = log.recent(2).iter().map(|e| e.event_type).collect();
    assert_eq!(
        recent,
        vec![SlotLogEventType::Targeting, SlotLogEventType::Shuffled]
    );
    assert_eq!(log.recent(50).len(), 5);
}

#[test]
fn test_clear_resets_time() {
    let mut log = create_test_log();
    log.clear();
    assert!(log.entries.is_empty());
    assert_eq!(log.elapsed, 0.0);
}
