// Unit tests for folding status deltas into the snapshot

use crate::merger::{MergeOutcome, StatusMerger};

use models::Hhmmss;

use serde_json::{Value, json};

fn notification(delta: Value, event_time: f64) -> String {
    json!({
        "jsonrpc": "2.0",
        "method": "notify_status_update",
        "params": [delta, event_time],
    })
    .to_string()
}

fn full_delta() -> Value {
    json!({
        "virtual_sdcard": {"progress": 0.42, "is_active": true},
        "print_stats": {
            "filename": "benchy.gcode",
            "print_duration": 3725.9,
            "state": "printing",
            "info": {"total_layer": 120, "current_layer": 17}
        }
    })
}

/// **VALUE**: Verifies every tracked field is taken from a full notification.
///
/// **BUG THIS CATCHES**: Would catch a field mapped from the wrong path
/// (e.g. `total_layer` into `layer`) or a missing hh:mm:ss recompute.
#[test]
fn given_full_delta_when_applied_then_all_fields_set() {
    // GIVEN: A fresh merger
    let merger = StatusMerger::new();

    // WHEN: Applying a notification with every tracked field
    let outcome = merger.apply(&notification(full_delta(), 100.0));

    // THEN: Snapshot mirrors the payload
    assert_eq!(outcome, MergeOutcome::Changed(6));
    let snapshot = merger.snapshot();
    assert_eq!(snapshot.layer, 17);
    assert_eq!(snapshot.total_layers, 120);
    assert_eq!(snapshot.time_remaining_seconds, 3725.9);
    assert_eq!(
        snapshot.time_remaining,
        Hhmmss {
            hours: 1,
            minutes: 2,
            seconds: 5
        }
    );
    assert_eq!(snapshot.progress, 0.42);
    assert_eq!(snapshot.filename, "benchy.gcode");
    assert_eq!(snapshot.state, "printing");
}

/// **VALUE**: Verifies a partial delta leaves absent fields untouched.
///
/// **WHY THIS MATTERS**: Moonraker only sends what changed. Treating a missing
/// field as zero would make the layer counter flicker back to 0 on every
/// progress-only update.
///
/// **BUG THIS CATCHES**: Would catch `#[serde(default)]` on plain (non-Option)
/// fields, which turns "absent" into "zero".
#[test]
fn given_partial_delta_when_applied_then_other_fields_kept() {
    // GIVEN: A populated snapshot
    let merger = StatusMerger::new();
    merger.apply(&notification(full_delta(), 100.0));

    // WHEN: Only progress changes
    let outcome = merger.apply(&notification(
        json!({"virtual_sdcard": {"progress": 0.5}}),
        101.0,
    ));

    // THEN: Progress moved, everything else stayed
    assert_eq!(outcome, MergeOutcome::Changed(1));
    let snapshot = merger.snapshot();
    assert_eq!(snapshot.progress, 0.5);
    assert_eq!(snapshot.layer, 17);
    assert_eq!(snapshot.total_layers, 120);
    assert_eq!(snapshot.filename, "benchy.gcode");
}

/// **VALUE**: Verifies explicit nulls are treated like absent fields.
#[test]
fn given_null_fields_when_applied_then_no_change() {
    let merger = StatusMerger::new();
    merger.apply(&notification(full_delta(), 100.0));

    let outcome = merger.apply(&notification(
        json!({"print_stats": {"filename": null, "info": {"current_layer": null}}}),
        101.0,
    ));

    assert_eq!(outcome, MergeOutcome::Unchanged);
    assert_eq!(merger.snapshot().filename, "benchy.gcode");
    assert_eq!(merger.snapshot().layer, 17);
}

/// **VALUE**: Verifies identical values do not wake snapshot watchers.
///
/// **WHY THIS MATTERS**: Consumers redraw on every change notification;
/// Moonraker repeats values often enough that spurious wakeups are visible.
#[test]
fn given_identical_delta_when_applied_then_watchers_not_notified() {
    // GIVEN: A merger with a watcher that has seen the current value
    let merger = StatusMerger::new();
    merger.apply(&notification(full_delta(), 100.0));
    let mut watcher = merger.subscribe();
    watcher.borrow_and_update();

    // WHEN: The same payload arrives again
    let outcome = merger.apply(&notification(full_delta(), 101.0));

    // THEN: Nothing changed and the watcher was not marked
    assert_eq!(outcome, MergeOutcome::Unchanged);
    assert!(!watcher.has_changed().unwrap());
}

/// **VALUE**: Verifies watchers are woken when a field changes.
#[test]
fn given_changed_delta_when_applied_then_watchers_notified() {
    let merger = StatusMerger::new();
    let mut watcher = merger.subscribe();
    watcher.borrow_and_update();

    merger.apply(&notification(json!({"print_stats": {"state": "paused"}}), 5.0));

    assert!(watcher.has_changed().unwrap());
    assert_eq!(watcher.borrow_and_update().state, "paused");
}

/// **VALUE**: Verifies a new print duration recomputes the hh:mm:ss breakdown.
#[test]
fn given_new_duration_when_applied_then_breakdown_recomputed() {
    let merger = StatusMerger::new();
    merger.apply(&notification(full_delta(), 100.0));

    merger.apply(&notification(
        json!({"print_stats": {"print_duration": 59.99}}),
        101.0,
    ));

    let snapshot = merger.snapshot();
    assert_eq!(snapshot.time_remaining_seconds, 59.99);
    assert_eq!(
        snapshot.time_remaining,
        Hhmmss {
            hours: 0,
            minutes: 0,
            seconds: 59
        }
    );
}

/// **VALUE**: Verifies an older notification cannot roll fields back.
///
/// **BUG THIS CATCHES**: Would catch a merger that applies frames purely in
/// arrival order and lets a late one overwrite newer values.
#[test]
fn given_older_event_time_when_applied_then_dropped_as_stale() {
    // GIVEN: A snapshot at event time 200
    let merger = StatusMerger::new();
    merger.apply(&notification(json!({"print_stats": {"state": "printing"}}), 200.0));

    // WHEN: A frame stamped 150 arrives afterwards
    let outcome = merger.apply(&notification(
        json!({"print_stats": {"state": "standby"}}),
        150.0,
    ));

    // THEN: It is dropped
    assert_eq!(outcome, MergeOutcome::Stale);
    assert_eq!(merger.snapshot().state, "printing");
}

/// **VALUE**: Verifies frames without an event time are always applied.
#[test]
fn given_missing_event_time_when_applied_then_merged() {
    let merger = StatusMerger::new();
    merger.apply(&notification(json!({"print_stats": {"state": "printing"}}), 200.0));

    let frame = json!({
        "method": "notify_status_update",
        "params": [{"print_stats": {"state": "complete"}}],
    })
    .to_string();

    assert_eq!(merger.apply(&frame), MergeOutcome::Changed(1));
    assert_eq!(merger.snapshot().state, "complete");
}

/// **VALUE**: Verifies malformed notifications are rejected without touching state.
///
/// **WHY THIS MATTERS**: A bad frame from the backend must never crash the
/// receive loop or corrupt the snapshot.
///
/// **BUG THIS CATCHES**: Would catch an index into `params[0]` that panics on
/// an empty array, or a type mismatch that resets fields.
#[test]
fn given_malformed_frames_when_applied_then_rejected() {
    let merger = StatusMerger::new();
    merger.apply(&notification(full_delta(), 100.0));
    let before = merger.snapshot();

    let frames = [
        String::from("not json at all"),
        json!({"method": "notify_status_update", "params": []}).to_string(),
        json!({"method": "notify_status_update"}).to_string(),
        json!({"method": "notify_status_update", "params": ["text", 1.0]}).to_string(),
        notification(json!({"print_stats": {"info": {"current_layer": "seven"}}}), 101.0),
    ];

    for frame in &frames {
        assert_eq!(merger.apply(frame), MergeOutcome::Malformed, "frame: {frame}");
    }
    assert_eq!(merger.snapshot(), before);
}

/// **VALUE**: Verifies progress is merged even when an untracked sibling
/// field has an unexpected type.
///
/// **BUG THIS CATCHES**: Would catch the whole frame being rejected as
/// malformed because of a field the snapshot does not track.
#[test]
fn given_untracked_field_with_odd_type_when_applied_then_progress_merged() {
    let merger = StatusMerger::new();

    let outcome = merger.apply(&notification(
        json!({"virtual_sdcard": {"progress": 0.3, "is_active": "yes"}}),
        1.0,
    ));

    assert_eq!(outcome, MergeOutcome::Changed(1));
    assert_eq!(merger.snapshot().progress, 0.3);
}
