//! Folds `notify_status_update` deltas into the printer status snapshot.
//!
//! The merger is the only writer of the snapshot. Consumers hold a
//! `watch::Receiver` and are woken only when a tracked field actually changed.
//!
//! # Ordering
//!
//! Moonraker stamps each notification with its event time in `params[1]`. A
//! notification older than the last one applied is dropped, so a late frame
//! cannot roll a field back. Frames without an event time are always applied.

use models::{Hhmmss, PrinterStatusSnapshot, StatusDelta, StatusNotification};

use std::sync::{Mutex, PoisonError};

use log::{debug, warn};
use serde::Deserialize;
use tokio::sync::watch;

/// What [`StatusMerger::apply`] did with a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Number of snapshot fields overwritten.
    Changed(usize),
    Unchanged,
    Stale,
    Malformed,
}

pub struct StatusMerger {
    snapshot: watch::Sender<PrinterStatusSnapshot>,
    last_event_time: Mutex<Option<f64>>,
}

impl StatusMerger {
    pub fn new() -> Self {
        Self {
            snapshot: watch::Sender::new(PrinterStatusSnapshot::default()),
            last_event_time: Mutex::new(None),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<PrinterStatusSnapshot> {
        self.snapshot.subscribe()
    }

    pub fn snapshot(&self) -> PrinterStatusSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Apply one `notify_status_update` frame.
    ///
    /// Malformed frames are logged and leave the snapshot untouched.
    pub fn apply(&self, frame: &str) -> MergeOutcome {
        let notification = match serde_json::from_str::<StatusNotification>(frame) {
            Ok(notification) => notification,
            Err(e) => {
                warn!("Status update parse error: {e}");
                return MergeOutcome::Malformed;
            }
        };

        let Some(payload) = notification.delta() else {
            warn!("Status update without params, ignoring");
            return MergeOutcome::Malformed;
        };

        let delta = match StatusDelta::deserialize(payload) {
            Ok(delta) => delta,
            Err(e) => {
                warn!("Status update params parse error: {e}");
                return MergeOutcome::Malformed;
            }
        };

        // Held for the whole merge: one writer at a time.
        let mut last_event_time = self
            .last_event_time
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(event_time) = notification.event_time() {
            if let Some(previous) = *last_event_time
                && event_time < previous
            {
                debug!("Dropping stale status update ({event_time} < {previous})");
                return MergeOutcome::Stale;
            }
            *last_event_time = Some(event_time);
        }

        let mut changed = 0;
        self.snapshot.send_if_modified(|snapshot| {
            changed = merge_delta(snapshot, &delta);
            changed > 0
        });

        if changed == 0 {
            return MergeOutcome::Unchanged;
        }

        debug!("Status merged ({changed} fields): {:?}", *self.snapshot.borrow());
        MergeOutcome::Changed(changed)
    }
}

impl Default for StatusMerger {
    fn default() -> Self {
        Self::new()
    }
}

/// Overwrite each field present in `delta` that differs from the snapshot.
fn merge_delta(snapshot: &mut PrinterStatusSnapshot, delta: &StatusDelta) -> usize {
    let mut changed = 0;

    if let Some(print_stats) = &delta.print_stats {
        if let Some(info) = &print_stats.info {
            changed += overwrite(&mut snapshot.layer, info.current_layer.as_ref());
            changed += overwrite(&mut snapshot.total_layers, info.total_layer.as_ref());
        }

        if let Some(duration) = print_stats.print_duration
            && snapshot.time_remaining_seconds != duration
        {
            snapshot.time_remaining_seconds = duration;
            snapshot.time_remaining = Hhmmss::from_seconds(duration);
            changed += 1;
        }

        changed += overwrite(&mut snapshot.state, print_stats.state.as_ref());
        changed += overwrite(&mut snapshot.filename, print_stats.filename.as_ref());
    }

    if let Some(virtual_sdcard) = &delta.virtual_sdcard {
        changed += overwrite(&mut snapshot.progress, virtual_sdcard.progress.as_ref());
    }

    changed
}

fn overwrite<T: PartialEq + Clone>(field: &mut T, value: Option<&T>) -> usize {
    match value {
        Some(value) if *field != *value => {
            *field = value.clone();
            1
        }
        _ => 0,
    }
}
