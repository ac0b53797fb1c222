//! Steady-state loop of the monitor: report every status change until the
//! user interrupts or the backend drops the socket.

use crate::error::PrintwatchError;

use common::ErrorLocation;

use moonraker_core::session::MoonrakerSession;

use models::PrinterStatusSnapshot;

use std::future::Future;
use std::panic::Location;

use log::{info, warn};
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    Interrupted,
    ConnectionClosed,
}

/// One human-readable status line, e.g.
/// `benchy.gcode [printing] layer 17/120 42.0% elapsed 1:02:05`.
pub fn format_status_line(snapshot: &PrinterStatusSnapshot) -> String {
    let filename = if snapshot.filename.is_empty() {
        "-"
    } else {
        snapshot.filename.as_str()
    };
    let state = if snapshot.state.is_empty() {
        "unknown"
    } else {
        snapshot.state.as_str()
    };

    format!(
        "{filename} [{state}] layer {}/{} {:.1}% elapsed {}",
        snapshot.layer,
        snapshot.total_layers,
        snapshot.progress * 100.0,
        snapshot.time_remaining
    )
}

/// Log the current snapshot, then every change. Returns once the publisher
/// is gone.
pub async fn report_status(mut status: watch::Receiver<PrinterStatusSnapshot>) -> usize {
    // Status merged before we subscribed counts as unseen
    status.mark_changed();
    let mut reported = 0;

    while status.changed().await.is_ok() {
        let line = format_status_line(&status.borrow_and_update());
        info!("{line}");
        reported += 1;
    }

    reported
}

/// Resolve on whichever comes first: the interrupt signal or a closed socket.
///
/// # Errors
///
/// Returns [`PrintwatchError::Signal`] if the signal handler failed.
pub async fn wait_for_exit<S, C>(interrupt: S, closed: C) -> Result<ExitReason, PrintwatchError>
where
    S: Future<Output = std::io::Result<()>>,
    C: Future<Output = ()>,
{
    tokio::select! {
        signal = interrupt => {
            signal.map_err(|e| PrintwatchError::Signal {
                message: format!("Failed to listen for interrupt: {e}"),
                location: ErrorLocation::from(Location::caller()),
            })?;
            info!("Interrupt received, closing session");
            Ok(ExitReason::Interrupted)
        }
        _ = closed => {
            warn!("Moonraker closed the connection");
            Ok(ExitReason::ConnectionClosed)
        }
    }
}

/// Report status until interrupted or disconnected, then shut the session down.
pub async fn run(session: MoonrakerSession) -> Result<ExitReason, PrintwatchError> {
    let reporter = tokio::spawn(report_status(session.status()));

    let outcome = wait_for_exit(tokio::signal::ctrl_c(), session.closed()).await;

    session.shutdown().await;
    reporter.abort();

    outcome
}
