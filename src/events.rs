use chrono::{DateTime, Utc};
use std::fmt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Events the core emits to its sink: edge-triggered conflict alerts plus
/// aircraft lifecycle notifications.
#[derive(Debug, Clone, PartialEq)]
pub enum AirspaceEvent {
    ConflictAlert {
        id1: u32,
        id2: u32,
        /// Seconds until the projected separation violation; equals the
        /// prediction window in effect for the scan that raised it.
        time_to_violation: u64,
        timestamp: DateTime<Utc>,
    },
    AircraftAdded {
        id: u32,
        timestamp: DateTime<Utc>,
    },
    AircraftRemoved {
        id: u32,
        timestamp: DateTime<Utc>,
    },
}

impl fmt::Display for AirspaceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AirspaceEvent::ConflictAlert {
                id1,
                id2,
                time_to_violation,
                timestamp,
            } => write!(
                f,
                "[{}] PREDICTION: Aircraft {} and {} may lose separation in {} seconds",
                timestamp.format("%H:%M:%S"),
                id1,
                id2,
                time_to_violation
            ),
            AirspaceEvent::AircraftAdded { id, timestamp } => write!(
                f,
                "[{}] Aircraft {} entered airspace",
                timestamp.format("%H:%M:%S"),
                id
            ),
            AirspaceEvent::AircraftRemoved { id, timestamp } => write!(
                f,
                "[{}] Aircraft {} exited airspace",
                timestamp.format("%H:%M:%S"),
                id
            ),
        }
    }
}

/// Hand an event to the sink without ever blocking the emitting task.
/// A saturated or closed sink loses the event, which is logged, not fatal.
pub fn emit(events: &mpsc::Sender<AirspaceEvent>, event: AirspaceEvent) {
    if let Err(e) = events.try_send(event) {
        warn!("[EVENTS] Dropping event, sink unavailable: {}", e);
    }
}

/// Default sink: forwards every event to the tracing subscriber. Runs until
/// all senders are dropped.
pub fn spawn_console_sink(mut rx: mpsc::Receiver<AirspaceEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match &event {
                AirspaceEvent::ConflictAlert { .. } => warn!("[ALERT] {}", event),
                _ => info!("[AIRSPACE] {}", event),
            }
        }
    })
}
