use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::time::interval;
use tracing::debug;

use crate::events::{emit, AirspaceEvent};
use crate::registry::{AircraftRegistry, SlotHandle};

/// Per-aircraft position updater.
///
/// One of these runs as its own task for every active aircraft, advancing the
/// aircraft's slot once per tick. It terminates when the slot stops holding
/// its aircraft (removed by command or reused), when the optional lifetime
/// expires, or when shutdown is signalled.
pub struct KinematicsUpdater {
    registry: Arc<AircraftRegistry>,
    handle: SlotHandle,
    id: u32,
    /// Seconds the aircraft stays in the airspace; 0 means unbounded.
    lifetime_secs: u64,
    tick_secs: u64,
    events: mpsc::Sender<AirspaceEvent>,
}

impl KinematicsUpdater {
    pub fn new(
        registry: Arc<AircraftRegistry>,
        handle: SlotHandle,
        id: u32,
        lifetime_secs: u64,
        tick_secs: u64,
        events: mpsc::Sender<AirspaceEvent>,
    ) -> Self {
        Self {
            registry,
            handle,
            id,
            lifetime_secs,
            tick_secs,
            events,
        }
    }

    /// Drive the aircraft until removal, lifetime expiry, or shutdown.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let dt = self.tick_secs as f64;
        let mut ticker = interval(Duration::from_secs(self.tick_secs));
        // interval fires immediately; consume that so the first advance
        // happens one full tick after spawn.
        ticker.tick().await;

        let mut elapsed = 0u64;
        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    debug!("[KINEMATICS] Aircraft {} updater stopping on shutdown", self.id);
                    return;
                }
                _ = ticker.tick() => {
                    if !self.registry.advance_if(self.handle, self.id, dt).await {
                        // Slot was removed or reused out from under us.
                        debug!("[KINEMATICS] Aircraft {} no longer tracked, updater exiting", self.id);
                        return;
                    }
                    elapsed += self.tick_secs;
                    if self.lifetime_secs > 0 && elapsed >= self.lifetime_secs {
                        if self.registry.deallocate(self.handle).await.is_some() {
                            emit(&self.events, AirspaceEvent::AircraftRemoved {
                                id: self.id,
                                timestamp: Utc::now(),
                            });
                        }
                        debug!("[KINEMATICS] Aircraft {} lifetime expired", self.id);
                        return;
                    }
                }
            }
        }
    }
}
