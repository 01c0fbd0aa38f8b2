use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, info};

use crate::config::AirspaceConfig;
use crate::conflict::ConflictMatrix;
use crate::events::{emit, AirspaceEvent};
use crate::registry::{AircraftRecord, AircraftRegistry};

/// Process-wide projection horizon in seconds.
///
/// Mutated only through the command processor; every scan loads it exactly
/// once, so a scan never mixes two window values.
pub struct PredictionWindow(AtomicU64);

impl PredictionWindow {
    pub fn new(seconds: u64) -> Self {
        Self(AtomicU64::new(seconds))
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }

    pub fn set(&self, seconds: u64) {
        self.0.store(seconds, Ordering::SeqCst);
    }
}

/// Periodic O(n²) scan over all active aircraft pairs, projecting each
/// forward by the prediction window and raising edge-triggered alerts on
/// predicted separation violations.
pub struct ConflictPredictor {
    registry: Arc<AircraftRegistry>,
    window: Arc<PredictionWindow>,
    matrix: ConflictMatrix,
    /// Aircraft id seen in each slot at the last scan. Episode cells are
    /// cleared the moment a slot's occupant changes, so a slot freed and
    /// reallocated between two scans cannot inherit the old pair's episode.
    occupants: Vec<Option<u32>>,
    horizontal_threshold: f64,
    vertical_threshold: f64,
    scan_period_secs: u64,
    events: mpsc::Sender<AirspaceEvent>,
}

impl ConflictPredictor {
    pub fn new(
        config: &AirspaceConfig,
        registry: Arc<AircraftRegistry>,
        window: Arc<PredictionWindow>,
        events: mpsc::Sender<AirspaceEvent>,
    ) -> Self {
        Self {
            matrix: ConflictMatrix::new(registry.capacity()),
            occupants: vec![None; registry.capacity()],
            registry,
            window,
            horizontal_threshold: config.horizontal_threshold,
            vertical_threshold: config.vertical_threshold,
            scan_period_secs: config.scan_period_seconds,
            events,
        }
    }

    pub fn spawn(self, shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        info!(
            "[PREDICTOR] Scanning every {}s, window {}s",
            self.scan_period_secs,
            self.window.get()
        );
        let mut ticker = interval(Duration::from_secs(self.scan_period_secs));
        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    info!("[PREDICTOR] Shutdown signal received");
                    return;
                }
                _ = ticker.tick() => {
                    let alerts = self.scan().await;
                    if alerts > 0 {
                        debug!("[PREDICTOR] Scan raised {} alert(s)", alerts);
                    }
                }
            }
        }
    }

    /// Predicted separation violation at the projection horizon: horizontal
    /// and vertical distance both under their minima.
    fn violates(&self, a: &AircraftRecord, b: &AircraftRecord, seconds: f64) -> bool {
        let fa = a.position.projected(a.velocity, seconds);
        let fb = b.position.projected(b.velocity, seconds);
        fa.horizontal_distance(&fb) < self.horizontal_threshold
            && fa.vertical_distance(&fb) < self.vertical_threshold
    }

    /// One full scan pass. Returns the number of alerts raised; public so
    /// tests can drive scans deterministically.
    pub async fn scan(&mut self) -> usize {
        let window_secs = self.window.get();
        let snapshot = self.registry.snapshot().await;

        // Any slot whose occupant changed since the last scan (went empty,
        // or was freed and reused for a different aircraft) forfeits its
        // episode state; a handle disappearing mid-interval is routine, not
        // an error.
        let mut current: Vec<Option<u32>> = vec![None; self.registry.capacity()];
        for (handle, record) in &snapshot {
            current[handle.index()] = Some(record.id);
        }
        for (idx, occupant) in current.iter().enumerate() {
            if *occupant != self.occupants[idx] {
                self.matrix.clear_involving(idx);
            }
        }
        self.occupants = current;

        let mut alerts = 0;
        for (i, (ha, a)) in snapshot.iter().enumerate() {
            for (hb, b) in snapshot.iter().skip(i + 1) {
                let flagged = self.matrix.get(ha.index(), hb.index());
                let violating = self.violates(a, b, window_secs as f64);

                if violating && !flagged {
                    self.matrix.set(ha.index(), hb.index(), true);
                    emit(
                        &self.events,
                        AirspaceEvent::ConflictAlert {
                            id1: a.id,
                            id2: b.id,
                            time_to_violation: window_secs,
                            timestamp: Utc::now(),
                        },
                    );
                    alerts += 1;
                } else if !violating && flagged {
                    // Episode over; clearing is silent.
                    self.matrix.set(ha.index(), hb.index(), false);
                }
            }
        }
        alerts
    }
}
