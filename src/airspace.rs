use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::info;

use crate::command::{Command, CommandEnvelope, CommandProcessor, CommandResult};
use crate::config::AirspaceConfig;
use crate::conflict::{ConflictPredictor, PredictionWindow};
use crate::error::AirspaceError;
use crate::events::AirspaceEvent;
use crate::registry::{AircraftRecord, AircraftRegistry};

/// Point-in-time view of the airspace for display collaborators.
#[derive(Debug, Clone)]
pub struct AirspaceSnapshot {
    pub aircraft: Vec<AircraftRecord>,
    pub count: usize,
}

impl fmt::Display for AirspaceSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Airspace: {} aircraft tracked", self.count)?;
        for a in &self.aircraft {
            writeln!(
                f,
                "  Aircraft {}: Pos(x={:.1}, y={:.1}, z={:.1}) Speed(vx={:.1}, vy={:.1}, vz={:.1})",
                a.id,
                a.position.x,
                a.position.y,
                a.position.z,
                a.velocity.vx,
                a.velocity.vy,
                a.velocity.vz
            )?;
        }
        Ok(())
    }
}

/// Owns the whole running core: registry, conflict predictor, command
/// processor, and the shutdown broadcast that ties their lifetimes together.
///
/// Every task is spawned here (or by the command processor, which joins its
/// own aircraft tasks); `shutdown` signals all of them and waits for each to
/// acknowledge by exiting before it returns.
pub struct Airspace {
    registry: Arc<AircraftRegistry>,
    window: Arc<PredictionWindow>,
    command_tx: mpsc::Sender<CommandEnvelope>,
    shutdown_tx: broadcast::Sender<()>,
    tasks: Vec<JoinHandle<()>>,
}

impl Airspace {
    /// Build the core and start its long-lived tasks. Must be called from
    /// within a tokio runtime.
    pub fn new(
        config: &AirspaceConfig,
        events: mpsc::Sender<AirspaceEvent>,
    ) -> Result<Self, AirspaceError> {
        config.validate()?;
        let registry = Arc::new(AircraftRegistry::new(config.capacity)?);
        let window = Arc::new(PredictionWindow::new(config.default_prediction_window));
        let (shutdown_tx, _) = broadcast::channel(4);
        let (command_tx, command_rx) = mpsc::channel(64);

        let predictor = ConflictPredictor::new(
            config,
            Arc::clone(&registry),
            Arc::clone(&window),
            events.clone(),
        );
        let processor = CommandProcessor::new(
            config,
            Arc::clone(&registry),
            Arc::clone(&window),
            command_rx,
            events,
            shutdown_tx.clone(),
        );

        let tasks = vec![predictor.spawn(shutdown_tx.subscribe()), processor.spawn()];
        info!(
            "[AIRSPACE] Core started: capacity {}, window {}s",
            config.capacity, config.default_prediction_window
        );

        Ok(Self {
            registry,
            window,
            command_tx,
            shutdown_tx,
            tasks,
        })
    }

    pub fn registry(&self) -> Arc<AircraftRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn prediction_window(&self) -> u64 {
        self.window.get()
    }

    /// Sender half of the command queue, for collaborators that submit
    /// directly.
    pub fn command_sender(&self) -> mpsc::Sender<CommandEnvelope> {
        self.command_tx.clone()
    }

    /// Queue one command and wait for its acknowledgment.
    pub async fn submit(&self, command: Command) -> CommandResult {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(CommandEnvelope {
                command,
                reply: reply_tx,
            })
            .await
            .map_err(|_| AirspaceError::ResourceUnavailable("command queue closed".into()))?;
        reply_rx
            .await
            .map_err(|_| AirspaceError::ResourceUnavailable("command processor gone".into()))?
    }

    /// State snapshot query for display collaborators: active aircraft in
    /// slot order plus the active count.
    pub async fn snapshot(&self) -> AirspaceSnapshot {
        let aircraft: Vec<AircraftRecord> = self
            .registry
            .snapshot()
            .await
            .into_iter()
            .map(|(_, record)| record)
            .collect();
        AirspaceSnapshot {
            count: aircraft.len(),
            aircraft,
        }
    }

    /// Periodically log the snapshot, the way the radar display polls state.
    pub fn spawn_status_logger(&mut self, period_secs: u64) {
        let registry = Arc::clone(&self.registry);
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        self.tasks.push(tokio::spawn(async move {
            let mut ticker = interval(Duration::from_secs(period_secs));
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => return,
                    _ = ticker.tick() => {
                        let aircraft: Vec<AircraftRecord> = registry
                            .snapshot()
                            .await
                            .into_iter()
                            .map(|(_, record)| record)
                            .collect();
                        let snapshot = AirspaceSnapshot {
                            count: aircraft.len(),
                            aircraft,
                        };
                        for line in snapshot.to_string().lines() {
                            info!("[RADAR] {}", line);
                        }
                    }
                }
            }
        }));
    }

    /// Signal every task to stop at its next tick boundary and wait for all
    /// of them to exit. No task is aborted mid-mutation.
    pub async fn shutdown(self) {
        info!("[AIRSPACE] Shutting down...");
        let _ = self.shutdown_tx.send(());
        for task in self.tasks {
            let _ = task.await;
        }
        info!("[AIRSPACE] All tasks stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{Position, Velocity};

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_query_shape() {
        let (events_tx, _events_rx) = mpsc::channel(64);
        let airspace = Airspace::new(&AirspaceConfig::default(), events_tx).unwrap();

        airspace
            .submit(Command::AddAircraft {
                id: 1,
                position: Position::new(0.0, 0.0, 15000.0),
                velocity: Velocity::new(100.0, 50.0, 0.0),
                lifetime: 0,
            })
            .await
            .unwrap();

        let snapshot = airspace.snapshot().await;
        assert_eq!(snapshot.count, 1);
        assert_eq!(snapshot.aircraft[0].id, 1);
        assert!(snapshot.to_string().contains("Aircraft 1"));

        airspace.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_joins_all_tasks() {
        let (events_tx, _events_rx) = mpsc::channel(64);
        let mut airspace = Airspace::new(&AirspaceConfig::default(), events_tx).unwrap();
        airspace.spawn_status_logger(5);

        for id in 1..=3u32 {
            airspace
                .submit(Command::AddAircraft {
                    id,
                    position: Position::new(id as f64 * 50000.0, 0.0, 10000.0),
                    velocity: Velocity::new(10.0, 0.0, 0.0),
                    lifetime: 0,
                })
                .await
                .unwrap();
        }

        // Completes only if the predictor, processor, status logger, and all
        // three aircraft tasks acknowledge the shutdown signal.
        airspace.shutdown().await;
    }
}
