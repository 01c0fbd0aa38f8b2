use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::command::Command;
use crate::config::{AirspaceConfig, MAX_PREDICTION_WINDOW_SECS};
use crate::conflict::PredictionWindow;
use crate::error::AirspaceError;
use crate::events::{emit, AirspaceEvent};
use crate::kinematics::KinematicsUpdater;
use crate::registry::AircraftRegistry;

pub type CommandResult = Result<(), AirspaceError>;

/// One queued command plus the channel its acknowledgment goes back on.
#[derive(Debug)]
pub struct CommandEnvelope {
    pub command: Command,
    pub reply: oneshot::Sender<CommandResult>,
}

/// Serializes operator commands against the registry: one task, one command
/// at a time, in arrival order. Each command is all-or-nothing, so no
/// concurrent reader ever observes a half-applied mutation.
///
/// Aircraft added here get their kinematics task spawned into a local
/// `JoinSet`; on shutdown the processor waits for every one of them to exit
/// before returning.
pub struct CommandProcessor {
    registry: Arc<AircraftRegistry>,
    window: Arc<PredictionWindow>,
    kinematics_tick_secs: u64,
    commands: mpsc::Receiver<CommandEnvelope>,
    events: mpsc::Sender<AirspaceEvent>,
    shutdown: broadcast::Sender<()>,
    updaters: JoinSet<()>,
}

impl CommandProcessor {
    pub fn new(
        config: &AirspaceConfig,
        registry: Arc<AircraftRegistry>,
        window: Arc<PredictionWindow>,
        commands: mpsc::Receiver<CommandEnvelope>,
        events: mpsc::Sender<AirspaceEvent>,
        shutdown: broadcast::Sender<()>,
    ) -> Self {
        Self {
            registry,
            window,
            kinematics_tick_secs: config.kinematics_tick_seconds,
            commands,
            events,
            shutdown,
            updaters: JoinSet::new(),
        }
    }

    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) {
        let mut shutdown_rx = self.shutdown.subscribe();
        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("[COMMAND] Shutdown signal received");
                    break;
                }
                envelope = self.commands.recv() => {
                    match envelope {
                        Some(CommandEnvelope { command, reply }) => {
                            let result = self.apply(command).await;
                            if let Err(e) = &result {
                                warn!("[COMMAND] Rejected: {}", e);
                            }
                            // A caller that gave up waiting is not an error.
                            let _ = reply.send(result);
                        }
                        None => {
                            info!("[COMMAND] Command channel closed");
                            break;
                        }
                    }
                }
                Some(_) = self.updaters.join_next(), if !self.updaters.is_empty() => {}
            }
        }

        // Updaters see the same shutdown broadcast; wait for each to land.
        while self.updaters.join_next().await.is_some() {}
        info!("[COMMAND] All aircraft tasks joined");
    }

    async fn apply(&mut self, command: Command) -> CommandResult {
        match command {
            Command::SetVelocity { id, velocity } => {
                let handle = self
                    .registry
                    .find_by_id(id)
                    .await
                    .ok_or(AirspaceError::AircraftNotFound(id))?;
                if !self.registry.mutate_velocity(handle, velocity).await {
                    return Err(AirspaceError::AircraftNotFound(id));
                }
                info!("[COMMAND] Velocity updated for Aircraft {}", id);
                Ok(())
            }
            Command::SetAltitude { id, z } => {
                let handle = self
                    .registry
                    .find_by_id(id)
                    .await
                    .ok_or(AirspaceError::AircraftNotFound(id))?;
                if !self.registry.mutate_altitude(handle, z).await {
                    return Err(AirspaceError::AircraftNotFound(id));
                }
                info!("[COMMAND] Altitude updated for Aircraft {}", id);
                Ok(())
            }
            Command::AddAircraft {
                id,
                position,
                velocity,
                lifetime,
            } => {
                let handle = self.registry.allocate(id, position, velocity).await?;
                let updater = KinematicsUpdater::new(
                    Arc::clone(&self.registry),
                    handle,
                    id,
                    lifetime,
                    self.kinematics_tick_secs,
                    self.events.clone(),
                );
                let shutdown_rx = self.shutdown.subscribe();
                self.updaters.spawn(updater.run(shutdown_rx));
                emit(
                    &self.events,
                    AirspaceEvent::AircraftAdded {
                        id,
                        timestamp: Utc::now(),
                    },
                );
                info!("[COMMAND] Aircraft {} entered airspace", id);
                Ok(())
            }
            Command::RemoveAircraft { id } => {
                let handle = self
                    .registry
                    .find_by_id(id)
                    .await
                    .ok_or(AirspaceError::AircraftNotFound(id))?;
                if self.registry.deallocate(handle).await.is_none() {
                    return Err(AirspaceError::AircraftNotFound(id));
                }
                // The orphaned updater notices on its next tick and exits.
                emit(
                    &self.events,
                    AirspaceEvent::AircraftRemoved {
                        id,
                        timestamp: Utc::now(),
                    },
                );
                info!("[COMMAND] Aircraft {} removed from airspace", id);
                Ok(())
            }
            Command::SetPredictionWindow { seconds } => {
                if seconds == 0 || seconds > MAX_PREDICTION_WINDOW_SECS {
                    return Err(AirspaceError::InvalidParameter(format!(
                        "prediction window must be 1..={} seconds, got {}",
                        MAX_PREDICTION_WINDOW_SECS, seconds
                    )));
                }
                self.window.set(seconds);
                info!("[COMMAND] Prediction window set to {}s", seconds);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{Position, Velocity};

    struct Harness {
        registry: Arc<AircraftRegistry>,
        window: Arc<PredictionWindow>,
        commands: mpsc::Sender<CommandEnvelope>,
        shutdown: broadcast::Sender<()>,
        processor: tokio::task::JoinHandle<()>,
        _events_rx: mpsc::Receiver<AirspaceEvent>,
    }

    fn harness(capacity: usize) -> Harness {
        let config = AirspaceConfig {
            capacity,
            ..Default::default()
        };
        let registry = Arc::new(AircraftRegistry::new(capacity).unwrap());
        let window = Arc::new(PredictionWindow::new(config.default_prediction_window));
        let (command_tx, command_rx) = mpsc::channel(16);
        let (events_tx, events_rx) = mpsc::channel(64);
        let (shutdown_tx, _) = broadcast::channel(1);
        let processor = CommandProcessor::new(
            &config,
            Arc::clone(&registry),
            Arc::clone(&window),
            command_rx,
            events_tx,
            shutdown_tx.clone(),
        )
        .spawn();
        Harness {
            registry,
            window,
            commands: command_tx,
            shutdown: shutdown_tx,
            processor,
            _events_rx: events_rx,
        }
    }

    async fn submit(h: &Harness, command: Command) -> CommandResult {
        let (reply_tx, reply_rx) = oneshot::channel();
        h.commands
            .send(CommandEnvelope {
                command,
                reply: reply_tx,
            })
            .await
            .unwrap();
        reply_rx.await.unwrap()
    }

    fn add(id: u32) -> Command {
        Command::AddAircraft {
            id,
            position: Position::new(0.0, 0.0, 15000.0),
            velocity: Velocity::new(100.0, 0.0, 0.0),
            lifetime: 0,
        }
    }

    #[tokio::test]
    async fn test_add_remove_and_idempotent_failure() {
        let h = harness(8);
        assert_eq!(submit(&h, add(1)).await, Ok(()));
        assert_eq!(
            submit(&h, add(1)).await,
            Err(AirspaceError::DuplicateId(1))
        );
        assert_eq!(submit(&h, Command::RemoveAircraft { id: 1 }).await, Ok(()));
        assert_eq!(
            submit(&h, Command::RemoveAircraft { id: 1 }).await,
            Err(AirspaceError::AircraftNotFound(1))
        );
        assert_eq!(h.registry.count(), 0);

        let _ = h.shutdown.send(());
        h.processor.await.unwrap();
    }

    #[tokio::test]
    async fn test_capacity_exceeded_reported() {
        let h = harness(2);
        assert_eq!(submit(&h, add(1)).await, Ok(()));
        assert_eq!(submit(&h, add(2)).await, Ok(()));
        assert_eq!(
            submit(&h, add(3)).await,
            Err(AirspaceError::CapacityExceeded)
        );
        assert_eq!(h.registry.count(), 2);

        let _ = h.shutdown.send(());
        h.processor.await.unwrap();
    }

    #[tokio::test]
    async fn test_velocity_and_altitude_commands() {
        let h = harness(4);
        submit(&h, add(5)).await.unwrap();

        let velocity = Velocity::new(-120.0, -30.0, 0.0);
        assert_eq!(
            submit(&h, Command::SetVelocity { id: 5, velocity }).await,
            Ok(())
        );
        assert_eq!(
            submit(&h, Command::SetAltitude { id: 5, z: 18000.0 }).await,
            Ok(())
        );
        assert_eq!(
            submit(&h, Command::SetVelocity { id: 9, velocity }).await,
            Err(AirspaceError::AircraftNotFound(9))
        );

        let handle = h.registry.find_by_id(5).await.unwrap();
        let record = h.registry.read(handle).await.unwrap();
        assert_eq!(record.velocity, velocity);
        assert_eq!(record.position.z, 18000.0);

        let _ = h.shutdown.send(());
        h.processor.await.unwrap();
    }

    #[tokio::test]
    async fn test_prediction_window_validation() {
        let h = harness(2);
        assert_eq!(
            submit(&h, Command::SetPredictionWindow { seconds: 15 }).await,
            Ok(())
        );
        assert_eq!(h.window.get(), 15);

        assert!(matches!(
            submit(&h, Command::SetPredictionWindow { seconds: 0 }).await,
            Err(AirspaceError::InvalidParameter(_))
        ));
        assert!(matches!(
            submit(
                &h,
                Command::SetPredictionWindow {
                    seconds: MAX_PREDICTION_WINDOW_SECS + 1
                }
            )
            .await,
            Err(AirspaceError::InvalidParameter(_))
        ));
        // Rejected values leave the window untouched.
        assert_eq!(h.window.get(), 15);

        let _ = h.shutdown.send(());
        h.processor.await.unwrap();
    }
}
