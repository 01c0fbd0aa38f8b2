use std::sync::Arc;
use tokio::sync::mpsc;

use airspace_monitor::command::Command;
use airspace_monitor::registry::{AircraftRegistry, Position, Velocity};
use airspace_monitor::{Airspace, AirspaceConfig};

const AIRCRAFT: u32 = 20;

fn initial_velocity() -> Velocity {
    Velocity::new(1.0, 1.0, 0.0)
}

fn commanded_velocity(id: u32) -> Velocity {
    Velocity::new(id as f64 * 1000.0, -(id as f64) * 1000.0, 0.0)
}

/// Kinematics churn on every slot, a velocity command per aircraft, and
/// snapshot readers all running at once: every observed record must be
/// internally consistent (velocity components always from the same write,
/// never a mix), and the table invariants must hold throughout.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_no_torn_reads_under_concurrent_mutation() {
    let registry = Arc::new(AircraftRegistry::new(50).unwrap());

    let mut handles = Vec::new();
    for id in 1..=AIRCRAFT {
        let handle = registry
            .allocate(id, Position::new(0.0, 0.0, 15000.0), initial_velocity())
            .await
            .unwrap();
        handles.push((id, handle));
    }

    let mut tasks = Vec::new();
    for (id, handle) in &handles {
        // Updater stand-in: advance the slot repeatedly without timers.
        let (id, handle) = (*id, *handle);
        let reg = Arc::clone(&registry);
        tasks.push(tokio::spawn(async move {
            for _ in 0..200 {
                reg.advance_if(handle, id, 1.0).await;
                tokio::task::yield_now().await;
            }
        }));

        let reg = Arc::clone(&registry);
        tasks.push(tokio::spawn(async move {
            tokio::task::yield_now().await;
            assert!(reg.mutate_velocity(handle, commanded_velocity(id)).await);
        }));
    }

    // Concurrent readers verify consistency while the churn is live.
    for _ in 0..4 {
        let reg = Arc::clone(&registry);
        tasks.push(tokio::spawn(async move {
            for _ in 0..50 {
                for (_, record) in reg.snapshot().await {
                    let initial = initial_velocity();
                    let commanded = commanded_velocity(record.id);
                    assert!(
                        record.velocity == initial || record.velocity == commanded,
                        "torn velocity observed for aircraft {}: {:?}",
                        record.id,
                        record.velocity
                    );
                }
                tokio::task::yield_now().await;
            }
        }));
    }

    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(registry.count(), AIRCRAFT as usize);
    let snapshot = registry.snapshot().await;
    assert_eq!(snapshot.len(), AIRCRAFT as usize);
    for (_, record) in snapshot {
        assert_eq!(record.velocity, commanded_velocity(record.id));
        assert!(record.position.x.is_finite());
    }
}

/// Same property through the full stack: commands serialized by the
/// processor alongside live updater tasks.
#[tokio::test(start_paused = true)]
async fn test_concurrent_commands_through_processor() {
    let (events_tx, _events_rx) = mpsc::channel(256);
    let airspace = Arc::new(Airspace::new(&AirspaceConfig::default(), events_tx).unwrap());

    for id in 1..=AIRCRAFT {
        airspace
            .submit(Command::AddAircraft {
                id,
                position: Position::new(id as f64 * 10_000.0, 0.0, 15000.0),
                velocity: initial_velocity(),
                lifetime: 0,
            })
            .await
            .unwrap();
    }

    let mut submissions = Vec::new();
    for id in 1..=AIRCRAFT {
        let airspace = Arc::clone(&airspace);
        submissions.push(tokio::spawn(async move {
            airspace
                .submit(Command::SetVelocity {
                    id,
                    velocity: commanded_velocity(id),
                })
                .await
        }));
    }
    for submission in submissions {
        submission.await.unwrap().unwrap();
    }

    let snapshot = airspace.snapshot().await;
    assert_eq!(snapshot.count, AIRCRAFT as usize);
    let mut ids: Vec<u32> = snapshot.aircraft.iter().map(|a| a.id).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), AIRCRAFT as usize);
    for record in &snapshot.aircraft {
        assert_eq!(record.velocity, commanded_velocity(record.id));
    }

    match Arc::try_unwrap(airspace) {
        Ok(airspace) => airspace.shutdown().await,
        Err(_) => panic!("airspace still referenced"),
    }
}
