use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{info, warn, Level};

use airspace_monitor::command::{Command, CommandEnvelope, CommandParser, ConsoleInput};
use airspace_monitor::registry::AircraftRegistry;
use airspace_monitor::scenario::{self, ScenarioEntry};
use airspace_monitor::{Airspace, AirspaceConfig, AirspaceSnapshot};

#[derive(Parser)]
#[command(name = "airspace-monitor")]
#[command(about = "Concurrent airspace monitor with conflict prediction", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the airspace core with an operator console on stdin
    Run {
        /// JSON configuration file (defaults apply if omitted)
        #[arg(short, long)]
        config: Option<String>,

        /// Traffic scenario file: one `id x y z vx vy vz lifetime` per line
        #[arg(short, long)]
        scenario: Option<String>,

        /// Generate this many random aircraft instead of a scenario file
        #[arg(short, long)]
        random: Option<usize>,

        /// Stop automatically after this many seconds
        #[arg(short, long)]
        duration: Option<u64>,
    },

    /// Parse a scenario file and print what it contains
    CheckScenario {
        path: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            scenario,
            random,
            duration,
        } => {
            let config = match config {
                Some(path) => AirspaceConfig::load(&path)?,
                None => AirspaceConfig::default(),
            };
            let entries = match (scenario, random) {
                (Some(path), _) => scenario::load_scenario(&path)?,
                (None, Some(count)) => scenario::random_traffic(count),
                (None, None) => Vec::new(),
            };
            run(config, entries, duration).await?;
        }

        Commands::CheckScenario { path } => {
            let entries = scenario::load_scenario(&path)?;
            println!("{}: {} aircraft", path, entries.len());
            for e in &entries {
                println!(
                    "  Aircraft {}: pos=({}, {}, {}) vel=({}, {}, {}) lifetime={}s",
                    e.id,
                    e.position.x,
                    e.position.y,
                    e.position.z,
                    e.velocity.vx,
                    e.velocity.vy,
                    e.velocity.vz,
                    e.lifetime
                );
            }
        }
    }

    Ok(())
}

async fn run(config: AirspaceConfig, entries: Vec<ScenarioEntry>, duration: Option<u64>) -> Result<()> {
    info!("Starting airspace monitor");

    let (events_tx, events_rx) = mpsc::channel(256);
    let sink = airspace_monitor::events::spawn_console_sink(events_rx);

    let mut airspace = Airspace::new(&config, events_tx)?;
    airspace.spawn_status_logger(5);

    for entry in entries {
        let result = airspace
            .submit(Command::AddAircraft {
                id: entry.id,
                position: entry.position,
                velocity: entry.velocity,
                lifetime: entry.lifetime,
            })
            .await;
        if let Err(e) = result {
            warn!("Could not add aircraft {}: {}", entry.id, e);
        }
    }

    // Ctrl-C and the console's `exit` verb both land on this channel.
    let (stop_tx, mut stop_rx) = mpsc::channel::<()>(1);
    {
        let stop = stop_tx.clone();
        ctrlc::set_handler(move || {
            let _ = stop.blocking_send(());
        })?;
    }

    let (console_quit_tx, console_quit_rx) = watch::channel(false);
    let console = tokio::spawn(operator_console(
        airspace.command_sender(),
        airspace.registry(),
        stop_tx,
        console_quit_rx,
    ));

    match duration {
        Some(secs) => {
            tokio::select! {
                _ = tokio::time::sleep(std::time::Duration::from_secs(secs)) => {
                    info!("Run duration elapsed");
                }
                _ = stop_rx.recv() => {
                    info!("Stop requested");
                }
            }
        }
        None => {
            stop_rx.recv().await;
            info!("Stop requested");
        }
    }

    let _ = console_quit_tx.send(true);
    let _ = console.await;
    airspace.shutdown().await;
    let _ = sink.await;
    Ok(())
}

/// Operator console: reads command lines from stdin, queues them on the
/// command channel, and prints each acknowledgment.
async fn operator_console(
    command_tx: mpsc::Sender<CommandEnvelope>,
    registry: Arc<AircraftRegistry>,
    stop_tx: mpsc::Sender<()>,
    mut quit_rx: watch::Receiver<bool>,
) {
    let parser = CommandParser::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("Operator console ready. Type 'help' for commands.");

    loop {
        tokio::select! {
            _ = quit_rx.changed() => return,
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => return,
                    Err(e) => {
                        warn!("Console input error: {}", e);
                        return;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }
                match parser.parse(&line) {
                    Ok(ConsoleInput::Command(command)) => {
                        match submit(&command_tx, command).await {
                            Ok(()) => println!("ok"),
                            Err(e) => println!("error: {}", e),
                        }
                    }
                    Ok(ConsoleInput::Show) => {
                        let aircraft: Vec<_> = registry
                            .snapshot()
                            .await
                            .into_iter()
                            .map(|(_, record)| record)
                            .collect();
                        let snapshot = AirspaceSnapshot {
                            count: aircraft.len(),
                            aircraft,
                        };
                        print!("{}", snapshot);
                    }
                    Ok(ConsoleInput::Help) => println!("{}", CommandParser::help_text()),
                    Ok(ConsoleInput::Exit) => {
                        let _ = stop_tx.send(()).await;
                        return;
                    }
                    Err(e) => println!("error: {}", e),
                }
            }
        }
    }
}

async fn submit(
    command_tx: &mpsc::Sender<CommandEnvelope>,
    command: Command,
) -> Result<(), airspace_monitor::AirspaceError> {
    let (reply_tx, reply_rx) = oneshot::channel();
    command_tx
        .send(CommandEnvelope {
            command,
            reply: reply_tx,
        })
        .await
        .map_err(|_| {
            airspace_monitor::AirspaceError::ResourceUnavailable("command queue closed".into())
        })?;
    reply_rx.await.map_err(|_| {
        airspace_monitor::AirspaceError::ResourceUnavailable("command processor gone".into())
    })?
}
