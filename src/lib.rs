pub mod airspace;
pub mod command;
pub mod config;
pub mod conflict;
pub mod error;
pub mod events;
pub mod kinematics;
pub mod registry;
pub mod scenario;

pub use airspace::{Airspace, AirspaceSnapshot};
pub use command::{Command, CommandParser, CommandProcessor, ConsoleInput};
pub use config::AirspaceConfig;
pub use conflict::{ConflictPredictor, PredictionWindow};
pub use error::AirspaceError;
pub use events::AirspaceEvent;
pub use registry::{AircraftRecord, AircraftRegistry, Position, SlotHandle, Velocity};
