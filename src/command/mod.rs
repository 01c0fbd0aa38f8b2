mod parser;
mod processor;

pub use parser::{CommandParser, ConsoleInput};
pub use processor::{CommandEnvelope, CommandProcessor, CommandResult};

use crate::registry::{Position, Velocity};

/// Operator-issued operations against the airspace, applied one at a time in
/// arrival order by the `CommandProcessor`.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetVelocity {
        id: u32,
        velocity: Velocity,
    },
    SetAltitude {
        id: u32,
        z: f64,
    },
    AddAircraft {
        id: u32,
        position: Position,
        velocity: Velocity,
        /// Seconds before the aircraft leaves on its own; 0 = unbounded.
        lifetime: u64,
    },
    RemoveAircraft {
        id: u32,
    },
    SetPredictionWindow {
        seconds: u64,
    },
}
