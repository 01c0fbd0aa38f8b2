mod record;
mod table;

pub use record::{AircraftRecord, Position, Velocity};
pub use table::{AircraftRegistry, SlotHandle};
