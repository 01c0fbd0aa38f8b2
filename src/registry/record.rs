use serde::{Deserialize, Serialize};

/// A point in the airspace (airspace distance units).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Velocity in airspace units per second.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Velocity {
    pub vx: f64,
    pub vy: f64,
    pub vz: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Constant-velocity linear extrapolation `position + velocity * seconds`.
    pub fn projected(&self, velocity: Velocity, seconds: f64) -> Position {
        Position {
            x: self.x + velocity.vx * seconds,
            y: self.y + velocity.vy * seconds,
            z: self.z + velocity.vz * seconds,
        }
    }

    /// Horizontal (x/y plane) distance to another position.
    pub fn horizontal_distance(&self, other: &Position) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Absolute altitude difference to another position.
    pub fn vertical_distance(&self, other: &Position) -> f64 {
        (self.z - other.z).abs()
    }
}

impl Velocity {
    pub fn new(vx: f64, vy: f64, vz: f64) -> Self {
        Self { vx, vy, vz }
    }
}

/// One tracked aircraft: identity plus current kinematic state.
///
/// The registry slot is the sole owner; everything else works with clones
/// taken through `AircraftRegistry::read`/`snapshot`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AircraftRecord {
    pub id: u32,
    pub position: Position,
    pub velocity: Velocity,
}

impl AircraftRecord {
    pub fn new(id: u32, position: Position, velocity: Velocity) -> Self {
        Self {
            id,
            position,
            velocity,
        }
    }

    /// Advance position by one tick of `dt` seconds.
    pub fn advance(&mut self, dt: f64) {
        self.position = self.position.projected(self.velocity, dt);
    }
}
