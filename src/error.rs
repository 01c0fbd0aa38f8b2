use thiserror::Error;

/// Failures the airspace core reports to callers.
///
/// Per-command failures are recoverable and returned on the command's ack
/// channel; `ResourceUnavailable` is fatal at startup.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AirspaceError {
    #[error("airspace table is full")]
    CapacityExceeded,

    #[error("aircraft {0} not found")]
    AircraftNotFound(u32),

    #[error("aircraft {0} is already active")]
    DuplicateId(u32),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("shared airspace table unavailable: {0}")]
    ResourceUnavailable(String),
}
