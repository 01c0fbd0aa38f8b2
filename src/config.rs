use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;

use crate::error::AirspaceError;

/// Runtime configuration loaded from JSON, with defaults matching the
/// reference deployment (100 tracked aircraft, 3000/1000 separation minima).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct AirspaceConfig {
    /// Maximum number of simultaneously tracked aircraft.
    pub capacity: usize,
    /// Minimum horizontal separation (airspace distance units).
    pub horizontal_threshold: f64,
    /// Minimum vertical separation (airspace distance units).
    pub vertical_threshold: f64,
    /// Seconds into the future used for conflict projection at startup.
    pub default_prediction_window: u64,
    /// Period of the conflict scan task, seconds.
    pub scan_period_seconds: u64,
    /// Period of each aircraft's position update, seconds.
    pub kinematics_tick_seconds: u64,
}

impl Default for AirspaceConfig {
    fn default() -> Self {
        Self {
            capacity: 100,
            horizontal_threshold: 3000.0,
            vertical_threshold: 1000.0,
            default_prediction_window: 10,
            scan_period_seconds: 1,
            kinematics_tick_seconds: 1,
        }
    }
}

/// Prediction windows above this are operator typos, not intent.
pub const MAX_PREDICTION_WINDOW_SECS: u64 = 3600;

impl AirspaceConfig {
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path))?;
        let config: AirspaceConfig = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config JSON: {}", path))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects configurations the core cannot honor. Out-of-range values
    /// are errors, never silently clamped.
    pub fn validate(&self) -> Result<(), AirspaceError> {
        if self.capacity == 0 {
            return Err(AirspaceError::InvalidParameter(
                "capacity must be at least 1".into(),
            ));
        }
        if self.horizontal_threshold <= 0.0 || self.vertical_threshold <= 0.0 {
            return Err(AirspaceError::InvalidParameter(
                "separation thresholds must be positive".into(),
            ));
        }
        if self.default_prediction_window == 0
            || self.default_prediction_window > MAX_PREDICTION_WINDOW_SECS
        {
            return Err(AirspaceError::InvalidParameter(format!(
                "prediction window must be 1..={} seconds",
                MAX_PREDICTION_WINDOW_SECS
            )));
        }
        if self.scan_period_seconds == 0 || self.kinematics_tick_seconds == 0 {
            return Err(AirspaceError::InvalidParameter(
                "scan period and kinematics tick must be at least 1 second".into(),
            ));
        }
        Ok(())
    }
}
