mod matrix;
mod predictor;

pub use matrix::ConflictMatrix;
pub use predictor::{ConflictPredictor, PredictionWindow};
