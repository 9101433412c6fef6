// Regression model module
// Pre-trained arousal/valence regressors and the predictor pairing them

pub mod forest;
pub mod predictor;

pub use forest::ForestRegressor;
pub use predictor::{ModelPaths, Prediction, Predictor};

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading model artifacts (fatal at startup)
#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("Model artifacts not found; searched: {0}")]
    NotFound(String),

    #[error("Failed to read model {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse model artifact: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Model '{0}' contains no trees")]
    EmptyForest(String),

    #[error("Invalid tree {index}: {reason}")]
    InvalidTree { index: usize, reason: String },

    #[error("Model '{name}' expects {expected} features, extractor produces {actual}")]
    FeatureCountMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },
}

/// Errors raised per prediction call
#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("Feature vector has {actual} values, model expects {expected}")]
    FeatureCount { expected: usize, actual: usize },

    #[error("Feature {index} is not a finite number")]
    NonFiniteFeature { index: usize },

    #[error("Model '{0}' produced a non-finite prediction")]
    NonFiniteOutput(String),
}

/// A fitted single-output regression model
pub trait Regressor: Send + Sync {
    /// Identifier used in logs and errors
    fn name(&self) -> &str;

    /// Number of input columns the model was fitted on
    fn n_features(&self) -> usize;

    fn predict(&self, features: &[f64]) -> Result<f64, PredictionError>;
}
