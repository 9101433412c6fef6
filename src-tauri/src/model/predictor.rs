// Arousal/valence predictor
// Owns the two independently fitted regressors

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::audio::{FeatureVector, FEATURE_LEN};
use crate::model::{ForestRegressor, ModelLoadError, PredictionError, Regressor};

/// Predicted position on the arousal/valence plane
///
/// Nominally within [-1, 1] on both axes; not clamped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub arousal: f64,
    pub valence: f64,
}

/// File names of the model artifacts and the directories searched for them
#[derive(Debug, Clone)]
pub struct ModelPaths {
    pub arousal_file: String,
    pub valence_file: String,
    pub search_dirs: Vec<PathBuf>,
}

impl Default for ModelPaths {
    fn default() -> Self {
        ModelPaths {
            arousal_file: "arousal_forest.json".to_string(),
            valence_file: "valence_forest.json".to_string(),
            search_dirs: Vec::new(),
        }
    }
}

impl ModelPaths {
    pub fn with_search_dirs(search_dirs: Vec<PathBuf>) -> Self {
        ModelPaths {
            search_dirs,
            ..Self::default()
        }
    }

    /// First search directory containing both artifacts
    pub fn resolve(&self) -> Result<(PathBuf, PathBuf), ModelLoadError> {
        self.search_dirs
            .iter()
            .map(|dir| (dir.join(&self.arousal_file), dir.join(&self.valence_file)))
            .find(|(arousal, valence)| arousal.is_file() && valence.is_file())
            .ok_or_else(|| {
                let searched: Vec<String> = self
                    .search_dirs
                    .iter()
                    .map(|d| d.display().to_string())
                    .collect();
                ModelLoadError::NotFound(if searched.is_empty() {
                    "<no directories>".to_string()
                } else {
                    searched.join(", ")
                })
            })
    }
}

/// Pair of regressors consuming the same feature vector
pub struct Predictor {
    arousal: Box<dyn Regressor>,
    valence: Box<dyn Regressor>,
}

impl Predictor {
    /// Pair two regressors, rejecting any not fitted on the extractor's output
    pub fn new(arousal: Box<dyn Regressor>, valence: Box<dyn Regressor>) -> Result<Self, ModelLoadError> {
        for model in [&arousal, &valence] {
            if model.n_features() != FEATURE_LEN {
                return Err(ModelLoadError::FeatureCountMismatch {
                    name: model.name().to_string(),
                    expected: model.n_features(),
                    actual: FEATURE_LEN,
                });
            }
        }

        Ok(Predictor { arousal, valence })
    }

    /// Load both forest artifacts from the first directory holding them
    pub fn load(paths: &ModelPaths) -> Result<Self, ModelLoadError> {
        let (arousal_path, valence_path) = paths.resolve()?;
        Self::load_files(&arousal_path, &valence_path)
    }

    pub fn load_files(arousal_path: &Path, valence_path: &Path) -> Result<Self, ModelLoadError> {
        let arousal = ForestRegressor::load(arousal_path)?;
        let valence = ForestRegressor::load(valence_path)?;
        Self::new(Box::new(arousal), Box::new(valence))
    }

    pub fn predict(&self, features: &FeatureVector) -> Result<Prediction, PredictionError> {
        let values = features.as_slice();

        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(PredictionError::NonFiniteFeature { index });
        }

        Ok(Prediction {
            arousal: run_model(self.arousal.as_ref(), values)?,
            valence: run_model(self.valence.as_ref(), values)?,
        })
    }
}

fn run_model(model: &dyn Regressor, values: &[f64]) -> Result<f64, PredictionError> {
    let output = model.predict(values)?;
    if output.is_finite() {
        Ok(output)
    } else {
        Err(PredictionError::NonFiniteOutput(model.name().to_string()))
    }
}
