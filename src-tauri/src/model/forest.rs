// Random-forest regressor backend
// Evaluates tree ensembles exported from scikit-learn as JSON

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::model::{ModelLoadError, PredictionError, Regressor};

/// Sentinel used by scikit-learn for "no child" / "no feature"
const TREE_LEAF: i64 = -1;

/// One fitted tree in scikit-learn `tree_` array layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeArrays {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    /// Leaf prediction per node (only read at leaves)
    pub value: Vec<f64>,
}

/// On-disk forest artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestArtifact {
    /// Prediction target, informational ("arousal", "valence")
    #[serde(default)]
    pub target: Option<String>,

    /// Number of input columns the forest was fitted on
    pub n_features: usize,

    pub trees: Vec<TreeArrays>,
}

#[derive(Debug, Clone)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf(f64),
}

#[derive(Debug, Clone)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn from_arrays(index: usize, arrays: &TreeArrays, n_features: usize) -> Result<Self, ModelLoadError> {
        let invalid = |reason: String| ModelLoadError::InvalidTree { index, reason };

        let n = arrays.children_left.len();
        if n == 0 {
            return Err(invalid("tree has no nodes".to_string()));
        }
        if [
            arrays.children_right.len(),
            arrays.feature.len(),
            arrays.threshold.len(),
            arrays.value.len(),
        ]
        .iter()
        .any(|&len| len != n)
        {
            return Err(invalid("node arrays differ in length".to_string()));
        }

        let mut nodes = Vec::with_capacity(n);
        for id in 0..n {
            let (left, right) = (arrays.children_left[id], arrays.children_right[id]);

            if left == TREE_LEAF && right == TREE_LEAF {
                let value = arrays.value[id];
                if !value.is_finite() {
                    return Err(invalid(format!("node {} has non-finite leaf value", id)));
                }
                nodes.push(Node::Leaf(value));
                continue;
            }

            // Children always follow their parent in depth-first export order,
            // which also rules out cycles
            let child = |c: i64| -> Result<usize, ModelLoadError> {
                if c > id as i64 && (c as usize) < n {
                    Ok(c as usize)
                } else {
                    Err(invalid(format!("node {} has invalid child {}", id, c)))
                }
            };
            let left = child(left)?;
            let right = child(right)?;

            let feature = arrays.feature[id];
            if feature < 0 || feature as usize >= n_features {
                return Err(invalid(format!(
                    "node {} splits on feature {} (forest has {})",
                    id, feature, n_features
                )));
            }

            nodes.push(Node::Split {
                feature: feature as usize,
                threshold: arrays.threshold[id],
                left,
                right,
            });
        }

        Ok(Tree { nodes })
    }

    fn predict(&self, features: &[f64]) -> f64 {
        let mut id = 0;
        loop {
            match self.nodes[id] {
                Node::Leaf(value) => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    // scikit-learn casts inputs to float32 before comparing
                    let x = features[feature] as f32 as f64;
                    id = if x <= threshold { left } else { right };
                }
            }
        }
    }
}

/// Averaging ensemble of regression trees
#[derive(Debug, Clone)]
pub struct ForestRegressor {
    name: String,
    n_features: usize,
    trees: Vec<Tree>,
}

impl ForestRegressor {
    /// Validate an artifact and build the evaluator
    pub fn from_artifact(name: &str, artifact: &ForestArtifact) -> Result<Self, ModelLoadError> {
        if artifact.trees.is_empty() {
            return Err(ModelLoadError::EmptyForest(name.to_string()));
        }

        let trees = artifact
            .trees
            .iter()
            .enumerate()
            .map(|(i, arrays)| Tree::from_arrays(i, arrays, artifact.n_features))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ForestRegressor {
            name: name.to_string(),
            n_features: artifact.n_features,
            trees,
        })
    }

    /// Deserialize from JSON bytes
    pub fn from_json_bytes(name: &str, data: &[u8]) -> Result<Self, ModelLoadError> {
        let artifact: ForestArtifact = serde_json::from_slice(data)?;
        Self::from_artifact(name, &artifact)
    }

    /// Load from a JSON file on disk
    pub fn load(path: &Path) -> Result<Self, ModelLoadError> {
        let data = std::fs::read(path).map_err(|source| ModelLoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "forest".to_string());

        let forest = Self::from_json_bytes(&name, &data)?;
        log::info!(
            "Loaded forest '{}' from {}: {} trees, {} features",
            forest.name,
            path.display(),
            forest.tree_count(),
            forest.n_features
        );
        Ok(forest)
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }
}

impl Regressor for ForestRegressor {
    fn name(&self) -> &str {
        &self.name
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, features: &[f64]) -> Result<f64, PredictionError> {
        if features.len() != self.n_features {
            return Err(PredictionError::FeatureCount {
                expected: self.n_features,
                actual: features.len(),
            });
        }

        let sum: f64 = self.trees.iter().map(|tree| tree.predict(features)).sum();
        Ok(sum / self.trees.len() as f64)
    }
}
