// Data models for session state and analysis results
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

use crate::audio::AcousticFeatures;
use crate::emotion::{Classification, ConfusionMatrix, EmotionLabel};
use crate::model::Prediction;

/// A song in the session list together with its ground-truth label
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SongEntry {
    pub id: Uuid,
    pub path: PathBuf,
    pub added_at: DateTime<Utc>,
    pub true_label: Option<EmotionLabel>,
}

impl SongEntry {
    pub fn new(path: PathBuf, true_label: Option<EmotionLabel>) -> Self {
        SongEntry {
            id: Uuid::new_v4(),
            path,
            added_at: Utc::now(),
            true_label,
        }
    }

    /// File name for list display
    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Result of analyzing one song
#[derive(Debug, Clone, Serialize)]
pub struct SongAnalysis {
    pub song_id: Uuid,
    pub path: PathBuf,
    pub prediction: Prediction,
    pub classification: Classification,
    pub features: AcousticFeatures,
}

/// Confusion matrix over every labeled song in the session
#[derive(Debug, Clone, Serialize)]
pub struct ConfusionReport {
    /// Row/column names in matrix order
    pub labels: Vec<EmotionLabel>,
    pub matrix: ConfusionMatrix,
    /// Songs paired with their ground truth
    pub evaluated: u32,
    /// Songs skipped because they carry no ground-truth label
    pub unlabeled: u32,
    pub correct: u32,
    pub accuracy: Option<f64>,
}
