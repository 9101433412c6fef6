// Emotion label types
// Closed set of emotions with display colors and reference centroids

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Discrete emotion on the arousal/valence plane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmotionLabel {
    /// Positive valence, high arousal
    Happy,

    /// Negative valence, low arousal
    Sad,

    /// Positive valence, low arousal
    Calm,

    /// Negative valence, high arousal
    Anger,

    /// Strongly positive, very high arousal
    Joy,

    /// Strongly negative, very high arousal
    Fear,

    /// Anything not covered by another rule
    Mixed,
}

/// Reference point of a label on the plane
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Centroid {
    pub valence: f64,
    pub arousal: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{0}' is not a known emotion (expected one of: Happy, Sad, Calm, Anger, Joy, Fear, Mixed)")]
pub struct UnknownEmotion(pub String);

impl EmotionLabel {
    /// Canonical order, used for confusion matrix rows and columns
    pub const ALL: [EmotionLabel; 7] = [
        EmotionLabel::Happy,
        EmotionLabel::Sad,
        EmotionLabel::Calm,
        EmotionLabel::Anger,
        EmotionLabel::Joy,
        EmotionLabel::Fear,
        EmotionLabel::Mixed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EmotionLabel::Happy => "Happy",
            EmotionLabel::Sad => "Sad",
            EmotionLabel::Calm => "Calm",
            EmotionLabel::Anger => "Anger",
            EmotionLabel::Joy => "Joy",
            EmotionLabel::Fear => "Fear",
            EmotionLabel::Mixed => "Mixed",
        }
    }

    /// Plot color (hex)
    pub fn color(&self) -> &'static str {
        match self {
            EmotionLabel::Happy => "#1f77b4",
            EmotionLabel::Sad => "#ff7f0e",
            EmotionLabel::Calm => "#2ca02c",
            EmotionLabel::Anger => "#d62728",
            EmotionLabel::Joy => "#9467bd",
            EmotionLabel::Fear => "#8c564b",
            EmotionLabel::Mixed => "#7f7f7f",
        }
    }

    /// Reference centroid; informational only, the classifier does not use it
    pub fn centroid(&self) -> Centroid {
        let (valence, arousal) = match self {
            EmotionLabel::Happy => (0.7, 0.7),
            EmotionLabel::Sad => (-0.7, -0.7),
            EmotionLabel::Calm => (0.0, -0.7),
            EmotionLabel::Anger => (-0.7, 0.7),
            EmotionLabel::Joy => (0.9, 0.9),
            EmotionLabel::Fear => (-0.9, 0.9),
            EmotionLabel::Mixed => (0.0, 0.0),
        };
        Centroid { valence, arousal }
    }

    /// Position in `ALL`
    pub fn index(&self) -> usize {
        match self {
            EmotionLabel::Happy => 0,
            EmotionLabel::Sad => 1,
            EmotionLabel::Calm => 2,
            EmotionLabel::Anger => 3,
            EmotionLabel::Joy => 4,
            EmotionLabel::Fear => 5,
            EmotionLabel::Mixed => 6,
        }
    }
}

impl fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmotionLabel {
    type Err = UnknownEmotion;

    /// Exact, case-sensitive name match after trimming surrounding whitespace
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        EmotionLabel::ALL
            .iter()
            .copied()
            .find(|label| label.as_str() == name)
            .ok_or_else(|| UnknownEmotion(s.to_string()))
    }
}

/// Label summary for the front end
#[derive(Debug, Clone, Serialize)]
pub struct EmotionInfo {
    pub label: EmotionLabel,
    pub color: &'static str,
    pub centroid: Centroid,
}

pub fn list_emotions() -> Vec<EmotionInfo> {
    EmotionLabel::ALL
        .iter()
        .map(|&label| EmotionInfo {
            label,
            color: label.color(),
            centroid: label.centroid(),
        })
        .collect()
}
