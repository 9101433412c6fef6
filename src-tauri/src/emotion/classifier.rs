// Rule-based emotion classifier
// Maps an (arousal, valence) pair to a label with ordered range rules

use serde::Serialize;

use crate::emotion::types::EmotionLabel;

/// Classifier output: label plus its plot color
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Classification {
    pub label: EmotionLabel,
    pub color: &'static str,
}

/// Inclusive valence/arousal box
struct Rule {
    label: EmotionLabel,
    valence: (f64, f64),
    arousal: (f64, f64),
}

impl Rule {
    fn matches(&self, arousal: f64, valence: f64) -> bool {
        (self.valence.0..=self.valence.1).contains(&valence)
            && (self.arousal.0..=self.arousal.1).contains(&arousal)
    }
}

/// Evaluated top to bottom, first match wins.
///
/// Joy lies inside Happy and Fear inside Anger, so neither can ever be
/// returned. Known defect; kept so existing predictions stay comparable.
const RULES: [Rule; 6] = [
    Rule {
        label: EmotionLabel::Sad,
        valence: (-1.0, -0.5),
        arousal: (-1.0, -0.5),
    },
    Rule {
        label: EmotionLabel::Happy,
        valence: (0.0, 1.0),
        arousal: (0.0, 1.0),
    },
    Rule {
        label: EmotionLabel::Calm,
        valence: (0.0, 1.0),
        arousal: (-1.0, 0.0),
    },
    Rule {
        label: EmotionLabel::Anger,
        valence: (-1.0, 0.0),
        arousal: (0.0, 1.0),
    },
    Rule {
        label: EmotionLabel::Joy,
        valence: (0.7, 1.0),
        arousal: (0.7, 1.0),
    },
    Rule {
        label: EmotionLabel::Fear,
        valence: (-1.0, -0.7),
        arousal: (0.7, 1.0),
    },
];

/// Classify a predicted point; out-of-range and NaN inputs are Mixed
pub fn classify(arousal: f64, valence: f64) -> Classification {
    let label = RULES
        .iter()
        .find(|rule| rule.matches(arousal, valence))
        .map(|rule| rule.label)
        .unwrap_or(EmotionLabel::Mixed);

    Classification {
        label,
        color: label.color(),
    }
}
