// Emotion module
// Label set, rule-based classification and confusion matrix

pub mod classifier;
pub mod confusion;
pub mod types;

pub use classifier::{classify, Classification};
pub use confusion::ConfusionMatrix;
pub use types::{list_emotions, EmotionInfo, EmotionLabel, UnknownEmotion};
