// Audio processing module
// Handles audio file decoding and acoustic feature extraction

pub mod features;
pub mod ingest;
pub mod tempo;

pub use features::{extract_feature_vector, AcousticFeatures, FeatureVector, FEATURE_LEN};
pub use ingest::{decode_file, supported_extension, AudioData, DecodeError};
