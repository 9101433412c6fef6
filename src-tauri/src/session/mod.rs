// Session controller
// Owns the predictor and the list of songs with their ground-truth labels

pub mod models;

pub use models::{ConfusionReport, SongAnalysis, SongEntry};

use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

use crate::audio::{self, DecodeError};
use crate::emotion::{self, ConfusionMatrix, EmotionLabel, UnknownEmotion};
use crate::model::{PredictionError, Predictor};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Invalid emotion label: {0}")]
    Validation(#[from] UnknownEmotion),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("Prediction failed for {path}: {source}")]
    Prediction {
        path: PathBuf,
        #[source]
        source: PredictionError,
    },
}

/// An action was requested without a valid target
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("Please select a song to analyze.")]
    NoSongSelected,

    #[error("The selected song is no longer in the list.")]
    SongNotFound,

    #[error("Please add and label songs to test.")]
    NoLabeledSongs,
}

pub type SessionResult<T> = Result<T, SessionError>;

/// Single-window analysis session
pub struct Session {
    predictor: Predictor,
    songs: Vec<SongEntry>,
}

impl Session {
    pub fn new(predictor: Predictor) -> Self {
        Session {
            predictor,
            songs: Vec::new(),
        }
    }

    pub fn songs(&self) -> &[SongEntry] {
        &self.songs
    }

    pub fn song(&self, id: &Uuid) -> Option<&SongEntry> {
        self.songs.iter().find(|s| &s.id == id)
    }

    pub fn labeled_count(&self) -> usize {
        self.songs.iter().filter(|s| s.true_label.is_some()).count()
    }

    /// Add a song with an optional free-text ground-truth label
    ///
    /// Blank label text adds the song unlabeled. Nothing is recorded if
    /// the label or the file type is rejected.
    pub fn add_song(&mut self, path: &Path, label_text: Option<&str>) -> SessionResult<SongEntry> {
        let true_label = match label_text.map(str::trim) {
            Some(text) if !text.is_empty() => Some(text.parse::<EmotionLabel>()?),
            _ => None,
        };

        audio::supported_extension(path)?;

        let entry = SongEntry::new(path.to_path_buf(), true_label);
        log::info!(
            "Added song {} ({}), label: {}",
            entry.display_name(),
            entry.id,
            true_label.map_or("none", |l| l.as_str())
        );

        self.songs.push(entry.clone());
        Ok(entry)
    }

    /// Remove the selected song and its label together
    pub fn remove_song(&mut self, selected: Option<&Uuid>) -> SessionResult<SongEntry> {
        let id = selected.ok_or(SelectionError::NoSongSelected)?;
        let index = self
            .songs
            .iter()
            .position(|s| &s.id == id)
            .ok_or(SelectionError::SongNotFound)?;

        let entry = self.songs.remove(index);
        log::info!("Removed song {} ({})", entry.display_name(), entry.id);
        Ok(entry)
    }

    pub fn clear(&mut self) {
        log::info!("Cleared session ({} songs)", self.songs.len());
        self.songs.clear();
    }

    /// Predict and classify the selected song
    pub fn analyze(&self, selected: Option<&Uuid>) -> SessionResult<SongAnalysis> {
        let id = selected.ok_or(SelectionError::NoSongSelected)?;
        let entry = self.song(id).ok_or(SelectionError::SongNotFound)?;

        let analysis = self.analyze_entry(entry)?;
        log::info!(
            "Analyzed {}: arousal {:.3}, valence {:.3} -> {}",
            entry.display_name(),
            analysis.prediction.arousal,
            analysis.prediction.valence,
            analysis.classification.label
        );
        Ok(analysis)
    }

    /// Evaluate every labeled song against its ground truth
    pub fn confusion_matrix(&self) -> SessionResult<ConfusionReport> {
        if self.labeled_count() == 0 {
            return Err(SelectionError::NoLabeledSongs.into());
        }

        let mut pairs = Vec::with_capacity(self.songs.len());
        let mut unlabeled = 0u32;

        for entry in &self.songs {
            let Some(actual) = entry.true_label else {
                unlabeled += 1;
                continue;
            };
            let analysis = self.analyze_entry(entry)?;
            pairs.push((actual, analysis.classification.label));
        }

        let matrix = ConfusionMatrix::from_pairs(pairs);
        log::info!(
            "Confusion matrix: {} songs evaluated, {} correct, {} unlabeled skipped",
            matrix.total(),
            matrix.trace(),
            unlabeled
        );

        Ok(ConfusionReport {
            labels: EmotionLabel::ALL.to_vec(),
            evaluated: matrix.total(),
            unlabeled,
            correct: matrix.trace(),
            accuracy: matrix.accuracy(),
            matrix,
        })
    }

    fn analyze_entry(&self, entry: &SongEntry) -> SessionResult<SongAnalysis> {
        let audio = audio::decode_file(&entry.path)?;
        let features = audio::extract_feature_vector(&audio);

        let prediction = self
            .predictor
            .predict(&features)
            .map_err(|source| SessionError::Prediction {
                path: entry.path.clone(),
                source,
            })?;

        Ok(SongAnalysis {
            song_id: entry.id,
            path: entry.path.clone(),
            prediction,
            classification: emotion::classify(prediction.arousal, prediction.valence),
            features: features.stats(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::predictor::tests::fixed;
    use hound::{SampleFormat, WavSpec, WavWriter};

    /// Predicts (arousal, valence) = (0.5, 0.5): always Happy
    fn happy_session() -> Session {
        Session::new(Predictor::new(fixed("a", |_| 0.5), fixed("v", |_| 0.5)).unwrap())
    }

    /// Arousal tracks energy so loud files are Happy and silent ones Calm
    fn energy_session() -> Session {
        let arousal = fixed("a", |x| if x[1] > 0.01 { 0.5 } else { -0.5 });
        Session::new(Predictor::new(arousal, fixed("v", |_| 0.5)).unwrap())
    }

    fn write_wav(dir: &Path, name: &str, amplitude: f32) -> PathBuf {
        let path = dir.join(name);
        let spec = WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for i in 0..8000 {
            let s = amplitude * (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 8000.0).sin();
            writer.write_sample((s * 32767.0) as i16).unwrap();
        }
        writer.finalize().unwrap();
        path
    }

    #[test]
    fn test_add_song_with_label() {
        let mut session = happy_session();
        let entry = session.add_song(Path::new("/music/a.mp3"), Some("Happy")).unwrap();

        assert_eq!(entry.true_label, Some(EmotionLabel::Happy));
        assert_eq!(session.songs().len(), 1);
        assert_eq!(session.labeled_count(), 1);
        assert_eq!(entry.display_name(), "a.mp3");
    }

    #[test]
    fn test_add_song_without_label() {
        let mut session = happy_session();
        session.add_song(Path::new("/music/a.flac"), None).unwrap();
        session.add_song(Path::new("/music/b.flac"), Some("   ")).unwrap();

        assert_eq!(session.songs().len(), 2);
        assert_eq!(session.labeled_count(), 0);
    }

    #[test]
    fn test_invalid_label_records_nothing() {
        let mut session = happy_session();
        let result = session.add_song(Path::new("/music/a.wav"), Some("Bored"));

        assert!(matches!(result, Err(SessionError::Validation(_))));
        assert!(session.songs().is_empty());
        assert_eq!(session.labeled_count(), 0);
    }

    #[test]
    fn test_unsupported_file_records_nothing() {
        let mut session = happy_session();
        let result = session.add_song(Path::new("/docs/notes.txt"), Some("Sad"));

        assert!(matches!(result, Err(SessionError::Decode(DecodeError::UnsupportedFormat(_)))));
        assert!(session.songs().is_empty());
    }

    #[test]
    fn test_remove_keeps_remaining_labels_attached() {
        let mut session = happy_session();
        let a = session.add_song(Path::new("/m/a.wav"), Some("Sad")).unwrap();
        let b = session.add_song(Path::new("/m/b.wav"), Some("Calm")).unwrap();
        let c = session.add_song(Path::new("/m/c.wav"), None).unwrap();

        session.remove_song(Some(&a.id)).unwrap();

        assert_eq!(session.songs().len(), 2);
        assert_eq!(session.song(&b.id).unwrap().true_label, Some(EmotionLabel::Calm));
        assert_eq!(session.song(&c.id).unwrap().true_label, None);
        assert!(matches!(
            session.remove_song(Some(&a.id)),
            Err(SessionError::Selection(SelectionError::SongNotFound))
        ));
    }

    #[test]
    fn test_remove_requires_selection() {
        let mut session = happy_session();
        session.add_song(Path::new("/m/a.wav"), Some("Sad")).unwrap();

        assert!(matches!(
            session.remove_song(None),
            Err(SessionError::Selection(SelectionError::NoSongSelected))
        ));
        assert_eq!(session.songs().len(), 1);
    }

    #[test]
    fn test_clear() {
        let mut session = happy_session();
        session.add_song(Path::new("/m/a.wav"), Some("Sad")).unwrap();
        session.clear();
        assert!(session.songs().is_empty());
    }

    #[test]
    fn test_analyze_requires_selection() {
        let session = happy_session();
        assert!(matches!(
            session.analyze(None),
            Err(SessionError::Selection(SelectionError::NoSongSelected))
        ));
        assert!(matches!(
            session.analyze(Some(&Uuid::new_v4())),
            Err(SessionError::Selection(SelectionError::SongNotFound))
        ));
    }

    #[test]
    fn test_analyze_song() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_wav(dir.path(), "tone.wav", 0.5);

        let mut session = happy_session();
        let entry = session.add_song(&path, None).unwrap();
        let analysis = session.analyze(Some(&entry.id)).unwrap();

        assert_eq!(analysis.song_id, entry.id);
        assert_eq!(analysis.prediction.arousal, 0.5);
        assert_eq!(analysis.classification.label, EmotionLabel::Happy);
        assert_eq!(analysis.classification.color, "#1f77b4");
        assert!(analysis.features.energy > 0.1);
    }

    #[test]
    fn test_analyze_missing_file_is_decode_error() {
        let mut session = happy_session();
        let entry = session.add_song(Path::new("/nonexistent/gone.wav"), Some("Happy")).unwrap();

        let result = session.analyze(Some(&entry.id));
        assert!(matches!(result, Err(SessionError::Decode(DecodeError::Io(_)))));
        assert_eq!(session.songs().len(), 1);
    }

    #[test]
    fn test_confusion_requires_labels() {
        let mut session = happy_session();
        // Unlabeled and undecodable: rejected before any decoding happens
        session.add_song(Path::new("/nonexistent/a.wav"), None).unwrap();

        let result = session.confusion_matrix();
        assert!(matches!(result, Err(SessionError::Selection(SelectionError::NoLabeledSongs))));
    }

    #[test]
    fn test_confusion_matrix_diagonal_when_labels_match() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = energy_session();
        for i in 0..3 {
            let loud = write_wav(dir.path(), &format!("loud{}.wav", i), 0.8);
            session.add_song(&loud, Some("Happy")).unwrap();
        }
        let quiet = write_wav(dir.path(), "quiet.wav", 0.0);
        session.add_song(&quiet, Some("Calm")).unwrap();

        let report = session.confusion_matrix().unwrap();

        assert_eq!(report.evaluated, 4);
        assert_eq!(report.correct, 4);
        assert_eq!(report.matrix.trace(), 4);
        assert_eq!(report.matrix.count(EmotionLabel::Happy, EmotionLabel::Happy), 3);
        assert_eq!(report.matrix.count(EmotionLabel::Calm, EmotionLabel::Calm), 1);
        assert_eq!(report.accuracy, Some(1.0));
        assert_eq!(report.labels, EmotionLabel::ALL.to_vec());
    }

    #[test]
    fn test_confusion_matrix_skips_unlabeled_and_counts_misses() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = happy_session();
        let a = write_wav(dir.path(), "a.wav", 0.3);
        let b = write_wav(dir.path(), "b.wav", 0.3);
        let c = write_wav(dir.path(), "c.wav", 0.3);
        session.add_song(&a, Some("Sad")).unwrap();
        session.add_song(&b, None).unwrap();
        session.add_song(&c, Some("Happy")).unwrap();

        let report = session.confusion_matrix().unwrap();

        assert_eq!(report.evaluated, 2);
        assert_eq!(report.unlabeled, 1);
        assert_eq!(report.matrix.count(EmotionLabel::Sad, EmotionLabel::Happy), 1);
        assert_eq!(report.accuracy, Some(0.5));
    }

    #[test]
    fn test_confusion_matrix_aborts_on_decode_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = happy_session();
        let good = write_wav(dir.path(), "good.wav", 0.3);
        session.add_song(&good, Some("Happy")).unwrap();
        session.add_song(Path::new("/nonexistent/bad.flac"), Some("Sad")).unwrap();

        let result = session.confusion_matrix();
        assert!(matches!(result, Err(SessionError::Decode(_))));
        assert_eq!(session.songs().len(), 2);
        assert_eq!(session.labeled_count(), 2);
    }
}
