// Tauri IPC Commands
// Synchronous commands: Tauri runs them on the main thread, one at a time
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use tauri::State;
use uuid::Uuid;

use crate::audio::DecodeError;
use crate::emotion::{self, EmotionInfo};
use crate::session::{ConfusionReport, SelectionError, Session, SessionError, SongAnalysis, SongEntry};

/// Session held in Tauri managed state
pub struct SessionState(pub Mutex<Session>);

impl SessionState {
    pub fn new(session: Session) -> Self {
        SessionState(Mutex::new(session))
    }

    fn lock(&self) -> CommandResult<MutexGuard<'_, Session>> {
        self.0.lock().map_err(|_| CommandError {
            kind: ErrorKind::Error,
            title: "Internal Error".to_string(),
            message: "Session state is unavailable.".to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Error,
    Warning,
}

/// Error payload shown by the front end as a modal dialog
#[derive(Debug, Serialize)]
pub struct CommandError {
    kind: ErrorKind,
    title: String,
    message: String,
}

impl From<SessionError> for CommandError {
    fn from(error: SessionError) -> Self {
        let (kind, title) = match &error {
            SessionError::Validation(_) => (ErrorKind::Error, "Invalid Input"),
            SessionError::Selection(SelectionError::NoSongSelected) => (ErrorKind::Warning, "No Song Selected"),
            SessionError::Selection(SelectionError::SongNotFound) => (ErrorKind::Warning, "Song Not Found"),
            SessionError::Selection(SelectionError::NoLabeledSongs) => (ErrorKind::Warning, "No Test Songs"),
            SessionError::Decode(DecodeError::UnsupportedFormat(_)) => (ErrorKind::Error, "Unsupported File"),
            SessionError::Decode(_) => (ErrorKind::Error, "Decode Error"),
            SessionError::Prediction { .. } => (ErrorKind::Error, "Prediction Error"),
        };

        log::warn!("{}: {}", title, error);

        CommandError {
            kind,
            title: title.to_string(),
            message: error.to_string(),
        }
    }
}

type CommandResult<T> = Result<T, CommandError>;

/// List item for the song list box
#[derive(Debug, Serialize)]
pub struct SongData {
    pub id: String,
    pub path: String,
    pub name: String,
    pub true_label: Option<emotion::EmotionLabel>,
}

impl From<&SongEntry> for SongData {
    fn from(entry: &SongEntry) -> Self {
        SongData {
            id: entry.id.to_string(),
            path: entry.path.display().to_string(),
            name: entry.display_name(),
            true_label: entry.true_label,
        }
    }
}

fn parse_song_id(id: &str) -> CommandResult<Uuid> {
    Uuid::parse_str(id).map_err(|_| CommandError::from(SessionError::from(SelectionError::SongNotFound)))
}

// ==================== EMOTION COMMANDS ====================

/// Emotion names, colors and centroids for legends and the label hint
#[tauri::command]
pub fn list_emotions() -> Vec<EmotionInfo> {
    emotion::list_emotions()
}

// ==================== SESSION COMMANDS ====================

#[tauri::command]
pub fn list_songs(session: State<'_, SessionState>) -> CommandResult<Vec<SongData>> {
    let session = session.lock()?;
    Ok(session.songs().iter().map(SongData::from).collect())
}

#[derive(Debug, Deserialize)]
pub struct AddSongInput {
    pub path: String,
    pub label: Option<String>,
}

#[tauri::command]
pub fn add_song(session: State<'_, SessionState>, input: AddSongInput) -> CommandResult<SongData> {
    let mut session = session.lock()?;
    let entry = session.add_song(&PathBuf::from(input.path), input.label.as_deref())?;
    Ok(SongData::from(&entry))
}

#[tauri::command]
pub fn remove_song(session: State<'_, SessionState>, id: Option<String>) -> CommandResult<()> {
    let uuid = id.as_deref().map(parse_song_id).transpose()?;
    let mut session = session.lock()?;
    session.remove_song(uuid.as_ref())?;
    Ok(())
}

#[tauri::command]
pub fn clear_session(session: State<'_, SessionState>) -> CommandResult<()> {
    session.lock()?.clear();
    Ok(())
}

// ==================== ANALYSIS COMMANDS ====================

/// Predict arousal/valence for the selected song
#[tauri::command]
pub fn analyze_song(session: State<'_, SessionState>, id: Option<String>) -> CommandResult<SongAnalysis> {
    let uuid = id.as_deref().map(parse_song_id).transpose()?;
    let session = session.lock()?;
    Ok(session.analyze(uuid.as_ref())?)
}

/// Ground truth vs predicted emotion over all labeled songs
#[tauri::command]
pub fn confusion_matrix(session: State<'_, SessionState>) -> CommandResult<ConfusionReport> {
    let session = session.lock()?;
    Ok(session.confusion_matrix()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emotion::UnknownEmotion;

    #[test]
    fn test_validation_maps_to_invalid_input() {
        let error = CommandError::from(SessionError::Validation(UnknownEmotion("Meh".to_string())));
        assert_eq!(error.kind, ErrorKind::Error);
        assert_eq!(error.title, "Invalid Input");
        assert!(error.message.contains("Meh"));
    }

    #[test]
    fn test_selection_titles() {
        let no_song = CommandError::from(SessionError::from(SelectionError::NoSongSelected));
        assert_eq!(no_song.kind, ErrorKind::Warning);
        assert_eq!(no_song.title, "No Song Selected");
        assert_eq!(no_song.message, "Please select a song to analyze.");

        let no_labels = CommandError::from(SessionError::from(SelectionError::NoLabeledSongs));
        assert_eq!(no_labels.title, "No Test Songs");
    }

    #[test]
    fn test_error_serializes_for_frontend() {
        let error = CommandError::from(SessionError::Decode(DecodeError::Empty));
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(json["kind"], "error");
        assert_eq!(json["title"], "Decode Error");
    }

    #[test]
    fn test_bad_song_id() {
        let error = parse_song_id("not-a-uuid").unwrap_err();
        assert_eq!(error.kind, ErrorKind::Warning);
        assert_eq!(error.title, "Song Not Found");
    }
}
