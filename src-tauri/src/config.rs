// Application paths
// Where model artifacts are looked up; there is no user-editable config file

use std::path::{Path, PathBuf};

use crate::model::{ModelLoadError, ModelPaths};

/// Bundle identifier, also the app data sub-directory name
pub const APP_IDENTIFIER: &str = "com.moodscope.app";

/// Directory (under each search root) holding the model artifacts
pub const MODEL_DIR_NAME: &str = "model";

/// Get the app data directory for Moodscope, if the platform has one
pub fn get_app_data_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join(APP_IDENTIFIER))
}

/// Model search order: `model/` under the working directory, then under
/// the app data directory
pub fn model_paths(working_dir: Option<&Path>) -> ModelPaths {
    let search_dirs = working_dir
        .map(Path::to_path_buf)
        .into_iter()
        .chain(get_app_data_dir())
        .map(|root| root.join(MODEL_DIR_NAME))
        .collect();

    ModelPaths::with_search_dirs(search_dirs)
}

/// Text of the startup dialog shown when the models cannot be loaded
pub fn model_load_message(error: &ModelLoadError, paths: &ModelPaths) -> String {
    let mut message = format!("Moodscope cannot start.\n\n{}", error);

    if matches!(error, ModelLoadError::NotFound(_)) {
        message.push_str(&format!(
            "\n\nPlace {} and {} in one of:",
            paths.arousal_file, paths.valence_file
        ));
        for dir in &paths.search_dirs {
            message.push_str(&format!("\n  {}", dir.display()));
        }
    }

    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_working_dir_searched_first() {
        let paths = model_paths(Some(Path::new("/opt/moodscope")));
        assert_eq!(paths.search_dirs[0], PathBuf::from("/opt/moodscope/model"));
        assert!(paths.search_dirs.iter().all(|d| d.ends_with(MODEL_DIR_NAME)));
        assert_eq!(paths.arousal_file, "arousal_forest.json");
    }

    #[test]
    fn test_without_working_dir() {
        let paths = model_paths(None);
        assert!(paths.search_dirs.len() <= 1);
        if let Some(dir) = paths.search_dirs.first() {
            assert!(dir.ends_with(Path::new(APP_IDENTIFIER).join(MODEL_DIR_NAME)));
        }
    }

    #[test]
    fn test_missing_models_message_lists_search_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let paths = model_paths(Some(dir.path()));
        let error = paths.resolve().unwrap_err();

        let message = model_load_message(&error, &paths);
        assert!(message.contains("arousal_forest.json"));
        assert!(message.contains("valence_forest.json"));
        for searched in &paths.search_dirs {
            assert!(message.contains(&searched.display().to_string()));
        }
    }

    #[test]
    fn test_invalid_model_message_has_cause_only() {
        let error = ModelLoadError::FeatureCountMismatch {
            name: "valence_forest".to_string(),
            expected: 5,
            actual: 10,
        };
        let message = model_load_message(&error, &model_paths(None));
        assert!(message.contains("valence_forest"));
        assert!(!message.contains("Place "));
    }
}
