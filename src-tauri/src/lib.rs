// Moodscope - Song arousal/valence prediction
// Module declarations

use tauri::Manager;
use tauri_plugin_dialog::{DialogExt, MessageDialogKind};

mod audio;
mod commands;
mod config;
mod emotion;
mod model;
mod session;

use commands::SessionState;
use model::Predictor;
use session::Session;

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    tauri::Builder::default()
        .plugin(tauri_plugin_dialog::init())
        .setup(|app| {
            if cfg!(debug_assertions) {
                app.handle().plugin(
                    tauri_plugin_log::Builder::default()
                        .level(log::LevelFilter::Info)
                        .build(),
                )?;
            }

            // Both regressors must load before the window is usable
            let working_dir = std::env::current_dir().ok();
            let paths = config::model_paths(working_dir.as_deref());
            let predictor = Predictor::load(&paths).map_err(|e| {
                log::error!("Failed to load prediction models: {}", e);
                app.dialog()
                    .message(config::model_load_message(&e, &paths))
                    .title("Model Load Error")
                    .kind(MessageDialogKind::Error)
                    .blocking_show();
                e
            })?;

            app.manage(SessionState::new(Session::new(predictor)));

            log::info!("Moodscope initialized successfully");
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            commands::list_emotions,
            commands::list_songs,
            commands::add_song,
            commands::remove_song,
            commands::clear_session,
            commands::analyze_song,
            commands::confusion_matrix,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
