//! Roadmapper turns model-generated learning roadmaps into a persistent
//! checklist: parse the text into phases, track which items are done, and
//! keep that progress across sessions.

pub mod config;
pub mod error;
pub mod generate;
pub mod logging;
pub mod payload;
pub mod render;
pub mod roadmap;
pub mod store;
pub mod util;

#[cfg(feature = "desktop")]
mod commands;

pub use error::{Result, RoadmapError};
pub use roadmap::{make_item_id, parse_roadmap, Phase, Tracker};
pub use store::{PersistState, StateStore, StorageKey};

/// Starts the desktop shell.
#[cfg(feature = "desktop")]
pub fn run() {
    let config = config::load_or_default();
    logging::init(config.log_level());

    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .manage(commands::roadmap::TrackerState::default())
        .invoke_handler(tauri::generate_handler![
            commands::roadmap::generate_roadmap,
            commands::roadmap::open_roadmap,
            commands::roadmap::roadmap_view,
            commands::roadmap::toggle_item,
            commands::roadmap::toggle_phase,
            commands::roadmap::reset_progress,
            commands::config::load_config,
            commands::config::save_settings,
        ])
        .run(tauri::generate_context!())
        .expect("failed to run Roadmapper");
}
