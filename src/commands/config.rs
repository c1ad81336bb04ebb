use crate::config::{self, RoadmapperConfig, SettingsUpdate};
use crate::error::Result;

#[tauri::command]
pub async fn load_config() -> Option<RoadmapperConfig> {
    config::load_config()
}

#[tauri::command]
pub async fn save_settings(settings: SettingsUpdate) -> Result<RoadmapperConfig> {
    config::save_settings(settings)
}
