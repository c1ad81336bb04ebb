use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Result, RoadmapError};
use crate::store::{FileStore, StateStore, StorageKey};
use crate::util::{expand_tilde, roadmapper_dir};

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-lite";
pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_LOG_LEVEL: &str = "warn";
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Persisted settings (`~/.roadmapper/config.json`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadmapperConfig {
    pub version: u32,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_key: Option<String>,
    #[serde(default)]
    pub namespace_by_roadmap: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_topic: Option<String>,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

impl Default for RoadmapperConfig {
    fn default() -> Self {
        Self {
            version: 1,
            model: default_model(),
            api_base_url: default_api_base_url(),
            state_dir: None,
            storage_key: None,
            namespace_by_roadmap: false,
            request_timeout_secs: None,
            log_level: None,
            last_topic: None,
        }
    }
}

impl RoadmapperConfig {
    /// Directory holding progress documents. Defaults to `~/.roadmapper/state`.
    pub fn state_dir(&self) -> Option<PathBuf> {
        match self.state_dir.as_deref().filter(|d| !d.trim().is_empty()) {
            Some(dir) => Some(PathBuf::from(expand_tilde(dir))),
            None => roadmapper_dir().map(|d| d.join("state")),
        }
    }

    /// Storage key for a roadmap under the current settings.
    pub fn storage_key_for(&self, raw: &str) -> StorageKey {
        if self.namespace_by_roadmap {
            StorageKey::for_roadmap(raw)
        } else {
            match self.storage_key.as_deref().filter(|k| !k.trim().is_empty()) {
                Some(key) => StorageKey::new(key),
                None => StorageKey::default(),
            }
        }
    }

    /// Progress store for a roadmap. Without a usable directory the store is
    /// inert and progress lives only in memory.
    pub fn state_store(&self, raw: &str) -> StateStore {
        let key = self.storage_key_for(raw);
        match self.state_dir() {
            Some(dir) => {
                tracing::debug!(dir = %dir.display(), %key, "using file progress store");
                StateStore::new(FileStore::new(dir), key)
            }
            None => {
                tracing::warn!("no home directory; progress will not be saved");
                StateStore::new(crate::store::UnavailableStore, key)
            }
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }
}

/// Reads the generation API key from the environment.
pub fn api_key() -> Result<String> {
    match std::env::var(API_KEY_ENV) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(RoadmapError::Config(format!(
            "Missing API key. Please set the {API_KEY_ENV} environment variable."
        ))),
    }
}

pub fn config_path() -> Option<PathBuf> {
    roadmapper_dir().map(|d| d.join("config.json"))
}

/// File the CLI keeps the most recently generated roadmap in.
pub fn last_roadmap_path() -> Option<PathBuf> {
    roadmapper_dir().map(|d| d.join("last-roadmap.md"))
}

/// Loads the config, or `None` if it is missing or unreadable.
pub fn load_config() -> Option<RoadmapperConfig> {
    let path = config_path()?;
    let content = std::fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable config");
            None
        }
    }
}

pub fn load_or_default() -> RoadmapperConfig {
    load_config().unwrap_or_default()
}

pub fn save_config(config: &RoadmapperConfig) -> Result<()> {
    let path = config_path()
        .ok_or_else(|| RoadmapError::Custom("Cannot find home directory".into()))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(&path, json)?;
    Ok(())
}

/// Remembers the last topic a roadmap was generated for.
pub fn save_last_topic(topic: &str) -> Result<RoadmapperConfig> {
    let mut config = load_or_default();
    config.last_topic = Some(topic.to_string());
    save_config(&config)?;
    Ok(config)
}

/// Settings the user can change from the interface.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    pub model: Option<String>,
    pub state_dir: Option<String>,
    pub namespace_by_roadmap: Option<bool>,
    pub request_timeout_secs: Option<u64>,
}

pub fn save_settings(update: SettingsUpdate) -> Result<RoadmapperConfig> {
    let mut config = load_or_default();

    if let Some(model) = update.model.filter(|m| !m.trim().is_empty()) {
        config.model = model;
    }
    if let Some(dir) = update.state_dir {
        config.state_dir = Some(expand_tilde(&dir)).filter(|d| !d.trim().is_empty());
    }
    if let Some(namespaced) = update.namespace_by_roadmap {
        config.namespace_by_roadmap = namespaced;
    }
    if update.request_timeout_secs.is_some() {
        config.request_timeout_secs = update.request_timeout_secs;
    }

    save_config(&config)?;
    Ok(config)
}
