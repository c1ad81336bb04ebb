//! Durable progress state.
//!
//! The `{completed, expanded}` document is written under a storage key in a
//! [`KeyValueStore`]. Every failure here degrades to the empty state: a
//! corrupt or missing document loads as empty, and failed writes are logged
//! and dropped.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Storage key used when no per-roadmap key is configured.
pub const DEFAULT_STORAGE_KEY: &str = "roadmap-progress-v1";

/// Which items are completed and which phases are expanded.
///
/// `completed` is keyed by item id (see [`crate::roadmap::make_item_id`]),
/// `expanded` by phase title.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistState {
    #[serde(default)]
    pub completed: BTreeMap<String, bool>,
    #[serde(default)]
    pub expanded: BTreeMap<String, bool>,
}

/// Key under which a [`PersistState`] document is stored.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StorageKey(String);

impl StorageKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Key scoped to one roadmap's raw text, so unrelated roadmaps that share
    /// phase and item names keep separate progress.
    pub fn for_roadmap(raw: &str) -> Self {
        let digest = Sha256::digest(raw.as_bytes());
        let short = hex::encode(&digest[..8]);
        Self(format!("{DEFAULT_STORAGE_KEY}-{short}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for StorageKey {
    fn default() -> Self {
        Self(DEFAULT_STORAGE_KEY.to_string())
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of checking a stored document against the expected shape.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DocumentCheck {
    Valid(PersistState),
    Invalid(String),
}

/// Validates a stored document.
///
/// Only non-JSON text and a non-object top level are invalid. Each field is
/// then resolved on its own: a missing, `null` or non-object `completed` or
/// `expanded` reads as empty, and entries whose value is not a boolean are
/// dropped. Anything dropped is logged at `warn`.
pub fn validate_document(text: &str) -> DocumentCheck {
    let value: Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(e) => return DocumentCheck::Invalid(format!("not valid JSON: {e}")),
    };
    let Value::Object(mut root) = value else {
        return DocumentCheck::Invalid("document is not a JSON object".into());
    };

    DocumentCheck::Valid(PersistState {
        completed: bool_map(root.remove("completed"), "completed"),
        expanded: bool_map(root.remove("expanded"), "expanded"),
    })
}

fn bool_map(field: Option<Value>, name: &str) -> BTreeMap<String, bool> {
    match field {
        None | Some(Value::Null) => BTreeMap::new(),
        Some(Value::Object(entries)) => entries
            .into_iter()
            .filter_map(|(key, value)| match value {
                Value::Bool(b) => Some((key, b)),
                other => {
                    tracing::warn!(field = name, %key, value = %other, "dropping non-boolean progress entry");
                    None
                }
            })
            .collect(),
        Some(other) => {
            tracing::warn!(field = name, value = %other, "progress field is not an object, reading it as empty");
            BTreeMap::new()
        }
    }
}

/// String key-value backend for state documents.
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> io::Result<Option<String>>;

    fn set(&mut self, key: &str, value: &str) -> io::Result<()>;

    /// `false` for backends that cannot persist anything.
    fn is_available(&self) -> bool {
        true
    }
}

/// Stores each key as `<dir>/<key>.json`, written atomically.
#[derive(Clone, Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing a key. Characters outside `[A-Za-z0-9._-]` become `_`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{name}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let tmp_path = path.with_extension("json.tmp");
        {
            let mut file = std::fs::File::create(&tmp_path)?;
            file.write_all(value.as_bytes())?;
            file.flush()?;
        }
        std::fs::rename(tmp_path, path)
    }
}

/// In-process store. Clones share the same map.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> io::Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| io::Error::other("memory store lock poisoned"))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> io::Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Backend for contexts with no durable storage: reads nothing, writes nowhere.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnavailableStore;

impl KeyValueStore for UnavailableStore {
    fn get(&self, _key: &str) -> io::Result<Option<String>> {
        Ok(None)
    }

    fn set(&mut self, _key: &str, _value: &str) -> io::Result<()> {
        Ok(())
    }

    fn is_available(&self) -> bool {
        false
    }
}

/// Loads and saves [`PersistState`] under one storage key.
pub struct StateStore {
    backend: Box<dyn KeyValueStore>,
    key: StorageKey,
}

impl StateStore {
    pub fn new(backend: impl KeyValueStore + 'static, key: StorageKey) -> Self {
        Self {
            backend: Box::new(backend),
            key,
        }
    }

    /// Store with no durable backend.
    pub fn unavailable() -> Self {
        Self::new(UnavailableStore, StorageKey::default())
    }

    pub fn key(&self) -> &StorageKey {
        &self.key
    }

    /// Reads the stored state. Never fails: missing, unreadable or invalid
    /// documents all load as the empty state.
    pub fn load(&self) -> PersistState {
        if !self.backend.is_available() {
            return PersistState::default();
        }
        let raw = match self.backend.get(self.key.as_str()) {
            Ok(Some(raw)) => raw,
            Ok(None) => return PersistState::default(),
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "failed to read progress state");
                return PersistState::default();
            }
        };
        match validate_document(&raw) {
            DocumentCheck::Valid(state) => state,
            DocumentCheck::Invalid(reason) => {
                tracing::warn!(key = %self.key, %reason, "discarding stored progress state");
                PersistState::default()
            }
        }
    }

    /// Writes the state. Failures are logged and otherwise ignored.
    pub fn save(&mut self, state: &PersistState) {
        if !self.backend.is_available() {
            return;
        }
        let json = match serde_json::to_string(state) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "failed to serialize progress state");
                return;
            }
        };
        if let Err(e) = self.backend.set(self.key.as_str(), &json) {
            tracing::warn!(key = %self.key, error = %e, "failed to save progress state");
        }
    }
}

impl fmt::Debug for StateStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateStore")
            .field("key", &self.key)
            .field("available", &self.backend.is_available())
            .finish()
    }
}
