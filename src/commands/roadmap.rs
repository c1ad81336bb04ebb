use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config;
use crate::error::{Result, RoadmapError};
use crate::generate::{GeminiClient, RoadmapGenerator};
use crate::payload::{self, PayloadDecode};
use crate::roadmap::{RoadmapView, Tracker};

/// Managed Tauri state holding the roadmap currently on screen (if any).
pub struct TrackerState {
    pub tracker: Arc<Mutex<Option<Tracker>>>,
}

impl Default for TrackerState {
    fn default() -> Self {
        Self {
            tracker: Arc::new(Mutex::new(None)),
        }
    }
}

impl TrackerState {
    /// Runs `f` against the open tracker and returns the refreshed view.
    async fn with_tracker<F>(&self, query: &str, f: F) -> Result<RoadmapView>
    where
        F: FnOnce(&mut Tracker),
    {
        let mut guard = self.tracker.lock().await;
        let tracker = guard
            .as_mut()
            .ok_or_else(|| RoadmapError::Custom(payload::NO_DATA.into()))?;
        f(tracker);
        Ok(tracker.view(query))
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedRoadmap {
    pub roadmap: String,
    /// Percent-encoded `data` parameter for the checklist view.
    pub payload: String,
}

/// Generates a roadmap for `topic` and returns it with its hand-off payload.
#[tauri::command]
pub async fn generate_roadmap(topic: String) -> Result<GeneratedRoadmap> {
    let cfg = config::load_or_default();
    let client = GeminiClient::from_config(&cfg)?;
    let roadmap = client.generate(&topic).await?;

    if let Err(e) = config::save_last_topic(topic.trim()) {
        tracing::warn!(error = %e, "could not remember last topic");
    }

    Ok(GeneratedRoadmap {
        payload: payload::encode_payload(&roadmap),
        roadmap,
    })
}

/// Decodes a `data` payload, loads its progress, and makes it the open roadmap.
#[tauri::command]
pub async fn open_roadmap(
    data: Option<String>,
    state: tauri::State<'_, TrackerState>,
) -> Result<RoadmapView> {
    let raw = match payload::decode_payload(data.as_deref()) {
        PayloadDecode::Valid(raw) => raw,
        other => {
            let message = other.message().unwrap_or(payload::INVALID_SHAPE);
            return Err(RoadmapError::Custom(message.to_string()));
        }
    };

    let cfg = config::load_or_default();
    let tracker = Tracker::open(&raw, cfg.state_store(&raw));
    let view = tracker.view("");

    let mut guard = state.tracker.lock().await;
    *guard = Some(tracker);
    Ok(view)
}

#[tauri::command]
pub async fn roadmap_view(
    query: Option<String>,
    state: tauri::State<'_, TrackerState>,
) -> Result<RoadmapView> {
    state
        .with_tracker(query.as_deref().unwrap_or_default(), |_| {})
        .await
}

#[tauri::command]
pub async fn toggle_item(
    phase_title: String,
    item: String,
    query: Option<String>,
    state: tauri::State<'_, TrackerState>,
) -> Result<RoadmapView> {
    state
        .with_tracker(query.as_deref().unwrap_or_default(), |tracker| {
            tracker.toggle_item(&phase_title, &item);
        })
        .await
}

#[tauri::command]
pub async fn toggle_phase(
    title: String,
    query: Option<String>,
    state: tauri::State<'_, TrackerState>,
) -> Result<RoadmapView> {
    state
        .with_tracker(query.as_deref().unwrap_or_default(), |tracker| {
            tracker.toggle_phase_expanded(&title);
        })
        .await
}

#[tauri::command]
pub async fn reset_progress(
    query: Option<String>,
    state: tauri::State<'_, TrackerState>,
) -> Result<RoadmapView> {
    state
        .with_tracker(query.as_deref().unwrap_or_default(), |tracker| {
            tracker.reset_progress();
        })
        .await
}
