use serde::Serialize;

use super::progress::Progress;
use super::{make_item_id, Phase};

/// Snapshot of a roadmap for display, narrowed by a search query.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadmapView {
    pub query: String,
    pub total_items: usize,
    pub completed_count: usize,
    pub progress_percent: u8,
    pub phases: Vec<PhaseView>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseView {
    pub title: String,
    pub expanded: bool,
    /// Counts over the items visible under the current query.
    pub done: usize,
    pub total: usize,
    pub complete: bool,
    pub items: Vec<ItemView>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemView {
    pub id: String,
    pub text: String,
    pub done: bool,
}

impl RoadmapView {
    /// Builds the view. Overall totals always cover the whole roadmap; phase
    /// entries reflect the filtered content.
    pub fn build(progress: &Progress<'_>, query: &str) -> Self {
        let phases = progress
            .filtered_phases(query)
            .iter()
            .map(|phase| phase_view(progress, phase))
            .collect();
        Self {
            query: query.to_string(),
            total_items: progress.total_items(),
            completed_count: progress.completed_count(),
            progress_percent: progress.progress_percent(),
            phases,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_items == 0 && self.phases.is_empty()
    }
}

fn phase_view(progress: &Progress<'_>, phase: &Phase) -> PhaseView {
    let counts = progress.phase_completion_counts(phase);
    let items = phase
        .content
        .iter()
        .map(|text| ItemView {
            id: make_item_id(&phase.title, text),
            text: text.clone(),
            done: progress.is_item_completed(&phase.title, text),
        })
        .collect();
    PhaseView {
        title: phase.title.clone(),
        expanded: progress.is_phase_expanded(&phase.title),
        done: counts.done,
        total: counts.total,
        complete: counts.is_complete(),
        items,
    }
}
