use super::{make_item_id, Phase};
use crate::store::PersistState;

/// Default for a phase with no recorded expansion: phases start open.
pub const EXPANDED_BY_DEFAULT: bool = true;

/// Default for an item with no recorded completion.
pub const COMPLETED_BY_DEFAULT: bool = false;

/// Resolves whether a phase is expanded, falling back to [`EXPANDED_BY_DEFAULT`].
pub fn resolve_expanded(state: &PersistState, title: &str) -> bool {
    state
        .expanded
        .get(title)
        .copied()
        .unwrap_or(EXPANDED_BY_DEFAULT)
}

/// Resolves whether an item id is completed, falling back to [`COMPLETED_BY_DEFAULT`].
pub fn resolve_completed(state: &PersistState, item_id: &str) -> bool {
    state
        .completed
        .get(item_id)
        .copied()
        .unwrap_or(COMPLETED_BY_DEFAULT)
}

/// Flips an item's completion and returns the new value.
pub fn flip_item(state: &mut PersistState, phase_title: &str, item_text: &str) -> bool {
    let id = make_item_id(phase_title, item_text);
    let next = !resolve_completed(state, &id);
    state.completed.insert(id, next);
    next
}

/// Flips a phase's effective expansion and returns the new value.
///
/// An unset phase reads as open, so the first flip stores `false`.
pub fn flip_phase(state: &mut PersistState, title: &str) -> bool {
    let next = !resolve_expanded(state, title);
    state.expanded.insert(title.to_string(), next);
    next
}

/// Done/total item counts for one phase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PhaseCounts {
    pub done: usize,
    pub total: usize,
}

impl PhaseCounts {
    /// A phase is complete when it has items and all of them are done.
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.done == self.total
    }
}

/// Read-only progress queries over parsed phases and persisted state.
#[derive(Clone, Copy, Debug)]
pub struct Progress<'a> {
    phases: &'a [Phase],
    state: &'a PersistState,
}

impl<'a> Progress<'a> {
    pub fn new(phases: &'a [Phase], state: &'a PersistState) -> Self {
        Self { phases, state }
    }

    pub fn total_items(&self) -> usize {
        self.phases.iter().map(|p| p.content.len()).sum()
    }

    pub fn completed_count(&self) -> usize {
        self.phases
            .iter()
            .map(|p| self.phase_completion_counts(p).done)
            .sum()
    }

    /// Completion as a whole percentage, rounded half up. Zero when empty.
    pub fn progress_percent(&self) -> u8 {
        percent(self.completed_count(), self.total_items())
    }

    /// Phases narrowed to a case-insensitive search query.
    ///
    /// A blank query returns every phase untouched. Otherwise each phase keeps
    /// only its matching items, and survives if its title matches or any item
    /// does.
    pub fn filtered_phases(&self, query: &str) -> Vec<Phase> {
        if query.trim().is_empty() {
            return self.phases.to_vec();
        }
        let needle = query.to_lowercase();
        self.phases
            .iter()
            .filter_map(|phase| {
                let content: Vec<String> = phase
                    .content
                    .iter()
                    .filter(|item| item.to_lowercase().contains(&needle))
                    .cloned()
                    .collect();
                let title_matches = phase.title.to_lowercase().contains(&needle);
                (title_matches || !content.is_empty()).then(|| Phase {
                    title: phase.title.clone(),
                    content,
                })
            })
            .collect()
    }

    pub fn is_phase_expanded(&self, title: &str) -> bool {
        resolve_expanded(self.state, title)
    }

    pub fn is_item_completed(&self, phase_title: &str, item_text: &str) -> bool {
        resolve_completed(self.state, &make_item_id(phase_title, item_text))
    }

    pub fn phase_completion_counts(&self, phase: &Phase) -> PhaseCounts {
        let done = phase
            .item_ids()
            .filter(|id| resolve_completed(self.state, id))
            .count();
        PhaseCounts {
            done,
            total: phase.content.len(),
        }
    }
}

fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let done = done.min(total) as u64;
    let total = total as u64;
    ((200 * done + total) / (2 * total)) as u8
}
