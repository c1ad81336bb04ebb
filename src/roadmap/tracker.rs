use super::progress::{self, Progress};
use super::view::RoadmapView;
use super::{parse, Phase};
use crate::store::{PersistState, StateStore};

/// A parsed roadmap together with its progress state.
///
/// The tracker owns the in-memory [`PersistState`]; every toggle writes the
/// whole state back through its [`StateStore`].
#[derive(Debug)]
pub struct Tracker {
    phases: Vec<Phase>,
    state: PersistState,
    store: StateStore,
}

impl Tracker {
    /// Parses `raw` and loads the stored progress for it.
    pub fn open(raw: &str, store: StateStore) -> Self {
        Self::from_phases(parse(raw), store)
    }

    pub fn from_phases(phases: Vec<Phase>, store: StateStore) -> Self {
        let state = store.load();
        tracing::debug!(
            key = %store.key(),
            phases = phases.len(),
            completed = state.completed.len(),
            "opened roadmap tracker"
        );
        Self {
            phases,
            state,
            store,
        }
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    pub fn state(&self) -> &PersistState {
        &self.state
    }

    pub fn progress(&self) -> Progress<'_> {
        Progress::new(&self.phases, &self.state)
    }

    pub fn view(&self, query: &str) -> RoadmapView {
        RoadmapView::build(&self.progress(), query)
    }

    /// Flips an item's completion, persists, and returns the new value.
    pub fn toggle_item(&mut self, phase_title: &str, item_text: &str) -> bool {
        let done = progress::flip_item(&mut self.state, phase_title, item_text);
        self.store.save(&self.state);
        done
    }

    /// Flips a phase open/closed, persists, and returns whether it is now open.
    pub fn toggle_phase_expanded(&mut self, title: &str) -> bool {
        let expanded = progress::flip_phase(&mut self.state, title);
        self.store.save(&self.state);
        expanded
    }

    /// Clears completion for this roadmap's items. Entries from other
    /// roadmaps sharing the storage key are left alone.
    pub fn reset_progress(&mut self) -> usize {
        let mut cleared = 0;
        for phase in &self.phases {
            for id in phase.item_ids() {
                if self.state.completed.remove(&id).is_some() {
                    cleared += 1;
                }
            }
        }
        self.store.save(&self.state);
        cleared
    }

    /// Looks up a phase title case-insensitively, returning the stored casing.
    pub fn find_phase(&self, title: &str) -> Option<&Phase> {
        let wanted = title.to_lowercase();
        self.phases
            .iter()
            .find(|p| p.title == title)
            .or_else(|| self.phases.iter().find(|p| p.title.to_lowercase() == wanted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, StorageKey};

    const RAW: &str = "**Phase 1: Basics**\n* HTML\n* CSS\n\n**Phase 2: JS**\n* ES6";

    fn tracker_with(backend: &MemoryStore) -> Tracker {
        Tracker::open(RAW, StateStore::new(backend.clone(), StorageKey::default()))
    }

    #[test]
    fn toggles_persist_across_reopen() {
        let backend = MemoryStore::new();
        let mut tracker = tracker_with(&backend);
        assert!(tracker.toggle_item("Basics", "HTML"));
        assert!(!tracker.toggle_phase_expanded("JS"));

        let reopened = tracker_with(&backend);
        assert_eq!(reopened.state(), tracker.state());
        assert_eq!(reopened.progress().completed_count(), 1);
        assert!(!reopened.progress().is_phase_expanded("JS"));
    }

    #[test]
    fn reset_only_clears_this_roadmap() {
        let backend = MemoryStore::new();
        let mut tracker = tracker_with(&backend);
        tracker.toggle_item("Basics", "HTML");
        tracker.toggle_item("Other", "Thing");

        assert_eq!(tracker.reset_progress(), 1);
        assert_eq!(tracker.progress().completed_count(), 0);
        assert_eq!(tracker.state().completed.get("other::thing"), Some(&true));
        assert_eq!(tracker_with(&backend).state(), tracker.state());
    }

    #[test]
    fn find_phase_is_case_insensitive() {
        let tracker = Tracker::open(RAW, StateStore::unavailable());
        assert_eq!(tracker.find_phase("basics").map(|p| p.title.as_str()), Some("Basics"));
        assert!(tracker.find_phase("missing").is_none());
    }

    #[test]
    fn unavailable_store_still_tracks_in_memory() {
        let mut tracker = Tracker::open(RAW, StateStore::unavailable());
        tracker.toggle_item("JS", "ES6");
        assert_eq!(tracker.progress().completed_count(), 1);
    }
}
