//! Roadmap model: parsing raw model text and tracking progress through it.

pub mod id;
pub mod parser;
pub mod progress;
pub mod tracker;
pub mod view;

use serde::{Deserialize, Serialize};

pub use id::make_item_id;
pub use parser::{parse, parse_roadmap};
pub use progress::{PhaseCounts, Progress};
pub use tracker::Tracker;
pub use view::{ItemView, PhaseView, RoadmapView};

/// One top-level section of a roadmap.
///
/// `content` order is both display order and completion-tracking order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    pub title: String,
    pub content: Vec<String>,
}

impl Phase {
    /// Completion key of every item, in content order.
    pub fn item_ids(&self) -> impl Iterator<Item = String> + '_ {
        self.content
            .iter()
            .map(move |item| make_item_id(&self.title, item))
    }
}
