//! Plain-text checklist rendering for the terminal.

use std::fmt::Write;

use crate::roadmap::RoadmapView;

pub const EMPTY_MESSAGE: &str = "No roadmap data available to display.";

const BAR_WIDTH: usize = 30;

/// Renders a view as a checklist: a progress header, then each phase with
/// its items. Collapsed phases show only their header line.
pub fn render_view(view: &RoadmapView) -> String {
    if view.is_empty() {
        return format!("{EMPTY_MESSAGE}\n");
    }

    let mut out = String::new();
    let _ = writeln!(out, "Learning Progress");
    let _ = writeln!(
        out,
        "{} {}%  {}/{} completed",
        progress_bar(view.progress_percent),
        view.progress_percent,
        view.completed_count,
        view.total_items
    );
    if !view.query.trim().is_empty() {
        let _ = writeln!(out, "Filter: \"{}\"", view.query.trim());
    }

    if view.phases.is_empty() {
        let _ = writeln!(out, "\nNo phases or items match.");
        return out;
    }

    for (index, phase) in view.phases.iter().enumerate() {
        let marker = if phase.expanded { '▾' } else { '▸' };
        let status = if phase.complete { " ✓" } else { "" };
        let _ = writeln!(
            out,
            "\n{marker} {}. {}{status}  ({}/{} items completed)",
            index + 1,
            phase.title,
            phase.done,
            phase.total
        );
        if !phase.expanded {
            continue;
        }
        for item in &phase.items {
            let check = if item.done { 'x' } else { ' ' };
            let _ = writeln!(out, "    [{check}] {}", item.text);
        }
    }
    out
}

fn progress_bar(percent: u8) -> String {
    let filled = (usize::from(percent.min(100)) * BAR_WIDTH + 50) / 100;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}
