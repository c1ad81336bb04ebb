//! Roadmap text parser.
//!
//! Model output is only loosely structured, so parsing never fails: anything
//! that does not look like a phase degrades to fewer phases or a default
//! title. The accepted grammar is
//!
//! ```text
//! **Phase <N>: <Title>**
//! * <item>
//! * **Step <N>.<M>: <label>** <item>
//! ```
//!
//! Lines are classified one at a time and fed through a two-state machine
//! (`SeekHeading` for text before the first heading, `InPhaseBody` after it).
//! Each heading line opens a new segment; every segment that carries at least
//! one `* ` marker becomes a [`Phase`].

use super::Phase;

/// Title used when a segment's first line is not a well-formed heading.
pub const UNTITLED_PHASE: &str = "Untitled Phase";

const HEADING_PREFIX: &str = "**Phase";
const STEP_PREFIX: &str = "**Step";
const BOLD: &str = "**";
const BULLET: &str = "* ";

/// How a single raw line participates in segmentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineClass {
    /// Starts a new segment.
    Heading,
    /// Trimmed line starts with `* `.
    Bullet,
    /// Whitespace only.
    Blank,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    SeekHeading,
    InPhaseBody,
}

/// Classifies a raw (untrimmed) line.
///
/// Headings must start at column zero: `**Phase`, whitespace, digits, `:`,
/// then any text containing a closing `**`.
pub fn classify_line(line: &str) -> LineClass {
    if is_heading_line(line) {
        LineClass::Heading
    } else {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            LineClass::Blank
        } else if trimmed.starts_with(BULLET) {
            LineClass::Bullet
        } else {
            LineClass::Other
        }
    }
}

/// Parses raw model output, treating `None` like empty input.
pub fn parse_roadmap(raw: Option<&str>) -> Vec<Phase> {
    match raw {
        Some(text) => parse(text),
        None => Vec::new(),
    }
}

/// Parses raw model output into ordered phases.
pub fn parse(raw: &str) -> Vec<Phase> {
    if raw.is_empty() {
        return Vec::new();
    }

    let mut phases = Vec::new();
    let mut dropped = 0usize;
    let mut state = ParseState::SeekHeading;
    let mut segment = Segment::default();

    for line in raw.split('\n') {
        let class = classify_line(line);
        if class == LineClass::Heading {
            if !segment.is_empty() {
                match segment.finish() {
                    Some(phase) => phases.push(phase),
                    None => dropped += 1,
                }
            }
            segment = Segment::default();
            state = ParseState::InPhaseBody;
        }
        segment.push(line, class);
    }
    match segment.finish() {
        Some(phase) => phases.push(phase),
        None if state == ParseState::InPhaseBody => dropped += 1,
        None => {}
    }

    tracing::debug!(phases = phases.len(), dropped, "parsed roadmap");
    phases
}

/// Lines collected between two headings.
#[derive(Default)]
struct Segment {
    first_line: Option<String>,
    items: Vec<String>,
    has_bullet_marker: bool,
    has_text: bool,
    raw_lines: usize,
}

impl Segment {
    fn is_empty(&self) -> bool {
        self.raw_lines == 0
    }

    fn push(&mut self, line: &str, class: LineClass) {
        self.raw_lines += 1;
        if line.contains(BULLET) {
            self.has_bullet_marker = true;
        }
        if class == LineClass::Blank {
            return;
        }
        self.has_text = true;

        let trimmed = line.trim();
        if self.first_line.is_none() {
            self.first_line = Some(trimmed.to_string());
            return;
        }
        if class == LineClass::Bullet {
            if let Some(item) = strip_item(trimmed) {
                self.items.push(item.to_string());
            }
        }
    }

    /// Noise segments (no text, or no `* ` marker anywhere) yield `None`.
    fn finish(self) -> Option<Phase> {
        if !self.has_text || !self.has_bullet_marker {
            return None;
        }
        let title = self
            .first_line
            .as_deref()
            .and_then(extract_title)
            .unwrap_or(UNTITLED_PHASE)
            .to_string();
        Some(Phase {
            title,
            content: self.items,
        })
    }
}

fn is_heading_line(line: &str) -> bool {
    let Some(rest) = line.strip_prefix(HEADING_PREFIX) else {
        return false;
    };
    let Some(rest) = strip_number_label(rest, ':') else {
        return false;
    };
    rest.contains(BOLD)
}

/// Returns the title from a trimmed heading line, or `None` when the line
/// is not `**Phase <N>: <title>**` with at least one space after the colon
/// and no `*` inside the title.
pub fn extract_title(line: &str) -> Option<&str> {
    let rest = line.strip_prefix(HEADING_PREFIX)?;
    let rest = strip_number_label(rest, ':')?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let end = rest.find('*').unwrap_or(rest.len());
    let (title, tail) = rest.split_at(end);
    if !tail.starts_with(BOLD) || title.chars().count() < 2 {
        return None;
    }
    Some(title.trim())
}

/// Strips the bullet and an optional `**Step N.M: label**` prefix from a
/// trimmed bullet line. Returns `None` if nothing remains.
pub fn strip_item(line: &str) -> Option<&str> {
    let rest = line.strip_prefix('*')?.trim_start();
    let rest = strip_step_label(rest).unwrap_or(rest);
    let item = rest.trim();
    (!item.is_empty()).then_some(item)
}

/// Removes a leading `**Step N.M: label**`, label included.
fn strip_step_label(text: &str) -> Option<&str> {
    let rest = text.strip_prefix(STEP_PREFIX)?;
    let rest = strip_number_label(rest, '.')?;
    let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return None;
    }
    let rest = rest[digits..].strip_prefix(':')?;

    let label_start = rest.len() - rest.trim_start().len();
    if label_start == 0 {
        return None;
    }
    let label = &rest[label_start..];
    // Shortest label of at least one character that is followed by `**`.
    if let Some(first) = label.chars().next() {
        let from = first.len_utf8();
        if let Some(pos) = label[from..].find(BOLD) {
            return Some(&label[from + pos + BOLD.len()..]);
        }
    }
    // The label may also be the tail of the whitespace run itself.
    if label_start >= 2 && label.starts_with(BOLD) {
        return Some(&label[BOLD.len()..]);
    }
    None
}

/// Consumes `<whitespace+><digits+><terminator>` and returns what follows.
fn strip_number_label(text: &str, terminator: char) -> Option<&str> {
    let after_ws = text.trim_start();
    if after_ws.len() == text.len() {
        return None;
    }
    let after_digits = after_ws.trim_start_matches(|c: char| c.is_ascii_digit());
    if after_digits.len() == after_ws.len() {
        return None;
    }
    after_digits.strip_prefix(terminator)
}
