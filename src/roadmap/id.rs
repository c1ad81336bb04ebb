/// Separator between the phase title and item text in an item id.
pub const ID_SEPARATOR: &str = "::";

/// Builds the completion key for an item: `"{phase}::{item}"`, lower-cased.
///
/// The result is only as unique as the (title, text) pair. Inputs that
/// already contain `::` can collide, which is accepted.
pub fn make_item_id(phase_title: &str, item_text: &str) -> String {
    let mut id = String::with_capacity(phase_title.len() + ID_SEPARATOR.len() + item_text.len());
    id.push_str(phase_title);
    id.push_str(ID_SEPARATOR);
    id.push_str(item_text);
    id.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_and_lowercases() {
        assert_eq!(make_item_id("Basics", "HTML Forms"), "basics::html forms");
    }

    #[test]
    fn is_deterministic() {
        let a = make_item_id("Phase Ü", "Item");
        let b = make_item_id("Phase Ü", "Item");
        assert_eq!(a, b);
        assert_eq!(a, "phase ü::item");
    }

    #[test]
    fn case_variants_share_an_id() {
        assert_eq!(make_item_id("JS", "ES6"), make_item_id("js", "es6"));
    }

    #[test]
    fn separator_inside_inputs_is_not_escaped() {
        assert_eq!(make_item_id("a::b", "c"), make_item_id("a", "b::c"));
    }

    #[test]
    fn empty_inputs() {
        assert_eq!(make_item_id("", ""), "::");
    }
}
