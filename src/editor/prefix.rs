use super::buffer::Buffer;
use super::selection::SelectionSet;

/// Per-view prefix mode state.
///
/// The mode is considered armed while `prefix` is set; the status line
/// renders "Prefix Mode: {label}" from `mode_label`, never the reverse.
#[derive(Debug, Clone, Default)]
pub struct PrefixState {
    prefix: Option<String>,
    mode_label: Option<String>,
}

impl PrefixState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, prefix: &str, mode_label: &str) {
        self.prefix = Some(prefix.to_string());
        self.mode_label = Some(mode_label.to_string());
    }

    /// Clear the mode. Idempotent.
    pub fn clear(&mut self) {
        self.prefix = None;
        self.mode_label = None;
    }

    pub fn prefix(&self) -> Option<&str> {
        // An empty prefix never counts as armed
        self.prefix.as_deref().filter(|p| !p.is_empty())
    }

    pub fn mode_label(&self) -> Option<&str> {
        self.mode_label.as_deref()
    }

    pub fn is_armed(&self) -> bool {
        self.prefix().is_some()
    }
}

/// Whether the view is still in a prefixed condition.
///
/// Requires every selection to be a plain caret, and the text between
/// each caret's line start and the caret to contain `prefix`. This is
/// deliberately substring containment rather than an adjacency check:
/// typing between the prefix and the resolving keystroke keeps the mode
/// alive, matching how the bindings are actually used.
pub fn is_prefixed(buffer: &Buffer, selections: &SelectionSet, prefix: &str) -> bool {
    if prefix.is_empty() {
        return false;
    }
    for sel in selections.iter() {
        if !sel.is_caret() {
            return false;
        }
        let before = buffer.text_before(sel.end);
        if !before.contains(prefix) {
            return false;
        }
    }
    true
}

/// Character column of the rightmost occurrence of `prefix` in the text
/// before a caret. `None` means the view was edited out from under the
/// mode and this caret can no longer be resolved.
pub fn prefix_start(before: &str, prefix: &str) -> Option<usize> {
    if prefix.is_empty() {
        return None;
    }
    let byte = before.rfind(prefix)?;
    Some(before[..byte].chars().count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::selection::{Position, Selection, SelectionSet};

    fn caret(line: usize, col: usize) -> Selection {
        Selection::caret(Position::new(line, col))
    }

    fn buffer_with(text: &str) -> Buffer {
        let mut buffer = Buffer::new();
        buffer.set_text(text);
        buffer
    }

    #[test]
    fn test_state_set_and_clear() {
        let mut state = PrefixState::new();
        assert!(!state.is_armed());
        assert_eq!(state.prefix(), None);

        state.set("`", "math");
        assert!(state.is_armed());
        assert_eq!(state.prefix(), Some("`"));
        assert_eq!(state.mode_label(), Some("math"));

        state.clear();
        assert!(!state.is_armed());
        assert_eq!(state.mode_label(), None);

        // clearing twice is fine
        state.clear();
        assert!(!state.is_armed());
    }

    #[test]
    fn test_empty_prefix_is_never_armed() {
        let mut state = PrefixState::new();
        state.set("", "math");
        assert!(!state.is_armed());
        assert_eq!(state.prefix(), None);
    }

    #[test]
    fn test_is_prefixed_basic() {
        let buffer = buffer_with("x = `");
        let sels = SelectionSet::from_points(vec![caret(0, 5)]);
        assert!(is_prefixed(&buffer, &sels, "`"));
    }

    #[test]
    fn test_is_prefixed_empty_prefix_fails_closed() {
        let buffer = buffer_with("x = `");
        let sels = SelectionSet::from_points(vec![caret(0, 5)]);
        assert!(!is_prefixed(&buffer, &sels, ""));
    }

    #[test]
    fn test_is_prefixed_rejects_nonempty_selection() {
        let buffer = buffer_with("x = `");
        let sels = SelectionSet::from_points(vec![Selection::range(
            Position::new(0, 2),
            Position::new(0, 5),
        )]);
        assert!(!is_prefixed(&buffer, &sels, "`"));
    }

    #[test]
    fn test_is_prefixed_only_looks_before_caret() {
        let buffer = buffer_with("x = `abc");
        // Caret before the prefix: nothing before it contains "`"
        let sels = SelectionSet::from_points(vec![caret(0, 3)]);
        assert!(!is_prefixed(&buffer, &sels, "`"));
        // Caret after the prefix, even with text typed in between
        let sels = SelectionSet::from_points(vec![caret(0, 8)]);
        assert!(is_prefixed(&buffer, &sels, "`"));
    }

    #[test]
    fn test_is_prefixed_all_carets_must_match() {
        let buffer = buffer_with("a = `\nb = ");
        let sels = SelectionSet::from_points(vec![caret(0, 5), caret(1, 4)]);
        assert!(!is_prefixed(&buffer, &sels, "`"));

        let buffer = buffer_with("a = `\nb = `");
        let sels = SelectionSet::from_points(vec![caret(0, 5), caret(1, 5)]);
        assert!(is_prefixed(&buffer, &sels, "`"));
    }

    #[test]
    fn test_is_prefixed_checks_caret_line_only() {
        let buffer = buffer_with("` on first line\nsecond");
        let sels = SelectionSet::from_points(vec![caret(1, 6)]);
        assert!(!is_prefixed(&buffer, &sels, "`"));
    }

    #[test]
    fn test_prefix_start_rightmost() {
        assert_eq!(prefix_start("x = `", "`"), Some(4));
        assert_eq!(prefix_start("`a`b", "`"), Some(2));
        assert_eq!(prefix_start("x = ", "`"), None);
        assert_eq!(prefix_start("x = `", ""), None);
    }

    #[test]
    fn test_prefix_start_multibyte_columns() {
        assert_eq!(prefix_start("αβ`", "`"), Some(2));
    }
}
