use super::Buffer;

/// A position in the buffer, addressed by line and character column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position {
    pub line: usize, // Row
    pub col: usize,  // Column, in characters
}

impl Position {
    pub fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }
}

/// One cursor or selection range. `begin == end` for a plain caret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub begin: Position,
    pub end: Position,
}

impl Selection {
    pub fn caret(pos: Position) -> Self {
        Self { begin: pos, end: pos }
    }

    pub fn range(begin: Position, end: Position) -> Self {
        Self { begin, end }
    }

    /// Whether this selection is an empty caret rather than a text range.
    pub fn is_caret(&self) -> bool {
        self.begin == self.end
    }
}

/// The set of active carets/selections in a view, kept in document order.
#[derive(Debug, Clone)]
pub struct SelectionSet {
    points: Vec<Selection>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self {
            points: vec![Selection::caret(Position::new(0, 0))],
        }
    }

    pub fn from_points(points: Vec<Selection>) -> Self {
        let mut set = Self { points };
        set.normalize();
        set
    }

    pub fn iter(&self) -> impl Iterator<Item = &Selection> {
        self.points.iter()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn get(&self, index: usize) -> Option<&Selection> {
        self.points.get(index)
    }

    pub fn set(&mut self, index: usize, sel: Selection) {
        if let Some(slot) = self.points.get_mut(index) {
            *slot = sel;
        }
    }

    /// The last caret in document order, used for viewport following.
    pub fn primary(&self) -> Selection {
        self.points
            .last()
            .copied()
            .unwrap_or(Selection::caret(Position::new(0, 0)))
    }

    /// Collapse everything to a single caret.
    pub fn collapse_to(&mut self, pos: Position) {
        self.points.clear();
        self.points.push(Selection::caret(pos));
    }

    pub fn add_caret(&mut self, pos: Position) {
        self.points.push(Selection::caret(pos));
        self.normalize();
    }

    /// Re-sort and drop duplicate carets after movement or edits.
    pub fn normalize(&mut self) {
        self.points.sort_by_key(|s| (s.begin, s.end));
        self.points.dedup();
        if self.points.is_empty() {
            self.points.push(Selection::caret(Position::new(0, 0)));
        }
    }

    /// Remap every point through `f`, then normalize.
    pub fn map(&mut self, f: impl Fn(Position) -> Position) {
        for sel in &mut self.points {
            sel.begin = f(sel.begin);
            sel.end = f(sel.end);
        }
        self.normalize();
    }

    pub fn move_left(&mut self, _buffer: &Buffer) {
        self.map(|p| {
            if p.col > 0 {
                Position::new(p.line, p.col - 1)
            } else {
                p
            }
        });
    }

    pub fn move_right(&mut self, buffer: &Buffer) {
        self.map(|p| {
            if p.col < buffer.line_len(p.line) {
                Position::new(p.line, p.col + 1)
            } else {
                p
            }
        });
    }

    pub fn move_up(&mut self, buffer: &Buffer) {
        self.map(|p| {
            if p.line > 0 {
                let line = p.line - 1;
                Position::new(line, p.col.min(buffer.line_len(line)))
            } else {
                p
            }
        });
    }

    pub fn move_down(&mut self, buffer: &Buffer) {
        self.map(|p| {
            if p.line + 1 < buffer.line_count() {
                let line = p.line + 1;
                Position::new(line, p.col.min(buffer.line_len(line)))
            } else {
                p
            }
        });
    }

    pub fn move_to_line_start(&mut self) {
        self.map(|p| Position::new(p.line, 0));
    }

    pub fn move_to_line_end(&mut self, buffer: &Buffer) {
        self.map(|p| Position::new(p.line, buffer.line_len(p.line)));
    }
}

impl Default for SelectionSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Where `p` lands after `text` is inserted at `at`.
///
/// Positions before the insertion point are untouched; positions at or
/// after it on the same line shift right (or down onto the last inserted
/// line when `text` spans lines); later lines shift down.
pub fn adjust_after_insert(p: Position, at: Position, text: &str) -> Position {
    if p.line < at.line || (p.line == at.line && p.col < at.col) {
        return p;
    }
    let newlines = text.matches('\n').count();
    if newlines == 0 {
        if p.line == at.line {
            Position::new(p.line, p.col + text.chars().count())
        } else {
            p
        }
    } else if p.line == at.line {
        let tail_len = text
            .rsplit('\n')
            .next()
            .unwrap_or_default()
            .chars()
            .count();
        Position::new(p.line + newlines, p.col - at.col + tail_len)
    } else {
        Position::new(p.line + newlines, p.col)
    }
}

/// Where `p` lands after the range `begin..end` is deleted.
/// Positions inside the deleted range clamp to `begin`.
pub fn adjust_after_delete(p: Position, begin: Position, end: Position) -> Position {
    if p <= begin {
        return p;
    }
    if p <= end {
        return begin;
    }
    if p.line == end.line {
        Position::new(begin.line, begin.col + (p.col - end.col))
    } else {
        Position::new(p.line - (end.line - begin.line), p.col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(line: usize, col: usize) -> Position {
        Position::new(line, col)
    }

    #[test]
    fn test_selection_set_starts_with_one_caret() {
        let set = SelectionSet::new();
        assert_eq!(set.len(), 1);
        assert!(set.primary().is_caret());
        assert_eq!(set.primary().end, pos(0, 0));
    }

    #[test]
    fn test_normalize_sorts_and_dedups() {
        let set = SelectionSet::from_points(vec![
            Selection::caret(pos(2, 1)),
            Selection::caret(pos(0, 3)),
            Selection::caret(pos(2, 1)),
        ]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.get(0).map(|s| s.end), Some(pos(0, 3)));
        assert_eq!(set.get(1).map(|s| s.end), Some(pos(2, 1)));
    }

    #[test]
    fn test_adjust_after_insert_same_line() {
        // Insert 3 chars at (0, 2)
        let at = pos(0, 2);
        assert_eq!(adjust_after_insert(pos(0, 1), at, "abc"), pos(0, 1));
        assert_eq!(adjust_after_insert(pos(0, 2), at, "abc"), pos(0, 5));
        assert_eq!(adjust_after_insert(pos(0, 7), at, "abc"), pos(0, 10));
        assert_eq!(adjust_after_insert(pos(1, 0), at, "abc"), pos(1, 0));
    }

    #[test]
    fn test_adjust_after_insert_multiline() {
        let at = pos(1, 4);
        // "ab\ncd" adds one line; the tail after the caret moves to col 2 + offset
        assert_eq!(adjust_after_insert(pos(1, 4), at, "ab\ncd"), pos(2, 2));
        assert_eq!(adjust_after_insert(pos(1, 6), at, "ab\ncd"), pos(2, 4));
        assert_eq!(adjust_after_insert(pos(3, 1), at, "ab\ncd"), pos(4, 1));
        assert_eq!(adjust_after_insert(pos(0, 9), at, "ab\ncd"), pos(0, 9));
    }

    #[test]
    fn test_adjust_after_delete_same_line() {
        let begin = pos(0, 2);
        let end = pos(0, 5);
        assert_eq!(adjust_after_delete(pos(0, 1), begin, end), pos(0, 1));
        assert_eq!(adjust_after_delete(pos(0, 4), begin, end), pos(0, 2));
        assert_eq!(adjust_after_delete(pos(0, 8), begin, end), pos(0, 5));
        assert_eq!(adjust_after_delete(pos(2, 3), begin, end), pos(2, 3));
    }

    #[test]
    fn test_adjust_after_delete_line_join() {
        let begin = pos(0, 4);
        let end = pos(1, 2);
        assert_eq!(adjust_after_delete(pos(1, 5), begin, end), pos(0, 7));
        assert_eq!(adjust_after_delete(pos(2, 3), begin, end), pos(1, 3));
        assert_eq!(adjust_after_delete(pos(1, 1), begin, end), pos(0, 4));
    }

    #[test]
    fn test_movement_clamps_to_line_lengths() {
        let mut buffer = Buffer::new();
        buffer.set_text("first line\nshort\nthird line here");

        let mut set = SelectionSet::from_points(vec![Selection::caret(pos(0, 9))]);
        set.move_down(&buffer);
        assert_eq!(set.primary().end, pos(1, 5)); // clamped to "short"

        set.move_down(&buffer);
        assert_eq!(set.primary().end, pos(2, 5));

        set.move_to_line_end(&buffer);
        assert_eq!(set.primary().end, pos(2, 15));

        set.move_down(&buffer);
        assert_eq!(set.primary().end, pos(2, 15)); // bottom boundary
    }
}
