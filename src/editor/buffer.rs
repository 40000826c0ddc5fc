use anyhow::{Context, Result};
use std::fs;
use std::sync::Arc;
use syntect::parsing::SyntaxReference;

use super::selection::Position;

/// Byte offset of character column `col` within `line`.
pub(crate) fn byte_index(line: &str, col: usize) -> usize {
    line.char_indices()
        .nth(col)
        .map(|(i, _)| i)
        .unwrap_or(line.len())
}

pub struct Buffer {
    pub lines: Vec<String>,
    pub file_path: Option<String>,
    pub is_modified: bool,
    pub syntax: Option<Arc<SyntaxReference>>,
}

impl Buffer {
    pub fn new() -> Self {
        Self {
            lines: vec![String::new()],
            file_path: None,
            is_modified: false,
            syntax: None,
        }
    }

    pub fn set_syntax(&mut self, syntax: Option<Arc<SyntaxReference>>) {
        self.syntax = syntax;
    }

    pub fn load_file(&mut self, path: &str) -> Result<()> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path))?;

        self.set_text(&content);
        self.file_path = Some(path.to_string());
        self.is_modified = false;
        Ok(())
    }

    pub fn save(&mut self) -> Result<String> {
        let path = self
            .file_path
            .clone()
            .context("No file path set for buffer")?;

        let content = self.text();
        fs::write(&path, content)
            .with_context(|| format!("Failed to write file: {}", path))?;

        self.is_modified = false;
        Ok(path)
    }

    /// Replace the entire buffer content. Keeps at least one (empty) line.
    pub fn set_text(&mut self, content: &str) {
        self.lines = content.split('\n').map(|l| l.to_string()).collect();
        if self.lines.is_empty() {
            self.lines.push(String::new());
        }
        self.is_modified = true;
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn line(&self, y: usize) -> &str {
        self.lines.get(y).map(|l| l.as_str()).unwrap_or("")
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Line length in characters.
    pub fn line_len(&self, y: usize) -> usize {
        self.line(y).chars().count()
    }

    /// Clamp a position onto actual buffer content.
    pub fn clamp(&self, pos: Position) -> Position {
        let line = pos.line.min(self.line_count().saturating_sub(1));
        Position::new(line, pos.col.min(self.line_len(line)))
    }

    /// Text on the caret's line from line start up to the caret.
    pub fn text_before(&self, pos: Position) -> String {
        self.line(pos.line).chars().take(pos.col).collect()
    }

    /// Insert `text` (may contain newlines) at `pos`.
    /// Returns the position immediately after the inserted text.
    pub fn insert_at(&mut self, pos: Position, text: &str) -> Position {
        let pos = self.clamp(pos);
        self.is_modified = true;

        if !text.contains('\n') {
            let line = &mut self.lines[pos.line];
            let byte = byte_index(line, pos.col);
            line.insert_str(byte, text);
            return Position::new(pos.line, pos.col + text.chars().count());
        }

        let byte = byte_index(&self.lines[pos.line], pos.col);
        let tail = self.lines[pos.line].split_off(byte);

        let mut parts = text.split('\n');
        if let Some(first) = parts.next() {
            self.lines[pos.line].push_str(first);
        }
        let mut insert_line = pos.line;
        let mut last_len = 0;
        for part in parts {
            insert_line += 1;
            last_len = part.chars().count();
            self.lines.insert(insert_line, part.to_string());
        }
        let end = Position::new(insert_line, last_len);
        self.lines[insert_line].push_str(&tail);
        end
    }

    /// Delete the range `begin..end` (begin must not be after end).
    pub fn delete_range(&mut self, begin: Position, end: Position) {
        let begin = self.clamp(begin);
        let end = self.clamp(end);
        if end <= begin {
            return;
        }
        self.is_modified = true;

        if begin.line == end.line {
            let line = &mut self.lines[begin.line];
            let b = byte_index(line, begin.col);
            let e = byte_index(line, end.col);
            line.replace_range(b..e, "");
            return;
        }

        let tail_byte = byte_index(&self.lines[end.line], end.col);
        let tail = self.lines[end.line][tail_byte..].to_string();
        let keep = byte_index(&self.lines[begin.line], begin.col);
        self.lines[begin.line].truncate(keep);
        self.lines[begin.line].push_str(&tail);
        self.lines.drain(begin.line + 1..=end.line);
    }
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(line: usize, col: usize) -> Position {
        Position::new(line, col)
    }

    #[test]
    fn test_new_buffer_has_one_empty_line() {
        let buffer = Buffer::new();
        assert_eq!(buffer.line_count(), 1);
        assert_eq!(buffer.line(0), "");
        assert!(!buffer.is_modified);
    }

    #[test]
    fn test_insert_at_single_line() {
        let mut buffer = Buffer::new();
        buffer.set_text("x = ");

        let end = buffer.insert_at(pos(0, 4), "`");
        assert_eq!(buffer.line(0), "x = `");
        assert_eq!(end, pos(0, 5));
        assert!(buffer.is_modified);
    }

    #[test]
    fn test_insert_at_middle_of_line() {
        let mut buffer = Buffer::new();
        buffer.set_text("heo");

        let end = buffer.insert_at(pos(0, 2), "ll");
        assert_eq!(buffer.line(0), "hello");
        assert_eq!(end, pos(0, 4));
    }

    #[test]
    fn test_insert_at_handles_multibyte() {
        let mut buffer = Buffer::new();
        buffer.set_text("αβ");

        let end = buffer.insert_at(pos(0, 1), "γ");
        assert_eq!(buffer.line(0), "αγβ");
        assert_eq!(end, pos(0, 2));
    }

    #[test]
    fn test_insert_at_multiline() {
        let mut buffer = Buffer::new();
        buffer.set_text("startend");

        let end = buffer.insert_at(pos(0, 5), "one\ntwo");
        assert_eq!(buffer.lines, vec!["startone", "twoend"]);
        assert_eq!(end, pos(1, 3));
    }

    #[test]
    fn test_delete_range_same_line() {
        let mut buffer = Buffer::new();
        buffer.set_text("x = `abc");

        buffer.delete_range(pos(0, 4), pos(0, 8));
        assert_eq!(buffer.line(0), "x = ");
    }

    #[test]
    fn test_delete_range_across_lines() {
        let mut buffer = Buffer::new();
        buffer.set_text("first\nsecond\nthird");

        buffer.delete_range(pos(0, 3), pos(2, 2));
        assert_eq!(buffer.lines, vec!["firird"]);
    }

    #[test]
    fn test_text_before() {
        let mut buffer = Buffer::new();
        buffer.set_text("x = `");
        assert_eq!(buffer.text_before(pos(0, 5)), "x = `");
        assert_eq!(buffer.text_before(pos(0, 2)), "x ");
        assert_eq!(buffer.text_before(pos(0, 0)), "");
    }

    #[test]
    fn test_byte_index_multibyte() {
        assert_eq!(byte_index("αβγ", 0), 0);
        assert_eq!(byte_index("αβγ", 1), 2);
        assert_eq!(byte_index("αβγ", 3), 6);
        assert_eq!(byte_index("abc", 10), 3);
    }
}
