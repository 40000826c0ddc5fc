use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use syntect::highlighting::ScopeSelectors;
use syntect::parsing::{ParseState, ScopeStack, SyntaxReference, SyntaxSet};
use tracing::warn;

use super::buffer::{byte_index, Buffer};
use super::selection::Position;

/// Syntax-scope queries against buffer positions.
///
/// This is the moral equivalent of Sublime's `view.score_selector`: parse
/// up to the caret, keep a scope stack, and match it against a selector
/// string such as "string.other.math".
pub struct ScopeEngine {
    syntax_set: SyntaxSet,
}

impl ScopeEngine {
    pub fn new() -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
        }
    }

    /// Determine the syntax for a file by extension, with first-line
    /// detection as a fallback.
    pub fn determine_syntax(
        &self,
        file_path: Option<&str>,
        first_line: &str,
    ) -> Option<Arc<SyntaxReference>> {
        if let Some(path) = file_path {
            let extension = Path::new(path)
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("");
            if let Some(syntax) = self.syntax_set.find_syntax_by_extension(extension) {
                return Some(Arc::new(syntax.clone()));
            }
        }

        self.syntax_set
            .find_syntax_by_first_line(first_line)
            .map(|syntax| Arc::new(syntax.clone()))
    }

    /// The LaTeX syntax from the bundled defaults. Untitled buffers get
    /// this, since the whole tool exists for typing LaTeX.
    pub fn latex(&self) -> Option<Arc<SyntaxReference>> {
        self.syntax_set
            .find_syntax_by_extension("tex")
            .or_else(|| self.syntax_set.find_syntax_by_name("LaTeX"))
            .map(|syntax| Arc::new(syntax.clone()))
    }

    pub fn plain_text(&self) -> Arc<SyntaxReference> {
        Arc::new(self.syntax_set.find_syntax_plain_text().clone())
    }

    /// Whether the scope stack at `pos` matches `selector`.
    ///
    /// False whenever the buffer has no syntax, the selector does not
    /// parse, or parsing fails, so context queries fail closed.
    pub fn score_selector(&self, buffer: &Buffer, pos: Position, selector: &str) -> bool {
        let Some(syntax) = buffer.syntax.as_ref() else {
            return false;
        };
        let selectors = match ScopeSelectors::from_str(selector) {
            Ok(s) => s,
            Err(err) => {
                warn!("invalid scope selector {:?}: {:?}", selector, err);
                return false;
            }
        };
        let pos = buffer.clamp(pos);

        let mut parse = ParseState::new(syntax);
        let mut stack = ScopeStack::new();
        for y in 0..=pos.line {
            // Newline-terminated lines, as the "newlines" syntax set expects
            let line = format!("{}\n", buffer.line(y));
            let ops = match parse.parse_line(&line, &self.syntax_set) {
                Ok(ops) => ops,
                Err(err) => {
                    warn!("scope parse failed on line {}: {:?}", y, err);
                    return false;
                }
            };
            let limit = if y == pos.line {
                byte_index(&line, pos.col)
            } else {
                line.len()
            };
            for (offset, op) in &ops {
                if *offset > limit {
                    break;
                }
                if stack.apply(op).is_err() {
                    return false;
                }
            }
        }

        selectors.does_match(stack.as_slice()).is_some()
    }
}

impl Default for ScopeEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_scope_matches() {
        let engine = ScopeEngine::new();
        let mut buffer = Buffer::new();
        buffer.set_text("just some words");
        buffer.set_syntax(Some(engine.plain_text()));

        assert!(engine.score_selector(&buffer, Position::new(0, 5), "text.plain"));
        assert!(!engine.score_selector(&buffer, Position::new(0, 5), "string.other.math"));
    }

    #[test]
    fn test_no_syntax_fails_closed() {
        let engine = ScopeEngine::new();
        let mut buffer = Buffer::new();
        buffer.set_text("anything");

        assert!(!engine.score_selector(&buffer, Position::new(0, 0), "text.plain"));
    }

    #[test]
    fn test_invalid_selector_fails_closed() {
        let engine = ScopeEngine::new();
        let mut buffer = Buffer::new();
        buffer.set_text("words");
        buffer.set_syntax(Some(engine.plain_text()));

        assert!(!engine.score_selector(&buffer, Position::new(0, 0), "!!!"));
    }

    #[test]
    fn test_latex_syntax_is_bundled() {
        let engine = ScopeEngine::new();
        assert!(engine.latex().is_some());
    }
}
