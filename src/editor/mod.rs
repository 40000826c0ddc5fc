mod buffer;
pub mod context;
mod help;
mod mode;
mod prefix;
mod scope;
mod selection;
mod snippet;
mod timeout;

pub use buffer::Buffer;
pub use help::{HelpEntry, HelpPanel};
pub use mode::Mode;
pub use prefix::PrefixState;
pub use scope::ScopeEngine;
pub use selection::{Position, Selection, SelectionSet};
pub use timeout::PrefixTimeout;

use std::collections::HashMap;
use std::time::Instant;

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{debug, warn};

use crate::config::keymap::{self, KeyBinding, Keymap};
use crate::config::Config;
use context::{ContextError, QueryInput};
use selection::{adjust_after_delete, adjust_after_insert};
use timeout::combination_timeout;

pub struct Editor {
    pub buffer: Buffer,
    pub selections: SelectionSet,
    pub mode: Mode,
    pub prefix: PrefixState,
    pub timeout: PrefixTimeout,
    pub help: HelpPanel,
    pub keymap: Keymap,
    pub symbols: HashMap<String, Option<String>>,
    pub scope_engine: ScopeEngine,
    pub config: Config,
}

impl Editor {
    pub fn new_with_config(config: Config) -> Result<Self> {
        let keymap = Keymap::load()?;
        let symbols = keymap::load_symbols()?;
        let scope_engine = ScopeEngine::new();

        // Untitled buffers are LaTeX; that is what this tool is for
        let mut buffer = Buffer::new();
        buffer.set_syntax(scope_engine.latex());

        Ok(Self {
            buffer,
            selections: SelectionSet::new(),
            mode: Mode::Edit,
            prefix: PrefixState::new(),
            timeout: PrefixTimeout::new(),
            help: HelpPanel::new(),
            keymap,
            symbols,
            scope_engine,
            config,
        })
    }

    pub fn load_file(&mut self, path: &str) -> Result<()> {
        self.buffer.load_file(path)?;
        let syntax = self
            .scope_engine
            .determine_syntax(Some(path), self.buffer.line(0))
            .or_else(|| self.scope_engine.latex());
        self.buffer.set_syntax(syntax);
        self.selections.collapse_to(Position::new(0, 0));
        self.prefix.clear();
        Ok(())
    }

    /// Drive the expiry scheduler. Called from the event loop on every
    /// iteration, and before handling each key.
    pub fn tick(&mut self, now: Instant) {
        if self.timeout.fire_due(now) {
            self.cancel_prefix_mode();
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> Result<bool> {
        self.tick(now);
        match self.mode {
            Mode::Edit => self.handle_edit_mode(key, now),
            Mode::Help => self.handle_help_mode(key),
        }
    }

    fn query_input(&self) -> QueryInput<'_> {
        QueryInput {
            buffer: &self.buffer,
            selections: &self.selections,
            prefix: &self.prefix,
            config: &self.config,
            scopes: &self.scope_engine,
        }
    }

    /// Whether every context query on a binding holds for the current
    /// view state. A binding without context always applies.
    fn context_applies(&self, binding: &KeyBinding) -> Result<bool, ContextError> {
        let input = self.query_input();
        for spec in &binding.context {
            if !context::evaluate(spec, &input)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn handle_edit_mode(&mut self, key: KeyEvent, now: Instant) -> Result<bool> {
        // Keymap dispatch first, so context-gated bindings can shadow
        // plain typing while prefix mode is armed
        let mut matched = None;
        for binding in self.keymap.iter() {
            if binding.keys.len() == 1
                && keymap::event_matches(&binding.keys[0], &key)
                && self.context_applies(binding)?
            {
                matched = Some(binding.clone());
                break;
            }
        }
        if let Some(binding) = matched {
            self.run_binding(&binding, now);
            return Ok(true);
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);
        match key.code {
            KeyCode::Char('q') if ctrl => return Ok(false),
            KeyCode::Char('s') if ctrl => {
                match self.buffer.save() {
                    Ok(path) => debug!("saved {}", path),
                    Err(err) => warn!("save failed: {:#}", err),
                }
            }
            KeyCode::Char('d') if ctrl => {
                let primary = self.selections.primary().end;
                if primary.line + 1 < self.buffer.line_count() {
                    let line = primary.line + 1;
                    let col = primary.col.min(self.buffer.line_len(line));
                    self.selections.add_caret(Position::new(line, col));
                }
            }
            KeyCode::Char(c) if !ctrl && !alt => {
                self.insert_at_carets(&c.to_string());
            }
            KeyCode::Enter => self.insert_at_carets("\n"),
            KeyCode::Backspace => self.backspace_at_carets(),
            KeyCode::Esc => self.cancel_prefix_mode(),
            KeyCode::Left => self.selections.move_left(&self.buffer),
            KeyCode::Right => self.selections.move_right(&self.buffer),
            KeyCode::Up => self.selections.move_up(&self.buffer),
            KeyCode::Down => self.selections.move_down(&self.buffer),
            KeyCode::Home => self.selections.move_to_line_start(),
            KeyCode::End => self.selections.move_to_line_end(&self.buffer),
            _ => {}
        }

        Ok(true)
    }

    fn handle_help_mode(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Esc => {
                self.help.close();
                self.mode = Mode::Edit;
            }
            KeyCode::Enter => {
                // Same resolve path as a live keystroke
                if let Some(entry) = self.help.get_selected().cloned() {
                    if entry.is_snippet {
                        self.resolve_with_snippet(&entry.contents);
                    } else {
                        self.resolve_with_text(&entry.contents);
                    }
                }
                self.help.close();
                self.mode = Mode::Edit;
            }
            KeyCode::Down => self.help.next(),
            KeyCode::Up => self.help.previous(),
            _ => {}
        }

        Ok(true)
    }

    fn run_binding(&mut self, binding: &KeyBinding, now: Instant) {
        let arg = |name: &str| {
            binding
                .args
                .get(name)
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string()
        };

        match binding.command.as_str() {
            "latex_prefix_key_prefix" => {
                let insert_prefix = arg("insert_prefix");
                if insert_prefix.is_empty() {
                    warn!("prefix binding without insert_prefix arg; ignoring");
                    return;
                }
                let mode = binding
                    .args
                    .get("mode")
                    .and_then(|v| v.as_str())
                    .unwrap_or("math");
                self.enter_prefix_mode(&insert_prefix, mode, now);
            }
            "latex_prefix_key_cancel" => self.cancel_prefix_mode(),
            "latex_prefix_key_insert" => self.resolve_with_text(&arg("characters")),
            "latex_prefix_key_insert_snippet" => self.resolve_with_snippet(&arg("contents")),
            "latex_prefix_key_help" => self.open_help(),
            other => debug!("unbound command {:?}", other),
        }
    }

    /// Enter prefix mode: insert the prefix at every caret, record it,
    /// arm the expiry timer. Re-entering while armed just re-arms.
    pub fn enter_prefix_mode(&mut self, insert_prefix: &str, mode: &str, now: Instant) {
        self.insert_at_carets(insert_prefix);
        self.prefix.set(insert_prefix, mode);
        self.timeout
            .arm(now, combination_timeout(self.config.key_combination_time));
    }

    /// Leave prefix mode without inserting anything. Idempotent.
    pub fn cancel_prefix_mode(&mut self) {
        self.prefix.clear();
    }

    /// Consume the prefix and insert literal characters at every caret.
    pub fn resolve_with_text(&mut self, characters: &str) {
        self.consume_prefix();
        self.insert_at_carets(characters);
        self.cancel_prefix_mode();
    }

    /// Consume the prefix and expand a snippet at every caret.
    pub fn resolve_with_snippet(&mut self, contents: &str) {
        self.consume_prefix();
        self.insert_snippet_at_carets(contents);
        self.cancel_prefix_mode();
    }

    pub fn open_help(&mut self) {
        let label = self.prefix.mode_label().unwrap_or("").to_string();
        let entries = help::build_entries(&label, &self.keymap, &self.symbols);
        self.help.open(entries);
        self.mode = Mode::Help;
    }

    /// Delete the previously inserted prefix before each caret, located
    /// by rightmost occurrence, independently per caret.
    fn consume_prefix(&mut self) {
        let Some(prefix) = self.prefix.prefix().map(str::to_string) else {
            return;
        };
        for i in (0..self.selections.len()).rev() {
            let Some(sel) = self.selections.get(i).copied() else {
                continue;
            };
            let caret = sel.end;
            let before = self.buffer.text_before(caret);
            match prefix::prefix_start(&before, &prefix) {
                Some(col) => {
                    let begin = Position::new(caret.line, col);
                    self.buffer.delete_range(begin, caret);
                    self.remap_others(i, |p| adjust_after_delete(p, begin, caret));
                    self.selections.set(i, Selection::caret(begin));
                }
                None => {
                    // Enter and resolve disagree about the text; the
                    // buffer was edited out from under the mode
                    warn!(
                        "prefix {:?} not found before caret at {}:{}; skipping",
                        prefix, caret.line, caret.col
                    );
                }
            }
        }
        self.selections.normalize();
    }

    fn insert_at_carets(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        for i in (0..self.selections.len()).rev() {
            let Some(sel) = self.selections.get(i).copied() else {
                continue;
            };
            let caret = sel.end;
            let end = self.buffer.insert_at(caret, text);
            self.remap_others(i, |p| adjust_after_insert(p, caret, text));
            self.selections.set(i, Selection::caret(end));
        }
        self.selections.normalize();
    }

    fn insert_snippet_at_carets(&mut self, contents: &str) {
        let (text, offset) = snippet::expand(contents);
        let landing_prefix: String = text.chars().take(offset).collect();
        for i in (0..self.selections.len()).rev() {
            let Some(sel) = self.selections.get(i).copied() else {
                continue;
            };
            let caret = sel.end;
            self.buffer.insert_at(caret, &text);
            self.remap_others(i, |p| adjust_after_insert(p, caret, &text));

            let newlines = landing_prefix.matches('\n').count();
            let landing = if newlines == 0 {
                Position::new(caret.line, caret.col + landing_prefix.chars().count())
            } else {
                let col = landing_prefix
                    .rsplit('\n')
                    .next()
                    .unwrap_or_default()
                    .chars()
                    .count();
                Position::new(caret.line + newlines, col)
            };
            self.selections.set(i, Selection::caret(landing));
        }
        self.selections.normalize();
    }

    fn backspace_at_carets(&mut self) {
        for i in (0..self.selections.len()).rev() {
            let Some(sel) = self.selections.get(i).copied() else {
                continue;
            };
            let caret = sel.end;
            let (begin, end) = if caret.col > 0 {
                (
                    Position::new(caret.line, caret.col - 1),
                    Position::new(caret.line, caret.col),
                )
            } else if caret.line > 0 {
                (
                    Position::new(caret.line - 1, self.buffer.line_len(caret.line - 1)),
                    Position::new(caret.line, 0),
                )
            } else {
                continue;
            };
            self.buffer.delete_range(begin, end);
            self.remap_others(i, |p| adjust_after_delete(p, begin, end));
            self.selections.set(i, Selection::caret(begin));
        }
        self.selections.normalize();
    }

    /// Remap every selection except `skip` through a position function,
    /// after a single buffer edit.
    fn remap_others(&mut self, skip: usize, f: impl Fn(Position) -> Position) {
        for j in 0..self.selections.len() {
            if j == skip {
                continue;
            }
            if let Some(sel) = self.selections.get(j).copied() {
                self.selections
                    .set(j, Selection::range(f(sel.begin), f(sel.end)));
            }
        }
    }
}
