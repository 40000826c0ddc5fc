use anyhow::{Context, Result};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

const DEFAULT_KEYMAP: &str = include_str!("../../resources/Default.keymap.json");
const SYMBOL_TABLE: &str = include_str!("../../resources/tex_symbols.json");

/// One keybinding record: keys, command, args and the context queries
/// that gate it.
#[derive(Debug, Clone, Deserialize)]
pub struct KeyBinding {
    pub keys: Vec<String>,
    pub command: String,
    #[serde(default)]
    pub args: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub context: Vec<ContextSpec>,
}

/// A raw context query as written in the keymap. The selector and
/// operator stay strings here; the resolver parses them.
#[derive(Debug, Clone, Deserialize)]
pub struct ContextSpec {
    pub key: String,
    #[serde(default = "default_operator")]
    pub operator: String,
    #[serde(default = "default_operand")]
    pub operand: bool,
    #[serde(default)]
    pub match_all: bool,
}

fn default_operator() -> String {
    "equal".to_string()
}

fn default_operand() -> bool {
    true
}

/// User bindings layered over the packaged defaults. User entries win on
/// dispatch because they are walked first.
#[derive(Debug)]
pub struct Keymap {
    pub user: Vec<KeyBinding>,
    pub default: Vec<KeyBinding>,
}

impl Keymap {
    pub fn load() -> Result<Self> {
        let user_path = user_keymap_path().ok();
        Self::load_with_user_path(user_path.as_deref())
    }

    pub fn load_with_user_path(user_path: Option<&Path>) -> Result<Self> {
        let default: Vec<KeyBinding> = serde_json::from_str(DEFAULT_KEYMAP)
            .context("Packaged default keymap is invalid")?;

        // A broken or missing user keymap must not take the default
        // bindings down with it.
        let user = match user_path {
            Some(path) if path.exists() => match load_user_keymap(path) {
                Ok(bindings) => bindings,
                Err(err) => {
                    warn!("Error loading keymap {:?}: {:#}", path, err);
                    Vec::new()
                }
            },
            _ => Vec::new(),
        };

        Ok(Self { user, default })
    }

    /// All bindings in dispatch order: user first, then defaults, stable
    /// within each source.
    pub fn iter(&self) -> impl Iterator<Item = &KeyBinding> {
        self.user.iter().chain(self.default.iter())
    }
}

fn load_user_keymap(path: &Path) -> Result<Vec<KeyBinding>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read keymap: {:?}", path))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse keymap: {:?}", path))
}

pub fn user_keymap_path() -> Result<PathBuf> {
    Ok(super::get_config_dir()?.join("keymap.json"))
}

/// The symbol annotation table: literal character sequence to optional
/// display symbol ("\\alpha" -> "α", null allowed).
pub fn load_symbols() -> Result<HashMap<String, Option<String>>> {
    serde_json::from_str(SYMBOL_TABLE).context("Packaged symbol table is invalid")
}

/// Whether a key spec like "a", "`", "escape" or "ctrl+space" matches a
/// terminal key event. Shift is only checked when spelled out, since
/// shifted characters already arrive as their shifted form.
pub fn event_matches(spec: &str, event: &KeyEvent) -> bool {
    let mut ctrl = false;
    let mut alt = false;
    let mut shift = false;
    let mut key = "";
    for part in spec.split('+') {
        match part {
            "ctrl" => ctrl = true,
            "alt" => alt = true,
            "shift" => shift = true,
            other => key = other,
        }
    }

    let key_matches = match event.code {
        KeyCode::Char(' ') => key == "space",
        KeyCode::Char(c) => {
            let mut chars = key.chars();
            chars.next() == Some(c) && chars.next().is_none()
        }
        KeyCode::Enter => key == "enter",
        KeyCode::Tab => key == "tab",
        KeyCode::Backspace => key == "backspace",
        KeyCode::Esc => key == "escape",
        KeyCode::Left => key == "left",
        KeyCode::Right => key == "right",
        KeyCode::Up => key == "up",
        KeyCode::Down => key == "down",
        KeyCode::Home => key == "home",
        KeyCode::End => key == "end",
        KeyCode::PageUp => key == "pageup",
        KeyCode::PageDown => key == "pagedown",
        KeyCode::Delete => key == "delete",
        KeyCode::Insert => key == "insert",
        KeyCode::F(n) => key == format!("f{}", n),
        _ => false,
    };

    let has_ctrl = event.modifiers.contains(KeyModifiers::CONTROL);
    let has_alt = event.modifiers.contains(KeyModifiers::ALT);
    let has_shift = event.modifiers.contains(KeyModifiers::SHIFT);

    let modifiers_match =
        ctrl == has_ctrl && alt == has_alt && (!shift || has_shift);

    key_matches && modifiers_match
}
