use std::collections::HashMap;

use crate::config::keymap::{KeyBinding, Keymap};

use super::snippet;

const INSERT_COMMANDS: [&str; 2] = ["latex_prefix_key_insert", "latex_prefix_key_insert_snippet"];

/// One selectable row in the help panel, flattened from a keybinding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelpEntry {
    /// Literal characters the binding produces (templating stripped).
    pub characters: String,
    /// Raw insert payload: characters, or snippet contents.
    pub contents: String,
    pub is_snippet: bool,
    /// Displayed key combination; shadowed duplicates get wrapped in
    /// parentheses.
    pub display_key: String,
    /// Human-readable label, annotated from the symbol table when known.
    pub label: String,
}

fn is_insert_binding(binding: &KeyBinding) -> bool {
    INSERT_COMMANDS.contains(&binding.command.as_str())
}

fn is_for_mode(binding: &KeyBinding, selector_name: &str) -> bool {
    binding.context.iter().any(|c| c.key == selector_name)
}

fn title_case(s: &str) -> String {
    let mut out = String::new();
    let mut boundary = true;
    for c in s.chars() {
        if c.is_alphanumeric() {
            if boundary {
                out.extend(c.to_uppercase());
            } else {
                out.push(c);
            }
            boundary = false;
        } else {
            out.push(c);
            boundary = true;
        }
    }
    out
}

fn flatten(binding: &KeyBinding) -> HelpEntry {
    let is_snippet = binding.command == "latex_prefix_key_insert_snippet";

    let (characters, contents) = if is_snippet {
        let contents = binding
            .args
            .get("contents")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();
        (snippet::display_characters(&contents), contents)
    } else {
        let characters = binding
            .args
            .get("characters")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();
        (characters.clone(), characters)
    };

    HelpEntry {
        characters,
        contents,
        is_snippet,
        display_key: binding.keys.join(","),
        label: String::new(),
    }
}

fn annotate(entry: &mut HelpEntry, symbols: &HashMap<String, Option<String>>) {
    let name = entry
        .characters
        .strip_prefix('\\')
        .unwrap_or(&entry.characters);
    let name = title_case(name);

    match symbols.get(&entry.characters) {
        Some(Some(symbol)) => {
            entry.label = format!("{} ({}): {}", name, symbol, entry.contents);
        }
        _ => {
            entry.label = entry.characters.clone();
        }
    }
}

/// Build the help rows for the active mode: user bindings first, then
/// packaged defaults, each filtered to insert commands whose context
/// names `latex_prefix_key.mode.<mode_label>` exactly.
pub fn build_entries(
    mode_label: &str,
    keymap: &Keymap,
    symbols: &HashMap<String, Option<String>>,
) -> Vec<HelpEntry> {
    let selector_name = format!("latex_prefix_key.mode.{}", mode_label);

    let mut entries: Vec<HelpEntry> = keymap
        .iter()
        .filter(|b| is_insert_binding(b) && is_for_mode(b, &selector_name))
        .map(flatten)
        .collect();

    // First occurrence of a key combination keeps its label; later ones
    // are shadowed and only shown parenthesized.
    let mut used_keys: Vec<String> = Vec::new();
    for entry in &mut entries {
        if used_keys.contains(&entry.display_key) {
            entry.display_key = format!("({})", entry.display_key);
        } else {
            used_keys.push(entry.display_key.clone());
        }
    }

    for entry in &mut entries {
        annotate(entry, symbols);
    }

    entries
}

/// Panel state for the interactive help list.
#[derive(Debug, Default)]
pub struct HelpPanel {
    entries: Vec<HelpEntry>,
    selected_index: usize,
}

impl HelpPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, entries: Vec<HelpEntry>) {
        self.entries = entries;
        self.selected_index = 0;
    }

    pub fn close(&mut self) {
        self.entries.clear();
        self.selected_index = 0;
    }

    pub fn entries(&self) -> &[HelpEntry] {
        &self.entries
    }

    pub fn selected_index(&self) -> usize {
        self.selected_index
    }

    pub fn get_selected(&self) -> Option<&HelpEntry> {
        self.entries.get(self.selected_index)
    }

    pub fn next(&mut self) {
        if !self.entries.is_empty() {
            self.selected_index = (self.selected_index + 1) % self.entries.len();
        }
    }

    pub fn previous(&mut self) {
        if !self.entries.is_empty() {
            self.selected_index = if self.selected_index == 0 {
                self.entries.len() - 1
            } else {
                self.selected_index - 1
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::keymap::ContextSpec;
    use serde_json::json;

    fn binding(keys: &[&str], command: &str, args: serde_json::Value, mode: &str) -> KeyBinding {
        let args = match args {
            serde_json::Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        KeyBinding {
            keys: keys.iter().map(|k| k.to_string()).collect(),
            command: command.to_string(),
            args,
            context: vec![ContextSpec {
                key: format!("latex_prefix_key.mode.{}", mode),
                operator: "equal".to_string(),
                operand: true,
                match_all: false,
            }],
        }
    }

    fn symbols() -> HashMap<String, Option<String>> {
        let mut map = HashMap::new();
        map.insert("\\alpha".to_string(), Some("α".to_string()));
        map.insert("\\frac".to_string(), None);
        map
    }

    fn keymap(user: Vec<KeyBinding>, default: Vec<KeyBinding>) -> Keymap {
        Keymap { user, default }
    }

    #[test]
    fn test_filters_to_insert_commands_for_mode() {
        let map = keymap(
            vec![],
            vec![
                binding(&["a"], "latex_prefix_key_insert", json!({"characters": "\\alpha"}), "math"),
                binding(&["`"], "latex_prefix_key_prefix", json!({"insert_prefix": "`"}), "math"),
                binding(&["c"], "latex_prefix_key_insert", json!({"characters": "\\ce"}), "chem"),
            ],
        );

        let entries = build_entries("math", &map, &symbols());
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].characters, "\\alpha");
        assert!(!entries[0].is_snippet);
    }

    #[test]
    fn test_user_entries_precede_defaults() {
        let map = keymap(
            vec![binding(&["a"], "latex_prefix_key_insert", json!({"characters": "\\aleph"}), "math")],
            vec![binding(&["b"], "latex_prefix_key_insert", json!({"characters": "\\beta"}), "math")],
        );

        let entries = build_entries("math", &map, &symbols());
        assert_eq!(entries[0].characters, "\\aleph");
        assert_eq!(entries[1].characters, "\\beta");
    }

    #[test]
    fn test_duplicate_display_keys_get_parenthesized() {
        let map = keymap(
            vec![binding(&["a"], "latex_prefix_key_insert", json!({"characters": "\\aleph"}), "math")],
            vec![
                binding(&["a"], "latex_prefix_key_insert", json!({"characters": "\\alpha"}), "math"),
                binding(&["b"], "latex_prefix_key_insert", json!({"characters": "\\beta"}), "math"),
            ],
        );

        let entries = build_entries("math", &map, &symbols());
        assert_eq!(entries[0].display_key, "a");
        assert_eq!(entries[1].display_key, "(a)");
        assert_eq!(entries[2].display_key, "b");
    }

    #[test]
    fn test_snippet_entry_strips_templating() {
        let map = keymap(
            vec![],
            vec![binding(
                &["F"],
                "latex_prefix_key_insert_snippet",
                json!({"contents": "\\frac{$1}{$2}$0"}),
                "math",
            )],
        );

        let entries = build_entries("math", &map, &symbols());
        assert_eq!(entries[0].characters, "\\frac");
        assert_eq!(entries[0].contents, "\\frac{$1}{$2}$0");
        assert!(entries[0].is_snippet);
    }

    #[test]
    fn test_symbol_annotation_in_label() {
        let map = keymap(
            vec![],
            vec![
                binding(&["a"], "latex_prefix_key_insert", json!({"characters": "\\alpha"}), "math"),
                binding(&["g"], "latex_prefix_key_insert", json!({"characters": "\\gamma"}), "math"),
            ],
        );

        let entries = build_entries("math", &map, &symbols());
        assert_eq!(entries[0].label, "Alpha (α): \\alpha");
        // No symbol known: the bare characters
        assert_eq!(entries[1].label, "\\gamma");
    }

    #[test]
    fn test_panel_navigation_wraps() {
        let mut panel = HelpPanel::new();
        panel.open(vec![
            HelpEntry {
                characters: "\\alpha".to_string(),
                contents: "\\alpha".to_string(),
                is_snippet: false,
                display_key: "a".to_string(),
                label: "\\alpha".to_string(),
            },
            HelpEntry {
                characters: "\\beta".to_string(),
                contents: "\\beta".to_string(),
                is_snippet: false,
                display_key: "b".to_string(),
                label: "\\beta".to_string(),
            },
        ]);

        assert_eq!(panel.selected_index(), 0);
        panel.next();
        assert_eq!(panel.selected_index(), 1);
        panel.next();
        assert_eq!(panel.selected_index(), 0);
        panel.previous();
        assert_eq!(panel.selected_index(), 1);
        assert_eq!(panel.get_selected().map(|e| e.characters.as_str()), Some("\\beta"));
    }
}
