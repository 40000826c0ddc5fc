use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

pub mod keymap;
pub use keymap::Keymap;

#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    /// Seconds of inactivity before an armed prefix mode auto-cancels.
    #[serde(default = "default_key_combination_time")]
    pub key_combination_time: f64,
    /// Scope selector that decides whether a caret counts as "in math".
    #[serde(default = "default_math_scope_selector")]
    pub math_scope_selector: String,
    /// Turn off the packaged backtick trigger (user keymaps still work).
    #[serde(default)]
    pub disable_default_prefix_key: bool,
    #[serde(default = "default_line_numbers")]
    pub line_numbers: bool,
    #[serde(default)]
    pub theme: Theme,
}

fn default_key_combination_time() -> f64 { 0.5 }
fn default_math_scope_selector() -> String {
    "string.other.math, meta.environment.math".to_string()
}
fn default_line_numbers() -> bool { true }

#[derive(Debug, Serialize, Deserialize)]
pub struct Theme {
    #[serde(default = "default_background")]
    pub background: String,
    #[serde(default = "default_foreground")]
    pub foreground: String,
    #[serde(default = "default_cursor")]
    pub cursor: String,
    #[serde(default = "default_status_line_bg")]
    pub status_line_bg: String,
    #[serde(default = "default_status_line_fg")]
    pub status_line_fg: String,
    #[serde(default = "default_prefix_mode_fg")]
    pub prefix_mode_fg: String,
}

fn default_background() -> String { "#282c34".to_string() }
fn default_foreground() -> String { "#abb2bf".to_string() }
fn default_cursor() -> String { "#528bff".to_string() }
fn default_status_line_bg() -> String { "#4b5263".to_string() }
fn default_status_line_fg() -> String { "#abb2bf".to_string() }
fn default_prefix_mode_fg() -> String { "#e5c07b".to_string() }

impl Default for Config {
    fn default() -> Self {
        Self {
            key_combination_time: default_key_combination_time(),
            math_scope_selector: default_math_scope_selector(),
            disable_default_prefix_key: false,
            line_numbers: default_line_numbers(),
            theme: Theme::default(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: default_background(),
            foreground: default_foreground(),
            cursor: default_cursor(),
            status_line_bg: default_status_line_bg(),
            status_line_fg: default_status_line_fg(),
            prefix_mode_fg: default_prefix_mode_fg(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_dir = get_config_dir()?;
        Self::load_from(&config_dir)
    }

    fn load_from(config_dir: &PathBuf) -> Result<Self> {
        let config_path = config_dir.join("config.toml");

        if config_path.exists() {
            let config_str = fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

            let config = toml::from_str(&config_str)
                .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;

            Ok(config)
        } else {
            // Create default config
            let config = Config::default();

            fs::create_dir_all(config_dir)
                .with_context(|| format!("Failed to create config directory: {:?}", config_dir))?;

            let config_str = toml::to_string_pretty(&config)
                .with_context(|| "Failed to serialize config")?;

            fs::write(&config_path, config_str)
                .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

            Ok(config)
        }
    }

}

pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .with_context(|| "Failed to determine config directory")?
        .join("texkey");

    Ok(config_dir)
}
