use std::fs;
use std::io::IsTerminal;
use std::path::Path;

use serde::Deserialize;

/// Process-wide knobs that sit outside the language's own semantics.
///
/// Loaded from (in increasing precedence) built-in defaults, an optional
/// `.kiprc.json` in the current directory, and `KIP_*` environment
/// variables. None of these affect what a program evaluates to; they only
/// affect the surrounding REPL/CLI/guard-rail behavior.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub max_call_depth: usize,
    pub prompt: String,
    pub color: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_call_depth: 1024,
            prompt: ">> ".to_string(),
            color: std::io::stdout().is_terminal(),
        }
    }
}

impl Config {
    pub fn load() -> Self {
        let mut config = Self::from_file(Path::new(".kiprc.json")).unwrap_or_default();
        config.apply_env();
        config
    }

    fn from_file(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) => {
                log::warn!("could not read {}: {err}", path.display());
                return None;
            }
        };
        match serde_json::from_str(&contents) {
            Ok(config) => Some(config),
            Err(err) => {
                log::warn!("malformed config file {}: {err}", path.display());
                None
            }
        }
    }

    fn apply_env(&mut self) {
        if let Ok(depth) = std::env::var("KIP_MAX_CALL_DEPTH") {
            match depth.parse() {
                Ok(depth) => self.max_call_depth = depth,
                Err(_) => log::warn!("KIP_MAX_CALL_DEPTH is not a valid number: {depth}"),
            }
        }
        if let Ok(prompt) = std::env::var("KIP_PROMPT") {
            self.prompt = prompt;
        }
        if let Ok(color) = std::env::var("KIP_COLOR") {
            self.color = color != "0" && color.to_lowercase() != "false";
        }
    }
}
