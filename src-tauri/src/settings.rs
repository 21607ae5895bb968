// Application settings
//
// Optional `settings.json` next to the macro files. Every field is optional;
// missing fields take the defaults below.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding the macro directory
pub const MACRO_DIR_ENV: &str = "FKEY_MACROS_DIR";

pub const SETTINGS_FILE: &str = "settings.json";

/// A named macro file offered by the context selector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    pub name: String,
    pub file: String,
}

impl Context {
    fn new(name: &str, file: &str) -> Self {
        Self {
            name: name.to_string(),
            file: file.to_string(),
        }
    }
}

/// The built-in context menu
pub fn default_contexts() -> Vec<Context> {
    vec![
        Context::new("Java", "macros_java.json"),
        Context::new("JavaScript", "macros_js.json"),
        Context::new("Professional", "macros_pro.json"),
        Context::new("LaTeX", "macros_latex.json"),
        Context::new("Default", "macros.json"),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Hotkeys {
    pub context_hotkey: String,
    pub help_hotkey: String,
    pub quit_hotkey: String,
}

impl Default for Hotkeys {
    fn default() -> Self {
        Self {
            // Backquote is the physical key labelled ² on AZERTY layouts
            context_hotkey: "CmdOrCtrl+Alt+Backquote".to_string(),
            help_hotkey: "CmdOrCtrl+Alt+Slash".to_string(),
            quit_hotkey: "CmdOrCtrl+Alt+Escape".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    #[serde(flatten)]
    pub hotkeys: Hotkeys,
    pub default_context: String,
    pub watch_files: bool,
    pub contexts: Vec<Context>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            hotkeys: Hotkeys::default(),
            default_context: "Default".to_string(),
            watch_files: true,
            contexts: default_contexts(),
        }
    }
}

impl Settings {
    /// Load `settings.json` from the macro directory, falling back to defaults
    pub fn load(macro_dir: &Path) -> Self {
        let path = macro_dir.join(SETTINGS_FILE);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("⚙️  No {} in {:?}, using defaults", SETTINGS_FILE, macro_dir);
                return Self::default();
            }
            Err(e) => {
                warn!("⚠️  Failed to read {:?}: {}, using defaults", path, e);
                return Self::default();
            }
        };

        match serde_json::from_str::<Settings>(&content) {
            Ok(settings) => {
                info!("⚙️  Settings loaded from {:?}", path);
                settings.validated()
            }
            Err(e) => {
                warn!("⚠️  Invalid settings in {:?}: {}, using defaults", path, e);
                Self::default()
            }
        }
    }

    /// Repair values that would leave the app without a usable context
    pub fn validated(mut self) -> Self {
        self.contexts.retain(|c| {
            let usable = !c.name.trim().is_empty() && !c.file.trim().is_empty();
            if !usable {
                warn!("⚠️  Ignoring context with empty name or file: {:?}", c);
            }
            usable
        });

        let mut seen = std::collections::HashSet::new();
        self.contexts.retain(|c| {
            let first = seen.insert(c.name.clone());
            if !first {
                warn!("⚠️  Ignoring duplicate context `{}`", c.name);
            }
            first
        });

        if self.contexts.is_empty() {
            warn!("⚠️  No contexts configured, using the built-in list");
            self.contexts = default_contexts();
        }

        if self.context(&self.default_context).is_none() {
            // the last built-in entry is the catch-all "Default"
            let fallback = self
                .contexts
                .iter()
                .find(|c| c.name == "Default")
                .or_else(|| self.contexts.last())
                .map(|c| c.name.clone())
                .unwrap_or_default();
            warn!(
                "⚠️  Default context `{}` does not exist, using `{}`",
                self.default_context, fallback
            );
            self.default_context = fallback;
        }

        self
    }

    pub fn context(&self, name: &str) -> Option<&Context> {
        self.contexts.iter().find(|c| c.name == name)
    }
}

/// Directory holding the macro files and `settings.json`
pub fn macro_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(MACRO_DIR_ENV) {
        return PathBuf::from(dir);
    }
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}
