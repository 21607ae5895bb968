use crate::fs_watcher::WatcherControl;
use crate::hotkey::{FunctionKey, MacroKeys, RegistrationReport};
use crate::macros::{self, ConfigError, MacroAction, MacroFile, MacroTable};
use crate::settings::{Context, Settings};
use crate::ui::UiBridge;
use log::{info, warn};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// The context whose macros are currently bound
#[derive(Debug, Clone)]
pub struct ActiveContext {
    pub context: Context,
    /// None until the context's file has been loaded once
    pub file: Option<MacroFile>,
}

/// Snapshot of the active context sent to the frontend
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContextSummary {
    pub name: String,
    pub file: String,
    pub path: String,
    pub loaded: bool,
    pub bindings: usize,
    pub problems: Vec<String>,
}

/// Application state shared by hotkeys, commands and the watcher
pub struct AppState {
    pub macro_dir: PathBuf,
    pub settings: Settings,
    pub active: Mutex<ActiveContext>,
    pub ui: UiBridge,
    pub watcher_control: Mutex<Option<WatcherControl>>,
    /// F-key grabs; kept in step with the active table
    macro_keys: Mutex<Option<MacroKeys>>,
}

impl AppState {
    pub fn new(macro_dir: PathBuf, settings: Settings, ui: UiBridge) -> Self {
        let context = settings
            .context(&settings.default_context)
            .or_else(|| settings.contexts.first())
            .cloned()
            .unwrap_or_else(|| Context {
                name: "Default".to_string(),
                file: "macros.json".to_string(),
            });

        Self {
            macro_dir,
            settings,
            active: Mutex::new(ActiveContext {
                context,
                file: None,
            }),
            ui,
            watcher_control: Mutex::new(None),
            macro_keys: Mutex::new(None),
        }
    }

    pub fn context_path(&self, context: &Context) -> PathBuf {
        self.macro_dir.join(&context.file)
    }

    /// The macro directory, then any other directory holding a context file
    pub fn watch_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = vec![self.macro_dir.clone()];
        for context in &self.settings.contexts {
            let path = self.context_path(context);
            let dir = path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| self.macro_dir.clone());
            if !dirs.contains(&dir) {
                dirs.push(dir);
            }
        }
        dirs
    }

    pub fn active_path(&self) -> PathBuf {
        let active = self.active.lock().unwrap();
        self.context_path(&active.context)
    }

    pub fn summary(&self) -> ContextSummary {
        let active = self.active.lock().unwrap();
        self.summarize(&active)
    }

    fn summarize(&self, active: &ActiveContext) -> ContextSummary {
        let (bindings, problems) = match &active.file {
            Some(file) => (file.table.len(), file.table.problems()),
            None => (0, Vec::new()),
        };
        ContextSummary {
            name: active.context.name.clone(),
            file: active.context.file.clone(),
            path: self.context_path(&active.context).to_string_lossy().to_string(),
            loaded: active.file.is_some(),
            bindings,
            problems,
        }
    }

    /// Copy of the active table
    pub fn table(&self) -> MacroTable {
        let active = self.active.lock().unwrap();
        active
            .file
            .as_ref()
            .map(|f| f.table.clone())
            .unwrap_or_default()
    }

    pub fn action_for(&self, key: FunctionKey) -> Option<MacroAction> {
        let active = self.active.lock().unwrap();
        active
            .file
            .as_ref()
            .and_then(|f| f.table.action_for(key).cloned())
    }

    /// Load a context's file and make it active
    ///
    /// The previous context stays active when the file cannot be loaded.
    pub fn select_context(&self, name: &str) -> Result<ContextSummary, ConfigError> {
        let context = self
            .settings
            .context(name)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownContext(name.to_string()))?;

        let file = macros::load_macro_file(&self.context_path(&context))?;
        Ok(self.activate(context, file))
    }

    /// Re-read the active context's file
    pub fn reload(&self) -> Result<ContextSummary, ConfigError> {
        let context = self.active.lock().unwrap().context.clone();
        let file = macros::load_macro_file(&self.context_path(&context))?;
        Ok(self.activate(context, file))
    }

    /// Reload only when the file content differs from what is loaded
    pub fn reload_if_changed(&self) -> Result<Option<ContextSummary>, ConfigError> {
        let (context, loaded_digest) = {
            let active = self.active.lock().unwrap();
            (
                active.context.clone(),
                active.file.as_ref().map(|f| f.digest.clone()),
            )
        };

        let file = macros::load_macro_file(&self.context_path(&context))?;
        if loaded_digest.as_deref() == Some(file.digest.as_str()) {
            return Ok(None);
        }
        Ok(Some(self.activate(context, file)))
    }

    /// Start grabbing the F-keys bound in the active table
    pub fn attach_macro_keys(&self, mut keys: MacroKeys) -> RegistrationReport {
        let mut slot = self.macro_keys.lock().unwrap();
        let report = keys.sync(&self.table().bound_keys());
        *slot = Some(keys);
        report
    }

    fn activate(&self, context: Context, file: MacroFile) -> ContextSummary {
        info!("📄 Configuration loaded: {:?} ({} bindings)", file.path, file.table.len());
        for problem in file.table.problems() {
            warn!("⚠️  {}: {}", context.name, problem);
        }
        let bound = file.table.bound_keys();

        // macro_keys before active, so grabs follow activations in order
        let mut keys = self.macro_keys.lock().unwrap();
        let summary = {
            let mut active = self.active.lock().unwrap();
            *active = ActiveContext {
                context,
                file: Some(file),
            };
            self.summarize(&active)
        };
        if let Some(keys) = keys.as_mut() {
            keys.sync(&bound);
        }
        summary
    }
}
