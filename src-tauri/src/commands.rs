use crate::events;
use crate::hotkey::{self, FunctionKey};
use crate::macros::{ActionKind, MacroTable};
use crate::settings::Hotkeys;
use crate::state::{AppState, ContextSummary};
use crate::ui::{self, UiRequest, CONTEXT_SELECTOR_LABEL, HELP_LABEL};
use key_inject::KeySequence;
use log::info;
use serde::Serialize;
use tauri::{AppHandle, State};
use tauri_plugin_opener::OpenerExt;

const PREVIEW_CHARS: usize = 60;

/// A context entry as shown by the selector
#[derive(Debug, Clone, Serialize)]
pub struct ContextView {
    pub name: String,
    pub file: String,
    pub active: bool,
    pub exists: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HotkeyView {
    pub accelerator: String,
    pub action: String,
}

/// One row of the help viewer
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BindingView {
    pub key: String,
    pub kind: Option<String>,
    pub value: String,
    pub preview: String,
    /// Canonical form of a `keys` value, when it parses
    pub keys: Option<KeySequence>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HelpSnapshot {
    pub context: ContextSummary,
    pub hotkeys: Vec<HotkeyView>,
    pub bindings: Vec<BindingView>,
    pub auto_reload: bool,
}

/// Single-line preview of a macro value, cut after `max` characters
pub fn preview(value: &str, max: usize) -> String {
    let flat: String = value
        .chars()
        .map(|c| match c {
            '\n' => '⏎',
            '\t' | '\r' => ' ',
            c => c,
        })
        .collect();

    if flat.chars().count() <= max {
        flat
    } else {
        let mut cut: String = flat.chars().take(max).collect();
        cut.push('…');
        cut
    }
}

/// Build what the help viewer shows for the given table
pub fn help_snapshot(
    context: ContextSummary,
    table: &MacroTable,
    hotkeys: &Hotkeys,
    auto_reload: bool,
) -> HelpSnapshot {
    let hotkeys = hotkey::bindings(hotkeys)
        .into_iter()
        .map(|(accelerator, action)| HotkeyView {
            accelerator: hotkey::normalize_accelerator(&accelerator),
            action: action.to_string(),
        })
        .collect();

    let bindings = FunctionKey::ALL
        .into_iter()
        .map(|key| match table.action_for(key) {
            Some(action) => BindingView {
                key: key.to_string(),
                kind: Some(action.kind.to_string()),
                value: action.value.clone(),
                preview: preview(&action.value, PREVIEW_CHARS),
                keys: match action.kind {
                    ActionKind::Keys => KeySequence::parse(&action.value).ok(),
                    _ => None,
                },
            },
            None => BindingView {
                key: key.to_string(),
                kind: None,
                value: String::new(),
                preview: String::new(),
                keys: None,
            },
        })
        .collect();

    HelpSnapshot {
        context,
        hotkeys,
        bindings,
        auto_reload,
    }
}

/// List the configured contexts for the selector
#[tauri::command]
pub fn list_contexts(state: State<AppState>) -> Vec<ContextView> {
    let active = state.summary().name;
    state
        .settings
        .contexts
        .iter()
        .map(|c| ContextView {
            name: c.name.clone(),
            file: c.file.clone(),
            active: c.name == active,
            exists: state.context_path(c).is_file(),
        })
        .collect()
}

/// Get the active context
#[tauri::command]
pub fn get_active_context(state: State<AppState>) -> ContextSummary {
    state.summary()
}

/// Activate a context and close the selector
#[tauri::command]
pub async fn select_context(
    name: String,
    app: AppHandle,
    state: State<'_, AppState>,
) -> Result<ContextSummary, String> {
    info!("🔀 Switching context to {}", name);

    let summary = state.select_context(&name).map_err(|e| e.to_string())?;
    events::emit_context_changed(&app, &summary)?;
    ui::close_window(&app, CONTEXT_SELECTOR_LABEL)?;

    Ok(summary)
}

/// Everything the help viewer displays
#[tauri::command]
pub fn get_help(state: State<AppState>) -> HelpSnapshot {
    let auto_reload = state
        .watcher_control
        .lock()
        .map(|control| control.as_ref().is_some_and(|c| c.is_enabled()))
        .unwrap_or(false);

    help_snapshot(state.summary(), &state.table(), &state.settings.hotkeys, auto_reload)
}

/// Re-read the active context's file
#[tauri::command]
pub async fn reload_macros(app: AppHandle, state: State<'_, AppState>) -> Result<ContextSummary, String> {
    let summary = state.reload().map_err(|e| e.to_string())?;
    events::emit_context_changed(&app, &summary)?;
    Ok(summary)
}

/// Pause or resume hot reloading of the active file
#[tauri::command]
pub fn set_auto_reload(enabled: bool, state: State<AppState>) -> Result<bool, String> {
    let control = state.watcher_control.lock()
        .map_err(|e| format!("Failed to lock watcher_control: {}", e))?;
    let control = control.as_ref().ok_or("File watching is disabled in settings")?;

    if enabled {
        control.resume();
    } else {
        control.pause();
    }
    Ok(control.is_enabled())
}

/// Open the active macro file with the system's default application
#[tauri::command]
pub async fn open_macro_file(app: AppHandle, state: State<'_, AppState>) -> Result<(), String> {
    let path = state.active_path();
    if !path.exists() {
        return Err(format!("{} does not exist yet", path.display()));
    }

    app.opener()
        .open_path(path.to_string_lossy().to_string(), None::<&str>)
        .map_err(|e| format!("Failed to open file: {}", e))
}

/// Open the context selector from another window
#[tauri::command]
pub fn open_context_selector(state: State<AppState>) -> Result<(), String> {
    if state.ui.request(UiRequest::SelectContext) {
        Ok(())
    } else {
        Err("UI queue closed".to_string())
    }
}

/// Close one of the dialog windows
#[tauri::command]
pub async fn close_dialog(label: String, app: AppHandle) -> Result<(), String> {
    if label != CONTEXT_SELECTOR_LABEL && label != HELP_LABEL {
        return Err(format!("Unknown dialog: {}", label));
    }
    ui::close_window(&app, &label)
}

/// Stop the app (same as the quit hotkey)
#[tauri::command]
pub fn quit_app(app: AppHandle) {
    info!("👋 Quit requested from UI");
    app.exit(0);
}
