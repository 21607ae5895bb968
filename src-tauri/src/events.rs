use crate::state::ContextSummary;
use serde::Serialize;
use tauri::{AppHandle, Emitter};

#[derive(Debug, Clone, Serialize)]
pub struct MacroTriggeredEvent {
    pub key: String,
    pub kind: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MacroErrorEvent {
    pub key: String,
    pub message: String,
}

/// Emit the newly active context to open windows
pub fn emit_context_changed(app: &AppHandle, summary: &ContextSummary) -> Result<(), String> {
    app.emit("context-changed", summary)
        .map_err(|e| format!("Failed to emit context-changed: {}", e))
}

/// Emit a performed macro to open windows
pub fn emit_macro_triggered(app: &AppHandle, event: MacroTriggeredEvent) -> Result<(), String> {
    app.emit("macro-triggered", event)
        .map_err(|e| format!("Failed to emit macro-triggered: {}", e))
}

/// Emit a failed macro to open windows
pub fn emit_macro_error(app: &AppHandle, event: MacroErrorEvent) -> Result<(), String> {
    app.emit("macro-error", event)
        .map_err(|e| format!("Failed to emit macro-error: {}", e))
}
