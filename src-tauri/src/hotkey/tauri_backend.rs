// Global hotkeys through tauri-plugin-global-shortcut
//
// The plugin wraps RegisterHotKey on Windows, Carbon hotkeys on macOS and
// XGrabKey on Linux (X11 only; Wayland compositors refuse global grabs).

use super::{HotkeyCallback, ShortcutBackend};
use log::debug;
use tauri::AppHandle;
use tauri_plugin_global_shortcut::{GlobalShortcutExt, Shortcut, ShortcutState};

pub struct TauriShortcutBackend {
    app: AppHandle,
}

impl TauriShortcutBackend {
    pub fn new(app: AppHandle) -> Self {
        Self { app }
    }
}

impl ShortcutBackend for TauriShortcutBackend {
    fn register(&self, accelerator: &str, callback: HotkeyCallback) -> Result<(), String> {
        let shortcut: Shortcut = accelerator
            .parse()
            .map_err(|e| format!("Invalid hotkey `{}`: {}", accelerator, e))?;

        self.app
            .global_shortcut()
            .on_shortcut(shortcut, move |_app, shortcut, event| {
                debug!("Hotkey event: {:?} state={:?}", shortcut, event.state);
                // Releases would fire the callback a second time
                if event.state == ShortcutState::Pressed {
                    callback();
                }
            })
            .map_err(|e| format!("Failed to register `{}`: {}", accelerator, e))
    }

    fn unregister(&self, accelerator: &str) -> Result<(), String> {
        let shortcut: Shortcut = accelerator
            .parse()
            .map_err(|e| format!("Invalid hotkey `{}`: {}", accelerator, e))?;

        self.app
            .global_shortcut()
            .unregister(shortcut)
            .map_err(|e| format!("Failed to unregister `{}`: {}", accelerator, e))
    }

    fn unregister_all(&self) -> Result<(), String> {
        self.app
            .global_shortcut()
            .unregister_all()
            .map_err(|e| format!("Failed to unregister hotkeys: {}", e))
    }
}
