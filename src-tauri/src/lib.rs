mod commands;
mod dispatch;
mod events;
mod fs_watcher;
mod hotkey;
mod macros;
mod settings;
mod state;
mod ui;

pub mod logging;

use dispatch::Dispatcher;
use hotkey::tauri_backend::TauriShortcutBackend;
use hotkey::{HotkeyAction, HotkeyHandler, MacroKeys, ShortcutBackend};
use log::{error, info, warn};
use macros::ConfigError;
use settings::{Hotkeys, Settings};
use state::AppState;
use std::sync::Arc;
use tauri::{AppHandle, Manager, RunEvent};
use tauri_plugin_dialog::{DialogExt, MessageDialogKind};
use ui::UiRequest;

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    let macro_dir = settings::macro_dir();
    let settings = Settings::load(&macro_dir);
    let (ui_bridge, ui_rx) = ui::channel();

    let app = tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .plugin(tauri_plugin_dialog::init())
        .plugin(tauri_plugin_global_shortcut::Builder::new().build())
        .manage(AppState::new(macro_dir, settings, ui_bridge))
        .invoke_handler(tauri::generate_handler![
            commands::list_contexts,
            commands::get_active_context,
            commands::select_context,
            commands::get_help,
            commands::reload_macros,
            commands::set_auto_reload,
            commands::open_macro_file,
            commands::open_context_selector,
            commands::close_dialog,
            commands::quit_app,
        ])
        .setup(move |app| {
            let app_handle = app.handle().clone();
            let state = app.state::<AppState>();

            print_banner(&state.settings.hotkeys);
            info!("📁 Macro directory: {:?}", state.macro_dir);

            // Initial context
            match state.reload() {
                Ok(summary) => info!("✅ Context {} ready ({} bindings)", summary.name, summary.bindings),
                Err(ConfigError::NotFound(path)) => {
                    warn!("⚠️  File not found: {:?}, no macros bound until a context is selected", path);
                }
                Err(e) => {
                    error!("❌ {}", e);
                    show_error(&app_handle, &e.to_string());
                }
            }

            ui::spawn_pump(app_handle.clone(), ui_rx);
            let dispatcher = Dispatcher::spawn(app_handle.clone());

            let handler_app = app_handle.clone();
            let handler: HotkeyHandler = Arc::new(move |action: HotkeyAction| match action {
                HotkeyAction::Macro(key) => dispatcher.trigger(key),
                HotkeyAction::SelectContext => {
                    handler_app.state::<AppState>().ui.request(UiRequest::SelectContext);
                }
                HotkeyAction::ShowHelp => {
                    handler_app.state::<AppState>().ui.request(UiRequest::ShowHelp);
                }
                HotkeyAction::Quit => {
                    info!("👋 Quit hotkey pressed");
                    handler_app.exit(0);
                }
            });

            let backend = Arc::new(TauriShortcutBackend::new(app_handle.clone()));
            let chords = hotkey::register_hotkeys(
                backend.as_ref(),
                &state.settings.hotkeys,
                Arc::clone(&handler),
            );
            // F-keys are grabbed only while the active context binds them
            let macro_keys = state.attach_macro_keys(MacroKeys::new(backend, handler, &chords));
            if chords.registered.is_empty() && macro_keys.registered.is_empty() {
                show_error(
                    &app_handle,
                    "No global hotkey could be registered. Another application may own them, \
                     or the session does not allow global shortcuts (Wayland).",
                );
            }

            // Hot reload of the active macro file
            if state.settings.watch_files {
                match fs_watcher::watch_macro_files(app_handle.clone(), state.watch_dirs()) {
                    Ok(watcher_control) => {
                        let mut control = state.watcher_control.lock().unwrap();
                        *control = Some(watcher_control);
                    }
                    Err(e) => {
                        warn!("⚠️  Failed to start macro file watcher: {}", e);
                    }
                }
            }

            Ok(())
        })
        .build(tauri::generate_context!())
        .expect("error while building tauri application");

    app.run(|app_handle, event| match event {
        // Closing the last dialog must not stop the hotkeys; only an explicit
        // exit (quit hotkey or command) carries an exit code.
        RunEvent::ExitRequested { api, code, .. } if code.is_none() => {
            api.prevent_exit();
        }
        RunEvent::Exit => {
            if let Err(e) = TauriShortcutBackend::new(app_handle.clone()).unregister_all() {
                warn!("⚠️  {}", e);
            }
            info!("Macros stopped.");
        }
        _ => {}
    });
}

fn print_banner(hotkeys: &Hotkeys) {
    info!("=== Macros F1-F12 ===");
    info!("{} : select the context", hotkeys.context_hotkey);
    info!("{} : show bindings", hotkeys.help_hotkey);
    info!("{} : quit", hotkeys.quit_hotkey);
    info!("Supported action types: text, keys, command");
}

fn show_error(app: &AppHandle, message: &str) {
    app.dialog()
        .message(message)
        .kind(MessageDialogKind::Error)
        .title("Macros F1-F12")
        .show(|_| {});
}
