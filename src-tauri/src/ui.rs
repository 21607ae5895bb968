// Dialog windows and the request queue feeding them
//
// Hotkey callbacks push requests onto a channel; a pump thread drains it
// and creates (or focuses) the windows, so a hotkey press never waits on
// window creation.

use log::{debug, info, warn};
use std::sync::mpsc::{self, Receiver, Sender};
use tauri::{AppHandle, Manager, WebviewUrl, WebviewWindowBuilder};

pub const CONTEXT_SELECTOR_LABEL: &str = "context_selector";
pub const HELP_LABEL: &str = "help";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiRequest {
    SelectContext,
    ShowHelp,
}

/// How a dialog window is built
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSpec {
    pub label: &'static str,
    pub page: &'static str,
    pub title: &'static str,
    pub width: f64,
    pub height: f64,
    pub resizable: bool,
    pub always_on_top: bool,
}

impl UiRequest {
    pub fn window(&self) -> WindowSpec {
        match self {
            UiRequest::SelectContext => WindowSpec {
                label: CONTEXT_SELECTOR_LABEL,
                page: "context.html",
                title: "Select context",
                width: 300.0,
                height: 250.0,
                resizable: false,
                always_on_top: true,
            },
            UiRequest::ShowHelp => WindowSpec {
                label: HELP_LABEL,
                page: "help.html",
                title: "Macros F1-F12",
                width: 560.0,
                height: 600.0,
                resizable: true,
                always_on_top: false,
            },
        }
    }
}

/// Sending half of the UI queue, held by the app state
#[derive(Debug, Clone)]
pub struct UiBridge {
    tx: Sender<UiRequest>,
}

impl UiBridge {
    /// Queue a window request; returns false once the pump is gone
    pub fn request(&self, request: UiRequest) -> bool {
        match self.tx.send(request) {
            Ok(()) => true,
            Err(_) => {
                warn!("⚠️  UI queue closed, dropping {:?}", request);
                false
            }
        }
    }
}

pub fn channel() -> (UiBridge, Receiver<UiRequest>) {
    let (tx, rx) = mpsc::channel();
    (UiBridge { tx }, rx)
}

/// Drain UI requests for the lifetime of the app
pub fn spawn_pump(app: AppHandle, rx: Receiver<UiRequest>) {
    std::thread::spawn(move || {
        while let Ok(request) = rx.recv() {
            debug!("UI request: {:?}", request);
            if let Err(e) = open_window(&app, request) {
                warn!("⚠️  {}", e);
            }
        }
        debug!("UI queue closed");
    });
}

/// Create the window for a request, or focus it when already open
pub fn open_window(app: &AppHandle, request: UiRequest) -> Result<(), String> {
    let spec = request.window();

    if let Some(window) = app.get_webview_window(spec.label) {
        debug!("Window {} already open, focusing", spec.label);
        window
            .show()
            .and_then(|_| window.set_focus())
            .map_err(|e| format!("Failed to focus {} window: {}", spec.label, e))?;
        return Ok(());
    }

    info!("🪟 Opening {} window", spec.label);
    WebviewWindowBuilder::new(app, spec.label, WebviewUrl::App(spec.page.into()))
        .title(spec.title)
        .inner_size(spec.width, spec.height)
        .resizable(spec.resizable)
        .always_on_top(spec.always_on_top)
        .center()
        .focused(true)
        .build()
        .map_err(|e| format!("Failed to create {} window: {}", spec.label, e))?;

    Ok(())
}

/// Close a dialog window if it is open
pub fn close_window(app: &AppHandle, label: &str) -> Result<(), String> {
    match app.get_webview_window(label) {
        Some(window) => window
            .close()
            .map_err(|e| format!("Failed to close {} window: {}", label, e)),
        None => {
            debug!("Window {} not open", label);
            Ok(())
        }
    }
}
